//! Registry of delivered software builds.
//!
//! Maps a `(name, delivery_id)` pair to the installation directory and
//! version string of one delivered build.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// One delivered software build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeliveredSoftware {
    pub name: String,
    pub delivery_id: String,
    /// Installation directory (contains `bin/` and `lib/`)
    pub path: PathBuf,
    pub version: String,
}

/// Lookup of delivered software.
#[async_trait]
pub trait DeliveryRegistry: Send + Sync {
    async fn lookup(&self, name: &str, delivery_id: &str) -> StorageResult<DeliveredSoftware>;
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    deliveries: Vec<DeliveredSoftware>,
}

/// Registry loaded from a YAML file.
///
/// ```yaml
/// deliveries:
///   - name: hirs_ctp_monthly
///     delivery_id: "20180803-1"
///     path: hirs_ctp_monthly/20180803-1
///     version: v20180803
/// ```
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Debug, Clone, Default)]
pub struct YamlDeliveryRegistry {
    deliveries: Vec<DeliveredSoftware>,
}

impl YamlDeliveryRegistry {
    pub fn new(deliveries: Vec<DeliveredSoftware>) -> Self {
        Self { deliveries }
    }

    /// Load a registry file.
    pub fn load(path: &Path) -> StorageResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| StorageError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let registry = Self::from_yaml(&content, base).map_err(|e| match e {
            StorageError::Parse { message, .. } => StorageError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        info!(
            path = %path.display(),
            count = registry.deliveries.len(),
            "Loaded delivery registry"
        );
        Ok(registry)
    }

    /// Parse registry YAML, resolving relative paths against `base`.
    pub fn from_yaml(content: &str, base: &Path) -> StorageResult<Self> {
        let file: RegistryFile =
            serde_yaml::from_str(content).map_err(|e| StorageError::Parse {
                path: PathBuf::from("<inline>"),
                message: e.to_string(),
            })?;

        let deliveries = file
            .deliveries
            .into_iter()
            .map(|mut d| {
                if d.path.is_relative() {
                    d.path = base.join(&d.path);
                }
                d
            })
            .collect();

        Ok(Self { deliveries })
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }
}

#[async_trait]
impl DeliveryRegistry for YamlDeliveryRegistry {
    async fn lookup(&self, name: &str, delivery_id: &str) -> StorageResult<DeliveredSoftware> {
        let found = self
            .deliveries
            .iter()
            .find(|d| d.name == name && d.delivery_id == delivery_id)
            .cloned()
            .ok_or_else(|| StorageError::UnknownDelivery {
                name: name.to_string(),
                delivery_id: delivery_id.to_string(),
            })?;

        debug!(
            name = %name,
            delivery_id = %delivery_id,
            path = %found.path.display(),
            version = %found.version,
            "Resolved delivered software"
        );
        Ok(found)
    }
}
