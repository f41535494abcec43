//! Locating the CTP averaging executable for a version set.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use hirs_common::VersionSet;
use storage::DeliveryRegistry;
use tracing::debug;

use crate::error::{JobError, JobResult};

/// File name of the averaging executable inside a package's `bin/`.
pub const EXECUTABLE_NAME: &str = "create_monthly_daynight_ctps.exe";

/// Name of the monthly package in the delivery registry.
pub const DELIVERY_NAME: &str = "hirs_ctp_monthly";

/// An executable together with the shared libraries it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedTool {
    pub executable: PathBuf,
    pub library_dir: PathBuf,
    pub version: String,
}

/// Strategy for finding the package that holds the executable.
#[derive(Clone)]
pub enum ExecutableLocator {
    /// `<root>/<ctp_version>/{bin,lib}`
    PackageRoot { root: PathBuf },
    /// Installation path from the delivery registry, keyed by `ctp_version`.
    Delivered {
        registry: Arc<dyn DeliveryRegistry>,
        name: String,
    },
}

impl fmt::Debug for ExecutableLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutableLocator::PackageRoot { root } => f
                .debug_struct("PackageRoot")
                .field("root", root)
                .finish(),
            ExecutableLocator::Delivered { name, .. } => {
                f.debug_struct("Delivered").field("name", name).finish()
            }
        }
    }
}

impl ExecutableLocator {
    pub fn package_root(root: impl Into<PathBuf>) -> Self {
        ExecutableLocator::PackageRoot { root: root.into() }
    }

    pub fn delivered(registry: Arc<dyn DeliveryRegistry>) -> Self {
        ExecutableLocator::Delivered {
            registry,
            name: DELIVERY_NAME.to_string(),
        }
    }

    /// Resolve the executable for `versions`; it must exist on disk.
    pub async fn locate(&self, versions: &VersionSet) -> JobResult<LocatedTool> {
        let (package_dir, version) = match self {
            ExecutableLocator::PackageRoot { root } => (
                root.join(&versions.ctp_version),
                versions.ctp_version.clone(),
            ),
            ExecutableLocator::Delivered { registry, name } => {
                let delivered = registry.lookup(name, &versions.ctp_version).await?;
                (delivered.path, delivered.version)
            }
        };
        // The tool runs from the working directory, not from ours.
        let package_dir = std::path::absolute(&package_dir)?;

        let tool = LocatedTool {
            executable: package_dir.join("bin").join(EXECUTABLE_NAME),
            library_dir: package_dir.join("lib"),
            version,
        };

        if !tokio::fs::try_exists(&tool.executable).await? {
            return Err(JobError::ExecutableNotFound(tool.executable));
        }

        debug!(
            executable = %tool.executable.display(),
            version = %tool.version,
            "Located executable"
        );
        Ok(tool)
    }
}
