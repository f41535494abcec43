//! Job configuration loaded from YAML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use hirs_common::VersionSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compress::NetcdfRepack;
use crate::error::{JobError, JobResult};

/// Root configuration of the monthly job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Root of the stored-product catalog
    pub catalog_root: PathBuf,
    /// Where private working directories are created
    #[serde(default = "default_work_root")]
    pub work_root: PathBuf,
    pub locator: LocatorConfig,
    #[serde(default)]
    pub compress: CompressConfig,
    /// Kill the averaging tool after this many seconds (no limit if unset)
    #[serde(default)]
    pub tool_timeout_secs: Option<u64>,
    /// Default upstream versions for contexts
    #[serde(default)]
    pub versions: Option<VersionSet>,
    #[serde(default)]
    pub daily: DailyConfig,
}

fn default_work_root() -> PathBuf {
    PathBuf::from(".")
}

/// How the executable is found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocatorConfig {
    PackageRoot { package_root: PathBuf },
    Delivered { registry_file: PathBuf },
}

/// Output repacking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub repack: NetcdfRepack,
}

/// Daily collaborator settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyConfig {
    /// Last day whose daily products may exist (today if unset)
    #[serde(default)]
    pub availability_cutoff: Option<NaiveDate>,
}

impl JobConfig {
    /// Load a job configuration from a YAML file.
    pub fn load(path: &Path) -> JobResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            JobError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml(&content).map_err(|e| {
            JobError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded job config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> JobResult<Self> {
        let config: JobConfig =
            serde_yaml::from_str(content).map_err(|e| JobError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> JobResult<()> {
        if let Some(versions) = &self.versions {
            versions.validate()?;
        }
        if self.compress.enabled {
            self.compress.repack.validate()?;
        }
        if self.tool_timeout_secs == Some(0) {
            return Err(JobError::Config(
                "tool_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }

    /// Repack settings when compression is enabled.
    pub fn repack(&self) -> Option<NetcdfRepack> {
        self.compress.enabled.then(|| self.compress.repack.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
catalog_root: /data/products
locator:
  type: package_root
  package_root: /opt/hirs_ctp_monthly
"#;
        let config = JobConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.catalog_root, PathBuf::from("/data/products"));
        assert_eq!(config.work_root, PathBuf::from("."));
        assert_eq!(
            config.locator,
            LocatorConfig::PackageRoot {
                package_root: PathBuf::from("/opt/hirs_ctp_monthly")
            }
        );
        assert!(config.repack().is_none());
        assert!(config.tool_timeout().is_none());
        assert!(config.versions.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
catalog_root: /data/products
work_root: /scratch
locator:
  type: delivered
  registry_file: /etc/hirs/deliveries.yaml
compress:
  enabled: true
  level: 6
tool_timeout_secs: 7200
versions:
  hirs_version: v20151014
  collo_version: v20151014
  csrb_version: v20150915
  ctp_version: v20150915
daily:
  availability_cutoff: 2018-01-31
"#;
        let config = JobConfig::from_yaml(yaml).unwrap();
        let repack = config.repack().unwrap();
        assert_eq!(repack.level, 6);
        assert_eq!(repack.tool, PathBuf::from("nccopy"));
        assert!(repack.shuffle);
        assert_eq!(config.tool_timeout(), Some(Duration::from_secs(7200)));
        assert_eq!(config.versions.unwrap().ctp_version, "v20150915");
        assert_eq!(
            config.daily.availability_cutoff,
            NaiveDate::from_ymd_opt(2018, 1, 31)
        );
    }

    #[test]
    fn test_invalid_compress_level_rejected() {
        let yaml = r#"
catalog_root: /data
locator: { type: package_root, package_root: /opt }
compress: { enabled: true, level: 12 }
"#;
        assert!(matches!(JobConfig::from_yaml(yaml), Err(JobError::Config(_))));
    }

    #[test]
    fn test_unknown_locator_rejected() {
        let yaml = r#"
catalog_root: /data
locator: { type: ftp }
"#;
        assert!(JobConfig::from_yaml(yaml).is_err());
    }
}
