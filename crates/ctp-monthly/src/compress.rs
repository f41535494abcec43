//! Lossless NetCDF repacking of produced outputs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::error::{JobError, JobResult};
use crate::tool::ToolCommand;

/// Repacks a NetCDF file with deflate compression using `nccopy`.
///
/// Only the container layout changes; the data values are copied unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetcdfRepack {
    /// Program used for the repack
    #[serde(default = "default_tool")]
    pub tool: PathBuf,
    /// Deflate level, 1-9
    #[serde(default = "default_level")]
    pub level: u8,
    /// Enable the shuffle filter
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
}

fn default_tool() -> PathBuf {
    PathBuf::from("nccopy")
}

fn default_level() -> u8 {
    4
}

fn default_shuffle() -> bool {
    true
}

impl Default for NetcdfRepack {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            level: default_level(),
            shuffle: default_shuffle(),
        }
    }
}

impl NetcdfRepack {
    pub fn validate(&self) -> JobResult<()> {
        if !(1..=9).contains(&self.level) {
            return Err(JobError::Config(format!(
                "deflate level must be between 1 and 9, got {}",
                self.level
            )));
        }
        Ok(())
    }

    /// Repack `path` in place.
    pub async fn repack(&self, path: &Path, timeout: Option<Duration>) -> JobResult<()> {
        self.validate()?;

        let file_name = path
            .file_name()
            .ok_or_else(|| JobError::OutputMissing(path.to_path_buf()))?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".repack");
        let tmp = path.with_file_name(tmp_name);

        let mut command = ToolCommand::new(&self.tool)
            .arg("-d")
            .arg(self.level.to_string());
        if self.shuffle {
            command = command.arg("-s");
        }
        let command = command.arg(path).arg(&tmp).timeout(timeout);

        if let Err(e) = command.run().await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }

        if !fs::try_exists(&tmp).await? {
            return Err(JobError::OutputMissing(tmp));
        }

        let before = fs::metadata(path).await?.len();
        fs::rename(&tmp, path).await?;
        let after = fs::metadata(path).await?.len();

        info!(
            path = %path.display(),
            before_bytes = before,
            after_bytes = after,
            "Repacked output"
        );
        Ok(())
    }
}
