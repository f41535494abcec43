//! Invocation of external executables.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::error::{JobError, JobResult};

/// Dynamic library search path variable.
pub const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";

/// Prepend `additions` to a path-list variable's current value.
///
/// The existing entries are kept after the additions.
pub fn augmented_path_list(
    additions: &[PathBuf],
    existing: Option<&OsStr>,
) -> JobResult<OsString> {
    let mut entries: Vec<PathBuf> = additions.to_vec();
    if let Some(existing) = existing {
        entries.extend(std::env::split_paths(existing).filter(|p| !p.as_os_str().is_empty()));
    }
    std::env::join_paths(entries).map_err(|e| JobError::Config(e.to_string()))
}

/// A single external command run to completion.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    library_dirs: Vec<PathBuf>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            library_dirs: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Add a directory to the front of the library search path.
    pub fn library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_dirs.push(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command line as it would be typed in a shell, for logs and errors.
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// Run the command, waiting for it to exit.
    ///
    /// A nonzero exit is an [`JobError::ExternalToolFailure`]; it is not
    /// retried here.
    #[instrument(skip(self), fields(command = %self.display()))]
    pub async fn run(&self) -> JobResult<()> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        if !self.library_dirs.is_empty() {
            let existing = std::env::var_os(LIBRARY_PATH_VAR);
            let value = augmented_path_list(&self.library_dirs, existing.as_deref())?;
            debug!(value = %value.to_string_lossy(), "Augmented {}", LIBRARY_PATH_VAR);
            command.env(LIBRARY_PATH_VAR, value);
        }

        info!("Running external tool");

        let child = command.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => JobError::ExecutableNotFound(self.program.clone()),
            _ => JobError::Io(e),
        })?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(timeout_secs = limit.as_secs(), "External tool timed out");
                    return Err(JobError::ToolTimeout {
                        command: self.display(),
                        timeout: limit,
                    });
                }
            },
            None => child.wait_with_output().await?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            debug!(stdout = %stdout.trim_end(), "Tool stdout");
        }

        if !output.status.success() {
            warn!(
                code = ?output.status.code(),
                stderr = %stderr.trim_end(),
                "External tool failed"
            );
            return Err(JobError::ExternalToolFailure {
                command: self.display(),
                code: output.status.code(),
            });
        }

        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim_end(), "Tool stderr");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_augmented_path_keeps_existing_entries() {
        let value = augmented_path_list(
            &[PathBuf::from("/opt/ctp/v20150915/lib")],
            Some(OsStr::new("/usr/local/lib:/usr/lib")),
        )
        .unwrap();
        assert_eq!(value, OsString::from("/opt/ctp/v20150915/lib:/usr/local/lib:/usr/lib"));
    }

    #[test]
    fn test_augmented_path_without_existing_value() {
        let value = augmented_path_list(&[PathBuf::from("/opt/ctp/lib")], None).unwrap();
        assert_eq!(value, OsString::from("/opt/ctp/lib"));

        let value = augmented_path_list(&[PathBuf::from("/opt/ctp/lib")], Some(OsStr::new("")))
            .unwrap();
        assert_eq!(value, OsString::from("/opt/ctp/lib"));
    }

    #[test]
    fn test_display() {
        let cmd = ToolCommand::new("/opt/bin/create_monthly_daynight_ctps.exe")
            .arg("ctp_daily_list")
            .arg("ctp.monthly.metop-b.d201706.nc");
        assert_eq!(
            cmd.display(),
            "/opt/bin/create_monthly_daynight_ctps.exe ctp_daily_list ctp.monthly.metop-b.d201706.nc"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_carries_code() {
        let err = ToolCommand::new("/bin/sh")
            .arg("-c")
            .arg("exit 7")
            .run()
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(7));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_program() {
        let err = ToolCommand::new("/nonexistent/create_monthly_daynight_ctps.exe")
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::ExecutableNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_hung_tool() {
        let err = ToolCommand::new("/bin/sh")
            .arg("-c")
            .arg("sleep 30")
            .timeout(Some(Duration::from_millis(200)))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::ToolTimeout { .. }));
    }
}
