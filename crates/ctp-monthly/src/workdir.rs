//! Private working directories for a single task run.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::computation::TaskInputs;
use crate::error::{JobError, JobResult};

/// A freshly created directory owned by one task invocation.
///
/// The directory is kept after the run: the produced output lives in it until
/// the orchestrator collects it.
#[derive(Debug, Clone)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    /// Create `<root>/<prefix>_<uuid>`.
    pub async fn create(root: &Path, prefix: &str) -> JobResult<Self> {
        let path = root.join(format!("{}_{}", prefix, Uuid::new_v4().simple()));
        fs::create_dir_all(&path).await?;
        let path = fs::canonicalize(&path).await?;
        debug!(path = %path.display(), "Created working directory");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }

    /// Symlink every input into the directory.
    ///
    /// Links are named after the input's file name; a name already taken by an
    /// earlier input is prefixed with the input's label. The returned inputs
    /// carry the link names, relative to the directory, in the same order.
    pub async fn stage_inputs(&self, inputs: &TaskInputs) -> JobResult<TaskInputs> {
        let mut staged = TaskInputs::new();

        for (label, source) in inputs.iter() {
            let file_name = source
                .file_name()
                .ok_or_else(|| {
                    JobError::Staging(format!("{} has no file name: {}", label, source.display()))
                })?
                .to_string_lossy()
                .into_owned();

            let mut link_name = file_name.clone();
            if fs::symlink_metadata(self.join(&link_name)).await.is_ok() {
                link_name = format!("{}_{}", label, file_name);
            }

            // Link targets resolve against the link's directory.
            let target = std::path::absolute(source).map_err(|e| {
                JobError::Staging(format!("{}: {}", source.display(), e))
            })?;
            symlink(&target, &self.join(&link_name)).await.map_err(|e| {
                JobError::Staging(format!("{} -> {}: {}", link_name, source.display(), e))
            })?;
            staged.insert(label, PathBuf::from(&link_name));
        }

        debug!(
            path = %self.path.display(),
            count = staged.len(),
            "Staged task inputs"
        );
        Ok(staged)
    }

    /// Write a manifest listing one path per line, each newline-terminated.
    pub async fn write_manifest<'a, I>(&self, name: &str, paths: I) -> JobResult<PathBuf>
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut content = String::new();
        for path in paths {
            content.push_str(&path.to_string_lossy());
            content.push('\n');
        }
        let manifest = self.join(name);
        fs::write(&manifest, content).await?;
        Ok(manifest)
    }
}

#[cfg(unix)]
async fn symlink(source: &Path, link: &Path) -> std::io::Result<()> {
    fs::symlink(source, link).await
}

#[cfg(not(unix))]
async fn symlink(source: &Path, link: &Path) -> std::io::Result<()> {
    fs::copy(source, link).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_is_unique() {
        let root = tempfile::tempdir().unwrap();
        let a = WorkDir::create(root.path(), "hirs_ctp_monthly").await.unwrap();
        let b = WorkDir::create(root.path(), "hirs_ctp_monthly").await.unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().is_dir());
        assert!(a
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("hirs_ctp_monthly_"));
    }

    #[tokio::test]
    async fn test_manifest_lists_paths_in_order() {
        let root = tempfile::tempdir().unwrap();
        let work = WorkDir::create(root.path(), "job").await.unwrap();
        let paths = [
            PathBuf::from("ctp.daily.metop-b.d20170602.nc"),
            PathBuf::from("ctp.daily.metop-b.d20170601.nc"),
        ];

        let manifest = work
            .write_manifest("ctp_daily_list", paths.iter().map(|p| p.as_path()))
            .await
            .unwrap();

        let content = std::fs::read_to_string(manifest).unwrap();
        assert_eq!(
            content,
            "ctp.daily.metop-b.d20170602.nc\nctp.daily.metop-b.d20170601.nc\n"
        );
    }

    #[tokio::test]
    async fn test_empty_manifest() {
        let root = tempfile::tempdir().unwrap();
        let work = WorkDir::create(root.path(), "job").await.unwrap();
        let manifest = work
            .write_manifest("ctp_daily_list", std::iter::empty())
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(manifest).unwrap(), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stage_inputs_symlinks_and_dedups_names() {
        let src = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("a")).unwrap();
        std::fs::create_dir_all(src.path().join("b")).unwrap();
        let first = src.path().join("a/daily.nc");
        let second = src.path().join("b/daily.nc");
        std::fs::write(&first, b"first").unwrap();
        std::fs::write(&second, b"second").unwrap();

        let mut inputs = TaskInputs::new();
        inputs.insert("CTPD-0", &first);
        inputs.insert("CTPD-1", &second);

        let root = tempfile::tempdir().unwrap();
        let work = WorkDir::create(root.path(), "job").await.unwrap();
        let staged = work.stage_inputs(&inputs).await.unwrap();

        assert_eq!(staged.get("CTPD-0"), Some(Path::new("daily.nc")));
        assert_eq!(staged.get("CTPD-1"), Some(Path::new("CTPD-1_daily.nc")));
        assert_eq!(std::fs::read(work.join("daily.nc")).unwrap(), b"first");
        assert_eq!(std::fs::read(work.join("CTPD-1_daily.nc")).unwrap(), b"second");
        assert!(std::fs::symlink_metadata(work.join("daily.nc"))
            .unwrap()
            .file_type()
            .is_symlink());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stage_relative_input_resolves_from_workdir() {
        let cwd = std::env::current_dir().unwrap();
        let src = tempfile::Builder::new().tempdir_in(&cwd).unwrap();
        let daily = src
            .path()
            .strip_prefix(&cwd)
            .unwrap()
            .join("ctp.daily.metop-b.d20170601.nc");
        assert!(daily.is_relative());
        std::fs::write(&daily, b"day one").unwrap();

        let mut inputs = TaskInputs::new();
        inputs.insert("CTPD-0", &daily);

        let root = tempfile::tempdir().unwrap();
        let work = WorkDir::create(root.path(), "job").await.unwrap();
        work.stage_inputs(&inputs).await.unwrap();

        let link = work.join("ctp.daily.metop-b.d20170601.nc");
        assert!(std::fs::read_link(&link).unwrap().is_absolute());
        assert_eq!(std::fs::read(&link).unwrap(), b"day one");
    }
}
