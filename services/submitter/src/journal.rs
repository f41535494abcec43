//! Submission journal: one line per submitted interval.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use hirs_common::{Satellite, TimeInterval};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// `hirs_ctp_monthly_<sat>_s<YYYYMM>_e<YYYYMM>_c<YYYYMMDDHHMMSS>.log`
///
/// The start month comes from the first interval, the end month from the
/// right bound of the last one.
pub fn journal_file_name(
    satellite: Satellite,
    intervals: &[TimeInterval],
    created: NaiveDateTime,
) -> Option<String> {
    let first = intervals.first()?;
    let last = intervals.last()?;
    Some(format!(
        "hirs_ctp_monthly_{}_s{}_e{}_c{}.log",
        satellite,
        first.left.format("%Y%m"),
        last.right.format("%Y%m"),
        created.format("%Y%m%d%H%M%S")
    ))
}

pub fn submitted_line(first: impl Display, last: impl Display, job_ids: &[u64]) -> Option<String> {
    let (a, b) = (job_ids.first()?, job_ids.last()?);
    Some(format!(
        "contexts: [{}, {}]; job numbers: {{{}..{}}}",
        first, last, a, b
    ))
}

pub fn no_jobs_line(first: impl Display, last: impl Display) -> String {
    format!("contexts: {{{}, {}}}; --> no jobs", first, last)
}

/// Append-only journal file.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{}\n", line).as_bytes()).await?;
        file.flush().await
    }
}
