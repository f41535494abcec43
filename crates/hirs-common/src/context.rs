//! Typed contexts: one unit of work for a month or a day.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{HirsError, HirsResult};
use crate::satellite::Satellite;

/// Upstream software versions a context was produced against.
///
/// Field order is significant: it is the ordering used when contexts with the
/// same granule and satellite are sorted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionSet {
    pub hirs_version: String,
    pub collo_version: String,
    pub csrb_version: String,
    pub ctp_version: String,
}

impl VersionSet {
    pub fn new(
        hirs_version: impl Into<String>,
        collo_version: impl Into<String>,
        csrb_version: impl Into<String>,
        ctp_version: impl Into<String>,
    ) -> HirsResult<Self> {
        let versions = Self {
            hirs_version: hirs_version.into(),
            collo_version: collo_version.into(),
            csrb_version: csrb_version.into(),
            ctp_version: ctp_version.into(),
        };
        versions.validate()?;
        Ok(versions)
    }

    /// Versions are used as path components, so they must be non-empty and
    /// must not contain separators.
    pub fn validate(&self) -> HirsResult<()> {
        for (field, value) in [
            ("hirs_version", &self.hirs_version),
            ("collo_version", &self.collo_version),
            ("csrb_version", &self.csrb_version),
            ("ctp_version", &self.ctp_version),
        ] {
            if value.is_empty() {
                return Err(HirsError::InvalidVersion {
                    field,
                    message: "empty".to_string(),
                });
            }
            if value.contains('/') || value.contains('\\') || value == ".." {
                return Err(HirsError::InvalidVersion {
                    field,
                    message: format!("'{}' is not a valid path component", value),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for VersionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hirs_version={} collo_version={} csrb_version={} ctp_version={}",
            self.hirs_version, self.collo_version, self.csrb_version, self.ctp_version
        )
    }
}

/// One month of work for one satellite.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthlyContext {
    /// First day of the month
    pub granule: NaiveDate,
    pub satellite: Satellite,
    pub versions: VersionSet,
}

impl MonthlyContext {
    pub fn new(granule: NaiveDate, satellite: Satellite, versions: VersionSet) -> Self {
        Self {
            granule: crate::time::first_of_month(granule),
            satellite,
            versions,
        }
    }
}

impl fmt::Display for MonthlyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{granule={} sat={} {}}}",
            self.granule, self.satellite, self.versions
        )
    }
}

/// One day of work for one satellite.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DailyContext {
    pub granule: NaiveDate,
    pub satellite: Satellite,
    pub versions: VersionSet,
}

impl DailyContext {
    pub fn new(granule: NaiveDate, satellite: Satellite, versions: VersionSet) -> Self {
        Self {
            granule,
            satellite,
            versions,
        }
    }
}

impl fmt::Display for DailyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{granule={} sat={} {}}}",
            self.granule, self.satellite, self.versions
        )
    }
}
