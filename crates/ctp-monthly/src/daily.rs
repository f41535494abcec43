//! The upstream daily CTP computation, seen from the monthly job.
//!
//! The monthly job only needs two things from it: its context enumeration and
//! the catalog handle of each daily context's `out` product.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use hirs_common::{DailyContext, Satellite, TimeInterval, VersionSet};
use storage::ProductRef;
use tracing::debug;

use crate::error::JobResult;

pub const DAILY_COMPUTATION: &str = "HIRS_CTP_DAILY";

/// Daily computation collaborator.
#[async_trait]
pub trait DailyComputation: Send + Sync {
    fn name(&self) -> &str;

    /// Daily contexts touched by `interval`, in chronological order.
    async fn find_contexts(
        &self,
        interval: &TimeInterval,
        satellite: Satellite,
        versions: &VersionSet,
    ) -> JobResult<Vec<DailyContext>>;

    /// Catalog handle of the daily `out` product.
    fn output_product(&self, context: &DailyContext) -> ProductRef;
}

/// HIRS_CTP_DAILY: one context per calendar day.
///
/// Days after the availability cutoff are never enumerated since their
/// products cannot exist yet. Without an explicit cutoff, today (UTC) is used.
#[derive(Debug, Clone, Default)]
pub struct HirsCtpDaily {
    availability_cutoff: Option<NaiveDate>,
}

impl HirsCtpDaily {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cutoff(cutoff: NaiveDate) -> Self {
        Self {
            availability_cutoff: Some(cutoff),
        }
    }

    fn cutoff(&self) -> NaiveDate {
        self.availability_cutoff
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn context_path(&self, context: &DailyContext) -> PathBuf {
        PathBuf::from("HIRS")
            .join(context.satellite.as_str())
            .join(context.granule.year().to_string())
            .join("CTP_DAILY")
    }

    pub fn output_filename(&self, context: &DailyContext) -> String {
        format!(
            "ctp.daily.{}.{}.nc",
            context.satellite,
            context.granule.format("d%Y%m%d")
        )
    }
}

#[async_trait]
impl DailyComputation for HirsCtpDaily {
    fn name(&self) -> &str {
        DAILY_COMPUTATION
    }

    async fn find_contexts(
        &self,
        interval: &TimeInterval,
        satellite: Satellite,
        versions: &VersionSet,
    ) -> JobResult<Vec<DailyContext>> {
        let cutoff = self.cutoff();
        let contexts: Vec<_> = interval
            .days()
            .into_iter()
            .filter(|day| *day <= cutoff)
            .map(|day| DailyContext::new(day, satellite, versions.clone()))
            .collect();

        debug!(
            interval = %interval,
            satellite = %satellite,
            cutoff = %cutoff,
            count = contexts.len(),
            "Enumerated daily contexts"
        );
        Ok(contexts)
    }

    fn output_product(&self, context: &DailyContext) -> ProductRef {
        ProductRef::new(
            DAILY_COMPUTATION,
            self.context_path(context),
            self.output_filename(context),
        )
    }
}
