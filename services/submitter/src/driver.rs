//! Interval-by-interval submission of monthly contexts.

use ctp_monthly::{Computation, HirsCtpMonthly};
use hirs_common::{MonthlyContext, Satellite, TimeInterval, VersionSet};
use tokio::sync::broadcast;
use tracing::{error, info, instrument, warn};

use crate::journal::{no_jobs_line, submitted_line, Journal};
use crate::orchestrator::Orchestrator;
use crate::submit::{monthly_order, submit_with_retry, RetryPolicy, SubmitError};

/// What happened to one submitted interval.
#[derive(Debug)]
pub enum IntervalOutcome {
    /// No contexts in the interval
    Empty,
    Submitted {
        first: MonthlyContext,
        last: MonthlyContext,
        job_ids: Vec<u64>,
    },
    Failed(SubmitError),
}

/// Sorted monthly contexts of an interval.
pub fn sorted_contexts(
    job: &HirsCtpMonthly,
    interval: &TimeInterval,
    satellite: Satellite,
    versions: &VersionSet,
) -> Vec<MonthlyContext> {
    let mut contexts = job.find_contexts(interval, satellite, versions);
    contexts.sort();
    contexts
}

pub struct Submitter<'a> {
    pub job: &'a HirsCtpMonthly,
    pub orchestrator: &'a dyn Orchestrator,
    pub policy: RetryPolicy,
    pub journal: Journal,
}

impl Submitter<'_> {
    /// Submit every interval in turn, journaling each batch.
    ///
    /// A failed interval is logged and the next one is attempted; a shutdown
    /// signal stops the loop.
    pub async fn submit_intervals(
        &self,
        intervals: &[TimeInterval],
        satellite: Satellite,
        versions: &VersionSet,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> std::io::Result<Vec<IntervalOutcome>> {
        let mut outcomes = Vec::with_capacity(intervals.len());
        for interval in intervals {
            let outcome = self
                .submit_interval(interval, satellite, versions, shutdown)
                .await?;
            let cancelled = matches!(outcome, IntervalOutcome::Failed(SubmitError::Cancelled));
            outcomes.push(outcome);
            if cancelled {
                break;
            }
        }
        Ok(outcomes)
    }

    #[instrument(skip(self, interval, versions, shutdown), fields(interval = %interval))]
    async fn submit_interval(
        &self,
        interval: &TimeInterval,
        satellite: Satellite,
        versions: &VersionSet,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> std::io::Result<IntervalOutcome> {
        let contexts = sorted_contexts(self.job, interval, satellite, versions);
        info!(count = contexts.len(), "Contexts in interval");

        let (first, last) = match (contexts.first(), contexts.last()) {
            (Some(first), Some(last)) => (first.clone(), last.clone()),
            _ => {
                warn!(satellite = %satellite, "No contexts in interval, nothing to submit");
                return Ok(IntervalOutcome::Empty);
            }
        };
        info!(first = %first, last = %last, "Submitting contexts");

        let order = monthly_order(self.job, contexts);
        match submit_with_retry(self.orchestrator, &order, &self.policy, shutdown).await {
            Ok(job_ids) => {
                let line = match submitted_line(&first, &last, &job_ids) {
                    Some(line) => line,
                    None => no_jobs_line(&first, &last),
                };
                info!(journal = %self.journal.path().display(), "{}", line);
                self.journal.append(&line).await?;
                Ok(IntervalOutcome::Submitted {
                    first,
                    last,
                    job_ids,
                })
            }
            Err(e) => {
                error!(error = %e, "Submission failed");
                Ok(IntervalOutcome::Failed(e))
            }
        }
    }
}
