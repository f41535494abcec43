//! Order submission with bounded retry and exponential backoff.

use std::time::Duration;

use ctp_monthly::{Computation, HirsCtpMonthly, DAILY_COMPUTATION, OUTPUT_DATASET};
use hirs_common::MonthlyContext;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::orchestrator::{OrderRequest, Orchestrator};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submission failed after {attempts} attempts: {last_error}")]
    SubmissionFailure { attempts: u32, last_error: String },

    #[error("submission cancelled")]
    Cancelled,

    #[error("{0}")]
    Rejected(String),
}

/// Attempt budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay after the first failure (doubles each retry)
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Delay following `delay` in the backoff schedule.
    pub fn next_delay(&self, delay: Duration) -> Duration {
        std::cmp::min(delay * 2, self.max_delay)
    }

    /// Delays slept between attempts, `max_attempts - 1` of them.
    pub fn delays(&self) -> Vec<Duration> {
        let mut delays = Vec::new();
        let mut delay = std::cmp::min(self.initial_delay, self.max_delay);
        for _ in 1..self.max_attempts {
            delays.push(delay);
            delay = self.next_delay(delay);
        }
        delays
    }
}

/// Order for a batch of monthly contexts, with the daily computation as a
/// download-only dependency.
pub fn monthly_order(job: &HirsCtpMonthly, contexts: Vec<MonthlyContext>) -> OrderRequest {
    OrderRequest {
        computation: job.name().to_string(),
        outputs: vec![OUTPUT_DATASET.to_string()],
        contexts,
        download_onlies: vec![DAILY_COMPUTATION.to_string()],
    }
}

/// Submit `order`, retrying transport failures until the policy's attempts
/// are spent or a shutdown signal arrives.
pub async fn submit_with_retry(
    orchestrator: &dyn Orchestrator,
    order: &OrderRequest,
    policy: &RetryPolicy,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<Vec<u64>, SubmitError> {
    let mut attempts = 0;
    let mut delay = std::cmp::min(policy.initial_delay, policy.max_delay);

    loop {
        attempts += 1;

        let result = tokio::select! {
            _ = shutdown.recv() => return Err(SubmitError::Cancelled),
            result = orchestrator.submit_order(order) => result,
        };

        match result {
            Ok(job_ids) => {
                info!(
                    computation = %order.computation,
                    attempts,
                    jobs = job_ids.len(),
                    "Order submitted"
                );
                return Ok(job_ids);
            }
            Err(e) if !e.is_retryable() => {
                return Err(SubmitError::Rejected(e.to_string()));
            }
            Err(e) => {
                if attempts >= policy.max_attempts {
                    return Err(SubmitError::SubmissionFailure {
                        attempts,
                        last_error: e.to_string(),
                    });
                }

                warn!(
                    error = %e,
                    attempt = attempts,
                    max_attempts = policy.max_attempts,
                    delay_secs = delay.as_secs_f64(),
                    "Submission failed, retrying"
                );

                tokio::select! {
                    _ = shutdown.recv() => {
                        info!("Shutdown requested, abandoning submission");
                        return Err(SubmitError::Cancelled);
                    }
                    _ = tokio::time::sleep(delay) => {}
                }

                delay = policy.next_delay(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::OrderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Fails with a transport error `failures` times, then succeeds.
    struct FlakyOrchestrator {
        failures: u32,
        calls: AtomicU32,
        call_times: Mutex<Vec<Instant>>,
    }

    impl FlakyOrchestrator {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                call_times: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Orchestrator for FlakyOrchestrator {
        async fn submit_order(&self, order: &OrderRequest) -> Result<Vec<u64>, OrderError> {
            self.call_times.lock().unwrap().push(Instant::now());
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(OrderError::Transport(format!("connection refused ({})", call)))
            } else {
                Ok((1..=order.contexts.len() as u64).collect())
            }
        }
    }

    #[derive(Default)]
    struct RejectingOrchestrator {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Orchestrator for RejectingOrchestrator {
        async fn submit_order(&self, _order: &OrderRequest) -> Result<Vec<u64>, OrderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(OrderError::Rejected {
                status: 422,
                message: "unknown computation".to_string(),
            })
        }
    }

    fn order() -> OrderRequest {
        OrderRequest {
            computation: "HIRS_CTP_MONTHLY".to_string(),
            outputs: vec!["out".to_string()],
            contexts: vec![
                test_utils::monthly_context(hirs_common::Satellite::MetopB, 2017, 1),
                test_utils::monthly_context(hirs_common::Satellite::MetopB, 2017, 2),
            ],
            download_onlies: vec!["HIRS_CTP_DAILY".to_string()],
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_delays_double_and_cap() {
        let secs: Vec<u64> = policy(6).delays().iter().map(|d| d.as_secs()).collect();
        assert_eq!(secs, vec![2, 4, 8, 10, 10]);
        assert!(policy(1).delays().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let (_tx, mut rx) = broadcast::channel(1);
        let orchestrator = FlakyOrchestrator::new(2);

        let job_ids = submit_with_retry(&orchestrator, &order(), &policy(5), &mut rx)
            .await
            .unwrap();

        assert_eq!(job_ids, vec![1, 2]);
        assert_eq!(orchestrator.calls(), 3);

        let times = orchestrator.call_times.lock().unwrap().clone();
        assert_eq!(times[1] - times[0], Duration::from_secs(2));
        assert_eq!(times[2] - times[1], Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_attempts() {
        let (_tx, mut rx) = broadcast::channel(1);
        let orchestrator = FlakyOrchestrator::new(u32::MAX);

        let err = submit_with_retry(&orchestrator, &order(), &policy(4), &mut rx)
            .await
            .unwrap_err();

        match err {
            SubmitError::SubmissionFailure {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 4);
                assert!(last_error.contains("connection refused (4)"));
            }
            other => panic!("expected SubmissionFailure, got {:?}", other),
        }
        assert_eq!(orchestrator.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_is_not_retried() {
        let (_tx, mut rx) = broadcast::channel(1);

        let orchestrator = RejectingOrchestrator::default();

        let err = submit_with_retry(&orchestrator, &order(), &policy(5), &mut rx)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Rejected(ref m) if m.contains("422")));
        assert_eq!(err.to_string(), "order rejected (422): unknown computation");
        assert_eq!(orchestrator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_backoff() {
        let (tx, mut rx) = broadcast::channel(1);
        let orchestrator = FlakyOrchestrator::new(u32::MAX);

        let sender = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            tx.send(()).ok();
            tx
        });

        let err = submit_with_retry(&orchestrator, &order(), &policy(10), &mut rx)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Cancelled));
        // First attempt at t=0, second after 2s, cancelled during the 4s wait.
        assert_eq!(orchestrator.calls(), 2);
        let _tx = sender.await.unwrap();
    }
}
