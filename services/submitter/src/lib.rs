//! Submission driver for the HIRS_CTP_MONTHLY job.
//!
//! Enumerates monthly contexts over time intervals and either submits them to
//! the orchestration service (with retry and a submission journal) or runs
//! them locally.

pub mod config;
pub mod driver;
pub mod journal;
pub mod local;
pub mod orchestrator;
pub mod submit;

pub use config::{OrchestratorConfig, SubmitterConfig};
pub use driver::{sorted_contexts, IntervalOutcome, Submitter};
pub use journal::{journal_file_name, no_jobs_line, submitted_line, Journal};
pub use local::{run_contexts, LocalRunOptions, LocalRunSummary};
pub use orchestrator::{HttpOrchestrator, OrderError, OrderRequest, OrderResponse, Orchestrator};
pub use submit::{monthly_order, submit_with_retry, RetryPolicy, SubmitError};
