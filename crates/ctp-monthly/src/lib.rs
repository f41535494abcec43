//! HIRS cloud-top-pressure monthly aggregation.
//!
//! Aggregates daily CTP products into monthly means by running the external
//! `create_monthly_daynight_ctps.exe` averaging tool.
//!
//! # Architecture
//!
//! The job is a [`Computation`] driven by an external orchestrator:
//!
//! - `find_contexts` enumerates one context per calendar month
//! - `build_task` resolves the month's daily products through the catalog
//! - `run_task` stages inputs in a private working directory, writes the
//!   daily-file manifest, runs the tool and optionally repacks the output
//!
//! Collaborators (catalog, daily computation, delivery registry) are injected
//! so they can be replaced in tests.

pub mod compress;
pub mod computation;
pub mod config;
pub mod daily;
pub mod error;
pub mod locator;
pub mod monthly;
pub mod tool;
pub mod workdir;

// Re-exports
pub use compress::NetcdfRepack;
pub use computation::{Computation, TaskInputs, TaskOutputs, OUTPUT_DATASET};
pub use config::{CompressConfig, DailyConfig, JobConfig, LocatorConfig};
pub use daily::{DailyComputation, HirsCtpDaily, DAILY_COMPUTATION};
pub use error::{JobError, JobResult};
pub use locator::{ExecutableLocator, LocatedTool, DELIVERY_NAME, EXECUTABLE_NAME};
pub use monthly::{
    monthly_output_filename, HirsCtpMonthly, RunOptions, DAILY_LIST_NAME, MONTHLY_COMPUTATION,
};
pub use tool::{augmented_path_list, ToolCommand, LIBRARY_PATH_VAR};
pub use workdir::WorkDir;
