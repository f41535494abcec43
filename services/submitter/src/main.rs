//! HIRS_CTP_MONTHLY submission driver.
//!
//! - `contexts`: list the monthly contexts of one or more intervals
//! - `submit`: submit them to the orchestrator and journal the job numbers
//! - `run`: prepare and execute contexts locally

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use ctp_monthly::HirsCtpMonthly;
use hirs_common::{Satellite, TimeInterval, VersionSet};
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use submitter::{
    journal_file_name, run_contexts, sorted_contexts, HttpOrchestrator, IntervalOutcome, Journal,
    LocalRunOptions, Submitter, SubmitterConfig,
};

#[derive(Parser, Debug)]
#[command(name = "hirs-ctp-submit")]
#[command(about = "Submit and run HIRS_CTP_MONTHLY contexts")]
struct Args {
    /// Job configuration file
    #[arg(long, env = "HIRS_CTP_CONFIG", default_value = "config/hirs_ctp_monthly.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the candidate contexts
    Contexts(Selection),

    /// Submit contexts to the orchestrator
    Submit {
        #[command(flatten)]
        selection: Selection,

        /// Orchestrator base URL (overrides the config file)
        #[arg(long, env = "ORCHESTRATOR_URL")]
        orchestrator_url: Option<String>,

        /// Directory for the submission journal
        #[arg(long, default_value = ".")]
        journal_dir: PathBuf,
    },

    /// Prepare and execute contexts locally
    Run {
        #[command(flatten)]
        selection: Selection,

        /// Run every context instead of only the first
        #[arg(long)]
        all: bool,

        #[arg(long)]
        skip_prepare: bool,

        #[arg(long)]
        skip_execute: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct Selection {
    #[arg(long)]
    satellite: Satellite,

    /// START/END, repeatable
    #[arg(long = "interval", required = true, value_parser = parse_interval)]
    intervals: Vec<TimeInterval>,

    #[arg(long)]
    hirs_version: Option<String>,

    #[arg(long)]
    collo_version: Option<String>,

    #[arg(long)]
    csrb_version: Option<String>,

    #[arg(long)]
    ctp_version: Option<String>,
}

fn parse_interval(s: &str) -> Result<TimeInterval, String> {
    TimeInterval::parse(s).map_err(|e| e.to_string())
}

impl Selection {
    /// Versions from the command line, falling back to the config file.
    fn versions(&self, config: &SubmitterConfig) -> Result<VersionSet> {
        let defaults = config.job.versions.as_ref();
        let pick = |flag: &Option<String>, field: &str, from_config: Option<&String>| {
            flag.clone()
                .or_else(|| from_config.cloned())
                .with_context(|| format!("--{} not given and not set in config", field))
        };

        let versions = VersionSet::new(
            pick(&self.hirs_version, "hirs-version", defaults.map(|v| &v.hirs_version))?,
            pick(&self.collo_version, "collo-version", defaults.map(|v| &v.collo_version))?,
            pick(&self.csrb_version, "csrb-version", defaults.map(|v| &v.csrb_version))?,
            pick(&self.ctp_version, "ctp-version", defaults.map(|v| &v.ctp_version))?,
        )?;
        Ok(versions)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = SubmitterConfig::load(&args.config)?;
    let job = HirsCtpMonthly::from_config(&config.job).context("Failed to set up the job")?;

    match args.command {
        Command::Contexts(selection) => {
            let versions = selection.versions(&config)?;
            for interval in &selection.intervals {
                let contexts = sorted_contexts(&job, interval, selection.satellite, &versions);
                info!(interval = %interval, count = contexts.len(), "Candidate contexts");
                for context in contexts {
                    println!("{}", context);
                }
            }
        }

        Command::Submit {
            selection,
            orchestrator_url,
            journal_dir,
        } => {
            let versions = selection.versions(&config)?;
            let url = match orchestrator_url.or_else(|| config.orchestrator.url.clone()) {
                Some(url) => url,
                None => bail!("No orchestrator URL: pass --orchestrator-url or set orchestrator.url"),
            };
            let orchestrator = HttpOrchestrator::new(&url, config.orchestrator.request_timeout())?;

            let created = chrono::Utc::now().naive_utc();
            let name = journal_file_name(selection.satellite, &selection.intervals, created)
                .context("No intervals given")?;
            tokio::fs::create_dir_all(&journal_dir).await?;
            let journal = Journal::new(journal_dir.join(name));
            info!(journal = %journal.path().display(), url = %url, "Submitting intervals");

            // Shutdown signal
            let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
            let shutdown_tx_clone = shutdown_tx.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Received shutdown signal");
                shutdown_tx_clone.send(()).ok();
            });

            let submitter = Submitter {
                job: &job,
                orchestrator: &orchestrator,
                policy: config.orchestrator.retry_policy(),
                journal,
            };
            let outcomes = submitter
                .submit_intervals(&selection.intervals, selection.satellite, &versions, &mut shutdown_rx)
                .await
                .context("Failed to write submission journal")?;

            let failed = outcomes
                .iter()
                .filter(|o| matches!(o, IntervalOutcome::Failed(_)))
                .count();
            drop(shutdown_tx);
            if failed > 0 {
                bail!("{} of {} intervals failed to submit", failed, outcomes.len());
            }
        }

        Command::Run {
            selection,
            all,
            skip_prepare,
            skip_execute,
        } => {
            let versions = selection.versions(&config)?;
            let mut contexts = Vec::new();
            for interval in &selection.intervals {
                contexts.extend(sorted_contexts(&job, interval, selection.satellite, &versions));
            }
            if contexts.is_empty() {
                bail!(
                    "There are no valid {} contexts for the given intervals",
                    selection.satellite
                );
            }

            let summary = run_contexts(
                &job,
                &contexts,
                LocalRunOptions {
                    all,
                    skip_prepare,
                    skip_execute,
                },
            )
            .await;

            info!(
                attempted = summary.attempted,
                prepared = summary.prepared,
                executed = summary.executed,
                failed = summary.failed,
                "Local run finished"
            );
        }
    }

    Ok(())
}
