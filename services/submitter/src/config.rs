//! Submitter configuration.
//!
//! One YAML file carries the job settings (catalog, locator, compression,
//! versions) plus the orchestrator endpoint and its retry policy.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use ctp_monthly::JobConfig;
use serde::Deserialize;
use tracing::info;

use crate::submit::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitterConfig {
    #[serde(flatten)]
    pub job: JobConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Orchestration service endpoint and submission retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrchestratorConfig {
    /// Base URL; orders are POSTed to `<url>/orders`
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay_secs() -> u64 {
    2
}

fn default_max_delay_secs() -> u64 {
    120
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_attempts: default_max_attempts(),
            initial_delay_secs: default_initial_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl OrchestratorConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_secs(self.initial_delay_secs),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SubmitterConfig {
    /// Load and validate the configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "Loaded submitter config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: SubmitterConfig = serde_yaml::from_str(content)?;
        config.job.validate()?;
        if config.orchestrator.max_attempts == 0 {
            bail!("orchestrator.max_attempts must be at least 1");
        }
        if config.orchestrator.initial_delay_secs > config.orchestrator.max_delay_secs {
            bail!("orchestrator.initial_delay_secs exceeds max_delay_secs");
        }
        Ok(config)
    }
}
