//! Client side of the orchestration service.

use std::time::Duration;

use async_trait::async_trait;
use hirs_common::MonthlyContext;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// One batch of contexts submitted for a computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub computation: String,
    /// Datasets of the computation to produce
    pub outputs: Vec<String>,
    pub contexts: Vec<MonthlyContext>,
    /// Computations whose products are only fetched, never recomputed
    pub download_onlies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub job_ids: Vec<u64>,
}

/// Failure of a single submission attempt.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Connection problems, timeouts and server-side errors
    #[error("transport error: {0}")]
    Transport(String),

    /// The service refused the order
    #[error("order rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl OrderError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderError::Transport(_))
    }
}

#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Submit an order, returning the job ids assigned to it.
    async fn submit_order(&self, order: &OrderRequest) -> Result<Vec<u64>, OrderError>;
}

/// Orchestrator reached over HTTP.
pub struct HttpOrchestrator {
    client: Client,
    orders_url: String,
}

impl HttpOrchestrator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, OrderError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| OrderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            orders_url: format!("{}/orders", base_url.trim_end_matches('/')),
        })
    }

    pub fn orders_url(&self) -> &str {
        &self.orders_url
    }
}

#[async_trait]
impl Orchestrator for HttpOrchestrator {
    async fn submit_order(&self, order: &OrderRequest) -> Result<Vec<u64>, OrderError> {
        debug!(
            url = %self.orders_url,
            contexts = order.contexts.len(),
            "Posting order"
        );

        let response = self
            .client
            .post(&self.orders_url)
            .json(order)
            .send()
            .await
            .map_err(|e| OrderError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(OrderError::Transport(format!("server returned {}", status)));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OrderError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: OrderResponse = response.json().await.map_err(|e| OrderError::Rejected {
            status: status.as_u16(),
            message: format!("invalid response body: {}", e),
        })?;
        Ok(body.job_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_url() {
        let orchestrator =
            HttpOrchestrator::new("http://flo:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(orchestrator.orders_url(), "http://flo:8080/orders");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(OrderError::Transport("refused".into()).is_retryable());
        assert!(!OrderError::Rejected {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_response_parsing() {
        let response: OrderResponse = serde_json::from_str(r#"{"job_ids": [101, 102]}"#).unwrap();
        assert_eq!(response.job_ids, vec![101, 102]);
    }
}
