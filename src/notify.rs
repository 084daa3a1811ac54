//! Terminal-status notification to the backend callback endpoint.
//!
//! On every terminal transition (completed or failed) the orchestrator posts
//! the run outcome to a configured URL with bearer-token auth. Delivery is
//! strictly best-effort: failures are logged and swallowed, never retried,
//! and never change the run's status.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::NotifyError;
use crate::workflow::state::WorkflowState;

/// JSON body posted to the callback endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyPayload {
    pub run_id: String,
    pub event_id: String,
    /// Upper-cased status string, e.g. "COMPLETED" or "FAILED".
    pub status: String,
    pub current_step: String,
    pub completed_steps: Vec<String>,
    pub failed_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub artifacts: Map<String, Value>,
}

impl NotifyPayload {
    /// Builds the payload for a terminal state.
    pub fn from_state(state: &WorkflowState) -> Self {
        Self {
            run_id: state.run_id.clone(),
            event_id: state.event_id.clone(),
            status: state.status.as_str().to_ascii_uppercase(),
            current_step: state.current_step.clone(),
            completed_steps: state.completed_steps.clone(),
            failed_steps: state.failed_steps.clone(),
            error_message: state.error_message.clone(),
            artifacts: state.artifacts.clone(),
        }
    }
}

/// Sink for terminal run-state reports.
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    /// Reports a terminal state. Implementations must not fail the caller;
    /// errors are for logging only.
    async fn notify(&self, state: &WorkflowState) -> Result<(), NotifyError>;
}

/// HTTP notifier posting JSON to the configured callback URL.
pub struct HttpNotifier {
    callback_url: Option<String>,
    bearer_token: Option<String>,
    http_client: Client,
}

impl HttpNotifier {
    /// Creates a notifier with a bounded request timeout.
    pub fn new(
        callback_url: Option<String>,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            callback_url,
            bearer_token,
            http_client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Whether a callback URL is configured.
    pub fn is_configured(&self) -> bool {
        self.callback_url.is_some()
    }

    async fn post(&self, payload: &NotifyPayload) -> Result<(), NotifyError> {
        let url = self
            .callback_url
            .as_deref()
            .ok_or(NotifyError::NotConfigured)?;

        let mut request = self.http_client.post(url).json(payload);
        if let Some(ref token) = self.bearer_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::BadStatus(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl CompletionNotifier for HttpNotifier {
    async fn notify(&self, state: &WorkflowState) -> Result<(), NotifyError> {
        let payload = NotifyPayload::from_state(state);

        match self.post(&payload).await {
            Ok(()) => {
                tracing::info!(
                    run_id = %state.run_id,
                    status = %payload.status,
                    "Backend notified of terminal status"
                );
            }
            Err(NotifyError::NotConfigured) => {
                tracing::warn!(
                    run_id = %state.run_id,
                    "Callback URL not configured, skipping notification"
                );
            }
            Err(e) => {
                tracing::error!(
                    run_id = %state.run_id,
                    error = %e,
                    "Backend notification failed"
                );
            }
        }

        // Notification failure never propagates to the run.
        Ok(())
    }
}
