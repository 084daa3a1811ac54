//! Generic JSON-over-HTTP collaborator client.
//!
//! Each collaborating service is fronted by an agent endpoint that accepts a
//! JSON request and answers with a flat field map, using an `error` field for
//! business-level failures. One client type covers both the content and
//! filing contracts; only the request body differs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};

use super::{ContentGenerator, FilingService};
use crate::error::CollaboratorError;

/// HTTP client for a single collaborator endpoint.
pub struct RemoteCollaborator {
    /// Service name used in errors and artifact messages.
    service: String,
    endpoint: Option<String>,
    bearer_token: Option<String>,
    http_client: Client,
}

impl RemoteCollaborator {
    /// Creates a client for one collaborator service.
    ///
    /// An absent endpoint is allowed; calls then fail with
    /// [`CollaboratorError::NotConfigured`], which the pipeline records as a
    /// best-effort step failure.
    pub fn new(
        service: impl Into<String>,
        endpoint: Option<String>,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            service: service.into(),
            endpoint,
            bearer_token,
            http_client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// The service name this client fronts.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Whether an endpoint is configured.
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn call(&self, body: Value) -> Result<Map<String, Value>, CollaboratorError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| CollaboratorError::NotConfigured {
                service: self.service.clone(),
            })?;

        let mut request = self.http_client.post(endpoint).json(&body);
        if let Some(ref token) = self.bearer_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| CollaboratorError::RequestFailed {
                service: self.service.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CollaboratorError::RequestFailed {
                service: self.service.clone(),
                message: e.to_string(),
            })?;

        self.interpret_response(status, &text)
    }

    /// Maps a raw response to the produced field map.
    ///
    /// An error status fails the call outright; a 2xx body must be a JSON
    /// object, and an `error` field inside it is a business-level service
    /// failure rather than produced content.
    fn interpret_response(
        &self,
        status: reqwest::StatusCode,
        text: &str,
    ) -> Result<Map<String, Value>, CollaboratorError> {
        if !status.is_success() {
            return Err(CollaboratorError::RequestFailed {
                service: self.service.clone(),
                message: format!("status {}: {}", status.as_u16(), text),
            });
        }

        let parsed: Value =
            serde_json::from_str(text).map_err(|e| CollaboratorError::ParseError {
                service: self.service.clone(),
                message: e.to_string(),
            })?;

        let fields = match parsed {
            Value::Object(map) => map,
            other => {
                return Err(CollaboratorError::ParseError {
                    service: self.service.clone(),
                    message: format!("expected a JSON object, got {}", other),
                })
            }
        };

        if let Some(error) = fields.get("error") {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(CollaboratorError::Service {
                service: self.service.clone(),
                message,
            });
        }

        Ok(fields)
    }
}

#[async_trait]
impl ContentGenerator for RemoteCollaborator {
    async fn generate(
        &self,
        event_data: &Map<String, Value>,
        preferences: &Map<String, Value>,
    ) -> Result<Map<String, Value>, CollaboratorError> {
        tracing::debug!(service = %self.service, "Calling content collaborator");
        self.call(json!({
            "event_data": event_data,
            "preferences": preferences,
        }))
        .await
    }
}

#[async_trait]
impl FilingService for RemoteCollaborator {
    async fn set_up(
        &self,
        event_data: &Map<String, Value>,
        artifacts: &Map<String, Value>,
    ) -> Result<Map<String, Value>, CollaboratorError> {
        tracing::debug!(service = %self.service, "Calling filing collaborator");
        self.call(json!({
            "event_data": event_data,
            "artifacts": artifacts,
        }))
        .await
    }
}
