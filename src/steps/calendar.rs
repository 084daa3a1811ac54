//! Calendar entry creation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::collaborators::FilingService;
use crate::error::StepError;
use crate::workflow::registry::WorkflowStep;
use crate::workflow::state::{artifact, WorkflowState};

/// Creates the calendar entry and records whether invites went out.
pub struct CreateCalendarEvent {
    service: Arc<dyn FilingService>,
}

impl CreateCalendarEvent {
    pub fn new(service: Arc<dyn FilingService>) -> Self {
        Self { service }
    }

    /// The calendar collaborator files against the requesting user, not the
    /// produced assets, so user info rides along in the request body.
    fn request_context(state: &WorkflowState) -> Map<String, Value> {
        let mut context = Map::new();
        context.insert("user_info".to_string(), Value::Object(state.user_info.clone()));
        context
    }
}

#[async_trait]
impl WorkflowStep for CreateCalendarEvent {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let context = Self::request_context(state);
        let result = self.service.set_up(&state.event_data, &context).await?;

        if let Some(event_id) = result.get("event_id") {
            state
                .artifacts
                .insert(artifact::CALENDAR_EVENT_ID.to_string(), event_id.clone());
        }
        if let Some(event_url) = result.get("event_url") {
            state
                .artifacts
                .insert(artifact::CALENDAR_EVENT_URL.to_string(), event_url.clone());
        }
        let invite_sent = result
            .get("invite_sent")
            .cloned()
            .unwrap_or_else(|| json!(false));
        state
            .artifacts
            .insert(artifact::CALENDAR_INVITE_SENT.to_string(), invite_sent);

        tracing::info!(run_id = %state.run_id, "Calendar entry created");
        Ok(())
    }
}
