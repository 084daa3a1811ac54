//! Broadcast (messenger) announcement generation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::collaborators::ContentGenerator;
use crate::error::StepError;
use crate::workflow::registry::WorkflowStep;
use crate::workflow::state::{artifact, WorkflowState};

/// Writes the broadcast announcement and suggested recipient lists.
pub struct CreateBroadcastMessage {
    generator: Arc<dyn ContentGenerator>,
}

impl CreateBroadcastMessage {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl WorkflowStep for CreateBroadcastMessage {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let result = self
            .generator
            .generate(&state.event_data, &state.preferences)
            .await?;

        if let Some(message) = result.get("message") {
            state
                .artifacts
                .insert(artifact::BROADCAST_MESSAGE.to_string(), message.clone());
        }
        if let Some(lists) = result.get("broadcast_suggestions") {
            state
                .artifacts
                .insert(artifact::BROADCAST_LISTS.to_string(), lists.clone());
        }

        tracing::info!(run_id = %state.run_id, "Broadcast message created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testing::FixedCollaborator;
    use serde_json::{json, Map};

    #[tokio::test]
    async fn test_writes_message_and_lists() {
        let mut fields = Map::new();
        fields.insert("message".to_string(), json!("Join us Saturday!"));
        fields.insert(
            "broadcast_suggestions".to_string(),
            json!(["volunteers", "neighbors"]),
        );

        let step = CreateBroadcastMessage::new(Arc::new(FixedCollaborator::ok(fields)));
        let mut state = WorkflowState::new(
            "run-1",
            "event-1",
            "create_broadcast_message",
            Map::new(),
            Map::new(),
            Map::new(),
            chrono::Duration::minutes(3),
        );
        step.run(&mut state).await.expect("broadcast step succeeds");

        assert_eq!(
            state.artifacts["broadcast_message"],
            json!("Join us Saturday!")
        );
        assert_eq!(
            state.artifacts["broadcast_lists"],
            json!(["volunteers", "neighbors"])
        );
    }
}
