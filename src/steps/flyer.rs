//! Flyer creation, the primary asset of the run.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::collaborators::ContentGenerator;
use crate::error::StepError;
use crate::workflow::registry::WorkflowStep;
use crate::workflow::state::{artifact, WorkflowState};

/// Renders the event flyer via the configured design collaborator.
pub struct CreateFlyer {
    generator: Arc<dyn ContentGenerator>,
}

impl CreateFlyer {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl WorkflowStep for CreateFlyer {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let result = self
            .generator
            .generate(&state.event_data, &state.preferences)
            .await?;

        if let Some(url) = result.get("url") {
            state
                .artifacts
                .insert(artifact::FLYER_URL.to_string(), url.clone());
        }
        if let Some(asset_id) = result.get("asset_id") {
            state
                .artifacts
                .insert(artifact::FLYER_ASSET_ID.to_string(), asset_id.clone());
        }
        if let Some(notes) = result.get("design_notes") {
            state
                .artifacts
                .insert(artifact::FLYER_DESIGN_NOTES.to_string(), notes.clone());
        }

        let flyer_url = state
            .artifacts
            .get(artifact::FLYER_URL)
            .and_then(Value::as_str)
            .unwrap_or("<none>");
        tracing::info!(run_id = %state.run_id, url = %flyer_url, "Flyer created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testing::FixedCollaborator;
    use serde_json::{json, Map};

    fn base_state() -> WorkflowState {
        WorkflowState::new(
            "run-1",
            "event-1",
            "create_flyer",
            Map::new(),
            Map::new(),
            Map::new(),
            chrono::Duration::minutes(3),
        )
    }

    #[tokio::test]
    async fn test_maps_collaborator_fields_to_artifacts() {
        let mut fields = Map::new();
        fields.insert("url".to_string(), json!("https://assets/flyer.png"));
        fields.insert("asset_id".to_string(), json!("design-42"));
        fields.insert("design_notes".to_string(), json!("bold spring palette"));

        let step = CreateFlyer::new(Arc::new(FixedCollaborator::ok(fields)));
        let mut state = base_state();
        step.run(&mut state).await.expect("flyer step succeeds");

        assert_eq!(state.artifacts["flyer_url"], json!("https://assets/flyer.png"));
        assert_eq!(state.artifacts["flyer_asset_id"], json!("design-42"));
        assert_eq!(
            state.artifacts["flyer_design_notes"],
            json!("bold spring palette")
        );
    }

    #[tokio::test]
    async fn test_collaborator_error_propagates() {
        let step = CreateFlyer::new(Arc::new(FixedCollaborator::failing("timeout")));
        let mut state = base_state();

        let err = step.run(&mut state).await.expect_err("flyer step fails");
        assert!(err.to_string().contains("timeout"));
        assert!(state.artifacts.is_empty());
    }
}
