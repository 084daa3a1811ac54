//! Task-tracker entry creation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::collaborators::FilingService;
use crate::error::StepError;
use crate::workflow::registry::WorkflowStep;
use crate::workflow::state::{artifact, WorkflowState};

/// Creates the follow-up task (with checklist) in the task tracker.
pub struct CreateTrackerTask {
    service: Arc<dyn FilingService>,
}

impl CreateTrackerTask {
    pub fn new(service: Arc<dyn FilingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl WorkflowStep for CreateTrackerTask {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let result = self
            .service
            .set_up(&state.event_data, &state.artifacts)
            .await?;

        if let Some(task_id) = result.get("task_id") {
            state
                .artifacts
                .insert(artifact::TRACKER_TASK_ID.to_string(), task_id.clone());
        }
        if let Some(task_url) = result.get("task_url") {
            state
                .artifacts
                .insert(artifact::TRACKER_TASK_URL.to_string(), task_url.clone());
        }
        let checklist = result
            .get("checklist_items")
            .cloned()
            .unwrap_or_else(|| json!([]));
        state
            .artifacts
            .insert(artifact::TRACKER_CHECKLIST.to_string(), checklist);

        tracing::info!(run_id = %state.run_id, "Tracker task created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testing::FixedCollaborator;
    use serde_json::Map;

    #[tokio::test]
    async fn test_writes_tracker_artifacts() {
        let mut fields = Map::new();
        fields.insert("task_id".to_string(), json!("task-5"));
        fields.insert("task_url".to_string(), json!("https://tracker/task-5"));
        fields.insert(
            "checklist_items".to_string(),
            json!(["print flyers", "book stalls"]),
        );

        let step = CreateTrackerTask::new(Arc::new(FixedCollaborator::ok(fields)));
        let mut state = WorkflowState::new(
            "run-1",
            "event-1",
            "create_tracker_task",
            Map::new(),
            Map::new(),
            Map::new(),
            chrono::Duration::minutes(3),
        );
        step.run(&mut state).await.expect("tracker step succeeds");

        assert_eq!(state.artifacts["tracker_task_id"], json!("task-5"));
        assert_eq!(
            state.artifacts["tracker_task_url"],
            json!("https://tracker/task-5")
        );
        assert_eq!(
            state.artifacts["tracker_checklist"],
            json!(["print flyers", "book stalls"])
        );
    }
}
