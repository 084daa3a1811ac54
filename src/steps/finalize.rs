//! Run finalization: summary artifact computed from the state itself.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::StepError;
use crate::workflow::registry::WorkflowStep;
use crate::workflow::state::{artifact, WorkflowState};

/// Asset-presence checks feeding the summary's generated-assets list.
const ASSET_MARKERS: &[(&str, &str)] = &[
    (artifact::FLYER_URL, "Event Flyer"),
    (artifact::INSTAGRAM_CAPTION, "Social Media Content"),
    (artifact::BROADCAST_MESSAGE, "Broadcast Message"),
    (artifact::STORAGE_FOLDER_URL, "Storage Folder"),
    (artifact::CALENDAR_EVENT_ID, "Calendar Entry"),
    (artifact::TRACKER_TASK_ID, "Tracker Task"),
];

/// Computes the `workflow_summary` artifact. Needs no collaborator; it only
/// reads what earlier steps left behind.
pub struct Finalize;

#[async_trait]
impl WorkflowStep for Finalize {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let completed = state.completed_steps.len();
        let failed = state.failed_steps.len();
        let attempted = completed + failed;
        let success_rate = if attempted == 0 {
            100.0
        } else {
            (completed as f64 / attempted as f64) * 100.0
        };

        let generated_assets: Vec<Value> = ASSET_MARKERS
            .iter()
            .filter(|(key, _)| state.artifacts.contains_key(*key))
            .map(|(_, label)| json!(label))
            .collect();

        let summary = json!({
            "total_steps": attempted,
            "completed_steps": completed,
            "failed_steps": failed,
            "success_rate": success_rate,
            "generated_assets": generated_assets,
        });

        state
            .artifacts
            .insert(artifact::WORKFLOW_SUMMARY.to_string(), summary);

        tracing::info!(
            run_id = %state.run_id,
            completed,
            failed,
            "Workflow finalized"
        );
        Ok(())
    }
}
