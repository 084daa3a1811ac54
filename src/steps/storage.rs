//! Shared storage folder setup.

use std::sync::Arc;

use async_trait::async_trait;

use crate::collaborators::FilingService;
use crate::error::StepError;
use crate::workflow::registry::WorkflowStep;
use crate::workflow::state::{artifact, WorkflowState};

/// Creates the shared storage folder and files the generated assets into it.
///
/// Runs after the content steps so the filing collaborator sees every asset
/// produced so far.
pub struct SetupStorageFolder {
    service: Arc<dyn FilingService>,
}

impl SetupStorageFolder {
    pub fn new(service: Arc<dyn FilingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl WorkflowStep for SetupStorageFolder {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let result = self
            .service
            .set_up(&state.event_data, &state.artifacts)
            .await?;

        if let Some(folder_id) = result.get("folder_id") {
            state
                .artifacts
                .insert(artifact::STORAGE_FOLDER_ID.to_string(), folder_id.clone());
        }
        if let Some(folder_url) = result.get("folder_url") {
            state
                .artifacts
                .insert(artifact::STORAGE_FOLDER_URL.to_string(), folder_url.clone());
        }
        if let Some(files) = result.get("files") {
            state
                .artifacts
                .insert(artifact::STORAGE_FILES.to_string(), files.clone());
        }

        tracing::info!(run_id = %state.run_id, "Storage folder set up");
        Ok(())
    }
}
