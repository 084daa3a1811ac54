//! Selective re-execution of pipeline steps against an existing run.
//!
//! Regeneration loads the run's persisted state, merges caller preference
//! overrides, and replays only the requested steps in registry order. Every
//! replayed step is best-effort regardless of its critical flag: a failure is
//! recorded and the remaining selected steps still run. Artifacts owned by
//! unselected steps are left untouched.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::WorkflowError;
use crate::notify::CompletionNotifier;
use crate::store::StateStore;
use crate::workflow::registry::StepRegistry;
use crate::workflow::state::{StateRecord, WorkflowStatus};

/// Replays chosen steps of a completed (or failed) run.
pub struct RegenerationController {
    store: Arc<dyn StateStore>,
    registry: Arc<StepRegistry>,
    notifier: Arc<dyn CompletionNotifier>,
}

impl RegenerationController {
    /// Creates a controller from its injected collaborators.
    pub fn new(
        store: Arc<dyn StateStore>,
        registry: Arc<StepRegistry>,
        notifier: Arc<dyn CompletionNotifier>,
    ) -> Self {
        Self {
            store,
            registry,
            notifier,
        }
    }

    /// Re-runs `step_names` against the run's stored state.
    ///
    /// Rejects unknown step names before any mutation. Returns the final
    /// record after the replay completes and the backend has been notified.
    pub async fn regenerate(
        &self,
        run_id: &str,
        step_names: &[String],
        preference_overrides: Map<String, Value>,
    ) -> Result<StateRecord, WorkflowError> {
        let selected = self
            .registry
            .select(step_names)
            .map_err(WorkflowError::UnknownStep)?;

        let record = self
            .store
            .get(run_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(run_id.to_string()))?;
        let mut state = record.into_state();

        let selected_names: Vec<&str> = selected.iter().map(|e| e.name).collect();
        tracing::info!(
            run_id = %run_id,
            steps = ?selected_names,
            "Regenerating workflow content"
        );

        for (key, value) in preference_overrides {
            state.preferences.insert(key, value);
        }
        state.status = WorkflowStatus::InProgress;
        self.persist(&state).await;

        for entry in &selected {
            state.current_step = entry.name.to_string();
            self.persist(&state).await;

            match entry.step.run(&mut state).await {
                Ok(()) => {
                    state.mark_step_completed(entry.name);
                    // A regenerated step supersedes its previous failure
                    // artifact, if any.
                    state
                        .artifacts
                        .remove(&crate::workflow::state::artifact::error_key(entry.name));
                    tracing::info!(run_id = %run_id, step = entry.name, "Step regenerated");
                }
                Err(e) => {
                    tracing::warn!(
                        run_id = %run_id,
                        step = entry.name,
                        error = %e,
                        "Step regeneration failed, continuing"
                    );
                    state.mark_step_failed(entry.name, &e.to_string());
                }
            }
            self.persist(&state).await;
        }

        state.status = WorkflowStatus::Completed;
        state.current_step = format!("regenerated:{}", selected_names.join(","));
        self.persist(&state).await;
        let _ = self.notifier.notify(&state).await;

        Ok(state.to_record(self.registry.len()))
    }

    /// Persists the state, logging and swallowing store errors, matching the
    /// orchestrator's durability policy.
    async fn persist(&self, state: &crate::workflow::state::WorkflowState) {
        let record = state.to_record(self.registry.len());
        if let Err(e) = self.store.put(&record).await {
            tracing::error!(run_id = %state.run_id, error = %e, "Failed to persist workflow state");
        }
    }
}
