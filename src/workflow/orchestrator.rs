//! Workflow orchestrator: drives a run from creation to terminal status.
//!
//! One tokio task exclusively owns each run's [`WorkflowState`] while the
//! pipeline executes; all external reads go through the active-run map
//! snapshot or the durable store, never through shared references into the
//! live object. The store is re-written after every mutation so a crashed
//! process leaves behind the last persisted step boundary.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::error::WorkflowError;
use crate::notify::CompletionNotifier;
use crate::store::StateStore;
use crate::workflow::registry::StepRegistry;
use crate::workflow::state::{sentinel, StateRecord, WorkflowState, WorkflowStatus};

/// Out-of-band progress push, e.g. from a step that reports asynchronously.
///
/// List fields replace the stored lists wholesale when present; artifacts are
/// merged into the existing map.
#[derive(Debug, Default, Clone)]
pub struct ProgressUpdate {
    pub completed_steps: Option<Vec<String>>,
    pub failed_steps: Option<Vec<String>>,
    pub error_message: Option<String>,
    pub artifacts: Option<Map<String, Value>>,
}

/// Coordinates workflow runs against the step registry, durable store, and
/// completion notifier.
///
/// All collaborators are injected at construction; the orchestrator holds no
/// ambient singletons and is cheap to clone (every field is shared).
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn StateStore>,
    registry: Arc<StepRegistry>,
    notifier: Arc<dyn CompletionNotifier>,
    active: Arc<RwLock<HashMap<String, WorkflowState>>>,
    estimated_duration: chrono::Duration,
}

impl Orchestrator {
    /// Creates an orchestrator from its injected collaborators.
    pub fn new(
        store: Arc<dyn StateStore>,
        registry: Arc<StepRegistry>,
        notifier: Arc<dyn CompletionNotifier>,
        estimated_duration: chrono::Duration,
    ) -> Self {
        Self {
            store,
            registry,
            notifier,
            active: Arc::new(RwLock::new(HashMap::new())),
            estimated_duration,
        }
    }

    /// Starts a new run and schedules its execution.
    ///
    /// Returns the freshly created record immediately; callers poll
    /// [`Orchestrator::get_status`] for completion (fire-and-forget).
    /// Run ids must be unique per caller; reusing an id creates two tasks
    /// racing to overwrite the same store key.
    pub async fn start_workflow(
        &self,
        run_id: impl Into<String>,
        event_id: impl Into<String>,
        event_data: Map<String, Value>,
        preferences: Map<String, Value>,
        user_info: Map<String, Value>,
    ) -> StateRecord {
        let first_step = self
            .registry
            .first_step_name()
            .unwrap_or(sentinel::COMPLETED);

        let state = WorkflowState::new(
            run_id,
            event_id,
            first_step,
            event_data,
            preferences,
            user_info,
            self.estimated_duration,
        );

        tracing::info!(run_id = %state.run_id, event_id = %state.event_id, "Starting workflow");

        self.persist(&state).await;
        self.active
            .write()
            .await
            .insert(state.run_id.clone(), state.clone());

        let record = state.to_record(self.registry.len());
        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.execute_workflow(state).await;
        });

        record
    }

    /// Runs the pipeline to a terminal status. Owns `state` for the whole
    /// run; the active map only ever sees cloned snapshots.
    async fn execute_workflow(&self, mut state: WorkflowState) {
        for entry in self.registry.entries().iter() {
            // cancel() evicts the run from the active map; once the entry is
            // gone this executor must neither run further steps nor persist
            // over the stored Cancelled record.
            if !self.is_active(&state.run_id).await {
                tracing::info!(run_id = %state.run_id, "Run cancelled, stopping pipeline");
                return;
            }

            state.current_step = entry.name.to_string();
            self.persist(&state).await;
            self.sync_active(&state).await;

            match entry.step.run(&mut state).await {
                Ok(()) => {
                    state.mark_step_completed(entry.name);
                    tracing::info!(run_id = %state.run_id, step = entry.name, "Step completed");
                }
                Err(e) if entry.critical => {
                    tracing::error!(
                        run_id = %state.run_id,
                        step = entry.name,
                        error = %e,
                        "Critical step failed, aborting run"
                    );
                    if !self.is_active(&state.run_id).await {
                        tracing::info!(run_id = %state.run_id, "Run cancelled, stopping pipeline");
                        return;
                    }
                    state.status = WorkflowStatus::Failed;
                    state.current_step = sentinel::ERROR.to_string();
                    state.error_message = Some(e.to_string());
                    state.failed_steps.push(entry.name.to_string());
                    self.persist(&state).await;
                    self.evict(&state.run_id).await;
                    let _ = self.notifier.notify(&state).await;
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        run_id = %state.run_id,
                        step = entry.name,
                        error = %e,
                        "Step failed, continuing pipeline"
                    );
                    state.mark_step_failed(entry.name, &e.to_string());
                }
            }

            // A cancel may have landed while the step was in flight; its
            // results are dropped along with the rest of the run.
            if !self.is_active(&state.run_id).await {
                tracing::info!(run_id = %state.run_id, "Run cancelled, stopping pipeline");
                return;
            }

            self.persist(&state).await;
            self.sync_active(&state).await;
        }

        // A cancel can still land between the last active-map check and this
        // transition; the stored Cancelled status must win over Completed.
        match self.store.get(&state.run_id).await {
            Ok(Some(stored)) if stored.status == WorkflowStatus::Cancelled => {
                tracing::info!(run_id = %state.run_id, "Run was cancelled, skipping completion");
                self.evict(&state.run_id).await;
                return;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(run_id = %state.run_id, error = %e, "Cancellation check read failed");
            }
        }

        state.status = WorkflowStatus::Completed;
        state.current_step = sentinel::COMPLETED.to_string();
        self.persist(&state).await;
        self.evict(&state.run_id).await;
        let _ = self.notifier.notify(&state).await;

        tracing::info!(run_id = %state.run_id, "Workflow completed");
    }

    /// Returns the run's current record, preferring the in-memory snapshot
    /// of an active run over the durable store. `None` means not found.
    pub async fn get_status(&self, run_id: &str) -> Result<Option<StateRecord>, WorkflowError> {
        if let Some(state) = self.active.read().await.get(run_id) {
            return Ok(Some(state.to_record(self.registry.len())));
        }
        Ok(self.store.get(run_id).await?)
    }

    /// Cancels a run. Succeeds (returns true) only while the stored status
    /// is InProgress; a second call, or a call after a terminal transition,
    /// returns false.
    ///
    /// Cancellation is cooperative: it does not interrupt an in-flight step,
    /// and a step finishing afterwards may still persist its own results
    /// before the executor notices the flag at its terminal check.
    pub async fn cancel(&self, run_id: &str) -> bool {
        let current = match self.get_status(run_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(e) => {
                tracing::error!(run_id = %run_id, error = %e, "Failed to read state for cancel");
                return false;
            }
        };

        if current.status != WorkflowStatus::InProgress {
            return false;
        }

        let mut state = current.into_state();
        state.status = WorkflowStatus::Cancelled;
        state.current_step = sentinel::CANCELLED.to_string();
        self.persist(&state).await;
        self.evict(run_id).await;

        tracing::info!(run_id = %run_id, "Workflow cancelled");
        true
    }

    /// Applies an out-of-band progress push (read-modify-write against the
    /// store). Fails with NotFound for unknown runs.
    pub async fn update_progress(
        &self,
        run_id: &str,
        status: WorkflowStatus,
        current_step: &str,
        update: ProgressUpdate,
    ) -> Result<(), WorkflowError> {
        let record = self
            .get_status(run_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(run_id.to_string()))?;

        let mut state = record.into_state();
        state.status = status;
        state.current_step = current_step.to_string();
        if let Some(completed) = update.completed_steps {
            state.completed_steps = completed;
        }
        if let Some(failed) = update.failed_steps {
            state.failed_steps = failed;
        }
        if let Some(message) = update.error_message {
            state.error_message = Some(message);
        }
        if let Some(artifacts) = update.artifacts {
            state.merge_artifacts(artifacts);
        }

        self.persist(&state).await;
        self.sync_active(&state).await;
        Ok(())
    }

    /// Number of runs currently executing in this process.
    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    /// The store backing this orchestrator.
    pub fn store(&self) -> Arc<dyn StateStore> {
        self.store.clone()
    }

    /// The registry this orchestrator executes.
    pub fn registry(&self) -> Arc<StepRegistry> {
        self.registry.clone()
    }

    /// The notifier invoked on terminal transitions.
    pub fn notifier(&self) -> Arc<dyn CompletionNotifier> {
        self.notifier.clone()
    }

    /// Persists the state, logging and swallowing store errors: durability is
    /// best-effort and never blocks the run.
    async fn persist(&self, state: &WorkflowState) {
        let record = state.to_record(self.registry.len());
        if let Err(e) = self.store.put(&record).await {
            tracing::error!(run_id = %state.run_id, error = %e, "Failed to persist workflow state");
        }
    }

    /// Refreshes the active-map snapshot, but never resurrects an entry that
    /// cancel (or a terminal transition) already evicted.
    async fn sync_active(&self, state: &WorkflowState) {
        let mut active = self.active.write().await;
        if let Some(entry) = active.get_mut(&state.run_id) {
            *entry = state.clone();
        }
    }

    async fn evict(&self, run_id: &str) {
        self.active.write().await.remove(run_id);
    }

    async fn is_active(&self, run_id: &str) -> bool {
        self.active.read().await.contains_key(run_id)
    }
}
