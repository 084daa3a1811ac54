//! Ordered registry of workflow steps.
//!
//! The registry is the single source of truth for step order and for the
//! fail-fast rule: an entry marked `critical` aborts the whole run when it
//! fails, every other entry is best-effort (its failure is recorded and the
//! pipeline continues).

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StepError;
use crate::workflow::state::WorkflowState;

/// A single named unit of work in the pipeline.
///
/// Steps mutate the state in place (typically by writing artifacts) and
/// signal failure by returning an error. Bookkeeping — completed/failed
/// lists, `<step>_error` artifacts — is handled by the orchestrator so step
/// implementations stay pure adapters over their collaborators.
#[async_trait]
pub trait WorkflowStep: Send + Sync {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError>;
}

/// A registered step together with its execution policy.
#[derive(Clone)]
pub struct StepEntry {
    /// Unique step name, also used in `completed_steps`/`failed_steps`.
    pub name: &'static str,
    /// Whether a failure of this step aborts the entire run.
    pub critical: bool,
    /// The step implementation.
    pub step: Arc<dyn WorkflowStep>,
}

impl std::fmt::Debug for StepEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepEntry")
            .field("name", &self.name)
            .field("critical", &self.critical)
            .finish_non_exhaustive()
    }
}

/// Ordered sequence of steps making up the pipeline.
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    entries: Vec<StepEntry>,
}

impl StepRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a best-effort step.
    pub fn register(mut self, name: &'static str, step: Arc<dyn WorkflowStep>) -> Self {
        self.entries.push(StepEntry {
            name,
            critical: false,
            step,
        });
        self
    }

    /// Appends a critical (fail-fast) step.
    pub fn register_critical(mut self, name: &'static str, step: Arc<dyn WorkflowStep>) -> Self {
        self.entries.push(StepEntry {
            name,
            critical: true,
            step,
        });
        self
    }

    /// All entries in execution order.
    pub fn entries(&self) -> &[StepEntry] {
        &self.entries
    }

    /// Number of registered steps; the denominator for progress.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no steps.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the first (entry) step, if any.
    pub fn first_step_name(&self) -> Option<&'static str> {
        self.entries.first().map(|e| e.name)
    }

    /// Looks up a single entry by name.
    pub fn get(&self, name: &str) -> Option<&StepEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Selects the entries matching `names`, preserving registry order
    /// rather than request order.
    ///
    /// Returns the first unknown name as an error before any selection.
    pub fn select<'a>(&'a self, names: &[String]) -> Result<Vec<&'a StepEntry>, String> {
        for name in names {
            if self.get(name).is_none() {
                return Err(name.clone());
            }
        }
        Ok(self
            .entries
            .iter()
            .filter(|e| names.iter().any(|n| n == e.name))
            .collect())
    }
}
