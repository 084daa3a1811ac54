//! Durable workflow execution: state, the step registry, the orchestrator
//! that drives runs end to end, and selective regeneration.

pub mod orchestrator;
pub mod regenerate;
pub mod registry;
pub mod state;

pub use orchestrator::{Orchestrator, ProgressUpdate};
pub use regenerate::RegenerationController;
pub use registry::{StepEntry, StepRegistry, WorkflowStep};
pub use state::{StateRecord, WorkflowState, WorkflowStatus};
