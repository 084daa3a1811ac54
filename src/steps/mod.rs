//! The fixed promotional-asset pipeline steps.
//!
//! Step order is significant: later steps read artifacts written by earlier
//! ones (the social step needs the flyer URL, filing steps ship whatever
//! content exists so far). Only `validate_input` is critical; every other
//! step is best-effort so one missing asset never blocks the rest.

mod broadcast;
mod calendar;
mod finalize;
mod flyer;
mod social;
mod storage;
mod tracker;
mod validate;

use std::sync::Arc;

use crate::collaborators::{ContentGenerator, FilingService};
use crate::workflow::registry::StepRegistry;

pub use broadcast::CreateBroadcastMessage;
pub use calendar::CreateCalendarEvent;
pub use finalize::Finalize;
pub use flyer::CreateFlyer;
pub use social::CreateSocialContent;
pub use storage::SetupStorageFolder;
pub use tracker::CreateTrackerTask;
pub use validate::ValidateInput;

/// Canonical step names, in pipeline order.
pub mod names {
    pub const VALIDATE_INPUT: &str = "validate_input";
    pub const CREATE_FLYER: &str = "create_flyer";
    pub const CREATE_SOCIAL_CONTENT: &str = "create_social_content";
    pub const CREATE_BROADCAST_MESSAGE: &str = "create_broadcast_message";
    pub const SETUP_STORAGE_FOLDER: &str = "setup_storage_folder";
    pub const CREATE_CALENDAR_EVENT: &str = "create_calendar_event";
    pub const CREATE_TRACKER_TASK: &str = "create_tracker_task";
    pub const FINALIZE: &str = "finalize";
}

/// Collaborator clients the default pipeline is wired with.
pub struct PipelineDeps {
    pub flyer: Arc<dyn ContentGenerator>,
    pub social: Arc<dyn ContentGenerator>,
    pub broadcast: Arc<dyn ContentGenerator>,
    pub storage: Arc<dyn FilingService>,
    pub calendar: Arc<dyn FilingService>,
    pub tracker: Arc<dyn FilingService>,
}

/// Builds the default eight-step registry from injected collaborators.
pub fn default_registry(deps: PipelineDeps) -> StepRegistry {
    StepRegistry::new()
        .register_critical(names::VALIDATE_INPUT, Arc::new(ValidateInput))
        .register(names::CREATE_FLYER, Arc::new(CreateFlyer::new(deps.flyer)))
        .register(
            names::CREATE_SOCIAL_CONTENT,
            Arc::new(CreateSocialContent::new(deps.social)),
        )
        .register(
            names::CREATE_BROADCAST_MESSAGE,
            Arc::new(CreateBroadcastMessage::new(deps.broadcast)),
        )
        .register(
            names::SETUP_STORAGE_FOLDER,
            Arc::new(SetupStorageFolder::new(deps.storage)),
        )
        .register(
            names::CREATE_CALENDAR_EVENT,
            Arc::new(CreateCalendarEvent::new(deps.calendar)),
        )
        .register(
            names::CREATE_TRACKER_TASK,
            Arc::new(CreateTrackerTask::new(deps.tracker)),
        )
        .register(names::FINALIZE, Arc::new(Finalize))
}
