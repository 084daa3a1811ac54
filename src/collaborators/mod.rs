//! Boundary contracts for external collaborators.
//!
//! The pipeline never talks to third-party services directly; each step is
//! handed one of these trait objects. Content collaborators (flyer renderer,
//! caption writer, broadcast writer) take the event data plus preferences and
//! return produced fields. Filing collaborators (storage folder, calendar,
//! task tracker) additionally see the artifacts produced so far.

mod remote;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::CollaboratorError;

pub use remote::RemoteCollaborator;

/// A collaborator that generates promotional content fields.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generates content for the event. Returned keys become artifacts.
    async fn generate(
        &self,
        event_data: &Map<String, Value>,
        preferences: &Map<String, Value>,
    ) -> Result<Map<String, Value>, CollaboratorError>;
}

/// A collaborator that files the event into an external service.
#[async_trait]
pub trait FilingService: Send + Sync {
    /// Sets up the external resource (folder, calendar entry, tracker task)
    /// and returns the identifiers/URLs it created.
    async fn set_up(
        &self,
        event_data: &Map<String, Value>,
        artifacts: &Map<String, Value>,
    ) -> Result<Map<String, Value>, CollaboratorError>;
}
