//! promoforge: Durable promotion workflow engine for community events.
//!
//! This library runs a resumable multi-step pipeline that generates
//! promotional assets (flyer, social captions, broadcast message) for an
//! event and files them into storage, calendar, and task-tracker services.

// Core modules
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod notify;
pub mod steps;
pub mod store;
pub mod workflow;

// Re-export commonly used error types
pub use error::{CollaboratorError, NotifyError, StepError, StoreError, WorkflowError};
