//! Error types for promoforge operations.
//!
//! Defines error types for the major subsystems:
//! - Durable state store access
//! - Step execution
//! - Collaborator (content generation / filing service) calls
//! - Completion notification
//! - Workflow lifecycle operations

use thiserror::Error;

/// Errors that can occur while reading or writing the durable state store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Store operation failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("State serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur while calling an external collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Collaborator '{service}' is not configured")]
    NotConfigured { service: String },

    #[error("Request to '{service}' failed: {message}")]
    RequestFailed { service: String, message: String },

    #[error("Collaborator '{service}' returned an error: {message}")]
    Service { service: String, message: String },

    #[error("Failed to parse response from '{service}': {message}")]
    ParseError { service: String, message: String },
}

/// Errors raised by an individual workflow step.
///
/// Whether a step error aborts the run or is merely recorded depends on the
/// step's `critical` flag in the registry, not on the variant.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing artifact '{artifact}' required by step '{step}'")]
    MissingArtifact { step: String, artifact: String },

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("Step failed: {0}")]
    Other(String),
}

/// Errors that can occur while notifying the external callback endpoint.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Callback URL is not configured")]
    NotConfigured,

    #[error("Notification request failed: {0}")]
    RequestFailed(String),

    #[error("Callback endpoint returned status {0}")]
    BadStatus(u16),
}

/// Errors surfaced by workflow lifecycle operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Workflow '{0}' not found")]
    NotFound(String),

    #[error("Unknown step '{0}'")]
    UnknownStep(String),

    #[error("Invalid status value '{0}'")]
    InvalidStatus(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("State serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
