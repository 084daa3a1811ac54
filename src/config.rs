//! Runtime configuration for the promotion workflow service.
//!
//! Covers the Redis state store, the completion callback, the collaborator
//! service endpoints, and timing knobs. Everything has a usable default
//! except the secrets, which stay unset until provided.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for the workflow orchestrator and its collaborators.
#[derive(Debug, Clone)]
pub struct PromoConfig {
    // State store settings
    /// Redis connection URL for workflow state.
    pub redis_url: String,
    /// TTL applied to every persisted workflow record, in seconds.
    pub state_ttl_secs: u64,

    // Callback settings
    /// Backend endpoint notified when a run reaches a terminal state.
    pub callback_url: Option<String>,
    /// Bearer token sent with completion callbacks.
    pub callback_token: Option<String>,
    /// Timeout for the completion callback request.
    pub notify_timeout: Duration,

    // Collaborator settings
    /// Flyer generation service endpoint.
    pub flyer_endpoint: Option<String>,
    /// Social caption generation service endpoint.
    pub social_endpoint: Option<String>,
    /// Broadcast message generation service endpoint.
    pub broadcast_endpoint: Option<String>,
    /// Storage filing service endpoint.
    pub storage_endpoint: Option<String>,
    /// Calendar filing service endpoint.
    pub calendar_endpoint: Option<String>,
    /// Task tracker filing service endpoint.
    pub tracker_endpoint: Option<String>,
    /// Bearer token shared by all collaborator requests.
    pub collaborator_token: Option<String>,
    /// Timeout for each collaborator request.
    pub collaborator_timeout: Duration,

    // Timing settings
    /// Rough end-to-end duration used for the completion estimate.
    pub estimated_run_duration: chrono::Duration,
}

impl Default for PromoConfig {
    fn default() -> Self {
        Self {
            // State store defaults
            redis_url: "redis://127.0.0.1:6379".to_string(),
            state_ttl_secs: 86_400, // 24 hours

            // Callback defaults
            callback_url: None,
            callback_token: None,
            notify_timeout: Duration::from_secs(10),

            // Collaborator defaults
            flyer_endpoint: None,
            social_endpoint: None,
            broadcast_endpoint: None,
            storage_endpoint: None,
            calendar_endpoint: None,
            tracker_endpoint: None,
            collaborator_token: None,
            collaborator_timeout: Duration::from_secs(60),

            // Timing defaults
            estimated_run_duration: chrono::Duration::minutes(3),
        }
    }
}

impl PromoConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PROMO_REDIS_URL`: Redis connection URL (default: redis://127.0.0.1:6379)
    /// - `PROMO_STATE_TTL_SECS`: State record TTL in seconds (default: 86400)
    /// - `PROMO_CALLBACK_URL`: Completion callback endpoint (optional)
    /// - `PROMO_CALLBACK_TOKEN`: Bearer token for the callback (optional)
    /// - `PROMO_NOTIFY_TIMEOUT_SECS`: Callback request timeout (default: 10)
    /// - `PROMO_FLYER_ENDPOINT`: Flyer service endpoint (optional)
    /// - `PROMO_SOCIAL_ENDPOINT`: Social caption service endpoint (optional)
    /// - `PROMO_BROADCAST_ENDPOINT`: Broadcast service endpoint (optional)
    /// - `PROMO_STORAGE_ENDPOINT`: Storage service endpoint (optional)
    /// - `PROMO_CALENDAR_ENDPOINT`: Calendar service endpoint (optional)
    /// - `PROMO_TRACKER_ENDPOINT`: Task tracker service endpoint (optional)
    /// - `PROMO_COLLABORATOR_TOKEN`: Bearer token for collaborators (optional)
    /// - `PROMO_COLLABORATOR_TIMEOUT_SECS`: Collaborator request timeout (default: 60)
    /// - `PROMO_ESTIMATED_RUN_MINUTES`: Completion estimate in minutes (default: 3)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("PROMO_REDIS_URL") {
            config.redis_url = val;
        }

        if let Ok(val) = std::env::var("PROMO_STATE_TTL_SECS") {
            config.state_ttl_secs = parse_env_value(&val, "PROMO_STATE_TTL_SECS")?;
        }

        if let Ok(val) = std::env::var("PROMO_CALLBACK_URL") {
            config.callback_url = Some(val);
        }

        if let Ok(val) = std::env::var("PROMO_CALLBACK_TOKEN") {
            config.callback_token = Some(val);
        }

        if let Ok(val) = std::env::var("PROMO_NOTIFY_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "PROMO_NOTIFY_TIMEOUT_SECS")?;
            config.notify_timeout = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("PROMO_FLYER_ENDPOINT") {
            config.flyer_endpoint = Some(val);
        }

        if let Ok(val) = std::env::var("PROMO_SOCIAL_ENDPOINT") {
            config.social_endpoint = Some(val);
        }

        if let Ok(val) = std::env::var("PROMO_BROADCAST_ENDPOINT") {
            config.broadcast_endpoint = Some(val);
        }

        if let Ok(val) = std::env::var("PROMO_STORAGE_ENDPOINT") {
            config.storage_endpoint = Some(val);
        }

        if let Ok(val) = std::env::var("PROMO_CALENDAR_ENDPOINT") {
            config.calendar_endpoint = Some(val);
        }

        if let Ok(val) = std::env::var("PROMO_TRACKER_ENDPOINT") {
            config.tracker_endpoint = Some(val);
        }

        if let Ok(val) = std::env::var("PROMO_COLLABORATOR_TOKEN") {
            config.collaborator_token = Some(val);
        }

        if let Ok(val) = std::env::var("PROMO_COLLABORATOR_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "PROMO_COLLABORATOR_TIMEOUT_SECS")?;
            config.collaborator_timeout = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("PROMO_ESTIMATED_RUN_MINUTES") {
            let mins: i64 = parse_env_value(&val, "PROMO_ESTIMATED_RUN_MINUTES")?;
            config.estimated_run_duration = chrono::Duration::minutes(mins);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.redis_url.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "redis_url cannot be empty".to_string(),
            ));
        }

        if self.state_ttl_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "state_ttl_secs must be greater than 0".to_string(),
            ));
        }

        if self.notify_timeout.as_secs() == 0 {
            return Err(ConfigError::ValidationFailed(
                "notify_timeout must be greater than 0".to_string(),
            ));
        }

        if self.collaborator_timeout.as_secs() == 0 {
            return Err(ConfigError::ValidationFailed(
                "collaborator_timeout must be greater than 0".to_string(),
            ));
        }

        if self.estimated_run_duration <= chrono::Duration::zero() {
            return Err(ConfigError::ValidationFailed(
                "estimated_run_duration must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder method to set the Redis URL.
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Builder method to set the state record TTL.
    pub fn with_state_ttl_secs(mut self, secs: u64) -> Self {
        self.state_ttl_secs = secs;
        self
    }

    /// Builder method to set the completion callback endpoint.
    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    /// Builder method to set the callback bearer token.
    pub fn with_callback_token(mut self, token: impl Into<String>) -> Self {
        self.callback_token = Some(token.into());
        self
    }

    /// Builder method to set the collaborator bearer token.
    pub fn with_collaborator_token(mut self, token: impl Into<String>) -> Self {
        self.collaborator_token = Some(token.into());
        self
    }

    /// Builder method to set the collaborator request timeout.
    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    /// Builder method to set the completion estimate duration.
    pub fn with_estimated_run_duration(mut self, duration: chrono::Duration) -> Self {
        self.estimated_run_duration = duration;
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}
