//! Workflow run state: the shared mutable object threaded through every step.
//!
//! A [`WorkflowState`] is exclusively owned by its run's executor task while
//! the pipeline is running; all external reads go through the durable store
//! via the serialized [`StateRecord`] form.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a workflow run.
///
/// Transitions are forward-only: Pending → InProgress → one of
/// Completed/Failed/Cancelled. `WaitingApproval` and `Approved` are reachable
/// only through the regeneration/approval path, never set by the main
/// pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    InProgress,
    WaitingApproval,
    Approved,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowStatus {
    /// Returns true for statuses that end a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Completed | WorkflowStatus::Failed | WorkflowStatus::Cancelled
        )
    }

    /// The status as its stored wire string (e.g. "in_progress").
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::InProgress => "in_progress",
            WorkflowStatus::WaitingApproval => "waiting_approval",
            WorkflowStatus::Approved => "approved",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a wire string back into a status.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(WorkflowStatus::Pending),
            "in_progress" => Some(WorkflowStatus::InProgress),
            "waiting_approval" => Some(WorkflowStatus::WaitingApproval),
            "approved" => Some(WorkflowStatus::Approved),
            "completed" => Some(WorkflowStatus::Completed),
            "failed" => Some(WorkflowStatus::Failed),
            "cancelled" => Some(WorkflowStatus::Cancelled),
            _ => None,
        }
    }
}

/// Sentinel values for `current_step` outside of step execution.
pub mod sentinel {
    /// Set when the pipeline ran to the end.
    pub const COMPLETED: &str = "completed";
    /// Set when the run was cancelled cooperatively.
    pub const CANCELLED: &str = "cancelled";
    /// Set when an unhandled failure aborted the run.
    pub const ERROR: &str = "error";
}

/// Well-known artifact keys written by the pipeline steps.
///
/// The artifact map is a closed-but-extensible namespace: these constants plus
/// the `<step>_error` convention. Unknown keys are tolerated (and logged at
/// the serialization boundary) so older records keep deserializing.
pub mod artifact {
    pub const FLYER_URL: &str = "flyer_url";
    pub const FLYER_ASSET_ID: &str = "flyer_asset_id";
    pub const FLYER_DESIGN_NOTES: &str = "flyer_design_notes";
    pub const INSTAGRAM_CAPTION: &str = "instagram_caption";
    pub const LINKEDIN_CAPTION: &str = "linkedin_caption";
    pub const TWITTER_CAPTION: &str = "twitter_caption";
    pub const FACEBOOK_CAPTION: &str = "facebook_caption";
    pub const BROADCAST_MESSAGE: &str = "broadcast_message";
    pub const BROADCAST_LISTS: &str = "broadcast_lists";
    pub const STORAGE_FOLDER_ID: &str = "storage_folder_id";
    pub const STORAGE_FOLDER_URL: &str = "storage_folder_url";
    pub const STORAGE_FILES: &str = "storage_files";
    pub const CALENDAR_EVENT_ID: &str = "calendar_event_id";
    pub const CALENDAR_EVENT_URL: &str = "calendar_event_url";
    pub const CALENDAR_INVITE_SENT: &str = "calendar_invite_sent";
    pub const TRACKER_TASK_ID: &str = "tracker_task_id";
    pub const TRACKER_TASK_URL: &str = "tracker_task_url";
    pub const TRACKER_CHECKLIST: &str = "tracker_checklist";
    pub const WORKFLOW_SUMMARY: &str = "workflow_summary";

    /// All non-error keys the pipeline is expected to write.
    pub const KNOWN_KEYS: &[&str] = &[
        FLYER_URL,
        FLYER_ASSET_ID,
        FLYER_DESIGN_NOTES,
        INSTAGRAM_CAPTION,
        LINKEDIN_CAPTION,
        TWITTER_CAPTION,
        FACEBOOK_CAPTION,
        BROADCAST_MESSAGE,
        BROADCAST_LISTS,
        STORAGE_FOLDER_ID,
        STORAGE_FOLDER_URL,
        STORAGE_FILES,
        CALENDAR_EVENT_ID,
        CALENDAR_EVENT_URL,
        CALENDAR_INVITE_SENT,
        TRACKER_TASK_ID,
        TRACKER_TASK_URL,
        TRACKER_CHECKLIST,
        WORKFLOW_SUMMARY,
    ];

    /// The artifact key holding a step's recorded failure message.
    pub fn error_key(step_name: &str) -> String {
        format!("{}_error", step_name)
    }

    /// Whether a key belongs to the documented namespace.
    pub fn is_known_key(key: &str) -> bool {
        KNOWN_KEYS.contains(&key) || key.ends_with("_error")
    }
}

/// State object for a single workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Caller-assigned unique run identifier.
    pub run_id: String,
    /// External correlation id of the event being processed.
    pub event_id: String,
    /// Current lifecycle status.
    pub status: WorkflowStatus,
    /// Name of the step currently executing or last attempted.
    pub current_step: String,
    /// Names of steps that completed without failing, in execution order.
    pub completed_steps: Vec<String>,
    /// Names of steps that failed. Append-always: a step that fails on the
    /// initial run and again during regeneration appears twice.
    pub failed_steps: Vec<String>,
    /// Subject (event) data supplied by the caller. Immutable after creation.
    pub event_data: Map<String, Value>,
    /// Caller content preferences; mutable only via regeneration overrides.
    pub preferences: Map<String, Value>,
    /// Information about the requesting user, passed to filing services.
    pub user_info: Map<String, Value>,
    /// Artifacts produced by steps, keyed per [`artifact`].
    pub artifacts: Map<String, Value>,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
    /// Rough completion estimate shown to status pollers.
    pub estimated_completion: Option<DateTime<Utc>>,
    /// Top-level error summary, set only on unhandled failure.
    pub error_message: Option<String>,
}

impl WorkflowState {
    /// Creates the initial state for a brand-new run.
    pub fn new(
        run_id: impl Into<String>,
        event_id: impl Into<String>,
        first_step: &str,
        event_data: Map<String, Value>,
        preferences: Map<String, Value>,
        user_info: Map<String, Value>,
        estimated_duration: chrono::Duration,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            run_id: run_id.into(),
            event_id: event_id.into(),
            status: WorkflowStatus::InProgress,
            current_step: first_step.to_string(),
            completed_steps: Vec::new(),
            failed_steps: Vec::new(),
            event_data,
            preferences,
            user_info,
            artifacts: Map::new(),
            created_at,
            estimated_completion: Some(created_at + estimated_duration),
            error_message: None,
        }
    }

    /// Progress percentage derived purely from the completed-step count.
    ///
    /// Capped at 100; `mark_step_completed` guarantees a step is never
    /// counted twice, so the cap only matters for defensive reads of
    /// hand-edited records.
    pub fn progress(&self, total_steps: usize) -> u8 {
        if total_steps == 0 {
            return 0;
        }
        let pct = (self.completed_steps.len() * 100) / total_steps;
        pct.min(100) as u8
    }

    /// Records a successful step, guarding against double counting.
    pub fn mark_step_completed(&mut self, step_name: &str) {
        if !self.completed_steps.iter().any(|s| s == step_name) {
            self.completed_steps.push(step_name.to_string());
        }
    }

    /// Records a step failure: appends to `failed_steps` and writes the
    /// `<step>_error` artifact.
    pub fn mark_step_failed(&mut self, step_name: &str, message: &str) {
        self.failed_steps.push(step_name.to_string());
        self.artifacts
            .insert(artifact::error_key(step_name), Value::String(message.to_string()));
    }

    /// Merges new artifact values into the artifact map, overwriting
    /// existing keys.
    pub fn merge_artifacts(&mut self, new_artifacts: Map<String, Value>) {
        for (key, value) in new_artifacts {
            self.artifacts.insert(key, value);
        }
    }

    /// Serializes the state into its total, deterministic record form.
    ///
    /// Unknown artifact keys are logged here, at the serialization boundary,
    /// rather than rejected.
    pub fn to_record(&self, total_steps: usize) -> StateRecord {
        for key in self.artifacts.keys() {
            if !artifact::is_known_key(key) {
                tracing::warn!(run_id = %self.run_id, key = %key, "Unknown artifact key");
            }
        }

        StateRecord {
            run_id: self.run_id.clone(),
            event_id: self.event_id.clone(),
            status: self.status,
            current_step: self.current_step.clone(),
            completed_steps: self.completed_steps.clone(),
            failed_steps: self.failed_steps.clone(),
            event_data: self.event_data.clone(),
            preferences: self.preferences.clone(),
            user_info: self.user_info.clone(),
            artifacts: self.artifacts.clone(),
            created_at: self.created_at,
            estimated_completion: self.estimated_completion,
            error_message: self.error_message.clone(),
            progress_percentage: self.progress(total_steps),
        }
    }
}

/// Serialized form of a [`WorkflowState`], used for both persistence and
/// status-query responses.
///
/// Identical to the state plus the derived `progress_percentage`; every field
/// round-trips through [`StateRecord::into_state`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub run_id: String,
    pub event_id: String,
    pub status: WorkflowStatus,
    pub current_step: String,
    pub completed_steps: Vec<String>,
    pub failed_steps: Vec<String>,
    pub event_data: Map<String, Value>,
    pub preferences: Map<String, Value>,
    pub user_info: Map<String, Value>,
    pub artifacts: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub progress_percentage: u8,
}

impl StateRecord {
    /// Reconstructs the live state object. The derived progress field is
    /// dropped; it is always recomputed.
    pub fn into_state(self) -> WorkflowState {
        WorkflowState {
            run_id: self.run_id,
            event_id: self.event_id,
            status: self.status,
            current_step: self.current_step,
            completed_steps: self.completed_steps,
            failed_steps: self.failed_steps,
            event_data: self.event_data,
            preferences: self.preferences,
            user_info: self.user_info,
            artifacts: self.artifacts,
            created_at: self.created_at,
            estimated_completion: self.estimated_completion,
            error_message: self.error_message,
        }
    }

    /// Artifact keys grouped for display, sorted for stable output.
    pub fn artifact_keys(&self) -> BTreeMap<&str, &Value> {
        self.artifacts.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }
}
