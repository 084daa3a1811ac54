//! Input validation, the only critical step.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::StepError;
use crate::workflow::registry::WorkflowStep;
use crate::workflow::state::WorkflowState;

/// Required event-data fields. Missing or empty values abort the run.
const REQUIRED_FIELDS: &[&str] = &["title", "description", "start_date", "location"];

/// Validates the event data and fills preference defaults.
pub struct ValidateInput;

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

#[async_trait]
impl WorkflowStep for ValidateInput {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| is_missing(state.event_data.get(*field)))
            .collect();

        if !missing.is_empty() {
            return Err(StepError::InvalidInput(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        // Preference defaults, applied once so later steps can rely on them.
        state
            .preferences
            .entry("flyer_style".to_string())
            .or_insert_with(|| json!("professional"));
        state
            .preferences
            .entry("target_audience".to_string())
            .or_insert_with(|| json!(["general-public"]));

        tracing::debug!(run_id = %state.run_id, "Input validation passed");
        Ok(())
    }
}
