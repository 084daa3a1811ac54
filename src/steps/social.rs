//! Social caption generation, derived from the flyer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::collaborators::ContentGenerator;
use crate::error::StepError;
use crate::steps::names;
use crate::workflow::registry::WorkflowStep;
use crate::workflow::state::{artifact, WorkflowState};

/// Platforms and the artifact key each caption lands under.
const PLATFORM_KEYS: &[(&str, &str)] = &[
    ("instagram", artifact::INSTAGRAM_CAPTION),
    ("linkedin", artifact::LINKEDIN_CAPTION),
    ("twitter", artifact::TWITTER_CAPTION),
    ("facebook", artifact::FACEBOOK_CAPTION),
];

/// Generates per-platform captions referencing the flyer.
///
/// The captions are written against the rendered flyer, so a run whose flyer
/// step produced nothing skips this work and records a missing-dependency
/// failure instead of calling the collaborator.
pub struct CreateSocialContent {
    generator: Arc<dyn ContentGenerator>,
}

impl CreateSocialContent {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl WorkflowStep for CreateSocialContent {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        if !state.artifacts.contains_key(artifact::FLYER_URL) {
            return Err(StepError::MissingArtifact {
                step: names::CREATE_SOCIAL_CONTENT.to_string(),
                artifact: artifact::FLYER_URL.to_string(),
            });
        }

        let result = self
            .generator
            .generate(&state.event_data, &state.preferences)
            .await?;

        let mut written = 0;
        for (field, key) in PLATFORM_KEYS {
            if let Some(caption) = result.get(*field) {
                state.artifacts.insert((*key).to_string(), caption.clone());
                written += 1;
            }
        }

        tracing::info!(run_id = %state.run_id, platforms = written, "Social captions created");
        Ok(())
    }
}
