//! # Brief Initializer
//!
//! Step 0 of the pipeline: stores the verbatim user brief under
//! `project_brief` so every later stage reads the same text. No completion
//! call is made.

use crate::pipeline::{Stage, StageEvent};
use crate::state::{keys, PipelineState};
use crate::Result;
use async_trait::async_trait;

pub const INITIALIZER_NAME: &str = "BriefInitializer";

/// Captures the client brief into the shared state.
pub struct InitializerStage {
    brief: String,
}

impl InitializerStage {
    pub fn new(brief: impl Into<String>) -> Self {
        Self {
            brief: brief.into(),
        }
    }
}

#[async_trait]
impl Stage for InitializerStage {
    fn name(&self) -> &str {
        INITIALIZER_NAME
    }

    async fn run(&self, state: &mut PipelineState) -> Result<Vec<StageEvent>> {
        state.set(keys::PROJECT_BRIEF, self.brief.clone());
        Ok(vec![StageEvent::new(
            INITIALIZER_NAME,
            format!("project brief captured ({} chars)", self.brief.len()),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stores_brief_verbatim() {
        let brief = "Build a CRM.\nWith  odd   spacing.";
        let stage = InitializerStage::new(brief);
        let mut state = PipelineState::new();

        let events = stage.run(&mut state).await.unwrap();
        assert_eq!(state.text(keys::PROJECT_BRIEF), Some(brief));
        assert_eq!(events.len(), 1);
        assert!(!events[0].is_escalate());
    }

    #[tokio::test]
    async fn test_rerun_overwrites_deterministically() {
        let mut state = PipelineState::new();
        state.set(keys::PROJECT_BRIEF, "stale");
        InitializerStage::new("fresh").run(&mut state).await.unwrap();
        assert_eq!(state.text(keys::PROJECT_BRIEF), Some("fresh"));
    }
}
