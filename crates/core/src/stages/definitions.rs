//! # Stage Definitions
//!
//! Factory functions composing the prompt templates into the concrete LLM
//! stages of the MARES workflow. Stage ids double as the keys for per-stage
//! model overrides in the coordinator config.

use crate::llm::CompletionService;
use crate::stages::llm_stage::LlmStage;
use crate::stages::prompts;
use crate::state::keys;
use std::sync::Arc;

pub const ANALYST_NAME: &str = "BusinessAnalyst";
pub const SCRIPTER_NAME: &str = "ProductOwner";
pub const ESTIMATOR_NAME: &str = "AgileCoach";
pub const REPORT_GENERATOR_NAME: &str = "ReportGenerator";

/// Analyzes project briefs and identifies ambiguities.
pub fn analyst_stage(service: Arc<dyn CompletionService>, model: impl Into<String>) -> LlmStage {
    LlmStage::new(
        ANALYST_NAME,
        prompts::ANALYST,
        keys::ANALYST_OUTPUT,
        model,
        service,
    )
}

/// Generates user stories and acceptance criteria from validated requirements.
pub fn scripter_stage(service: Arc<dyn CompletionService>, model: impl Into<String>) -> LlmStage {
    LlmStage::new(
        SCRIPTER_NAME,
        prompts::SCRIPTER,
        keys::STORIES_AND_CRITERIA,
        model,
        service,
    )
}

/// Provides Story Point estimates for user stories.
pub fn estimator_stage(service: Arc<dyn CompletionService>, model: impl Into<String>) -> LlmStage {
    LlmStage::new(
        ESTIMATOR_NAME,
        prompts::ESTIMATOR,
        keys::ESTIMATIONS,
        model,
        service,
    )
}

/// Compiles all artifacts into a final report.
pub fn report_generator_stage(
    service: Arc<dyn CompletionService>,
    model: impl Into<String>,
) -> LlmStage {
    LlmStage::new(
        REPORT_GENERATOR_NAME,
        prompts::REPORT_GENERATOR,
        keys::FINAL_REPORT,
        model,
        service,
    )
}
