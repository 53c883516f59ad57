//! # Analyst Validation Stage
//!
//! Custom stage that checks whether the analyst marked the brief as complete
//! and branches accordingly. Each run passes through exactly one transition:
//! the analyst's JSON envelope resolves to Complete, Incomplete, or
//! Malformed, each with its own state mutations and control signal.
//!
//! Only the exact literal strings `"COMPLETE"` and `"INCOMPLETE"` select
//! their branches; case variants and anything else are treated as malformed.

use crate::pipeline::{Stage, StageEvent};
use crate::state::{keys, PipelineState};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

pub const VALIDATOR_NAME: &str = "AnalystValidator";

/// Parsed form of the analyst's output. Built once per run, discarded after
/// its fields are copied into the pipeline state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalystResult {
    /// The brief passed the Definition of Ready checklist.
    Complete { validated_brief: String },
    /// The brief has gaps; the analyst produced clarifying questions.
    Incomplete { questions: Vec<String> },
    /// The output was not the expected JSON envelope.
    Malformed { message: String },
}

impl AnalystResult {
    /// Parse raw analyst text into its outcome.
    pub fn parse(raw: &str) -> Self {
        let envelope: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                return AnalystResult::Malformed {
                    message: format!("failed to parse analyst response: {err}"),
                }
            }
        };

        match envelope.get("status").and_then(Value::as_str) {
            Some("COMPLETE") => AnalystResult::Complete {
                validated_brief: envelope
                    .get("validated_brief")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            Some("INCOMPLETE") => AnalystResult::Incomplete {
                questions: envelope
                    .get("questions")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            _ => AnalystResult::Malformed {
                message: format!(
                    "error in analyst response: {}",
                    envelope
                        .get("error")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown error")
                ),
            },
        }
    }
}

/// Validates analyst output and decides whether analysis is finished.
#[derive(Debug, Default)]
pub struct ValidationStage;

impl ValidationStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for ValidationStage {
    fn name(&self) -> &str {
        VALIDATOR_NAME
    }

    async fn run(&self, state: &mut PipelineState) -> Result<Vec<StageEvent>> {
        // The analyst defaults to an empty envelope if it never wrote its key;
        // that resolves to the malformed branch rather than a fatal error.
        let raw = state.text(keys::ANALYST_OUTPUT).unwrap_or("{}").to_string();

        let events = match AnalystResult::parse(&raw) {
            AnalystResult::Complete { validated_brief } => {
                state.set(keys::VALIDATED_BRIEF, validated_brief);
                state.set(keys::ANALYSIS_COMPLETE, true);
                tracing::info!(stage = VALIDATOR_NAME, "brief validation complete");
                // Sole mechanism that short-circuits the analysis pipeline.
                vec![StageEvent::escalate(
                    VALIDATOR_NAME,
                    "brief validation complete",
                )]
            }
            AnalystResult::Incomplete { questions } => {
                let count = questions.len();
                state.set(keys::PENDING_QUESTIONS, questions);
                state.set(keys::ANALYSIS_COMPLETE, false);
                tracing::info!(
                    stage = VALIDATOR_NAME,
                    questions = count,
                    "additional information needed"
                );
                vec![StageEvent::new(
                    VALIDATOR_NAME,
                    format!("additional information needed: {count} questions"),
                )
                .with_data(serde_json::json!({ "question_count": count }))]
            }
            AnalystResult::Malformed { message } => {
                // No mutation of validated_brief / analysis_complete.
                tracing::warn!(stage = VALIDATOR_NAME, %message, "malformed analyst output");
                vec![StageEvent::new(VALIDATOR_NAME, message)]
            }
        };

        Ok(events)
    }
}
