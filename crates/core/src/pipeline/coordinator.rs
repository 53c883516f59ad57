//! # Pipeline Coordinator
//!
//! Top-level entry point: accepts a client brief, seeds a fresh pipeline
//! state, and drives the workflow in two phases. The analysis phase runs
//! `[Initializer, Analyst, Validator]`; only when the validator marks the
//! analysis complete does the artifact phase `[Scripter, Estimator,
//! ReportGenerator]` run. An incomplete analysis surfaces the pending
//! questions together with the retained state, so a revised brief can
//! re-enter at the analyst stage instead of letting later stages run on an
//! unvalidated brief.

use crate::llm::CompletionService;
use crate::pipeline::events::StageEvent;
use crate::pipeline::sequential::{PipelineReport, SequentialPipeline};
use crate::pipeline::stage::Stage;
use crate::stages::{
    analyst_stage, estimator_stage, report_generator_stage, scripter_stage, InitializerStage,
    ValidationStage, ANALYST_NAME, ESTIMATOR_NAME, REPORT_GENERATOR_NAME, SCRIPTER_NAME,
    VALIDATOR_NAME,
};
use crate::state::{keys, PipelineState};
use crate::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Configuration for the coordinator. Explicit: core logic never reads
/// ambient process state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Cloud project hosting the prebuilt connectors, if any.
    pub project_id: Option<String>,
    /// Connector/service location.
    pub location: String,
    /// Model used by every LLM stage unless overridden.
    pub default_model: String,
    /// Per-stage model overrides (stage name -> model name).
    #[serde(default)]
    pub per_stage_models: HashMap<String, String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            location: "global".to_string(),
            default_model: crate::llm::gemini::DEFAULT_MODEL.to_string(),
            per_stage_models: HashMap::new(),
        }
    }
}

/// What a run handed back to the caller.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Analysis and all artifact stages finished.
    Complete {
        final_report: String,
        state: PipelineState,
    },
    /// The analyst needs answers before the brief can proceed. `state` is
    /// the resumption token for [`Coordinator::resume`].
    NeedsClarification {
        questions: Vec<String>,
        state: PipelineState,
    },
    /// The analyst's output was malformed; the run stopped at validation.
    AnalysisFailed { reason: String },
}

/// Orchestrates the MARES workflow against one completion service.
pub struct Coordinator {
    config: CoordinatorConfig,
    service: Arc<dyn CompletionService>,
    event_tx: Option<mpsc::Sender<StageEvent>>,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig, service: Arc<dyn CompletionService>) -> Self {
        Self {
            config,
            service,
            event_tx: None,
        }
    }

    /// Stream every stage event over a channel.
    pub fn with_event_channel(mut self, tx: mpsc::Sender<StageEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Model for a stage: per-stage override, else the default.
    fn model_for(&self, stage_name: &str) -> String {
        self.config
            .per_stage_models
            .get(stage_name)
            .cloned()
            .unwrap_or_else(|| self.config.default_model.clone())
    }

    fn pipeline(&self, name: &str, stages: Vec<Box<dyn Stage>>) -> SequentialPipeline {
        let pipeline = SequentialPipeline::new(name, stages);
        match &self.event_tx {
            Some(tx) => pipeline.with_event_channel(tx.clone()),
            None => pipeline,
        }
    }

    fn analysis_stages(&self, brief: Option<&str>) -> Vec<Box<dyn Stage>> {
        let mut stages: Vec<Box<dyn Stage>> = Vec::new();
        if let Some(brief) = brief {
            stages.push(Box::new(InitializerStage::new(brief)));
        }
        stages.push(Box::new(analyst_stage(
            self.service.clone(),
            self.model_for(ANALYST_NAME),
        )));
        stages.push(Box::new(ValidationStage::new()));
        stages
    }

    /// Run the full workflow on a fresh brief.
    pub async fn run(&self, brief: &str) -> Result<PipelineOutcome> {
        tracing::info!(brief_chars = brief.len(), "pipeline run started");

        let mut state = PipelineState::new();
        state.set(keys::PROJECT_BRIEF, brief);

        let analysis = self.pipeline("analysis", self.analysis_stages(Some(brief)));
        let report = analysis.run(&mut state).await?;
        self.conclude(state, &report).await
    }

    /// Re-enter at the analyst stage with a revised brief and the state
    /// retained from an incomplete run.
    pub async fn resume(
        &self,
        mut state: PipelineState,
        revised_brief: &str,
    ) -> Result<PipelineOutcome> {
        tracing::info!(brief_chars = revised_brief.len(), "pipeline run resumed");
        state.set(keys::PROJECT_BRIEF, revised_brief);

        let analysis = self.pipeline("analysis", self.analysis_stages(None));
        let report = analysis.run(&mut state).await?;
        self.conclude(state, &report).await
    }

    async fn conclude(
        &self,
        mut state: PipelineState,
        analysis_report: &PipelineReport,
    ) -> Result<PipelineOutcome> {
        match state.flag(keys::ANALYSIS_COMPLETE) {
            Some(true) => {
                let artifacts = self.pipeline(
                    "artifacts",
                    vec![
                        Box::new(scripter_stage(
                            self.service.clone(),
                            self.model_for(SCRIPTER_NAME),
                        )),
                        Box::new(estimator_stage(
                            self.service.clone(),
                            self.model_for(ESTIMATOR_NAME),
                        )),
                        Box::new(report_generator_stage(
                            self.service.clone(),
                            self.model_for(REPORT_GENERATOR_NAME),
                        )),
                    ],
                );
                artifacts.run(&mut state).await?;

                let final_report = state
                    .text(keys::FINAL_REPORT)
                    .ok_or_else(|| PipelineError::MissingStateKey(keys::FINAL_REPORT.to_string()))?
                    .to_string();
                tracing::info!("pipeline run complete");
                Ok(PipelineOutcome::Complete {
                    final_report,
                    state,
                })
            }
            Some(false) => {
                let questions = state
                    .list(keys::PENDING_QUESTIONS)
                    .map(<[String]>::to_vec)
                    .unwrap_or_default();
                tracing::info!(questions = questions.len(), "pipeline awaiting clarification");
                Ok(PipelineOutcome::NeedsClarification { questions, state })
            }
            None => {
                // The validator recovered a malformed envelope locally; its
                // last event carries the reason.
                let reason = analysis_report
                    .last_event_from(VALIDATOR_NAME)
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "analysis did not reach validation".to_string());
                tracing::warn!(%reason, "pipeline analysis failed");
                Ok(PipelineOutcome::AnalysisFailed { reason })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedCompletion;

    const COMPLETE_ANALYSIS: &str =
        r#"{"status": "COMPLETE", "validated_brief": "Validated requirements summary."}"#;
    const INCOMPLETE_ANALYSIS: &str = r#"{"status": "INCOMPLETE", "questions": ["What is the target user base?", "What are the performance SLAs?"]}"#;

    fn coordinator(service: Arc<ScriptedCompletion>) -> Coordinator {
        Coordinator::new(CoordinatorConfig::default(), service)
    }

    #[tokio::test]
    async fn test_complete_brief_runs_all_artifact_stages_in_order() {
        let service = Arc::new(ScriptedCompletion::new([
            COMPLETE_ANALYSIS,
            "## User Stories\nUS-001 ...",
            "| US-001 | 3 | moderate |",
            "# MARES: Functional Design & Estimation Report",
        ]));

        let outcome = coordinator(service.clone())
            .run("A fully specified brief.")
            .await
            .unwrap();

        match outcome {
            PipelineOutcome::Complete {
                final_report,
                state,
            } => {
                assert!(final_report.starts_with("# MARES"));
                assert_eq!(
                    state.text(keys::VALIDATED_BRIEF),
                    Some("Validated requirements summary.")
                );
                assert!(state.contains(keys::STORIES_AND_CRITERIA));
                assert!(state.contains(keys::ESTIMATIONS));
                assert!(state.contains(keys::FINAL_REPORT));
            }
            other => panic!("expected Complete, got {other:?}"),
        }

        // Analyst, then Scripter, Estimator, ReportGenerator in order; the
        // scripter saw the validated brief, the report saw the estimations.
        let prompts = service.prompts();
        assert_eq!(prompts.len(), 4);
        assert!(prompts[0].contains("A fully specified brief."));
        assert!(prompts[1].contains("Validated requirements summary."));
        assert!(prompts[2].contains("US-001"));
        assert!(prompts[3].contains("| US-001 | 3 | moderate |"));
    }

    #[tokio::test]
    async fn test_vague_brief_halts_with_questions() {
        let service = Arc::new(ScriptedCompletion::new([INCOMPLETE_ANALYSIS]));

        let outcome = coordinator(service.clone())
            .run("Make an app.")
            .await
            .unwrap();

        match outcome {
            PipelineOutcome::NeedsClarification { questions, state } => {
                assert_eq!(
                    questions,
                    vec![
                        "What is the target user base?".to_string(),
                        "What are the performance SLAs?".to_string(),
                    ]
                );
                assert_eq!(state.flag(keys::ANALYSIS_COMPLETE), Some(false));
                // Scripter/Estimator/ReportGenerator never invoked.
                assert!(!state.contains(keys::STORIES_AND_CRITERIA));
                assert!(!state.contains(keys::ESTIMATIONS));
                assert!(!state.contains(keys::FINAL_REPORT));
            }
            other => panic!("expected NeedsClarification, got {other:?}"),
        }

        assert_eq!(service.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_analyst_output_fails_analysis() {
        let service = Arc::new(ScriptedCompletion::new(["not json"]));

        let outcome = coordinator(service).run("Any brief.").await.unwrap();

        match outcome {
            PipelineOutcome::AnalysisFailed { reason } => {
                assert!(reason.contains("failed to parse analyst response"));
            }
            other => panic!("expected AnalysisFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resume_reenters_at_analyst() {
        let service = Arc::new(ScriptedCompletion::new([INCOMPLETE_ANALYSIS]));
        let coord = coordinator(service);

        let outcome = coord.run("Make an app.").await.unwrap();
        let resume_state = match outcome {
            PipelineOutcome::NeedsClarification { state, .. } => state,
            other => panic!("expected NeedsClarification, got {other:?}"),
        };

        // Second service: the revised brief now passes analysis.
        let service = Arc::new(ScriptedCompletion::new([
            COMPLETE_ANALYSIS,
            "stories",
            "estimates",
            "report",
        ]));
        let coord = coordinator(service.clone());

        let outcome = coord
            .resume(resume_state, "Make an app. Users: clerks. SLA: 200ms.")
            .await
            .unwrap();
        assert!(matches!(outcome, PipelineOutcome::Complete { .. }));

        // The analyst prompt carried the revised brief, not the stale one.
        assert!(service.prompts()[0].contains("SLA: 200ms."));
    }

    #[tokio::test]
    async fn test_service_failure_aborts_run() {
        let service = Arc::new(ScriptedCompletion::default().then_fail("quota exhausted"));
        let err = coordinator(service).run("Any brief.").await.unwrap_err();
        assert!(matches!(err, PipelineError::DelegatedService(_)));
    }

    #[tokio::test]
    async fn test_events_stream_over_channel() {
        let service = Arc::new(ScriptedCompletion::new([INCOMPLETE_ANALYSIS]));
        let (tx, mut rx) = mpsc::channel(32);
        let coord = coordinator(service).with_event_channel(tx);

        coord.run("Make an app.").await.unwrap();

        let mut authors = Vec::new();
        while let Ok(event) = rx.try_recv() {
            authors.push(event.author);
        }
        assert_eq!(
            authors,
            vec!["BriefInitializer", "BusinessAnalyst", "AnalystValidator"]
        );
    }

    #[tokio::test]
    async fn test_per_stage_model_override() {
        let mut config = CoordinatorConfig::default();
        config
            .per_stage_models
            .insert(ANALYST_NAME.to_string(), "gemini-2.0-pro".to_string());
        let coord = Coordinator::new(config, Arc::new(ScriptedCompletion::default()));

        assert_eq!(coord.model_for(ANALYST_NAME), "gemini-2.0-pro");
        assert_eq!(
            coord.model_for(SCRIPTER_NAME),
            crate::llm::gemini::DEFAULT_MODEL
        );
    }
}
