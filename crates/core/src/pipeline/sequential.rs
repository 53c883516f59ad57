//! # Sequential Pipeline
//!
//! Runs an ordered list of stages against one shared state, one stage at a
//! time. After draining a stage's events, the pipeline inspects the last
//! control signal: `Escalate` stops the run before the remaining stages.
//! Stage N+1 never begins before stage N's state mutations are committed.

use crate::pipeline::events::StageEvent;
use crate::pipeline::stage::Stage;
use crate::state::PipelineState;
use crate::Result;
use tokio::sync::mpsc;

/// What a pipeline run produced, for the caller's inspection.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Every event emitted, in order.
    pub events: Vec<StageEvent>,
    /// Names of the stages that ran, in order.
    pub completed_stages: Vec<String>,
    /// Whether a stage escalated before the list was exhausted.
    pub escalated: bool,
}

impl PipelineReport {
    /// Last event emitted by the named stage, if any.
    pub fn last_event_from(&self, author: &str) -> Option<&StageEvent> {
        self.events.iter().rev().find(|e| e.author == author)
    }
}

/// An ordered list of stages sharing one `PipelineState`.
pub struct SequentialPipeline {
    name: String,
    stages: Vec<Box<dyn Stage>>,
    event_tx: Option<mpsc::Sender<StageEvent>>,
}

impl SequentialPipeline {
    pub fn new(name: impl Into<String>, stages: Vec<Box<dyn Stage>>) -> Self {
        Self {
            name: name.into(),
            stages,
            event_tx: None,
        }
    }

    /// Forward every event over a channel for live observability.
    pub fn with_event_channel(mut self, tx: mpsc::Sender<StageEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn emit(&self, report: &mut PipelineReport, event: StageEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event.clone()).await;
        }
        report.events.push(event);
    }

    /// Run each stage in order. Stops early when a stage's last event
    /// escalates; on a stage error, emits one failure event naming the stage
    /// and propagates the error.
    pub async fn run(&self, state: &mut PipelineState) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();

        for stage in &self.stages {
            tracing::info!(pipeline = %self.name, stage = %stage.name(), "running stage");

            let events = match stage.run(state).await {
                Ok(events) => events,
                Err(err) => {
                    tracing::error!(
                        pipeline = %self.name,
                        stage = %stage.name(),
                        error = %err,
                        "stage failed"
                    );
                    self.emit(&mut report, StageEvent::new(stage.name(), err.to_string()))
                        .await;
                    return Err(err);
                }
            };

            let escalated = events.last().is_some_and(StageEvent::is_escalate);
            for event in events {
                self.emit(&mut report, event).await;
            }
            report.completed_stages.push(stage.name().to_string());

            if escalated {
                tracing::info!(pipeline = %self.name, stage = %stage.name(), "pipeline escalated");
                report.escalated = true;
                break;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PipelineError;
    use async_trait::async_trait;

    /// Test stage that records a marker key and optionally escalates or fails.
    struct MarkerStage {
        name: String,
        escalate: bool,
        fail: bool,
    }

    impl MarkerStage {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                escalate: false,
                fail: false,
            }
        }

        fn escalating(name: &str) -> Self {
            Self {
                escalate: true,
                ..Self::new(name)
            }
        }

        fn failing(name: &str) -> Self {
            Self {
                fail: true,
                ..Self::new(name)
            }
        }
    }

    #[async_trait]
    impl Stage for MarkerStage {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, state: &mut PipelineState) -> Result<Vec<StageEvent>> {
            if self.fail {
                return Err(PipelineError::DelegatedService("quota exceeded".into()));
            }
            state.set(format!("{}_ran", self.name), true);
            let event = if self.escalate {
                StageEvent::escalate(&self.name, "done, stopping")
            } else {
                StageEvent::new(&self.name, "done")
            };
            Ok(vec![event])
        }
    }

    fn five_stage_list(escalate_at: usize) -> Vec<Box<dyn Stage>> {
        (1..=5)
            .map(|i| {
                let name = format!("stage{i}");
                let stage: Box<dyn Stage> = if i == escalate_at {
                    Box::new(MarkerStage::escalating(&name))
                } else {
                    Box::new(MarkerStage::new(&name))
                };
                stage
            })
            .collect()
    }

    #[tokio::test]
    async fn test_runs_all_stages_in_order() {
        let pipeline = SequentialPipeline::new("test", five_stage_list(0));
        let mut state = PipelineState::new();
        let report = pipeline.run(&mut state).await.unwrap();

        assert!(!report.escalated);
        assert_eq!(
            report.completed_stages,
            vec!["stage1", "stage2", "stage3", "stage4", "stage5"]
        );
    }

    #[tokio::test]
    async fn test_escalation_skips_remaining_stages() {
        let pipeline = SequentialPipeline::new("test", five_stage_list(3));
        let mut state = PipelineState::new();
        let report = pipeline.run(&mut state).await.unwrap();

        assert!(report.escalated);
        assert_eq!(report.completed_stages, vec!["stage1", "stage2", "stage3"]);
        // Stages 4-5 never touched the state.
        assert!(state.get("stage4_ran").is_none());
        assert!(state.get("stage5_ran").is_none());
    }

    #[tokio::test]
    async fn test_stage_error_emits_failure_event_and_aborts() {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(MarkerStage::new("stage1")),
            Box::new(MarkerStage::failing("stage2")),
            Box::new(MarkerStage::new("stage3")),
        ];
        let (tx, mut rx) = mpsc::channel(16);
        let pipeline = SequentialPipeline::new("test", stages).with_event_channel(tx);

        let mut state = PipelineState::new();
        let err = pipeline.run(&mut state).await.unwrap_err();
        assert!(matches!(err, PipelineError::DelegatedService(_)));
        assert!(state.get("stage3_ran").is_none());

        // The channel saw stage1's event, then the failure event.
        let first = rx.recv().await.unwrap();
        assert_eq!(first.author, "stage1");
        let failure = rx.recv().await.unwrap();
        assert_eq!(failure.author, "stage2");
        assert!(failure.message.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_last_event_from() {
        let pipeline = SequentialPipeline::new("test", five_stage_list(0));
        let mut state = PipelineState::new();
        let report = pipeline.run(&mut state).await.unwrap();
        assert_eq!(report.last_event_from("stage4").unwrap().message, "done");
        assert!(report.last_event_from("nope").is_none());
    }
}
