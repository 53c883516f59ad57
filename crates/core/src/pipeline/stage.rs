//! # Stage Contract
//!
//! The single capability every pipeline step exposes. State mutation is the
//! only channel through which a stage hands results to later stages; the
//! returned events are for observation, except for the control signal the
//! sequential pipeline reads off the last one.

use crate::pipeline::events::StageEvent;
use crate::state::PipelineState;
use crate::Result;
use async_trait::async_trait;

/// One step of the pipeline; either delegates to an LLM or runs local logic.
///
/// Re-running a stage must overwrite its own output key deterministically.
/// No stage-level retry is performed.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name, used as the `author` of its events.
    fn name(&self) -> &str;

    /// Run the stage against the shared state, producing its finite event
    /// sequence. Errors abort the enclosing pipeline.
    async fn run(&self, state: &mut PipelineState) -> Result<Vec<StageEvent>>;
}
