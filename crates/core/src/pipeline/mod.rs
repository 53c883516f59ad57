//! # Pipeline
//!
//! The machinery that drives stages: the `Stage` contract, stage events with
//! their control signals, prompt-template rendering, the sequential pipeline,
//! and the coordinator that owns a run end to end.

pub mod coordinator;
pub mod events;
pub mod sequential;
pub mod stage;
pub mod template;

pub use coordinator::{Coordinator, CoordinatorConfig, PipelineOutcome};
pub use events::{ControlSignal, StageEvent};
pub use sequential::{PipelineReport, SequentialPipeline};
pub use stage::Stage;
pub use template::render_template;
