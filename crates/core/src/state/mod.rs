pub mod pipeline_state;

pub use pipeline_state::{keys, PipelineState, StateValue};
