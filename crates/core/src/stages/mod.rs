//! # MARES Stages
//!
//! Concrete stages of the requirements workflow.
//!
//! **LLM Stages** (prompt template -> completion service -> output key):
//! - `BusinessAnalyst` - validates the brief, asks clarifying questions
//! - `ProductOwner` - decomposes the validated brief into user stories
//! - `AgileCoach` - assigns Story Point estimates
//! - `ReportGenerator` - compiles the final report
//!
//! **Custom Stages** (local logic, no completion call):
//! - `BriefInitializer` - captures the verbatim user brief into state
//! - `AnalystValidator` - parses the analyst envelope and decides whether
//!   analysis is complete

pub mod definitions;
pub mod initializer;
pub mod llm_stage;
pub mod prompts;
pub mod validator;

pub use definitions::{
    analyst_stage, estimator_stage, report_generator_stage, scripter_stage, ANALYST_NAME,
    ESTIMATOR_NAME, REPORT_GENERATOR_NAME, SCRIPTER_NAME,
};
pub use initializer::{InitializerStage, INITIALIZER_NAME};
pub use llm_stage::LlmStage;
pub use validator::{AnalystResult, ValidationStage, VALIDATOR_NAME};
