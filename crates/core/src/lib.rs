//! # MARES Core
//!
//! The "Brain" of the MARES system - turns an unstructured client project
//! brief into a validated requirements document, user stories, complexity
//! estimates, and a final report.
//!
//! ## Architecture
//!
//! - `state/` - Shared pipeline state threaded through every stage
//! - `pipeline/` - Stage contract, sequential pipeline, and the coordinator
//! - `stages/` - Concrete stages (Analyst, Validator, Scripter, Estimator, ...)
//! - `llm/` - Delegated text-completion service (Gemini + scripted test double)
//! - `connectors/` - Prebuilt document/file storage connector actions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mares_core::pipeline::{Coordinator, CoordinatorConfig, PipelineOutcome};
//! use mares_core::llm::GeminiClient;
//! use std::sync::Arc;
//!
//! let service = Arc::new(GeminiClient::from_env()?);
//! let coordinator = Coordinator::new(CoordinatorConfig::default(), service);
//! match coordinator.run("Build a stock tracker").await? {
//!     PipelineOutcome::Complete { final_report, .. } => println!("{final_report}"),
//!     PipelineOutcome::NeedsClarification { questions, .. } => println!("{questions:?}"),
//!     PipelineOutcome::AnalysisFailed { reason } => eprintln!("{reason}"),
//! }
//! ```

pub mod connectors;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod stages;
pub mod state;

pub use error::{PipelineError, Result};
