//! # Delegated Completion Service
//!
//! The pipeline treats the LLM as an opaque text-completion collaborator
//! behind the [`CompletionService`] trait: one blocking call per stage, no
//! retry. [`GeminiClient`] talks to the Generative Language API;
//! [`ScriptedCompletion`] replays canned responses for tests and offline runs.

pub mod gemini;
pub mod scripted;

pub use gemini::GeminiClient;
pub use scripted::ScriptedCompletion;

use crate::Result;
use async_trait::async_trait;

/// An opaque text-completion collaborator.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete `prompt` with the named model, returning the raw response
    /// text. Transport or service failures surface as
    /// [`crate::PipelineError::DelegatedService`].
    async fn complete(&self, prompt: &str, model: &str) -> Result<String>;
}
