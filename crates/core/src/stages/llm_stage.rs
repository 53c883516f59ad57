//! # LLM Stage
//!
//! A stage whose whole body is: render the prompt template against the
//! current state, call the completion service, store the raw response under
//! the output key. No output schema is enforced here; the validator is the
//! only consumer that expects structured output, and only from the analyst.

use crate::llm::CompletionService;
use crate::pipeline::{render_template, Stage, StageEvent};
use crate::state::PipelineState;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A prompt-template stage delegating to the completion service.
pub struct LlmStage {
    name: String,
    template: &'static str,
    output_key: &'static str,
    model: String,
    service: Arc<dyn CompletionService>,
}

impl LlmStage {
    pub fn new(
        name: impl Into<String>,
        template: &'static str,
        output_key: &'static str,
        model: impl Into<String>,
        service: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            name: name.into(),
            template,
            output_key,
            model: model.into(),
            service,
        }
    }

    pub fn output_key(&self) -> &str {
        self.output_key
    }
}

#[async_trait]
impl Stage for LlmStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, state: &mut PipelineState) -> Result<Vec<StageEvent>> {
        let prompt = render_template(state, self.template)?;

        tracing::debug!(stage = %self.name, model = %self.model, "delegating to completion service");
        let response = self.service.complete(&prompt, &self.model).await?;

        let chars = response.len();
        state.set(self.output_key, response);

        Ok(vec![StageEvent::new(
            &self.name,
            format!("stored {chars} chars under '{}'", self.output_key),
        )
        .with_data(serde_json::json!({ "output_key": self.output_key, "chars": chars }))])
    }
}
