//! # Scripted Completion Service
//!
//! Replays a fixed queue of responses in call order. Used by the pipeline
//! tests and by dry runs where no API key is available. Records every prompt
//! it was handed so tests can assert on what each stage actually sent.

use super::CompletionService;
use crate::{PipelineError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted reply: a response body or a simulated service failure.
type ScriptEntry = std::result::Result<String, String>;

/// A completion service that pops pre-baked responses off a queue.
#[derive(Default)]
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<ScriptEntry>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    /// Script the given responses, returned in order.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(|s| Ok(s.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Append a simulated service failure to the script.
    pub fn then_fail(self, reason: impl Into<String>) -> Self {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(Err(reason.into()));
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock poisoned").clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str, _model: &str) -> Result<String> {
        self.prompts
            .lock()
            .expect("prompts lock poisoned")
            .push(prompt.to_string());

        let next = self
            .script
            .lock()
            .expect("script lock poisoned")
            .pop_front();

        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(PipelineError::DelegatedService(reason)),
            None => Err(PipelineError::DelegatedService(
                "scripted completion exhausted".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pops_in_order_and_records_prompts() {
        let service = ScriptedCompletion::new(["first", "second"]);
        assert_eq!(service.complete("p1", "m").await.unwrap(), "first");
        assert_eq!(service.complete("p2", "m").await.unwrap(), "second");
        assert_eq!(service.prompts(), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_scripted_failure_and_exhaustion() {
        let service = ScriptedCompletion::new(["ok"]).then_fail("503 backend");
        service.complete("p", "m").await.unwrap();

        let err = service.complete("p", "m").await.unwrap_err();
        assert!(matches!(err, PipelineError::DelegatedService(ref r) if r.contains("503")));

        let err = service.complete("p", "m").await.unwrap_err();
        assert!(err.to_string().contains("exhausted"));
    }
}
