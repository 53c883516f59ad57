//! # Pipeline Errors
//!
//! Error taxonomy for the MARES pipeline. Malformed analyst output is
//! deliberately not represented here: the validation stage recovers it
//! locally into an event instead of aborting the run.

/// Errors that abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A prompt template referenced a state key that was never written.
    /// Substituting an empty string would hand the LLM garbage input, so
    /// this aborts the run.
    #[error("state key '{0}' has not been set")]
    MissingStateKey(String),

    /// The completion service or a connector action failed (network,
    /// quota, bad credentials). Remaining stages are aborted.
    #[error("delegated service call failed: {0}")]
    DelegatedService(String),

    /// A connector was invoked with an action name outside its catalog.
    #[error("unknown connector action '{0}'")]
    UnknownAction(String),

    /// Missing credentials or invalid options at construction time.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::DelegatedService(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::MissingStateKey("validated_brief".to_string());
        assert_eq!(err.to_string(), "state key 'validated_brief' has not been set");

        let err = PipelineError::UnknownAction("DeleteEverything".to_string());
        assert!(err.to_string().contains("DeleteEverything"));
    }

    #[test]
    fn test_result_type() {
        let ok: Result<u32> = Ok(7);
        assert_eq!(ok.unwrap(), 7);

        let err: Result<u32> = Err(PipelineError::Config("no api key".to_string()));
        assert!(err.is_err());
    }
}
