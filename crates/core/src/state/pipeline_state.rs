//! # Pipeline State
//!
//! The shared mapping every stage reads and writes. Owned by the coordinator
//! for the lifetime of a run and passed by mutable reference to each stage;
//! the strictly sequential execution model means there is never more than one
//! writer, so no locking is required. A run's state doubles as its resumption
//! token when analysis stops to ask clarifying questions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Well-known state keys written and read by the built-in stages.
pub mod keys {
    /// The verbatim client brief, seeded by the coordinator and the initializer.
    pub const PROJECT_BRIEF: &str = "project_brief";
    /// Raw analyst response (expected to be a JSON envelope).
    pub const ANALYST_OUTPUT: &str = "analyst_output";
    /// Validated requirements summary, written on a COMPLETE analysis.
    pub const VALIDATED_BRIEF: &str = "validated_brief";
    /// Whether analysis finished (`Flag`); absent until the validator runs.
    pub const ANALYSIS_COMPLETE: &str = "analysis_complete";
    /// Clarifying questions for the user, in analyst order (`List`).
    pub const PENDING_QUESTIONS: &str = "pending_questions";
    /// User stories and acceptance criteria (Markdown).
    pub const STORIES_AND_CRITERIA: &str = "stories_and_criteria";
    /// Story point estimations (Markdown table).
    pub const ESTIMATIONS: &str = "estimations";
    /// The compiled final report (Markdown).
    pub const FINAL_REPORT: &str = "final_report";
}

/// A value stored in the pipeline state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for StateValue {
    /// Rendering used for `{key}` prompt substitution.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Text(s) => f.write_str(s),
            StateValue::Flag(b) => write!(f, "{b}"),
            StateValue::List(items) => {
                let mut first = true;
                for item in items {
                    if !first {
                        writeln!(f)?;
                    }
                    write!(f, "- {item}")?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue::Text(s.to_string())
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        StateValue::Text(s)
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        StateValue::Flag(b)
    }
}

impl From<Vec<String>> for StateValue {
    fn from(items: Vec<String>) -> Self {
        StateValue::List(items)
    }
}

/// Mutable key/value state shared by all stages of a single run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    entries: HashMap<String, StateValue>,
}

impl PipelineState {
    /// Create an empty state for a fresh run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value; `None` if the key was never written.
    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.entries.get(key)
    }

    /// Write a value. Overwrite semantics, no merge.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<StateValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Text value under `key`, if present and textual.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(StateValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Boolean flag under `key`, if present and a flag.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.entries.get(key) {
            Some(StateValue::Flag(b)) => Some(*b),
            _ => None,
        }
    }

    /// String list under `key`, if present and a list.
    pub fn list(&self, key: &str) -> Option<&[String]> {
        match self.entries.get(key) {
            Some(StateValue::List(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// All keys currently set (iteration order unspecified).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites() {
        let mut state = PipelineState::new();
        state.set(keys::PROJECT_BRIEF, "v1");
        state.set(keys::PROJECT_BRIEF, "v2");
        assert_eq!(state.text(keys::PROJECT_BRIEF), Some("v2"));
    }

    #[test]
    fn test_typed_accessors() {
        let mut state = PipelineState::new();
        state.set(keys::ANALYSIS_COMPLETE, true);
        state.set(
            keys::PENDING_QUESTIONS,
            vec!["Who are the users?".to_string()],
        );

        assert_eq!(state.flag(keys::ANALYSIS_COMPLETE), Some(true));
        assert_eq!(
            state.list(keys::PENDING_QUESTIONS),
            Some(&["Who are the users?".to_string()][..])
        );
        // Wrong-type access returns None rather than panicking.
        assert_eq!(state.text(keys::ANALYSIS_COMPLETE), None);
        assert_eq!(state.flag(keys::PENDING_QUESTIONS), None);
    }

    #[test]
    fn test_absent_key() {
        let state = PipelineState::new();
        assert!(state.get(keys::FINAL_REPORT).is_none());
        assert!(!state.contains(keys::FINAL_REPORT));
    }

    #[test]
    fn test_display_for_substitution() {
        assert_eq!(StateValue::Text("brief".into()).to_string(), "brief");
        assert_eq!(StateValue::Flag(false).to_string(), "false");
        let list = StateValue::List(vec!["a".into(), "b".into()]);
        assert_eq!(list.to_string(), "- a\n- b");
    }

    #[test]
    fn test_resumption_round_trip() {
        let mut state = PipelineState::new();
        state.set(keys::PROJECT_BRIEF, "a CRM");
        state.set(keys::ANALYSIS_COMPLETE, false);
        state.set(keys::PENDING_QUESTIONS, vec!["What SLAs?".to_string()]);

        let token = serde_json::to_string(&state).unwrap();
        let restored: PipelineState = serde_json::from_str(&token).unwrap();
        assert_eq!(restored.text(keys::PROJECT_BRIEF), Some("a CRM"));
        assert_eq!(restored.flag(keys::ANALYSIS_COMPLETE), Some(false));
        assert_eq!(restored.list(keys::PENDING_QUESTIONS).unwrap().len(), 1);
    }
}
