//! # Prompt Templates
//!
//! `{key}` placeholder substitution against the pipeline state. A referenced
//! key that was never written fails loudly with `MissingStateKey` instead of
//! silently substituting an empty string, so a mis-ordered pipeline never
//! hands the LLM garbage input. Brace groups that are not plain identifiers
//! (JSON examples embedded in prompts) pass through verbatim.

use crate::state::PipelineState;
use crate::{PipelineError, Result};
use regex::Regex;
use std::sync::OnceLock;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX
        .get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("invalid placeholder pattern"))
}

/// Whether `s` is a plain identifier: letter or underscore, then letters,
/// digits, or underscores.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Render `template`, substituting each `{key}` with the state value under
/// `key`.
pub fn render_template(state: &PipelineState, template: &str) -> Result<String> {
    let regex = placeholder_regex();
    let mut result = String::with_capacity(template.len());
    let mut last_end = 0;

    for found in regex.find_iter(template) {
        result.push_str(&template[last_end..found.start()]);

        let var_name = found.as_str().trim_matches(|c| c == '{' || c == '}').trim();
        if is_identifier(var_name) {
            let value = state
                .get(var_name)
                .ok_or_else(|| PipelineError::MissingStateKey(var_name.to_string()))?;
            result.push_str(&value.to_string());
        } else {
            // Not a state reference (e.g. a JSON literal in the prompt).
            result.push_str(found.as_str());
        }

        last_end = found.end();
    }

    result.push_str(&template[last_end..]);
    Ok(result)
}
