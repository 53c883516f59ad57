//! Default prompt templates bundled at compile time.
//!
//! Placeholders like `{project_brief}` are substituted with pipeline state
//! values at render time; JSON examples inside the prompts pass through
//! untouched.

/// Business Analyst - validates briefs against the Definition of Ready
pub const ANALYST: &str = include_str!("defaults/analyst.md");

/// Product Owner - decomposes the validated brief into stories and criteria
pub const SCRIPTER: &str = include_str!("defaults/scripter.md");

/// Agile Coach - assigns Story Point estimates
pub const ESTIMATOR: &str = include_str!("defaults/estimator.md");

/// Report Generator - compiles all artifacts into the final report
pub const REPORT_GENERATOR: &str = include_str!("defaults/report_generator.md");

/// All default prompts with their slugs
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("analyst", ANALYST),
        ("scripter", SCRIPTER),
        ("estimator", ESTIMATOR),
        ("report_generator", REPORT_GENERATOR),
    ]
}
