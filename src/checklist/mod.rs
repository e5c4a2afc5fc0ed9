//! The coherence checklist: a fixed catalogue of thirty-six data-driven
//! rules judged against a hierarchy and its similarity matrix.

pub mod config;
pub mod evaluator;
pub mod rules;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{
    DEFAULT_H1_META_BAND, DEFAULT_TITLE_H1_BAND, DEFAULT_TITLE_META_BAND, RuleConfig,
};
pub use evaluator::ChecklistEvaluator;
pub use rules::{RULES, RuleDef, rule_def};
pub use types::{Band, ChecklistResult, Evidence, Priority, RuleCode, RuleStatus};
