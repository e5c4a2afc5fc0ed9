//! Rule evaluation over a validated hierarchy and its similarity matrix.
//!
//! The evaluator is pure: it never touches the provider or the store, it
//! only reads the hierarchy and the precomputed scores. Rules whose subject
//! is structurally required (CV-001, CV-005, CV-008, CV-010, CV-032) fail on
//! absence; rules over optional subjects report a nothing-to-evaluate
//! warning instead. A rule that needs a similarity score which could not be
//! computed warns with `Evidence::Unavailable` rather than guessing.

use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;

use tracing::debug;

use crate::config::error::ConfigResult;
use crate::hierarchy::{ContentHierarchy, ContentNode, NodeKind};
use crate::similarity::{RelationKind, SimilarityMatrix};

use super::config::RuleConfig;
use super::rules::RULES;
use super::types::{Band, ChecklistResult, Evidence, Priority, RuleCode, RuleStatus};

const TITLE_LENGTH: RangeInclusive<usize> = 50..=60;
const TITLE_LENGTH_SLACK: RangeInclusive<usize> = 61..=70;
const META_LENGTH: RangeInclusive<usize> = 150..=160;
const META_MIN_DETAIL: usize = 100;
const H2_LENGTH: RangeInclusive<usize> = 20..=70;
const H3_LENGTH: RangeInclusive<usize> = 15..=60;
const TITLE_WORDS: RangeInclusive<usize> = 4..=12;
const TITLE_SEPARATOR_MAX: usize = 2;
const KEYWORD_ECHO: RangeInclusive<usize> = 3..=5;
const KEYWORD_MIN_CHARS: usize = 4;
const H2_MIN_WORDS: usize = 3;
const H2_EXPLANATORY_RATIO: f64 = 0.8;
const H2_QUESTION_RATIO: f64 = 0.5;
const H3_PER_H2_FACTOR: usize = 3;
const STUFFING_LIMIT: usize = 2;

/// Internal per-rule outcome before it is stamped with code and priority.
struct Verdict {
    status: RuleStatus,
    evidence: Evidence,
    message: String,
    node: Option<usize>,
}

impl Verdict {
    fn new(status: RuleStatus, evidence: Evidence, message: impl Into<String>) -> Self {
        Self {
            status,
            evidence,
            message: message.into(),
            node: None,
        }
    }

    fn at(mut self, node: usize) -> Self {
        self.node = Some(node);
        self
    }
}

/// The subject of this rule is absent and not required, so there is nothing
/// to judge.
fn nothing_to_evaluate(message: impl Into<String>) -> Verdict {
    Verdict::new(RuleStatus::Warn, Evidence::None, message)
}

/// The inputs exist but a similarity the rule depends on is missing.
fn inconclusive(message: impl Into<String>) -> Verdict {
    Verdict::new(RuleStatus::Warn, Evidence::Unavailable, message)
}

/// Splits normalized text into comparison words, stripping punctuation stuck
/// to the tokens so `zmywarki?` and `zmywarki` compare equal.
fn lexical_words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
}

/// Data-driven checklist evaluator. Walks the catalogue in order and always
/// produces exactly one result per rule, CV-036 last.
#[derive(Debug, Clone)]
pub struct ChecklistEvaluator {
    config: RuleConfig,
    title_h1: Band,
    title_meta: Band,
    h1_meta: Band,
}

impl ChecklistEvaluator {
    /// Validates the configuration and resolves the effective relation
    /// bands. A config that does not validate is a fatal startup error.
    pub fn new(config: RuleConfig) -> ConfigResult<Self> {
        config.validate()?;
        let title_h1 = config.band_for(RuleCode::Cv009).unwrap_or(config.title_h1_band);
        let title_meta = config
            .band_for(RuleCode::Cv020)
            .unwrap_or(config.title_meta_band);
        let h1_meta = config.band_for(RuleCode::Cv021).unwrap_or(config.h1_meta_band);
        Ok(Self {
            config,
            title_h1,
            title_meta,
            h1_meta,
        })
    }

    #[inline]
    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Evaluates every rule. The aggregate CV-036 is derived from the other
    /// results and always closes the list.
    pub fn evaluate(
        &self,
        hierarchy: &ContentHierarchy,
        matrix: &SimilarityMatrix,
    ) -> Vec<ChecklistResult> {
        let mut results = Vec::with_capacity(RULES.len());
        for def in &RULES {
            if def.code == RuleCode::Cv036 {
                continue;
            }
            let verdict = self.check(def.code, hierarchy, matrix);
            results.push(ChecklistResult {
                code: def.code,
                priority: def.priority,
                status: verdict.status,
                evidence: verdict.evidence,
                message: verdict.message,
                node: verdict.node,
            });
        }

        let score = Self::overall_score(&results);
        let status = if score >= self.config.aggregate_pass_at {
            RuleStatus::Pass
        } else if score >= self.config.aggregate_warn_at {
            RuleStatus::Warn
        } else {
            RuleStatus::Fail
        };
        results.push(ChecklistResult {
            code: RuleCode::Cv036,
            priority: Priority::Critical,
            status,
            evidence: Evidence::Score {
                value: score as f32,
            },
            message: format!("aggregate coherence score {score:.1} of 100"),
            node: None,
        });

        let passed = results.iter().filter(|r| r.is_pass()).count();
        let failed = results.iter().filter(|r| r.is_fail()).count();
        debug!(
            passed,
            failed,
            warned = results.len() - passed - failed,
            overall = score,
            "checklist evaluated"
        );
        results
    }

    /// Weighted pass rate over the Critical and High rules, 0 to 100. The
    /// aggregate rule itself never feeds its own score.
    pub fn overall_score(results: &[ChecklistResult]) -> f64 {
        let mut weighted = 0.0;
        let mut total = 0.0;
        for result in results {
            if result.code == RuleCode::Cv036 {
                continue;
            }
            if matches!(result.priority, Priority::Critical | Priority::High) {
                total += result.priority.weight();
                weighted += result.priority.weight() * result.status.contribution();
            }
        }
        if total == 0.0 {
            return 0.0;
        }
        100.0 * weighted / total
    }

    fn check(&self, code: RuleCode, h: &ContentHierarchy, m: &SimilarityMatrix) -> Verdict {
        match code {
            RuleCode::Cv001 => self.title_present(h),
            RuleCode::Cv002 => self.title_length(h),
            RuleCode::Cv003 => self.title_uniqueness(h),
            RuleCode::Cv004 => self.title_stuffing(h),
            RuleCode::Cv005 => self.meta_extends_title(h),
            RuleCode::Cv006 => self.meta_length(h),
            RuleCode::Cv007 => self.meta_detail(h),
            RuleCode::Cv008 => self.single_h1(h),
            RuleCode::Cv009 => self.relation(h, m, RelationKind::TitleH1, self.title_h1),
            RuleCode::Cv010 => self.h1_non_empty(h),
            RuleCode::Cv011 => self.chain_coherence(m),
            RuleCode::Cv012 => self.h2_drift(h, m),
            RuleCode::Cv013 => self.h2_count(h),
            RuleCode::Cv014 => self.h2_self_explanatory(h),
            RuleCode::Cv015 => self.h2_question_share(h),
            RuleCode::Cv016 => self.h2_duplicates(h),
            RuleCode::Cv017 => self.h3_nesting(h),
            RuleCode::Cv018 => self.level_skip(h),
            RuleCode::Cv019 => self.h3_parent_mean(m),
            RuleCode::Cv020 => self.relation(h, m, RelationKind::TitleMeta, self.title_meta),
            RuleCode::Cv021 => self.relation(h, m, RelationKind::H1Meta, self.h1_meta),
            RuleCode::Cv022 => self.h2_core_mean(h, m),
            RuleCode::Cv023 => self.h2_core_spread(h, m),
            RuleCode::Cv024 => self.h3_group_balance(h),
            RuleCode::Cv025 => self.h2_lengths(h),
            RuleCode::Cv026 => self.h3_lengths(h),
            RuleCode::Cv027 => self.h3_volume(h),
            RuleCode::Cv028 => self.title_separators(h),
            RuleCode::Cv029 => self.keyword_echo(h),
            RuleCode::Cv030 => self.all_caps_headings(h),
            RuleCode::Cv031 => self.h1_position(h),
            RuleCode::Cv032 => self.title_count(h),
            RuleCode::Cv033 => self.meta_count(h),
            RuleCode::Cv034 => self.title_word_count(h),
            RuleCode::Cv035 => self.weakest_h3(m),
            // Derived after the loop in `evaluate`; never dispatched here.
            RuleCode::Cv036 => inconclusive("aggregate derives from the other rules"),
        }
    }

    fn recognized<'a>(
        &self,
        h: &'a ContentHierarchy,
        kind: NodeKind,
    ) -> Option<(usize, &'a ContentNode)> {
        let index = h.recognized_index(kind)?;
        let node = h.node(index)?;
        Some((index, node))
    }

    // CV-001
    fn title_present(&self, h: &ContentHierarchy) -> Verdict {
        match self.recognized(h, NodeKind::Title) {
            Some((index, _)) => Verdict::new(
                RuleStatus::Pass,
                Evidence::Count {
                    actual: h.count(NodeKind::Title),
                },
                "title element present",
            )
            .at(index),
            None => Verdict::new(
                RuleStatus::Fail,
                Evidence::Count { actual: 0 },
                "no title element found",
            ),
        }
    }

    // CV-002
    fn title_length(&self, h: &ContentHierarchy) -> Verdict {
        let Some((index, node)) = self.recognized(h, NodeKind::Title) else {
            return nothing_to_evaluate("no title to measure");
        };
        let chars = node.char_length;
        let (status, message) = if TITLE_LENGTH.contains(&chars) {
            (
                RuleStatus::Pass,
                format!("title length {chars} characters within 50-60"),
            )
        } else if TITLE_LENGTH_SLACK.contains(&chars) {
            (
                RuleStatus::Warn,
                format!("title length {chars} characters slightly over the 50-60 target"),
            )
        } else {
            (
                RuleStatus::Fail,
                format!("title length {chars} characters outside 50-60"),
            )
        };
        Verdict::new(status, Evidence::Length { chars }, message).at(index)
    }

    // CV-003. Single-page analysis cannot see the rest of the site, so a
    // present title passes with a note instead of pretending to compare.
    fn title_uniqueness(&self, h: &ContentHierarchy) -> Verdict {
        match self.recognized(h, NodeKind::Title) {
            Some((index, _)) => Verdict::new(
                RuleStatus::Pass,
                Evidence::None,
                "uniqueness assumed for single-page analysis, verify sitewide",
            )
            .at(index),
            None => nothing_to_evaluate("no title to compare"),
        }
    }

    // CV-004
    fn title_stuffing(&self, h: &ContentHierarchy) -> Verdict {
        let Some((index, node)) = self.recognized(h, NodeKind::Title) else {
            return nothing_to_evaluate("no title to inspect");
        };
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for word in lexical_words(&node.normalized) {
            *counts.entry(word).or_insert(0) += 1;
        }
        let offender = counts
            .iter()
            .filter(|(_, count)| **count > STUFFING_LIMIT)
            .max_by_key(|(_, count)| **count);
        match offender {
            Some((word, count)) => Verdict::new(
                RuleStatus::Warn,
                Evidence::Count { actual: *count },
                format!("word '{word}' repeats {count} times in the title"),
            )
            .at(index),
            None => Verdict::new(
                RuleStatus::Pass,
                Evidence::Count {
                    actual: counts.values().copied().max().unwrap_or(0),
                },
                "no title word repeats more than twice",
            )
            .at(index),
        }
    }

    // CV-005
    fn meta_extends_title(&self, h: &ContentHierarchy) -> Verdict {
        let Some((meta_index, meta)) = self.recognized(h, NodeKind::Meta) else {
            return Verdict::new(
                RuleStatus::Fail,
                Evidence::Count { actual: 0 },
                "meta description missing",
            );
        };
        let Some((_, title)) = self.recognized(h, NodeKind::Title) else {
            return inconclusive("no title to measure the meta against").at(meta_index);
        };
        let title_words: HashSet<&str> = lexical_words(&title.normalized).collect();
        let meta_words: HashSet<&str> = lexical_words(&meta.normalized).collect();
        if meta_words.is_empty() {
            return Verdict::new(
                RuleStatus::Fail,
                Evidence::Ratio {
                    numerator: 0,
                    denominator: 0,
                },
                "meta description has no words",
            )
            .at(meta_index);
        }
        let fresh = meta_words
            .iter()
            .filter(|word| !title_words.contains(*word))
            .count();
        let ratio = fresh as f64 / meta_words.len() as f64;
        let (status, message) = if ratio >= 0.4 {
            (
                RuleStatus::Pass,
                format!(
                    "meta adds {fresh} of {} distinct words beyond the title",
                    meta_words.len()
                ),
            )
        } else if ratio >= 0.2 {
            (
                RuleStatus::Warn,
                format!(
                    "meta mostly repeats the title ({fresh} fresh of {} words)",
                    meta_words.len()
                ),
            )
        } else {
            (
                RuleStatus::Fail,
                format!(
                    "meta restates the title ({fresh} fresh of {} words)",
                    meta_words.len()
                ),
            )
        };
        Verdict::new(
            status,
            Evidence::Ratio {
                numerator: fresh,
                denominator: meta_words.len(),
            },
            message,
        )
        .at(meta_index)
    }

    // CV-006
    fn meta_length(&self, h: &ContentHierarchy) -> Verdict {
        let Some((index, node)) = self.recognized(h, NodeKind::Meta) else {
            return Verdict::new(
                RuleStatus::Fail,
                Evidence::Count { actual: 0 },
                "meta description missing",
            );
        };
        let chars = node.char_length;
        let (status, message) = if META_LENGTH.contains(&chars) {
            (
                RuleStatus::Pass,
                format!("meta length {chars} characters within 150-160"),
            )
        } else {
            (
                RuleStatus::Warn,
                format!("meta length {chars} characters outside 150-160"),
            )
        };
        Verdict::new(status, Evidence::Length { chars }, message).at(index)
    }

    // CV-007
    fn meta_detail(&self, h: &ContentHierarchy) -> Verdict {
        let Some((index, node)) = self.recognized(h, NodeKind::Meta) else {
            return Verdict::new(
                RuleStatus::Fail,
                Evidence::Count { actual: 0 },
                "meta description missing",
            );
        };
        let chars = node.char_length;
        let (status, message) = if chars > META_MIN_DETAIL {
            (
                RuleStatus::Pass,
                format!("meta carries {chars} characters of detail"),
            )
        } else {
            (
                RuleStatus::Warn,
                format!("meta only {chars} characters, aim for more than 100"),
            )
        };
        Verdict::new(status, Evidence::Length { chars }, message).at(index)
    }

    // CV-008
    fn single_h1(&self, h: &ContentHierarchy) -> Verdict {
        let count = h.count(NodeKind::H1);
        let evidence = Evidence::Count { actual: count };
        match count {
            1 => {
                let verdict = Verdict::new(RuleStatus::Pass, evidence, "exactly one h1");
                match h.recognized_index(NodeKind::H1) {
                    Some(index) => verdict.at(index),
                    None => verdict,
                }
            }
            0 => Verdict::new(RuleStatus::Fail, evidence, "no h1 found"),
            n => Verdict::new(
                RuleStatus::Fail,
                evidence,
                format!("found {n} h1 elements, keep exactly one"),
            ),
        }
    }

    // CV-009, CV-020, CV-021 share one shape: band the score when it exists,
    // warn inconclusive when it does not.
    fn relation(
        &self,
        h: &ContentHierarchy,
        m: &SimilarityMatrix,
        relation: RelationKind,
        band: Band,
    ) -> Verdict {
        let (label, subject) = match relation {
            RelationKind::TitleH1 => ("title/h1", h.recognized_index(NodeKind::H1)),
            RelationKind::TitleMeta => ("title/meta", h.recognized_index(NodeKind::Meta)),
            RelationKind::H1Meta => ("h1/meta", h.recognized_index(NodeKind::Meta)),
            RelationKind::H2CoreTopic | RelationKind::H3ParentH2 => ("", None),
        };
        let Some(score) = m.score(relation) else {
            let verdict = inconclusive(format!("{label} similarity unavailable"));
            return match subject {
                Some(index) => verdict.at(index),
                None => verdict,
            };
        };
        let status = band.status(score);
        let message = match status {
            RuleStatus::Pass if score > band.target_max => format!(
                "{label} similarity {score:.2} above the {:.2}-{:.2} target band",
                band.target_min, band.target_max
            ),
            RuleStatus::Pass => format!("{label} similarity {score:.2} within target"),
            RuleStatus::Warn => format!(
                "{label} similarity {score:.2} below the {:.2} target",
                band.target_min
            ),
            RuleStatus::Fail => format!(
                "{label} similarity {score:.2} below the {:.2} minimum",
                band.min
            ),
        };
        let verdict = Verdict::new(status, Evidence::Score { value: score }, message);
        match subject {
            Some(index) => verdict.at(index),
            None => verdict,
        }
    }

    // CV-010
    fn h1_non_empty(&self, h: &ContentHierarchy) -> Verdict {
        match self.recognized(h, NodeKind::H1) {
            Some((index, node)) if !node.normalized.is_empty() => Verdict::new(
                RuleStatus::Pass,
                Evidence::Length {
                    chars: node.char_length,
                },
                "h1 present and non-empty",
            )
            .at(index),
            Some((index, _)) => {
                Verdict::new(RuleStatus::Fail, Evidence::Length { chars: 0 }, "h1 is empty")
                    .at(index)
            }
            None => Verdict::new(RuleStatus::Fail, Evidence::Count { actual: 0 }, "no h1 found"),
        }
    }

    // CV-011
    fn chain_coherence(&self, m: &SimilarityMatrix) -> Verdict {
        let statuses = [
            (RelationKind::TitleMeta, self.title_meta),
            (RelationKind::TitleH1, self.title_h1),
            (RelationKind::H1Meta, self.h1_meta),
        ]
        .map(|(relation, band)| match m.score(relation) {
            Some(score) => band.status(score),
            None => RuleStatus::Warn,
        });
        let passes = statuses.iter().filter(|s| **s == RuleStatus::Pass).count();
        let fails = statuses.iter().filter(|s| **s == RuleStatus::Fail).count();
        let status = if fails > 0 {
            RuleStatus::Fail
        } else if passes == statuses.len() {
            RuleStatus::Pass
        } else {
            RuleStatus::Warn
        };
        Verdict::new(
            status,
            Evidence::Ratio {
                numerator: passes,
                denominator: statuses.len(),
            },
            format!("{passes} of 3 chain relations at target"),
        )
    }

    // CV-012
    fn h2_drift(&self, h: &ContentHierarchy, m: &SimilarityMatrix) -> Verdict {
        let h2_total = h.count(NodeKind::H2);
        if h2_total == 0 {
            return nothing_to_evaluate("no h2 headings to assess");
        }
        let scored = m
            .h2_scores()
            .iter()
            .filter(|(_, score)| score.is_some())
            .count();
        if scored == 0 {
            return inconclusive("h2 similarities unavailable");
        }
        let threshold = self.config.drift_threshold;
        let drifting = m.drifting_h2(threshold);
        let count = drifting.len();
        let (status, message) = if count == 0 {
            (
                RuleStatus::Pass,
                format!("all scored h2 headings hold above {threshold:.2}"),
            )
        } else if count <= self.config.drift_warn_limit {
            (
                RuleStatus::Warn,
                format!("{count} of {h2_total} h2 headings drift below {threshold:.2}"),
            )
        } else {
            (
                RuleStatus::Fail,
                format!("{count} of {h2_total} h2 headings drift below {threshold:.2}"),
            )
        };
        Verdict::new(status, Evidence::Nodes { indices: drifting }, message)
    }

    // CV-013
    fn h2_count(&self, h: &ContentHierarchy) -> Verdict {
        let count = h.count(NodeKind::H2);
        let min = self.config.h2_count_min;
        let max = self.config.h2_count_max;
        let (status, message) = if count < min {
            (
                RuleStatus::Fail,
                format!("only {count} h2 headings, need at least {min}"),
            )
        } else if count > max {
            (
                RuleStatus::Warn,
                format!("{count} h2 headings exceed the recommended {max}"),
            )
        } else {
            (
                RuleStatus::Pass,
                format!("h2 count {count} within {min}-{max}"),
            )
        };
        Verdict::new(status, Evidence::Count { actual: count }, message)
    }

    // CV-014
    fn h2_self_explanatory(&self, h: &ContentHierarchy) -> Verdict {
        let h2s = h.h2_indices();
        if h2s.is_empty() {
            return nothing_to_evaluate("no h2 headings to assess");
        }
        let explanatory = h2s
            .iter()
            .filter(|&&i| h.node(i).is_some_and(|n| n.word_count() >= H2_MIN_WORDS))
            .count();
        let ratio = explanatory as f64 / h2s.len() as f64;
        let evidence = Evidence::Ratio {
            numerator: explanatory,
            denominator: h2s.len(),
        };
        if ratio >= H2_EXPLANATORY_RATIO {
            Verdict::new(
                RuleStatus::Pass,
                evidence,
                format!(
                    "{explanatory} of {} h2 headings carry at least {H2_MIN_WORDS} words",
                    h2s.len()
                ),
            )
        } else {
            Verdict::new(
                RuleStatus::Fail,
                evidence,
                format!(
                    "only {explanatory} of {} h2 headings carry at least {H2_MIN_WORDS} words",
                    h2s.len()
                ),
            )
        }
    }

    // CV-015. The ratio bound is inclusive: exactly half counts as passing.
    fn h2_question_share(&self, h: &ContentHierarchy) -> Verdict {
        let h2s = h.h2_indices();
        if h2s.is_empty() {
            return nothing_to_evaluate("no h2 headings to assess");
        }
        let questions = h2s
            .iter()
            .filter(|&&i| h.node(i).is_some_and(|n| n.is_question()))
            .count();
        let ratio = questions as f64 / h2s.len() as f64;
        let evidence = Evidence::Ratio {
            numerator: questions,
            denominator: h2s.len(),
        };
        if ratio >= H2_QUESTION_RATIO {
            Verdict::new(
                RuleStatus::Pass,
                evidence,
                format!("{questions} of {} h2 headings are questions", h2s.len()),
            )
        } else {
            Verdict::new(
                RuleStatus::Fail,
                evidence,
                format!(
                    "only {questions} of {} h2 headings are questions, target half",
                    h2s.len()
                ),
            )
        }
    }

    // CV-016
    fn h2_duplicates(&self, h: &ContentHierarchy) -> Verdict {
        let h2s = h.h2_indices();
        if h2s.is_empty() {
            return nothing_to_evaluate("no h2 headings to compare");
        }
        let mut seen: HashSet<&str> = HashSet::new();
        let mut duplicates = Vec::new();
        for &index in &h2s {
            if let Some(node) = h.node(index)
                && !seen.insert(node.normalized.as_str())
            {
                duplicates.push(index);
            }
        }
        if duplicates.is_empty() {
            Verdict::new(RuleStatus::Pass, Evidence::Count { actual: 0 }, "h2 headings distinct")
        } else {
            Verdict::new(
                RuleStatus::Fail,
                Evidence::Nodes {
                    indices: duplicates,
                },
                "duplicate h2 headings found",
            )
        }
    }

    // CV-017
    fn h3_nesting(&self, h: &ContentHierarchy) -> Verdict {
        if h.h3_indices().is_empty() {
            return nothing_to_evaluate("no h3 headings to assess");
        }
        let orphans = h.orphan_h3_indices();
        if orphans.is_empty() {
            Verdict::new(
                RuleStatus::Pass,
                Evidence::Count { actual: 0 },
                "every h3 sits under an h2",
            )
        } else {
            let count = orphans.len();
            Verdict::new(
                RuleStatus::Warn,
                Evidence::Nodes { indices: orphans },
                format!("{count} h3 headings not nested under any h2"),
            )
        }
    }

    // CV-018
    fn level_skip(&self, h: &ContentHierarchy) -> Verdict {
        if h.h3_indices().is_empty() {
            return nothing_to_evaluate("no h3 headings to assess");
        }
        let orphans = h.orphan_h3_indices();
        if orphans.is_empty() {
            Verdict::new(
                RuleStatus::Pass,
                Evidence::Count { actual: 0 },
                "no hierarchy level skipped",
            )
        } else {
            Verdict::new(
                RuleStatus::Fail,
                Evidence::Nodes { indices: orphans },
                "h3 appears before any h2",
            )
        }
    }

    // CV-019
    fn h3_parent_mean(&self, m: &SimilarityMatrix) -> Verdict {
        let pairs = m.h3_scores();
        if pairs.is_empty() {
            return nothing_to_evaluate("no nested h3 headings to score");
        }
        let scores: Vec<f32> = pairs.iter().filter_map(|(_, _, score)| *score).collect();
        if scores.is_empty() {
            return inconclusive("h3 similarities unavailable");
        }
        let mean = scores.iter().sum::<f32>() / scores.len() as f32;
        let floor = self.config.h3_parent_mean_min;
        let status = if mean >= floor {
            RuleStatus::Pass
        } else {
            RuleStatus::Fail
        };
        Verdict::new(
            status,
            Evidence::Score { value: mean },
            format!("mean h3/parent similarity {mean:.2}, floor {floor:.2}"),
        )
    }

    // CV-022
    fn h2_core_mean(&self, h: &ContentHierarchy, m: &SimilarityMatrix) -> Verdict {
        if h.count(NodeKind::H2) == 0 {
            return nothing_to_evaluate("no h2 headings to score");
        }
        let scores: Vec<f32> = m
            .h2_scores()
            .iter()
            .filter_map(|(_, score)| *score)
            .collect();
        if scores.is_empty() {
            return inconclusive("h2 similarities unavailable");
        }
        let mean = scores.iter().sum::<f32>() / scores.len() as f32;
        let floor = self.config.h2_core_mean_min;
        let status = if mean >= floor {
            RuleStatus::Pass
        } else {
            RuleStatus::Fail
        };
        Verdict::new(
            status,
            Evidence::Score { value: mean },
            format!("mean h2/core similarity {mean:.2}, floor {floor:.2}"),
        )
    }

    // CV-023
    fn h2_core_spread(&self, h: &ContentHierarchy, m: &SimilarityMatrix) -> Verdict {
        if h.count(NodeKind::H2) == 0 {
            return nothing_to_evaluate("no h2 headings to compare");
        }
        let scores: Vec<f32> = m
            .h2_scores()
            .iter()
            .filter_map(|(_, score)| *score)
            .collect();
        if scores.is_empty() {
            return inconclusive("h2 similarities unavailable");
        }
        let (lowest, highest) = scores
            .iter()
            .copied()
            .fold((f32::MAX, f32::MIN), |(lo, hi), s| (lo.min(s), hi.max(s)));
        let spread = highest - lowest;
        let limit = self.config.h2_core_spread_max;
        let status = if spread <= limit {
            RuleStatus::Pass
        } else {
            RuleStatus::Fail
        };
        Verdict::new(
            status,
            Evidence::Score { value: spread },
            format!("h2 coverage spread {spread:.2}, limit {limit:.2}"),
        )
    }

    // CV-024
    fn h3_group_balance(&self, h: &ContentHierarchy) -> Verdict {
        if h.h3_indices().is_empty() {
            return nothing_to_evaluate("no h3 groups to balance");
        }
        let lonely: Vec<usize> = h
            .h2_indices()
            .into_iter()
            .filter(|&i| h.children_of(i).len() == 1)
            .collect();
        if lonely.is_empty() {
            Verdict::new(
                RuleStatus::Pass,
                Evidence::Count { actual: 0 },
                "no h2 carries a single lonely h3",
            )
        } else {
            let count = lonely.len();
            Verdict::new(
                RuleStatus::Warn,
                Evidence::Nodes { indices: lonely },
                format!("{count} h2 headings carry exactly one h3"),
            )
        }
    }

    // CV-025
    fn h2_lengths(&self, h: &ContentHierarchy) -> Verdict {
        self.length_band(h, NodeKind::H2, H2_LENGTH, "h2")
    }

    // CV-026
    fn h3_lengths(&self, h: &ContentHierarchy) -> Verdict {
        self.length_band(h, NodeKind::H3, H3_LENGTH, "h3")
    }

    fn length_band(
        &self,
        h: &ContentHierarchy,
        kind: NodeKind,
        band: RangeInclusive<usize>,
        label: &str,
    ) -> Verdict {
        let indices = h.indices_of(kind);
        if indices.is_empty() {
            return nothing_to_evaluate(format!("no {label} headings to measure"));
        }
        let violators: Vec<usize> = indices
            .into_iter()
            .filter(|&i| h.node(i).is_some_and(|n| !band.contains(&n.char_length)))
            .collect();
        if violators.is_empty() {
            Verdict::new(
                RuleStatus::Pass,
                Evidence::Count { actual: 0 },
                format!(
                    "all {label} lengths within {}-{} characters",
                    band.start(),
                    band.end()
                ),
            )
        } else {
            let count = violators.len();
            Verdict::new(
                RuleStatus::Warn,
                Evidence::Nodes { indices: violators },
                format!(
                    "{count} {label} headings outside {}-{} characters",
                    band.start(),
                    band.end()
                ),
            )
        }
    }

    // CV-027
    fn h3_volume(&self, h: &ContentHierarchy) -> Verdict {
        let h3_count = h.count(NodeKind::H3);
        if h3_count == 0 {
            return nothing_to_evaluate("no h3 headings to count");
        }
        let h2_count = h.count(NodeKind::H2);
        let evidence = Evidence::Ratio {
            numerator: h3_count,
            denominator: h2_count,
        };
        if h3_count <= h2_count * H3_PER_H2_FACTOR {
            Verdict::new(
                RuleStatus::Pass,
                evidence,
                format!("{h3_count} h3 within {H3_PER_H2_FACTOR}x of {h2_count} h2"),
            )
        } else {
            Verdict::new(
                RuleStatus::Fail,
                evidence,
                format!("{h3_count} h3 for {h2_count} h2 exceeds the {H3_PER_H2_FACTOR}x limit"),
            )
        }
    }

    // CV-028. Separators count on the original text, not the normalized form.
    fn title_separators(&self, h: &ContentHierarchy) -> Verdict {
        let Some((index, node)) = self.recognized(h, NodeKind::Title) else {
            return nothing_to_evaluate("no title to inspect");
        };
        let separators = node
            .text
            .chars()
            .filter(|c| matches!(c, '-' | '|' | ':'))
            .count();
        let (status, message) = if separators <= TITLE_SEPARATOR_MAX {
            (
                RuleStatus::Pass,
                format!("title uses {separators} separators"),
            )
        } else {
            (
                RuleStatus::Warn,
                format!("title uses {separators} separators, keep at most {TITLE_SEPARATOR_MAX}"),
            )
        };
        Verdict::new(status, Evidence::Count { actual: separators }, message).at(index)
    }

    // CV-029
    fn keyword_echo(&self, h: &ContentHierarchy) -> Verdict {
        let Some((index, title)) = self.recognized(h, NodeKind::Title) else {
            return nothing_to_evaluate("no title to extract a keyword from");
        };
        let Some(keyword) = top_keyword(title) else {
            return nothing_to_evaluate("title has no words");
        };
        let echoes = h
            .nodes()
            .iter()
            .filter(|node| lexical_words(&node.normalized).any(|word| word == keyword))
            .count();
        let (status, message) = if KEYWORD_ECHO.contains(&echoes) {
            (
                RuleStatus::Pass,
                format!("keyword '{keyword}' appears in {echoes} hierarchy elements"),
            )
        } else {
            (
                RuleStatus::Warn,
                format!("keyword '{keyword}' appears in {echoes} hierarchy elements, target 3-5"),
            )
        };
        Verdict::new(status, Evidence::Count { actual: echoes }, message).at(index)
    }

    // CV-030
    fn all_caps_headings(&self, h: &ContentHierarchy) -> Verdict {
        let shouting: Vec<usize> = h
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                matches!(node.kind, NodeKind::H1 | NodeKind::H2 | NodeKind::H3)
                    && node.is_all_caps()
            })
            .map(|(i, _)| i)
            .collect();
        let has_headings = h
            .nodes()
            .iter()
            .any(|node| matches!(node.kind, NodeKind::H1 | NodeKind::H2 | NodeKind::H3));
        if !has_headings {
            return nothing_to_evaluate("no headings to inspect");
        }
        if shouting.is_empty() {
            Verdict::new(
                RuleStatus::Pass,
                Evidence::Count { actual: 0 },
                "no all-caps headings",
            )
        } else {
            let count = shouting.len();
            Verdict::new(
                RuleStatus::Warn,
                Evidence::Nodes { indices: shouting },
                format!("{count} headings written in all caps"),
            )
        }
    }

    // CV-031
    fn h1_position(&self, h: &ContentHierarchy) -> Verdict {
        let h2s = h.h2_indices();
        if h2s.is_empty() {
            return nothing_to_evaluate("no h2 headings to order");
        }
        let Some((h1_index, h1)) = self.recognized(h, NodeKind::H1) else {
            return nothing_to_evaluate("no h1 to order against");
        };
        let out_of_order: Vec<usize> = h2s
            .into_iter()
            .filter(|&i| h.node(i).is_some_and(|n| n.order < h1.order))
            .collect();
        if out_of_order.is_empty() {
            Verdict::new(
                RuleStatus::Pass,
                Evidence::Count { actual: 0 },
                "h1 precedes every h2",
            )
            .at(h1_index)
        } else {
            let count = out_of_order.len();
            Verdict::new(
                RuleStatus::Fail,
                Evidence::Nodes {
                    indices: out_of_order,
                },
                format!("{count} h2 headings appear before the h1"),
            )
        }
    }

    // CV-032
    fn title_count(&self, h: &ContentHierarchy) -> Verdict {
        let count = h.count(NodeKind::Title);
        let evidence = Evidence::Count { actual: count };
        match count {
            1 => Verdict::new(RuleStatus::Pass, evidence, "exactly one title"),
            0 => Verdict::new(RuleStatus::Fail, evidence, "no title element"),
            n => Verdict::new(
                RuleStatus::Fail,
                evidence,
                format!("found {n} title elements, keep exactly one"),
            ),
        }
    }

    // CV-033
    fn meta_count(&self, h: &ContentHierarchy) -> Verdict {
        let count = h.count(NodeKind::Meta);
        let evidence = Evidence::Count { actual: count };
        if count <= 1 {
            Verdict::new(RuleStatus::Pass, evidence, "at most one meta description")
        } else {
            Verdict::new(
                RuleStatus::Warn,
                evidence,
                format!("found {count} meta descriptions, keep one"),
            )
        }
    }

    // CV-034
    fn title_word_count(&self, h: &ContentHierarchy) -> Verdict {
        let Some((index, node)) = self.recognized(h, NodeKind::Title) else {
            return nothing_to_evaluate("no title to measure");
        };
        let words = node.word_count();
        let (status, message) = if TITLE_WORDS.contains(&words) {
            (RuleStatus::Pass, format!("title carries {words} words"))
        } else {
            (
                RuleStatus::Warn,
                format!("title carries {words} words, target 4-12"),
            )
        };
        Verdict::new(status, Evidence::Count { actual: words }, message).at(index)
    }

    // CV-035
    fn weakest_h3(&self, m: &SimilarityMatrix) -> Verdict {
        let pairs = m.h3_scores();
        if pairs.is_empty() {
            return nothing_to_evaluate("no nested h3 headings to score");
        }
        let weakest = pairs
            .iter()
            .filter_map(|(h3, _, score)| score.map(|value| (*h3, value)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let Some((index, score)) = weakest else {
            return inconclusive("h3 similarities unavailable");
        };
        let floor = self.config.h3_parent_floor;
        let status = if score >= floor {
            RuleStatus::Pass
        } else {
            RuleStatus::Fail
        };
        Verdict::new(
            status,
            Evidence::Score { value: score },
            format!("weakest h3/parent similarity {score:.2}, floor {floor:.2}"),
        )
        .at(index)
    }
}

/// Most frequent comparison word of the title with at least four characters,
/// ties broken by first appearance. Falls back to all words when the title
/// has only short ones.
fn top_keyword(title: &ContentNode) -> Option<&str> {
    let words: Vec<&str> = lexical_words(&title.normalized).collect();
    if words.is_empty() {
        return None;
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in &words {
        *counts.entry(word).or_insert(0) += 1;
    }
    let count_of = |word: &str| counts.get(word).copied().unwrap_or(0);

    let long: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| w.chars().count() >= KEYWORD_MIN_CHARS)
        .collect();
    let eligible = if long.is_empty() { words } else { long };
    let best = eligible.iter().map(|w| count_of(w)).max()?;
    eligible.into_iter().find(|w| count_of(w) == best)
}
