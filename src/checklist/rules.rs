//! The static rule catalogue. Evaluation walks this table in order, so the
//! result list always carries exactly one entry per code, CV-001 first and
//! the aggregate CV-036 last.

use crate::constants::CHECKLIST_RULE_COUNT;

use super::types::{Priority, RuleCode};

/// One catalogue row: identity, weight tier, and the human summary used as a
/// message prefix.
#[derive(Debug, Clone, Copy)]
pub struct RuleDef {
    pub code: RuleCode,
    pub priority: Priority,
    pub summary: &'static str,
}

pub const RULES: [RuleDef; CHECKLIST_RULE_COUNT] = [
    RuleDef {
        code: RuleCode::Cv001,
        priority: Priority::Critical,
        summary: "title element present",
    },
    RuleDef {
        code: RuleCode::Cv002,
        priority: Priority::High,
        summary: "title length within 50-60 characters",
    },
    RuleDef {
        code: RuleCode::Cv003,
        priority: Priority::High,
        summary: "title unique across the site",
    },
    RuleDef {
        code: RuleCode::Cv004,
        priority: Priority::High,
        summary: "no keyword stuffing in the title",
    },
    RuleDef {
        code: RuleCode::Cv005,
        priority: Priority::High,
        summary: "meta description extends the title",
    },
    RuleDef {
        code: RuleCode::Cv006,
        priority: Priority::Medium,
        summary: "meta description length within 150-160 characters",
    },
    RuleDef {
        code: RuleCode::Cv007,
        priority: Priority::Medium,
        summary: "meta description longer than 100 characters",
    },
    RuleDef {
        code: RuleCode::Cv008,
        priority: Priority::Critical,
        summary: "exactly one h1",
    },
    RuleDef {
        code: RuleCode::Cv009,
        priority: Priority::Critical,
        summary: "title and h1 semantically aligned",
    },
    RuleDef {
        code: RuleCode::Cv010,
        priority: Priority::High,
        summary: "h1 present and non-empty",
    },
    RuleDef {
        code: RuleCode::Cv011,
        priority: Priority::Critical,
        summary: "title, meta, and h1 form a coherent chain",
    },
    RuleDef {
        code: RuleCode::Cv012,
        priority: Priority::Critical,
        summary: "h2 headings stay on the core topic",
    },
    RuleDef {
        code: RuleCode::Cv013,
        priority: Priority::High,
        summary: "h2 count within the recommended band",
    },
    RuleDef {
        code: RuleCode::Cv014,
        priority: Priority::High,
        summary: "h2 headings self-explanatory",
    },
    RuleDef {
        code: RuleCode::Cv015,
        priority: Priority::Medium,
        summary: "h2 headings phrased as questions",
    },
    RuleDef {
        code: RuleCode::Cv016,
        priority: Priority::Medium,
        summary: "no duplicate h2 headings",
    },
    RuleDef {
        code: RuleCode::Cv017,
        priority: Priority::High,
        summary: "every h3 nested under an h2",
    },
    RuleDef {
        code: RuleCode::Cv018,
        priority: Priority::High,
        summary: "no hierarchy level skipped",
    },
    RuleDef {
        code: RuleCode::Cv019,
        priority: Priority::Medium,
        summary: "h3 headings close to their parent h2",
    },
    RuleDef {
        code: RuleCode::Cv020,
        priority: Priority::High,
        summary: "title and meta semantically aligned",
    },
    RuleDef {
        code: RuleCode::Cv021,
        priority: Priority::High,
        summary: "h1 and meta semantically aligned",
    },
    RuleDef {
        code: RuleCode::Cv022,
        priority: Priority::High,
        summary: "h2 headings close to the core topic",
    },
    RuleDef {
        code: RuleCode::Cv023,
        priority: Priority::Medium,
        summary: "h2 topical coverage evenly spread",
    },
    RuleDef {
        code: RuleCode::Cv024,
        priority: Priority::Medium,
        summary: "h3 groups balanced",
    },
    RuleDef {
        code: RuleCode::Cv025,
        priority: Priority::Medium,
        summary: "h2 length within 20-70 characters",
    },
    RuleDef {
        code: RuleCode::Cv026,
        priority: Priority::Medium,
        summary: "h3 length within 15-60 characters",
    },
    RuleDef {
        code: RuleCode::Cv027,
        priority: Priority::Medium,
        summary: "h3 count proportional to h2 count",
    },
    RuleDef {
        code: RuleCode::Cv028,
        priority: Priority::Medium,
        summary: "title uses at most two separators",
    },
    RuleDef {
        code: RuleCode::Cv029,
        priority: Priority::Medium,
        summary: "top title keyword echoed through the hierarchy",
    },
    RuleDef {
        code: RuleCode::Cv030,
        priority: Priority::Medium,
        summary: "no all-caps headings",
    },
    RuleDef {
        code: RuleCode::Cv031,
        priority: Priority::Medium,
        summary: "h1 precedes every h2",
    },
    RuleDef {
        code: RuleCode::Cv032,
        priority: Priority::High,
        summary: "exactly one title",
    },
    RuleDef {
        code: RuleCode::Cv033,
        priority: Priority::Medium,
        summary: "at most one meta description",
    },
    RuleDef {
        code: RuleCode::Cv034,
        priority: Priority::Medium,
        summary: "title word count within 4-12",
    },
    RuleDef {
        code: RuleCode::Cv035,
        priority: Priority::Medium,
        summary: "weakest h3 still related to its parent",
    },
    RuleDef {
        code: RuleCode::Cv036,
        priority: Priority::Critical,
        summary: "aggregate coherence score",
    },
];

/// Looks up the catalogue row for a code.
pub fn rule_def(code: RuleCode) -> &'static RuleDef {
    // ALL and RULES share one ordering, so the position is the index.
    let index = RuleCode::ALL
        .iter()
        .position(|c| *c == code)
        .unwrap_or_default();
    &RULES[index]
}
