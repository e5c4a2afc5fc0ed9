use serde::{Serialize, Serializer};

/// Rule priority tiers, weighted into the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
}

impl Priority {
    /// Weight used by the aggregate coherence score.
    pub fn weight(&self) -> f64 {
        match self {
            Priority::Critical => 3.0,
            Priority::High => 2.0,
            Priority::Medium => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
        }
    }
}

/// Outcome of a single rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Pass,
    Warn,
    Fail,
}

impl RuleStatus {
    /// Contribution toward the weighted pass rate.
    pub fn contribution(&self) -> f64 {
        match self {
            RuleStatus::Pass => 1.0,
            RuleStatus::Warn => 0.5,
            RuleStatus::Fail => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleStatus::Pass => "pass",
            RuleStatus::Warn => "warn",
            RuleStatus::Fail => "fail",
        }
    }
}

impl std::fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

macro_rules! rule_codes {
    ($(($variant:ident, $label:literal)),+ $(,)?) => {
        /// The fixed, enumerated rule set.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum RuleCode {
            $($variant),+
        }

        impl RuleCode {
            /// Every code, in evaluation order.
            pub const ALL: [RuleCode; crate::constants::CHECKLIST_RULE_COUNT] =
                [$(RuleCode::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(RuleCode::$variant => $label),+
                }
            }

            /// Parses a `CV-xxx` label back into a code.
            pub fn parse(label: &str) -> Option<Self> {
                match label.trim() {
                    $($label => Some(RuleCode::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

rule_codes![
    (Cv001, "CV-001"),
    (Cv002, "CV-002"),
    (Cv003, "CV-003"),
    (Cv004, "CV-004"),
    (Cv005, "CV-005"),
    (Cv006, "CV-006"),
    (Cv007, "CV-007"),
    (Cv008, "CV-008"),
    (Cv009, "CV-009"),
    (Cv010, "CV-010"),
    (Cv011, "CV-011"),
    (Cv012, "CV-012"),
    (Cv013, "CV-013"),
    (Cv014, "CV-014"),
    (Cv015, "CV-015"),
    (Cv016, "CV-016"),
    (Cv017, "CV-017"),
    (Cv018, "CV-018"),
    (Cv019, "CV-019"),
    (Cv020, "CV-020"),
    (Cv021, "CV-021"),
    (Cv022, "CV-022"),
    (Cv023, "CV-023"),
    (Cv024, "CV-024"),
    (Cv025, "CV-025"),
    (Cv026, "CV-026"),
    (Cv027, "CV-027"),
    (Cv028, "CV-028"),
    (Cv029, "CV-029"),
    (Cv030, "CV-030"),
    (Cv031, "CV-031"),
    (Cv032, "CV-032"),
    (Cv033, "CV-033"),
    (Cv034, "CV-034"),
    (Cv035, "CV-035"),
    (Cv036, "CV-036"),
];

impl std::fmt::Display for RuleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for RuleCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A three-point similarity band: `score >= target_min` passes,
/// `min <= score < target_min` warns, below `min` fails. Lower bounds are
/// inclusive. `target_max` is advisory and only surfaces in messages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    pub min: f32,
    pub target_min: f32,
    pub target_max: f32,
}

impl Band {
    pub const fn new(min: f32, target_min: f32, target_max: f32) -> Self {
        Self {
            min,
            target_min,
            target_max,
        }
    }

    pub fn status(&self, score: f32) -> RuleStatus {
        if score >= self.target_min {
            RuleStatus::Pass
        } else if score >= self.min {
            RuleStatus::Warn
        } else {
            RuleStatus::Fail
        }
    }

    /// `true` when `0 <= min <= target_min <= target_max <= 1`.
    pub fn is_ordered(&self) -> bool {
        0.0 <= self.min
            && self.min <= self.target_min
            && self.target_min <= self.target_max
            && self.target_max <= 1.0
    }
}

/// What a rule inspected, attached to its result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    /// A structural count (elements, duplicates, repeated words).
    Count { actual: usize },
    /// A character length measured on the original text.
    Length { chars: usize },
    /// A similarity score or derived statistic.
    Score { value: f32 },
    /// A proportion, kept as numerator/denominator for exact display.
    Ratio { numerator: usize, denominator: usize },
    /// Node indices the rule flagged.
    Nodes { indices: Vec<usize> },
    /// The inputs the rule needed could not be computed.
    Unavailable,
    /// The rule needs no evidence beyond its status.
    None,
}

/// Result of one rule evaluation. Every analysis produces exactly one result
/// per code, in catalogue order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistResult {
    pub code: RuleCode,
    pub priority: Priority,
    pub status: RuleStatus,
    pub evidence: Evidence,
    pub message: String,
    /// Index of the node the rule primarily judged, when one exists.
    pub node: Option<usize>,
}

impl ChecklistResult {
    pub fn is_pass(&self) -> bool {
        self.status == RuleStatus::Pass
    }

    pub fn is_warn(&self) -> bool {
        self.status == RuleStatus::Warn
    }

    pub fn is_fail(&self) -> bool {
        self.status == RuleStatus::Fail
    }
}
