//! Content guardrail evaluation
//!
//! The guard runs at two checkpoints per pipeline: on the raw input prompt
//! before any generation call, and on the generated draft before asset
//! generation. Evaluation is deterministic and side-effect-free (no
//! network, no retry policy) so it can run synchronously in the hot path.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::GuardrailMode;

/// Outcome of one guardrail checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Pass,
    Flag,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub decision: Decision,
    pub reasons: Vec<String>,
}

impl Verdict {
    pub fn is_block(&self) -> bool {
        self.decision == Decision::Block
    }

    pub fn is_flag(&self) -> bool {
        self.decision == Decision::Flag
    }
}

/// A heuristic returns a reason when the text trips it
type Heuristic = fn(&str) -> Option<String>;

/// Static rule set for one guardrail mode
struct RuleSet {
    blocked_terms: &'static [&'static str],
    flagged_terms: &'static [&'static str],
    heuristics: &'static [Heuristic],
}

const BEDTIME_BLOCKED: &[&str] = &[
    "kill", "killed", "blood", "gun", "knife", "murder", "weapon", "dead", "death", "hate",
    "terrify", "terrified",
];

const BEDTIME_FLAGGED: &[&str] = &[
    "scary", "monster", "ghost", "witch", "storm", "nightmare", "afraid",
];

const BRAND_BLOCKED: &[&str] = &["damn", "hell", "stupid", "idiot", "hate", "sucks"];

const BRAND_FLAGGED: &[&str] = &["cheapest", "guaranteed", "winner", "prize", "urgent"];

static BEDTIME_RULES: RuleSet = RuleSet {
    blocked_terms: BEDTIME_BLOCKED,
    flagged_terms: BEDTIME_FLAGGED,
    heuristics: &[exclamation_heuristic],
};

static BRAND_RULES: RuleSet = RuleSet {
    blocked_terms: BRAND_BLOCKED,
    flagged_terms: BRAND_FLAGGED,
    heuristics: &[shouting_heuristic, exclamation_heuristic],
};

fn rules_for(mode: GuardrailMode) -> &'static RuleSet {
    match mode {
        GuardrailMode::BedtimeSafety => &BEDTIME_RULES,
        GuardrailMode::BrandCompliance => &BRAND_RULES,
    }
}

/// More than three exclamation marks reads as overstimulating content
fn exclamation_heuristic(text: &str) -> Option<String> {
    let count = text.chars().filter(|c| *c == '!').count();
    if count > 3 {
        Some(format!("excessive exclamation marks ({count})"))
    } else {
        None
    }
}

/// Majority-uppercase text reads as shouting
fn shouting_heuristic(text: &str) -> Option<String> {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 20 {
        return None;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    if upper * 2 > letters.len() {
        Some("excessive all-caps emphasis".to_string())
    } else {
        None
    }
}

/// Evaluates text against the active guardrail rule set
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentGuard;

impl ContentGuard {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate `text` under `mode`, returning a pass/flag/block verdict
    /// with every matched reason
    pub fn evaluate(&self, text: &str, mode: GuardrailMode) -> Verdict {
        let rules = rules_for(mode);
        let words = tokenize(text);

        let mut blocked = Vec::new();
        for term in rules.blocked_terms {
            if words.iter().any(|word| word == term) {
                blocked.push(format!("blocked term \"{term}\""));
            }
        }
        if !blocked.is_empty() {
            return Verdict {
                decision: Decision::Block,
                reasons: blocked,
            };
        }

        let mut flags = Vec::new();
        for term in rules.flagged_terms {
            if words.iter().any(|word| word == term) {
                flags.push(format!("flagged term \"{term}\""));
            }
        }
        for heuristic in rules.heuristics {
            if let Some(reason) = heuristic(text) {
                flags.push(reason);
            }
        }

        if flags.is_empty() {
            Verdict {
                decision: Decision::Pass,
                reasons: Vec::new(),
            }
        } else {
            Verdict {
                decision: Decision::Flag,
                reasons: flags,
            }
        }
    }
}

/// Lowercased whole words; matching on word boundaries so "skillful" never
/// trips "kill"
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(String::from)
        .collect()
}
