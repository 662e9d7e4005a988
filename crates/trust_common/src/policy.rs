//! Regeneration policy: pure decision over the critic's signals.
//!
//! Rules, first match wins:
//! 1. no score                               → Unscored
//! 2. score < 5 and verdict is DO NOT TRUST  → Regenerate
//! 3. score < 8                              → Caution
//! 4. otherwise                              → Accept
//!
//! Rule 2 needs both signals. A low score without the exact
//! `DO NOT TRUST` phrase falls through to Caution.
//!
//! NO I/O - just logic on signals.

use crate::critique::{detect_verdict, Critique, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of the policy for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Accept,
    Caution,
    Regenerate,
    Unscored,
}

impl Action {
    pub fn requires_regeneration(&self) -> bool {
        matches!(self, Action::Regenerate)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::Accept => "ACCEPT",
            Action::Caution => "CAUTION",
            Action::Regenerate => "REGENERATE",
            Action::Unscored => "UNSCORED",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Score cut-offs for the decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyThresholds {
    /// Scores strictly below this may trigger regeneration (default: 5)
    pub regenerate_below: u64,
    /// Minimum score for accept (default: 8)
    pub accept_at: u64,
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            regenerate_below: 5,
            accept_at: 8,
        }
    }
}

/// Decide over the raw critic text.
pub fn decide(score: Option<u64>, critique_text: &str) -> Action {
    decide_signals(score, detect_verdict(critique_text), &PolicyThresholds::default())
}

/// Decide over an already parsed critique. Agrees with [`decide`] on the
/// same text.
pub fn decide_critique(critique: &Critique) -> Action {
    decide_with_thresholds(critique, &PolicyThresholds::default())
}

/// Decide with custom thresholds
pub fn decide_with_thresholds(critique: &Critique, thresholds: &PolicyThresholds) -> Action {
    decide_signals(critique.score, critique.verdict, thresholds)
}

fn decide_signals(
    score: Option<u64>,
    verdict: Option<Verdict>,
    thresholds: &PolicyThresholds,
) -> Action {
    // Rule 1: critic gave no parseable score
    let Some(score) = score else {
        return Action::Unscored;
    };

    // Rule 2: low score AND explicit distrust
    if score < thresholds.regenerate_below && verdict == Some(Verdict::DoNotTrust) {
        return Action::Regenerate;
    }

    // Rule 3: middling (or low without distrust)
    if score < thresholds.accept_at {
        return Action::Caution;
    }

    Action::Accept
}
