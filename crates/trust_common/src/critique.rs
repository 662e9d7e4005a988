//! Critic output parsing.
//!
//! The critic is a free-text generator. Nothing here fails: every field
//! that cannot be found is simply absent.
//!
//! - Trust score: the leftmost ASCII decimal integer immediately followed by
//!   `/10`. No range clamping, `15/10` yields 15. Other scripts' digits
//!   (fullwidth, Arabic-Indic) are not scores.
//! - Verdict: substring containment on the raw text, `DO NOT TRUST` checked
//!   before `CAUTION` before `TRUST` (the last is a substring of the first).
//! - Reason: whatever follows the first `Reason:` label.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::IntErrorKind;
use std::sync::OnceLock;

const SCORE_PATTERN: &str = r"([0-9]+)/10";
const REASON_PATTERN: &str = r"(?mi)^[ \t]*reason[ \t]*:[ \t]*(.*)$";

fn score_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SCORE_PATTERN).expect("score pattern is a valid regex"))
}

fn reason_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(REASON_PATTERN).expect("reason pattern is a valid regex"))
}

/// Critic's qualitative label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Trust,
    Caution,
    DoNotTrust,
}

impl Verdict {
    /// The literal phrase the critic is asked to write.
    pub fn phrase(&self) -> &'static str {
        match self {
            Verdict::Trust => "TRUST",
            Verdict::Caution => "CAUTION",
            Verdict::DoNotTrust => "DO NOT TRUST",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

/// Extract the trust score from critic output.
///
/// Returns the leftmost `<int>` of an `<int>/10` occurrence. Digit runs
/// that overflow `u64` saturate rather than being dropped.
pub fn extract_score(text: &str) -> Option<u64> {
    let caps = score_regex().captures(text)?;
    let digits = caps.get(1)?.as_str();
    match digits.parse::<u64>() {
        Ok(score) => Some(score),
        Err(e) if e.kind() == &IntErrorKind::PosOverflow => Some(u64::MAX),
        Err(_) => None,
    }
}

/// Infer the verdict from the critic text by substring presence.
pub fn detect_verdict(text: &str) -> Option<Verdict> {
    [Verdict::DoNotTrust, Verdict::Caution, Verdict::Trust]
        .into_iter()
        .find(|v| text.contains(v.phrase()))
}

/// The explanation following the first `Reason:` label, if non-empty.
pub fn extract_reason(text: &str) -> Option<String> {
    reason_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|r| !r.is_empty())
}

/// Critic output parsed once into its structured form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Critique {
    pub score: Option<u64>,
    pub verdict: Option<Verdict>,
    pub reason: Option<String>,
    /// The critic text exactly as received.
    pub raw: String,
}

impl Critique {
    pub fn parse(text: &str) -> Self {
        Self {
            score: extract_score(text),
            verdict: detect_verdict(text),
            reason: extract_reason(text),
            raw: text.to_string(),
        }
    }

    /// Whether the critic followed the full three-line contract.
    pub fn is_well_formed(&self) -> bool {
        self.score.is_some() && self.verdict.is_some() && self.reason.is_some()
    }
}
