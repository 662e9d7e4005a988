//! Golden tests for the trust loop.
//!
//! These tests lock the end-to-end decision behavior:
//! - two Generator calls per cycle, three when regenerating
//! - regeneration sees only the original question
//! - exactly one run record per completed cycle

use std::sync::Arc;
use tempfile::TempDir;
use trust_common::{
    critic_user_prompt, Action, FakeGenerator, JsonlRunLog, MemoryRunLog, TextRunLog, TrustLoop,
    Verdict, ANSWER_SYSTEM_PROMPT, CRITIC_SYSTEM_PROMPT, SAFE_SYSTEM_PROMPT,
};

const QUESTION: &str = "Who wrote the 1998 paper proving P = NP?";
const ANSWER: &str = "Nobody did; P vs NP is still open.";
const SAFE_ANSWER: &str = "No such proof exists as far as is known.";

struct Harness {
    answer: Arc<FakeGenerator>,
    critic: Arc<FakeGenerator>,
    sink: Arc<MemoryRunLog>,
    trust: TrustLoop,
}

/// Helper wiring fakes: the answer fake replies ANSWER then SAFE_ANSWER
fn harness(critique: &str) -> Harness {
    let answer = Arc::new(FakeGenerator::sequence(&[ANSWER, SAFE_ANSWER]));
    let critic = Arc::new(FakeGenerator::always(critique));
    let sink = Arc::new(MemoryRunLog::new());
    let trust = TrustLoop::new(answer.clone(), critic.clone(), sink.clone());
    Harness {
        answer,
        critic,
        sink,
        trust,
    }
}

/// GOLDEN: scenario A - high score accepted
#[test]
fn golden_accept() {
    let h = harness("Trust Score: 9/10\nVerdict: TRUST\nReason: accurate.");
    let report = h.trust.run_cycle(QUESTION).unwrap();

    assert_eq!(report.score(), Some(9));
    assert_eq!(report.critique.verdict, Some(Verdict::Trust));
    assert_eq!(report.action, Action::Accept);
    assert!(!report.was_regenerated());
    assert_eq!(h.answer.call_count(), 1);
    assert_eq!(h.critic.call_count(), 1);
}

/// GOLDEN: scenario B - low score + DO NOT TRUST regenerates from the question only
#[test]
fn golden_regenerate() {
    let critique = "Trust Score: 3/10\nVerdict: DO NOT TRUST\nReason: fabricated citation.";
    let h = harness(critique);
    let report = h.trust.run_cycle(QUESTION).unwrap();

    assert_eq!(report.score(), Some(3));
    assert_eq!(report.action, Action::Regenerate);
    assert_eq!(report.record.regenerated_answer.as_deref(), Some(SAFE_ANSWER));

    let calls = h.answer.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].role_prompt, SAFE_SYSTEM_PROMPT);
    assert_eq!(calls[1].user_content, QUESTION);
    assert!(!calls[1].user_content.contains(ANSWER));
    assert!(!calls[1].user_content.contains(critique));
}

/// GOLDEN: scenario C - middling score cautions
#[test]
fn golden_caution() {
    let h = harness("Trust Score: 6/10\nVerdict: CAUTION\nReason: minor ambiguity.");
    let report = h.trust.run_cycle(QUESTION).unwrap();

    assert_eq!(report.score(), Some(6));
    assert_eq!(report.action, Action::Caution);
    assert!(!report.was_regenerated());
    assert_eq!(h.answer.call_count(), 1);
}

/// GOLDEN: scenario D - unparseable critique is unscored but still logged
#[test]
fn golden_unscored() {
    let h = harness("I cannot evaluate this.");
    let report = h.trust.run_cycle(QUESTION).unwrap();

    assert_eq!(report.score(), None);
    assert_eq!(report.action, Action::Unscored);
    assert_eq!(h.sink.len(), 1);
    assert_eq!(h.sink.records()[0].critique, "I cannot evaluate this.");
}

/// GOLDEN: scenario E - low score without DO NOT TRUST is only a caution
#[test]
fn golden_low_score_without_distrust() {
    let h = harness("Trust Score: 2/10\nVerdict: CAUTION\nReason: weak support.");
    let report = h.trust.run_cycle(QUESTION).unwrap();

    assert_eq!(report.score(), Some(2));
    assert_eq!(report.action, Action::Caution);
    assert!(!report.was_regenerated());
    assert_eq!(h.answer.call_count(), 1);
}

#[test]
fn test_prompts_sent_to_each_role() {
    let h = harness("Trust Score: 9/10\nVerdict: TRUST\nReason: accurate.");
    h.trust.run_cycle(QUESTION).unwrap();

    let answer_call = &h.answer.calls()[0];
    assert_eq!(answer_call.role_prompt, ANSWER_SYSTEM_PROMPT);
    assert_eq!(answer_call.user_content, QUESTION);

    let critic_call = &h.critic.calls()[0];
    assert_eq!(critic_call.role_prompt, CRITIC_SYSTEM_PROMPT);
    assert_eq!(critic_call.user_content, critic_user_prompt(QUESTION, ANSWER));
}

#[test]
fn test_empty_question_is_forwarded() {
    let h = harness("Trust Score: 8/10\nVerdict: TRUST\nReason: fine.");
    let report = h.trust.run_cycle("").unwrap();

    assert_eq!(h.answer.calls()[0].user_content, "");
    assert_eq!(report.record.question, "");
    assert_eq!(h.sink.len(), 1);
}

#[test]
fn test_one_record_per_cycle_with_identical_content() {
    let answer = Arc::new(FakeGenerator::always(ANSWER));
    let critic = Arc::new(FakeGenerator::always("Trust Score: 7/10\nVerdict: CAUTION\nReason: ok."));
    let sink = Arc::new(MemoryRunLog::new());
    let trust = TrustLoop::new(answer, critic, sink.clone());

    trust.run_cycle(QUESTION).unwrap();
    trust.run_cycle(QUESTION).unwrap();

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].question, records[1].question);
    assert_eq!(records[0].answer, records[1].answer);
    assert_eq!(records[0].critique, records[1].critique);
    assert!(records[0].timestamp <= records[1].timestamp);
}

#[test]
fn test_text_log_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("runs.txt");
    let answer = Arc::new(FakeGenerator::sequence(&[ANSWER, SAFE_ANSWER]));
    let critic = Arc::new(FakeGenerator::always(
        "Trust Score: 3/10\nVerdict: DO NOT TRUST\nReason: fabricated citation.",
    ));
    let trust = TrustLoop::new(answer, critic, Arc::new(TextRunLog::new(&path)));

    trust.run_cycle(QUESTION).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with(&format!("\n{}\nTimestamp: ", "=".repeat(60))));
    assert!(contents.contains(&format!("QUESTION:\n{}\n\n", QUESTION)));
    assert!(contents.contains(&format!("ANSWER:\n{}\n\n", ANSWER)));
    assert!(contents.contains("CRITIC:\nTrust Score: 3/10\nVerdict: DO NOT TRUST\nReason: fabricated citation.\n\n"));
    assert!(contents.ends_with(&format!("REGENERATED ANSWER:\n{}\n\n", SAFE_ANSWER)));
}

#[test]
fn test_jsonl_log_end_to_end() {
    let dir = TempDir::new().unwrap();
    let log = Arc::new(JsonlRunLog::new(dir.path().join("runs.jsonl")));
    let answer = Arc::new(FakeGenerator::always(ANSWER));
    let critic = Arc::new(FakeGenerator::always("Trust Score: 10/10\nVerdict: TRUST"));
    let trust = TrustLoop::new(answer, critic, log.clone());

    trust.run_cycle("first").unwrap();
    trust.run_cycle("second").unwrap();

    let records = log.read_all().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].question, "first");
    assert_eq!(records[1].question, "second");
    assert!(records.iter().all(|r| r.regenerated_answer.is_none()));
}
