//! Trust loop: question → answer → critique → decision → (regeneration) → log.
//!
//! Strictly sequential. Each Generator call blocks until it returns or its
//! deadline expires; the answer, critique and regeneration calls never
//! overlap. A cycle either produces exactly one [`RunRecord`] or a
//! [`CycleError`] and no record.

use crate::critique::Critique;
use crate::error::TrustError;
use crate::llm_client::{Generator, LlmError};
use crate::policy::{decide_critique, Action};
use crate::prompts::{critic_user_prompt, RolePrompts};
use crate::run_log::{RunRecord, RunSink};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Literal that ends the interactive loop (case-insensitive)
pub const EXIT_COMMAND: &str = "exit";

/// Whether an input line asks to terminate. Only the line terminator is
/// stripped; " exit" is a question.
pub fn is_exit_command(input: &str) -> bool {
    input.trim_end_matches(['\n', '\r']).eq_ignore_ascii_case(EXIT_COMMAND)
}

/// Which Generator call a cycle was in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Answer,
    Critique,
    Regeneration,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Answer => "answer",
            Stage::Critique => "critique",
            Stage::Regeneration => "regeneration",
        };
        f.write_str(name)
    }
}

/// Why a cycle did not produce a record
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("{stage} generation failed: {source}")]
    GenerationFailure {
        stage: Stage,
        #[source]
        source: LlmError,
    },

    #[error("{stage} generation timed out after {secs} seconds")]
    GenerationTimeout { stage: Stage, secs: u64 },

    #[error("cycle cancelled before {stage} generation")]
    Cancelled { stage: Stage },

    #[error("failed to append run record: {0}")]
    Persistence(#[from] TrustError),
}

impl CycleError {
    fn from_llm(stage: Stage, error: LlmError) -> Self {
        match error {
            LlmError::Timeout(secs) => CycleError::GenerationTimeout { stage, secs },
            source => CycleError::GenerationFailure { stage, source },
        }
    }

    /// Stage the cycle stopped in, if it stopped in a generation call
    pub fn stage(&self) -> Option<Stage> {
        match self {
            CycleError::GenerationFailure { stage, .. }
            | CycleError::GenerationTimeout { stage, .. }
            | CycleError::Cancelled { stage } => Some(*stage),
            CycleError::Persistence(_) => None,
        }
    }
}

/// Shared cancellation flag, checked before every Generator call
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Clear a previous cancellation so the next cycle can run
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Everything one completed cycle produced
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub record: RunRecord,
    pub critique: Critique,
    pub action: Action,
}

impl CycleReport {
    pub fn score(&self) -> Option<u64> {
        self.critique.score
    }

    pub fn was_regenerated(&self) -> bool {
        self.record.regenerated_answer.is_some()
    }
}

/// Per-stage notifications while a cycle runs, so callers can show each
/// result as soon as it exists. Every method defaults to a no-op.
pub trait CycleEvents {
    /// The first answer is available; the critic has not been called yet.
    fn answer_ready(&self, _answer: &str) {}

    /// The critique is parsed and decided; regeneration (if any) has not started.
    fn critique_ready(&self, _critique: &Critique, _action: Action) {}

    /// The safe regeneration finished.
    fn regenerated(&self, _answer: &str) {}
}

/// Ignores every event
pub struct NoEvents;

impl CycleEvents for NoEvents {}

/// Answer/critic orchestrator
pub struct TrustLoop {
    answer: Arc<dyn Generator>,
    critic: Arc<dyn Generator>,
    sink: Arc<dyn RunSink>,
    prompts: RolePrompts,
    cancel: CancelToken,
}

impl TrustLoop {
    /// `answer` also serves the safe regeneration role.
    pub fn new(
        answer: Arc<dyn Generator>,
        critic: Arc<dyn Generator>,
        sink: Arc<dyn RunSink>,
    ) -> Self {
        Self {
            answer,
            critic,
            sink,
            prompts: RolePrompts::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_prompts(mut self, prompts: RolePrompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn call(
        &self,
        stage: Stage,
        generator: &dyn Generator,
        role_prompt: &str,
        user_content: &str,
    ) -> Result<String, CycleError> {
        if self.cancel.is_cancelled() {
            warn!("Cycle cancelled before {} generation", stage);
            return Err(CycleError::Cancelled { stage });
        }

        info!("Generating {} with {}", stage, generator.model());
        let text = generator
            .generate(role_prompt, user_content)
            .map_err(|e| CycleError::from_llm(stage, e))?;
        debug!("{} text: {}", stage, text);
        Ok(text)
    }

    /// Run one full cycle for `question`. Empty questions are forwarded as-is.
    pub fn run_cycle(&self, question: &str) -> Result<CycleReport, CycleError> {
        self.run_cycle_with_events(question, &NoEvents)
    }

    /// [`TrustLoop::run_cycle`], reporting each stage to `events` as it completes.
    pub fn run_cycle_with_events(
        &self,
        question: &str,
        events: &dyn CycleEvents,
    ) -> Result<CycleReport, CycleError> {
        let answer = self.call(Stage::Answer, self.answer.as_ref(), &self.prompts.answer, question)?;
        events.answer_ready(&answer);

        let critique_text = self.call(
            Stage::Critique,
            self.critic.as_ref(),
            &self.prompts.critic,
            &critic_user_prompt(question, &answer),
        )?;

        let critique = Critique::parse(&critique_text);
        let action = decide_critique(&critique);

        match critique.score {
            Some(score) => info!(
                "Trust score {}/10, verdict {:?} -> {}",
                score, critique.verdict, action
            ),
            None => warn!("Could not parse trust score from critic output -> {}", action),
        }
        events.critique_ready(&critique, action);

        // The regeneration sees the question only, never the rejected answer.
        let regenerated = if action.requires_regeneration() {
            let text = self.call(
                Stage::Regeneration,
                self.answer.as_ref(),
                &self.prompts.safe,
                question,
            )?;
            events.regenerated(&text);
            Some(text)
        } else {
            None
        };

        let record = RunRecord::new(question, &answer, &critique_text).with_regenerated(regenerated);
        self.sink.append(&record)?;
        info!("Run record appended");

        Ok(CycleReport {
            record,
            critique,
            action,
        })
    }
}
