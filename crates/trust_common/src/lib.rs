//! TrustAgent Common - answer/critic trust loop
//!
//! A fast model answers, a stricter model scores the answer, and a pure
//! policy decides whether to accept, warn, or regenerate with a safer prompt.
//! Every completed cycle is appended to a run log.

pub mod config;
pub mod critique;
pub mod error;
pub mod llm_client;
pub mod policy;
pub mod prompts;
pub mod run_log;
pub mod trust_loop;

pub use config::{LogConfig, ModelConfig, OllamaConfig, TrustConfig};
pub use critique::{detect_verdict, extract_reason, extract_score, Critique, Verdict};
pub use error::TrustError;
pub use llm_client::{FakeGenerator, Generator, LlmError, OllamaClient, RecordedCall};
pub use policy::{decide, decide_critique, decide_with_thresholds, Action, PolicyThresholds};
pub use prompts::{
    critic_user_prompt, RolePrompts, ANSWER_SYSTEM_PROMPT, CRITIC_SYSTEM_PROMPT, SAFE_SYSTEM_PROMPT,
};
pub use run_log::{
    open_sink, JsonlRunLog, LogFormat, MemoryRunLog, RunRecord, RunSink, TextRunLog,
};
pub use trust_loop::{
    is_exit_command, CancelToken, CycleError, CycleEvents, CycleReport, NoEvents, Stage, TrustLoop,
    EXIT_COMMAND,
};
