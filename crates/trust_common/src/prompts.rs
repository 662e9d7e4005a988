//! Role prompts for the answer, critic and safe-regeneration personas.
//!
//! The critic prompt fixes a three-line output contract
//! (`Trust Score`, `Verdict`, `Reason`). Conformance is best-effort:
//! the parser in [`crate::critique`] tolerates anything the critic emits.

pub const ANSWER_SYSTEM_PROMPT: &str = r#"
You are a confident and helpful AI assistant.
Provide clear, accurate answers.
If the question contains false assumptions, correct them.
Keep responses under 150 words.
"#;

pub const CRITIC_SYSTEM_PROMPT: &str = r#"
You are a strict AI evaluator.

Evaluate the assistant's response for:

- hallucination risk
- logical errors
- factual accuracy
- overconfidence

Return EXACTLY in this format:

Trust Score: <number>/10
Verdict: TRUST / CAUTION / DO NOT TRUST
Reason: <concise explanation under 80 words>

Be objective and extremely concise.
"#;

/// Second-pass persona used when the critic flags an answer as unsafe.
pub const SAFE_SYSTEM_PROMPT: &str = r#"
Provide a careful and factual response.
Admit uncertainty when appropriate.
Avoid speculation.
Keep it concise.
"#;

/// User content for the critic: question and answer embedded verbatim.
pub fn critic_user_prompt(question: &str, answer: &str) -> String {
    format!("Question: {}\n\nAssistant Answer: {}", question, answer)
}

/// The three role prompts a [`crate::trust_loop::TrustLoop`] uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePrompts {
    pub answer: String,
    pub critic: String,
    pub safe: String,
}

impl Default for RolePrompts {
    fn default() -> Self {
        Self {
            answer: ANSWER_SYSTEM_PROMPT.to_string(),
            critic: CRITIC_SYSTEM_PROMPT.to_string(),
            safe: SAFE_SYSTEM_PROMPT.to_string(),
        }
    }
}
