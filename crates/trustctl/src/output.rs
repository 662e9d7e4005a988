//! Terminal rendering for the trust loop.
//!
//! Every policy outcome has its own status line.

use owo_colors::OwoColorize;
use std::io::{self, Write};
use trust_common::{Action, Critique, CycleError};

pub const BANNER: &str = "✅ TrustAgent Initialized";
pub const EXIT_HINT: &str = "Type 'exit' to quit.";
pub const PROMPT: &str = "Ask something: ";
pub const FAREWELL: &str = "Goodbye 👋";

/// Status line shown for each decision
pub fn status_message(action: Action) -> &'static str {
    match action {
        Action::Accept => "✅ Response appears reliable.",
        Action::Caution => "⚠️ Use caution.",
        Action::Regenerate => "🚨 Unsafe answer detected → Regenerating...",
        Action::Unscored => "⚠️ Could not parse trust score.",
    }
}

pub struct Output {
    color: bool,
}

impl Output {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, action: Action) -> String {
        if !self.color {
            return text.to_string();
        }
        match action {
            Action::Accept => text.bright_green().to_string(),
            Action::Caution | Action::Unscored => text.yellow().to_string(),
            Action::Regenerate => text.bright_red().bold().to_string(),
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn banner<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", BANNER)?;
        writeln!(out, "{}", EXIT_HINT)?;
        writeln!(out)
    }

    pub fn prompt<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", PROMPT)?;
        out.flush()
    }

    pub fn farewell<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", FAREWELL)
    }

    /// First answer, shown before the critic is asked
    pub fn answer<W: Write>(&self, out: &mut W, answer: &str) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", self.heading("🤖 Answer Agent:"))?;
        writeln!(out)?;
        writeln!(out, "{}", answer)?;
        out.flush()
    }

    /// Critic text and the decision's status line
    pub fn critique<W: Write>(&self, out: &mut W, critique: &Critique, action: Action) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", self.heading("🧠 Critic Agent:"))?;
        writeln!(out)?;
        writeln!(out, "{}", critique.raw)?;

        writeln!(out)?;
        writeln!(out, "{}", self.paint(status_message(action), action))?;
        writeln!(out)?;
        out.flush()
    }

    pub fn regenerated<W: Write>(&self, out: &mut W, answer: &str) -> io::Result<()> {
        writeln!(out, "{}", self.heading("✅ Regenerated Answer:"))?;
        writeln!(out)?;
        writeln!(out, "{}", answer)?;
        out.flush()
    }

    pub fn cycle_error<W: Write>(&self, err: &mut W, error: &CycleError) -> io::Result<()> {
        let line = format!("[ERROR] {}", error);
        if self.color {
            writeln!(err, "{}", line.bright_red())
        } else {
            writeln!(err, "{}", line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(action: Action, critique: &str, regenerated: Option<&str>) -> String {
        let output = Output::new(false);
        let mut buf = Vec::new();
        output.answer(&mut buf, "the answer").unwrap();
        output.critique(&mut buf, &Critique::parse(critique), action).unwrap();
        if let Some(text) = regenerated {
            output.regenerated(&mut buf, text).unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_status_messages_are_distinct() {
        let all = [Action::Accept, Action::Caution, Action::Regenerate, Action::Unscored];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(status_message(*a), status_message(*b));
            }
        }
    }

    #[test]
    fn test_render_plain() {
        let text = render(Action::Accept, "Trust Score: 9/10", None);

        assert!(text.contains("🤖 Answer Agent:\n\nthe answer\n"));
        assert!(text.contains("🧠 Critic Agent:\n\nTrust Score: 9/10\n"));
        assert!(text.contains("✅ Response appears reliable."));
        assert!(!text.contains("Regenerated Answer"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_render_with_regeneration() {
        let text = render(
            Action::Regenerate,
            "Trust Score: 1/10\nVerdict: DO NOT TRUST",
            Some("safer"),
        );

        let status = text.find("🚨 Unsafe answer detected → Regenerating...").unwrap();
        let regenerated = text.find("✅ Regenerated Answer:\n\nsafer\n").unwrap();
        assert!(status < regenerated);
    }

    #[test]
    fn test_colored_output_has_ansi() {
        let mut buf = Vec::new();
        Output::new(true)
            .critique(&mut buf, &Critique::parse("nothing"), Action::Unscored)
            .unwrap();
        assert!(String::from_utf8(buf).unwrap().contains('\u{1b}'));
    }
}
