//! Read-eval-print loop around the trust loop.
//!
//! One line of input is one question. `exit` (any case) or end of input
//! stops the loop. Input bytes that are not UTF-8 are replaced, not rejected.
//! A failed cycle is reported and the loop moves on.

use crate::output::Output;
use anyhow::Result;
use std::borrow::Cow;
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use tracing::{debug, error, warn};
use trust_common::{is_exit_command, Action, Critique, CycleEvents, TrustLoop};

/// Counts for the session, reported at debug level on exit
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub completed: usize,
    pub failed: usize,
}

/// Prints each stage of a cycle as soon as the loop reports it.
/// The first write error is kept and surfaced after the cycle.
struct StagePrinter<'a, W: Write> {
    output: &'a Output,
    out: RefCell<&'a mut W>,
    failed: RefCell<Option<io::Error>>,
}

impl<'a, W: Write> StagePrinter<'a, W> {
    fn new(output: &'a Output, out: &'a mut W) -> Self {
        Self {
            output,
            out: RefCell::new(out),
            failed: RefCell::new(None),
        }
    }

    fn write(&self, f: impl FnOnce(&Output, &mut W) -> io::Result<()>) {
        if self.failed.borrow().is_some() {
            return;
        }
        let mut out = self.out.borrow_mut();
        if let Err(e) = f(self.output, &mut **out) {
            *self.failed.borrow_mut() = Some(e);
        }
    }

    fn finish(self) -> io::Result<()> {
        match self.failed.into_inner() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<W: Write> CycleEvents for StagePrinter<'_, W> {
    fn answer_ready(&self, answer: &str) {
        self.write(|o, out| o.answer(out, answer));
    }

    fn critique_ready(&self, critique: &Critique, action: Action) {
        self.write(|o, out| o.critique(out, critique, action));
    }

    fn regenerated(&self, answer: &str) {
        self.write(|o, out| o.regenerated(out, answer));
    }
}

/// Read one line as raw bytes. Returns `None` at end of input.
fn read_question<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&buf);
    if matches!(line, Cow::Owned(_)) {
        warn!("Input line was not valid UTF-8; invalid bytes replaced");
    }
    Ok(Some(line.into_owned()))
}

pub fn run<R, W, E>(
    trust: &TrustLoop,
    output: &Output,
    mut input: R,
    out: &mut W,
    err: &mut E,
) -> Result<SessionStats>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let mut stats = SessionStats::default();
    output.banner(out)?;

    loop {
        output.prompt(out)?;

        let Some(line) = read_question(&mut input)? else {
            debug!("End of input");
            break;
        };

        if is_exit_command(&line) {
            break;
        }

        let question = line.trim_end_matches(['\n', '\r']);
        let printer = StagePrinter::new(output, out);
        let result = trust.run_cycle_with_events(question, &printer);
        printer.finish()?;

        match result {
            Ok(_) => stats.completed += 1,
            Err(e) => {
                stats.failed += 1;
                error!("Cycle failed: {}", e);
                output.cycle_error(err, &e)?;
            }
        }
    }

    output.farewell(out)?;
    debug!("Session finished: {:?}", stats);
    Ok(stats)
}
