//! Run log: one append-only record per question cycle.
//!
//! Two file layouts:
//! - `Text`: the plain delimited `runs.txt` blocks, byte-compatible with
//!   existing logs.
//! - `Jsonl`: one JSON object per line.

use crate::error::TrustError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Width of the `=` separator line in the text layout
pub const SEPARATOR_WIDTH: usize = 60;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One persisted question/answer/critique cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp: DateTime<Local>,
    pub question: String,
    pub answer: String,
    pub critique: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regenerated_answer: Option<String>,
}

impl RunRecord {
    pub fn new(question: &str, answer: &str, critique: &str) -> Self {
        Self {
            timestamp: Local::now(),
            question: question.to_string(),
            answer: answer.to_string(),
            critique: critique.to_string(),
            regenerated_answer: None,
        }
    }

    pub fn with_regenerated(mut self, regenerated: Option<String>) -> Self {
        self.regenerated_answer = regenerated;
        self
    }

    /// Render in the delimited text layout.
    ///
    /// An empty regenerated answer is omitted like an absent one.
    pub fn to_text_block(&self) -> String {
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(SEPARATOR_WIDTH));
        out.push('\n');
        out.push_str(&format!("Timestamp: {}\n", self.timestamp.format(TIMESTAMP_FORMAT)));
        out.push_str(&format!("QUESTION:\n{}\n\n", self.question));
        out.push_str(&format!("ANSWER:\n{}\n\n", self.answer));
        out.push_str(&format!("CRITIC:\n{}\n\n", self.critique));

        if let Some(regenerated) = self.regenerated_answer.as_deref().filter(|r| !r.is_empty()) {
            out.push_str(&format!("REGENERATED ANSWER:\n{}\n\n", regenerated));
        }

        out
    }
}

/// File layout for the run log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(LogFormat::Text),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(TrustError::Config(format!("unknown log format: {}", other))),
        }
    }
}

/// Append-only persistence capability
pub trait RunSink: Send + Sync {
    fn append(&self, record: &RunRecord) -> Result<(), TrustError>;
}

fn open_append(path: &Path) -> Result<fs::File, TrustError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Delimited text log (`runs.txt`)
pub struct TextRunLog {
    path: PathBuf,
}

impl TextRunLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunSink for TextRunLog {
    fn append(&self, record: &RunRecord) -> Result<(), TrustError> {
        let mut file = open_append(&self.path)?;
        file.write_all(record.to_text_block().as_bytes())?;
        Ok(())
    }
}

/// One JSON object per line
pub struct JsonlRunLog {
    path: PathBuf,
}

impl JsonlRunLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back. Blank lines are skipped, corrupt lines are errors.
    pub fn read_all(&self) -> Result<Vec<RunRecord>, TrustError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(TrustError::from))
            .collect()
    }
}

impl RunSink for JsonlRunLog {
    fn append(&self, record: &RunRecord) -> Result<(), TrustError> {
        let line = serde_json::to_string(record)?;
        let mut file = open_append(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// In-memory sink for tests and embedding
#[derive(Default)]
pub struct MemoryRunLog {
    records: Mutex<Vec<RunRecord>>,
}

impl MemoryRunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<RunRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RunSink for MemoryRunLog {
    fn append(&self, record: &RunRecord) -> Result<(), TrustError> {
        self.records
            .lock()
            .map_err(|_| TrustError::Persistence("memory log poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}

/// Open the file sink for a configured layout.
///
/// The file (and its parent directories) is created here so an unwritable
/// log fails before any question is asked. Nothing is written to it.
pub fn open_sink(path: impl AsRef<Path>, format: LogFormat) -> Result<Box<dyn RunSink>, TrustError> {
    let path = path.as_ref();
    open_append(path).map_err(|e| {
        TrustError::Persistence(format!("cannot open run log {}: {}", path.display(), e))
    })?;

    Ok(match format {
        LogFormat::Text => Box::new(TextRunLog::new(path)),
        LogFormat::Jsonl => Box::new(JsonlRunLog::new(path)),
    })
}
