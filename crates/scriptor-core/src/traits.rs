//! Evaluation sinks.
//!
//! A session forwards every completed evaluation to an [`EvaluationSink`].
//! Delivery is fire-and-forget: a failing sink is logged by the caller and
//! never affects scoring or mastery.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::Evaluation;

/// One evaluation as delivered to a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Unique record id.
    pub id: Uuid,
    /// Session that produced the evaluation.
    pub session_id: Uuid,
    /// When the record was created.
    pub recorded_at: DateTime<Utc>,
    pub exercise_id: String,
    pub letter_index: usize,
    pub evaluation: Evaluation,
}

impl EvaluationRecord {
    pub fn new(
        session_id: Uuid,
        exercise_id: impl Into<String>,
        letter_index: usize,
        evaluation: Evaluation,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            recorded_at: Utc::now(),
            exercise_id: exercise_id.into(),
            letter_index,
            evaluation,
        }
    }
}

/// Receiver for completed evaluations (analytics, classroom dashboards, logs).
pub trait EvaluationSink: Send + Sync {
    /// Human-readable sink name, used in log lines.
    fn name(&self) -> &str;

    /// Deliver one record.
    fn submit(&self, record: &EvaluationRecord) -> anyhow::Result<()>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EvaluationSink for NoopSink {
    fn name(&self) -> &str {
        "noop"
    }

    fn submit(&self, _record: &EvaluationRecord) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it and its parent directory.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open evaluation log {}", path.display()))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EvaluationSink for JsonLinesSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn submit(&self, record: &EvaluationRecord) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(record).context("failed to serialize record")?;
        line.push('\n');
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("evaluation log lock poisoned"))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<EvaluationRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far.
    pub fn records(&self) -> Vec<EvaluationRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EvaluationSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn submit(&self, record: &EvaluationRecord) -> anyhow::Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink lock poisoned"))?
            .push(record.clone());
        Ok(())
    }
}

impl<S: EvaluationSink + ?Sized> EvaluationSink for std::sync::Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn submit(&self, record: &EvaluationRecord) -> anyhow::Result<()> {
        (**self).submit(record)
    }
}
