//! Session reports with JSON persistence.

use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::progression::MasteryState;
use crate::statistics::{compute_session_stats, SessionStats};
use crate::traits::EvaluationRecord;

/// A complete practice report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Session the records came from, when they all share one.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// Individual evaluation records.
    pub records: Vec<EvaluationRecord>,
    /// Aggregate statistics over `records`.
    pub stats: SessionStats,
    /// Mastery at report time, when known.
    #[serde(default)]
    pub mastery: Option<MasteryState>,
}

impl SessionReport {
    /// Build a report from records, computing the statistics.
    pub fn new(records: Vec<EvaluationRecord>, mastery: Option<MasteryState>) -> Self {
        let session_id = match records.split_first() {
            Some((first, rest)) if rest.iter().all(|r| r.session_id == first.session_id) => {
                Some(first.session_id)
            }
            _ => None,
        };
        let stats = compute_session_stats(&records);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            session_id,
            records,
            stats,
            mastery,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

/// Read records written by [`crate::traits::JsonLinesSink`]. Blank lines are
/// skipped; a malformed line is an error naming its line number.
pub fn load_records_jsonl(path: &Path) -> Result<Vec<EvaluationRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open evaluation log {}", path.display()))?;
    let mut records = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: EvaluationRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid evaluation record", path.display(), i + 1))?;
        records.push(record);
    }
    tracing::debug!(path = %path.display(), count = records.len(), "loaded evaluation log");
    Ok(records)
}
