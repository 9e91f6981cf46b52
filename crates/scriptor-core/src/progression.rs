//! Competence progression.
//!
//! [`ProgressionTracker`] owns the only mutable state in the core: per
//! competence mastery, advanced by completed evaluations. Choosing what to
//! present next is a pure function of a [`MasteryState`] snapshot and the
//! catalog, so progression is reproducible.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::Evaluation;
use crate::error::{Result, ScribeError};
use crate::model::{Catalog, Exercise};

/// Mastery lifecycle of a competence. `Mastered` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryStatus {
    #[default]
    NotStarted,
    InProgress,
    Mastered,
}

/// Progress on one competence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetenceProgress {
    pub status: MasteryStatus,
    /// Evaluations received, validated or not.
    pub attempts: u32,
    /// Best aggregate score so far.
    pub best_score: u8,
    /// Pen-down time of the evaluation that reached mastery.
    #[serde(default)]
    pub mastered_at: Option<DateTime<Utc>>,
    /// Letters that have passed validation at least once.
    #[serde(default)]
    pub validated_letters: BTreeSet<String>,
}

/// Mastery of every competence a student has touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasteryState {
    #[serde(default)]
    pub competences: BTreeMap<String, CompetenceProgress>,
}

impl MasteryState {
    pub fn progress(&self, code: &str) -> Option<&CompetenceProgress> {
        self.competences.get(code)
    }

    pub fn status(&self, code: &str) -> MasteryStatus {
        self.progress(code).map(|p| p.status).unwrap_or_default()
    }

    pub fn is_mastered(&self, code: &str) -> bool {
        self.status(code) == MasteryStatus::Mastered
    }

    pub fn letter_validated(&self, code: &str, letter: &str) -> bool {
        self.progress(code)
            .is_some_and(|p| p.validated_letters.contains(letter))
    }

    /// Save the state as JSON.
    pub fn save_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize mastery state")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write mastery state to {}", path.display()))?;
        Ok(())
    }

    /// Load a state saved with [`MasteryState::save_json`].
    pub fn load_json(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read mastery state from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse mastery state JSON")
    }
}

/// Owns one student's [`MasteryState`].
#[derive(Debug, Clone, Default)]
pub struct ProgressionTracker {
    state: MasteryState,
}

impl ProgressionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously saved state.
    pub fn from_state(state: MasteryState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &MasteryState {
        &self.state
    }

    pub fn snapshot(&self) -> MasteryState {
        self.state.clone()
    }

    pub fn into_state(self) -> MasteryState {
        self.state
    }

    pub fn progress(&self, code: &str) -> Option<&CompetenceProgress> {
        self.state.progress(code)
    }

    /// Apply a completed evaluation to the competence it was scored for.
    pub fn record_evaluation(
        &mut self,
        code: &str,
        evaluation: &Evaluation,
    ) -> Result<CompetenceProgress> {
        if evaluation.competence != code {
            return Err(ScribeError::InvalidState(format!(
                "evaluation for {} recorded against {code}",
                evaluation.competence
            )));
        }

        let progress = self.state.competences.entry(code.to_string()).or_default();
        let previous = progress.status;

        progress.attempts = progress.attempts.saturating_add(1);
        progress.best_score = progress.best_score.max(evaluation.aggregate);
        if evaluation.validated {
            progress.validated_letters.insert(evaluation.letter.clone());
        }

        progress.status = match (previous, evaluation.validated) {
            (MasteryStatus::Mastered, _) => MasteryStatus::Mastered,
            (_, true) => {
                let mastered_at = DateTime::from_timestamp_millis(evaluation.started_at_ms)
                    .unwrap_or_else(|| {
                        tracing::warn!(
                            competence = code,
                            started_at_ms = evaluation.started_at_ms,
                            "trace start out of range, stamping mastery with current time"
                        );
                        Utc::now()
                    });
                progress.mastered_at = Some(mastered_at);
                tracing::info!(
                    competence = code,
                    attempts = progress.attempts,
                    score = evaluation.aggregate,
                    "competence mastered"
                );
                MasteryStatus::Mastered
            }
            (_, false) => MasteryStatus::InProgress,
        };

        tracing::debug!(
            competence = code,
            letter = %evaluation.letter,
            ?previous,
            status = ?progress.status,
            attempts = progress.attempts,
            "evaluation recorded"
        );

        Ok(progress.clone())
    }

    /// Next exercise for this tracker's state.
    pub fn next_exercise(&self, catalog: &Catalog) -> NextStep {
        next_exercise(&self.state, catalog)
    }
}

/// What the student should do next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum NextStep {
    /// Trace `letter`, the `letter_index`-th target of `exercise_id`.
    Exercise {
        exercise_id: String,
        letter_index: usize,
        letter: String,
    },
    /// No unlocked exercise has letters left.
    CurriculumComplete,
}

fn is_unlocked(state: &MasteryState, catalog: &Catalog, exercise: &Exercise) -> bool {
    catalog
        .competence(&exercise.competence)
        .is_some_and(|c| c.prerequisites.iter().all(|p| state.is_mastered(p)))
}

fn first_open_letter(state: &MasteryState, exercise: &Exercise) -> Option<usize> {
    exercise
        .letters
        .iter()
        .position(|l| !state.letter_validated(&exercise.competence, &l.letter))
}

fn is_started(state: &MasteryState, exercise: &Exercise) -> bool {
    state
        .progress(&exercise.competence)
        .is_some_and(|p| p.attempts > 0 || !p.validated_letters.is_empty())
}

/// Pick the next exercise letter from a mastery snapshot.
///
/// Among unlocked exercises with letters left, the first one already in
/// progress wins, otherwise the first in catalog order.
pub fn next_exercise(state: &MasteryState, catalog: &Catalog) -> NextStep {
    let open: Vec<(&Exercise, usize)> = catalog
        .exercises
        .iter()
        .filter(|e| is_unlocked(state, catalog, e))
        .filter_map(|e| first_open_letter(state, e).map(|i| (e, i)))
        .collect();

    let chosen = open
        .iter()
        .find(|(e, _)| is_started(state, e))
        .or_else(|| open.first());

    match chosen {
        Some((exercise, index)) => NextStep::Exercise {
            exercise_id: exercise.id.clone(),
            letter_index: *index,
            letter: exercise.letters[*index].letter.clone(),
        },
        None => {
            let locked = catalog
                .exercises
                .iter()
                .filter(|e| first_open_letter(state, e).is_some())
                .count();
            if locked > 0 {
                tracing::warn!(
                    "{locked} exercise(s) remain locked behind unmastered prerequisites"
                );
            }
            NextStep::CurriculumComplete
        }
    }
}
