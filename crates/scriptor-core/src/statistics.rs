//! Aggregate statistics over a log of evaluation records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Dimension;
use crate::traits::EvaluationRecord;

/// Statistics over a set of evaluation records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Total evaluations.
    pub attempts: u32,
    /// Evaluations that passed validation.
    pub validated: u32,
    /// Per-competence statistics keyed by competence code.
    pub per_competence: BTreeMap<String, CompetenceStats>,
    /// Per-letter statistics keyed by letter id.
    pub per_letter: BTreeMap<String, LetterStats>,
}

impl SessionStats {
    pub fn pass_rate(&self) -> f64 {
        rate(self.validated, self.attempts)
    }
}

/// Statistics for one competence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetenceStats {
    pub competence: String,
    pub attempts: u32,
    pub validated: u32,
    pub pass_rate: f64,
    pub mean_aggregate: f64,
    pub best_aggregate: u8,
    /// 1-based attempt number of the first validation, in record order.
    pub attempts_to_validation: Option<u32>,
}

/// Statistics for one letter across all competences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterStats {
    pub letter: String,
    pub attempts: u32,
    pub validated: u32,
    pub pass_rate: f64,
    pub mean_aggregate: f64,
    pub best_aggregate: u8,
    /// Mean sub-score per dimension.
    pub mean_scores: BTreeMap<Dimension, f64>,
}

impl LetterStats {
    /// Dimension with the lowest mean sub-score.
    pub fn weakest(&self) -> Option<Dimension> {
        self.mean_scores
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(d, _)| *d)
    }
}

fn rate(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

fn mean(sum: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Compute statistics over records, taken in the order given.
pub fn compute_session_stats(records: &[EvaluationRecord]) -> SessionStats {
    let mut by_competence: BTreeMap<&str, Vec<&EvaluationRecord>> = BTreeMap::new();
    let mut by_letter: BTreeMap<&str, Vec<&EvaluationRecord>> = BTreeMap::new();
    for r in records {
        by_competence
            .entry(r.evaluation.competence.as_str())
            .or_default()
            .push(r);
        by_letter
            .entry(r.evaluation.letter.as_str())
            .or_default()
            .push(r);
    }

    let per_competence = by_competence
        .into_iter()
        .map(|(code, group)| {
            let attempts = group.len() as u32;
            let validated = group.iter().filter(|r| r.evaluation.validated).count() as u32;
            let total: f64 = group.iter().map(|r| r.evaluation.aggregate as f64).sum();
            let first_validation = group
                .iter()
                .position(|r| r.evaluation.validated)
                .map(|i| i as u32 + 1);
            let stats = CompetenceStats {
                competence: code.to_string(),
                attempts,
                validated,
                pass_rate: rate(validated, attempts),
                mean_aggregate: mean(total, attempts),
                best_aggregate: group.iter().map(|r| r.evaluation.aggregate).max().unwrap_or(0),
                attempts_to_validation: first_validation,
            };
            (code.to_string(), stats)
        })
        .collect();

    let per_letter = by_letter
        .into_iter()
        .map(|(letter, group)| {
            let attempts = group.len() as u32;
            let validated = group.iter().filter(|r| r.evaluation.validated).count() as u32;
            let total: f64 = group.iter().map(|r| r.evaluation.aggregate as f64).sum();
            let mean_scores = Dimension::ALL
                .iter()
                .map(|d| {
                    let sum: f64 = group
                        .iter()
                        .map(|r| r.evaluation.scores.get(*d) as f64)
                        .sum();
                    (*d, mean(sum, attempts))
                })
                .collect();
            let stats = LetterStats {
                letter: letter.to_string(),
                attempts,
                validated,
                pass_rate: rate(validated, attempts),
                mean_aggregate: mean(total, attempts),
                best_aggregate: group.iter().map(|r| r.evaluation.aggregate).max().unwrap_or(0),
                mean_scores,
            };
            (letter.to_string(), stats)
        })
        .collect();

    SessionStats {
        attempts: records.len() as u32,
        validated: records.iter().filter(|r| r.evaluation.validated).count() as u32,
        per_competence,
        per_letter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::tests::sample_evaluation;
    use uuid::Uuid;

    fn record(code: &str, letter: &str, aggregate: u8, validated: bool) -> EvaluationRecord {
        EvaluationRecord::new(
            Uuid::nil(),
            "ex",
            0,
            sample_evaluation(code, letter, aggregate, validated),
        )
    }

    #[test]
    fn empty_log() {
        let stats = compute_session_stats(&[]);
        assert_eq!(stats.attempts, 0);
        assert_eq!(stats.pass_rate(), 0.0);
        assert!(stats.per_competence.is_empty());
    }

    #[test]
    fn per_competence_stats() {
        let records = vec![
            record("C1", "i", 40, false),
            record("C1", "i", 60, false),
            record("C1", "u", 90, true),
            record("C2", "l", 70, true),
        ];
        let stats = compute_session_stats(&records);
        assert_eq!(stats.attempts, 4);
        assert_eq!(stats.validated, 2);
        assert!((stats.pass_rate() - 0.5).abs() < 1e-12);

        let c1 = &stats.per_competence["C1"];
        assert_eq!(c1.attempts, 3);
        assert_eq!(c1.validated, 1);
        assert_eq!(c1.best_aggregate, 90);
        assert!((c1.mean_aggregate - 190.0 / 3.0).abs() < 1e-9);
        assert_eq!(c1.attempts_to_validation, Some(3));

        let c2 = &stats.per_competence["C2"];
        assert_eq!(c2.attempts_to_validation, Some(1));
    }

    #[test]
    fn per_letter_stats() {
        let mut weak_speed = sample_evaluation("C1", "i", 50, false);
        weak_speed.scores.speed = 10;
        let records = vec![
            record("C1", "i", 50, false),
            EvaluationRecord::new(Uuid::nil(), "ex", 0, weak_speed),
        ];
        let stats = compute_session_stats(&records);
        let i = &stats.per_letter["i"];
        assert_eq!(i.attempts, 2);
        assert_eq!(i.validated, 0);
        assert_eq!(i.pass_rate, 0.0);
        assert!((i.mean_scores[&Dimension::Speed] - 30.0).abs() < 1e-9);
        assert!((i.mean_scores[&Dimension::Precision] - 50.0).abs() < 1e-9);
        assert_eq!(i.weakest(), Some(Dimension::Speed));
    }

    #[test]
    fn never_validated_competence() {
        let stats = compute_session_stats(&[record("C3", "o", 10, false)]);
        assert_eq!(stats.per_competence["C3"].attempts_to_validation, None);
    }
}
