//! Practice session orchestration.
//!
//! A [`Session`] ties one student's [`ProgressionTracker`] to a catalog, an
//! [`Evaluator`] and an [`EvaluationSink`]. Sessions share nothing with each
//! other except the read-only catalog.

use std::sync::Arc;

use uuid::Uuid;

use crate::engine::{Evaluation, EvaluationConfig, Evaluator};
use crate::error::{Result, ScribeError};
use crate::model::{Catalog, Competence, Exercise, LetterTarget};
use crate::progression::{MasteryState, NextStep, ProgressionTracker};
use crate::reference;
use crate::trace::Trace;
use crate::traits::{EvaluationRecord, EvaluationSink};

/// One student's practice session.
pub struct Session {
    id: Uuid,
    catalog: Arc<Catalog>,
    evaluator: Evaluator,
    tracker: ProgressionTracker,
    sink: Box<dyn EvaluationSink>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("catalog", &self.catalog.id)
            .field("sink", &self.sink.name())
            .finish()
    }
}

impl Session {
    /// Start a session with empty mastery.
    pub fn new(
        catalog: Arc<Catalog>,
        config: EvaluationConfig,
        sink: Box<dyn EvaluationSink>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            catalog,
            evaluator: Evaluator::new(config),
            tracker: ProgressionTracker::new(),
            sink,
        }
    }

    /// Resume from saved mastery.
    pub fn with_state(mut self, state: MasteryState) -> Self {
        self.tracker = ProgressionTracker::from_state(state);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tracker(&self) -> &ProgressionTracker {
        &self.tracker
    }

    pub fn into_state(self) -> MasteryState {
        self.tracker.into_state()
    }

    /// An empty user trace ready to receive samples.
    pub fn start_trace(&self) -> Trace {
        Trace::user()
    }

    fn resolve(
        &self,
        exercise_id: &str,
        letter_index: usize,
    ) -> Result<(&Exercise, &LetterTarget, &Competence)> {
        let exercise = self
            .catalog
            .exercise(exercise_id)
            .ok_or_else(|| ScribeError::MissingReference(format!("unknown exercise {exercise_id}")))?;
        let target = exercise.letter(letter_index).ok_or_else(|| {
            ScribeError::MissingReference(format!(
                "exercise {exercise_id} has no letter #{letter_index}"
            ))
        })?;
        let competence = self.catalog.competence(&exercise.competence).ok_or_else(|| {
            ScribeError::MissingReference(format!(
                "exercise {exercise_id} trains unknown competence {}",
                exercise.competence
            ))
        })?;
        Ok((exercise, target, competence))
    }

    /// Model trace the student should follow for one exercise letter.
    pub fn reference_for(&self, exercise_id: &str, letter_index: usize) -> Result<Trace> {
        let (exercise, target, _) = self.resolve(exercise_id, letter_index)?;
        reference::generate(&target.letter, exercise.anchor_x, exercise.anchor_y, exercise.scale)
    }

    /// Finalize, score and record one attempt.
    ///
    /// On error nothing is recorded: mastery is untouched and the sink
    /// receives nothing.
    pub fn submit(
        &mut self,
        exercise_id: &str,
        letter_index: usize,
        mut trace: Trace,
        trace_start_ms: i64,
    ) -> Result<Evaluation> {
        let (exercise, target, competence) = self.resolve(exercise_id, letter_index)?;
        trace.finalize()?;
        let reference =
            reference::generate(&target.letter, exercise.anchor_x, exercise.anchor_y, exercise.scale)?;
        let evaluation =
            self.evaluator
                .evaluate(&trace, &reference, target, trace_start_ms, competence)?;
        let code = competence.code.clone();

        self.tracker.record_evaluation(&code, &evaluation)?;

        let record = EvaluationRecord::new(self.id, exercise_id, letter_index, evaluation.clone());
        if let Err(e) = self.sink.submit(&record) {
            tracing::warn!(sink = self.sink.name(), record = %record.id, "failed to deliver evaluation: {e:#}");
        }

        Ok(evaluation)
    }

    /// What to present next.
    pub fn next_step(&self) -> NextStep {
        self.tracker.next_exercise(&self.catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::MasteryStatus;
    use crate::trace::TracePoint;
    use crate::traits::MemorySink;

    struct FailingSink;

    impl EvaluationSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        fn submit(&self, _record: &EvaluationRecord) -> anyhow::Result<()> {
            anyhow::bail!("sink offline")
        }
    }

    fn session_with(sink: Box<dyn EvaluationSink>) -> Session {
        Session::new(
            Arc::new(Catalog::builtin().unwrap()),
            EvaluationConfig::default(),
            sink,
        )
    }

    /// Replay the reference of an exercise letter as a user trace.
    fn replay(session: &Session, exercise_id: &str, index: usize, duration_ms: f64) -> Trace {
        let reference = session.reference_for(exercise_id, index).unwrap();
        let last = reference.duration_ms().max(1.0);
        let mut trace = session.start_trace();
        for p in reference.points() {
            let t = p.timestamp_ms / last * duration_ms;
            trace.append(TracePoint::new(p.x, p.y, t, 0.5)).unwrap();
        }
        trace
    }

    fn scribble(n: usize) -> Trace {
        let mut trace = Trace::user();
        for i in 0..n {
            let x = 400.0 + (i % 2) as f64 * 60.0;
            trace
                .append(TracePoint::new(x, 20.0 * i as f64, 100.0 * i as f64, 0.95))
                .unwrap();
        }
        trace
    }

    #[test]
    fn submit_exact_replay_masters_competence() {
        let sink = Arc::new(MemorySink::new());
        let mut session = session_with(Box::new(sink.clone()));
        let exercise = session.catalog().exercises[0].clone();
        let target_ms = exercise.letters[0].speed_target_ms;

        let trace = replay(&session, &exercise.id, 0, target_ms);
        let evaluation = session.submit(&exercise.id, 0, trace, 1_000).unwrap();

        assert_eq!(evaluation.scores.precision, 100);
        assert!(evaluation.validated, "{evaluation:?}");
        assert_eq!(
            session.tracker().state().status(&exercise.competence),
            MasteryStatus::Mastered
        );
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].session_id, session.id());
        assert_eq!(records[0].exercise_id, exercise.id);
    }

    #[test]
    fn failed_attempt_keeps_competence_in_progress() {
        let mut session = session_with(Box::new(MemorySink::new()));
        let exercise = session.catalog().exercises[0].clone();
        let evaluation = session.submit(&exercise.id, 0, scribble(12), 0).unwrap();
        assert!(!evaluation.validated);
        assert_eq!(
            session.tracker().state().status(&exercise.competence),
            MasteryStatus::InProgress
        );
    }

    #[test]
    fn errors_leave_no_trace() {
        let sink = Arc::new(MemorySink::new());
        let mut session = session_with(Box::new(sink.clone()));
        let exercise_id = session.catalog().exercises[0].id.clone();

        let err = session.submit(&exercise_id, 0, scribble(3), 0).unwrap_err();
        assert!(matches!(err, ScribeError::InsufficientTrace { points: 3, required: 5 }));

        let err = session.submit("no-such-exercise", 0, scribble(10), 0).unwrap_err();
        assert!(matches!(err, ScribeError::MissingReference(_)));

        let err = session.submit(&exercise_id, 99, scribble(10), 0).unwrap_err();
        assert!(matches!(err, ScribeError::MissingReference(_)));

        let err = session.submit(&exercise_id, 0, Trace::user(), 0).unwrap_err();
        assert_eq!(err, ScribeError::EmptyTrace);

        assert!(sink.is_empty());
        assert_eq!(session.tracker().state(), &MasteryState::default());
    }

    #[test]
    fn unknown_letter_is_reported() {
        let mut catalog = Catalog::builtin().unwrap();
        catalog.exercises[0].letters[0].letter = "ß".into();
        let mut session = Session::new(
            Arc::new(catalog),
            EvaluationConfig::default(),
            Box::new(MemorySink::new()),
        );
        let id = session.catalog().exercises[0].id.clone();
        let err = session.submit(&id, 0, scribble(10), 0).unwrap_err();
        assert_eq!(err, ScribeError::UnknownLetter("ß".into()));
    }

    #[test]
    fn sink_failure_does_not_block_scoring() {
        let mut session = session_with(Box::new(FailingSink));
        let exercise = session.catalog().exercises[0].clone();
        let trace = replay(&session, &exercise.id, 0, exercise.letters[0].speed_target_ms);
        let evaluation = session.submit(&exercise.id, 0, trace, 0).unwrap();
        assert!(evaluation.validated);
        assert!(session.tracker().state().is_mastered(&exercise.competence));
    }

    #[test]
    fn next_step_advances_through_letters() {
        let mut session = session_with(Box::new(MemorySink::new()));
        let exercise = session.catalog().exercises[0].clone();
        assert_eq!(
            session.next_step(),
            NextStep::Exercise {
                exercise_id: exercise.id.clone(),
                letter_index: 0,
                letter: exercise.letters[0].letter.clone(),
            }
        );

        let trace = replay(&session, &exercise.id, 0, exercise.letters[0].speed_target_ms);
        session.submit(&exercise.id, 0, trace, 0).unwrap();

        assert_eq!(
            session.next_step(),
            NextStep::Exercise {
                exercise_id: exercise.id.clone(),
                letter_index: 1,
                letter: exercise.letters[1].letter.clone(),
            }
        );
    }

    #[test]
    fn resumed_session_keeps_mastery() {
        let mut first = session_with(Box::new(MemorySink::new()));
        let exercise = first.catalog().exercises[0].clone();
        let trace = replay(&first, &exercise.id, 0, exercise.letters[0].speed_target_ms);
        first.submit(&exercise.id, 0, trace, 0).unwrap();
        let state = first.into_state();

        let second = session_with(Box::new(MemorySink::new())).with_state(state);
        assert!(second.tracker().state().is_mastered(&exercise.competence));
    }
}
