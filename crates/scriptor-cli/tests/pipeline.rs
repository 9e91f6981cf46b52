//! End-to-end scenarios through the library: reference generation, scoring,
//! progression, sinks and reports, driven the way a capture client would.

use std::sync::Arc;

use scriptor_core::engine::{evaluate, CommentTag, EvaluationConfig, NextAction};
use scriptor_core::model::{Catalog, Dimension};
use scriptor_core::pressure::{classify_pressure, PressureBand};
use scriptor_core::progression::{MasteryStatus, NextStep};
use scriptor_core::reference::generate;
use scriptor_core::report::{load_records_jsonl, SessionReport};
use scriptor_core::session::Session;
use scriptor_core::trace::{Trace, TracePoint};
use scriptor_core::traits::{JsonLinesSink, MemorySink};
use scriptor_core::ScribeError;

/// Replay `reference` as a user trace lasting `duration_ms`, shifted by `dx`.
fn replay(reference: &Trace, duration_ms: f64, dx: f64, pressure: f64) -> Trace {
    let last = reference.duration_ms();
    let mut trace = Trace::user();
    for p in reference.points() {
        trace
            .append(TracePoint::new(
                p.x + dx,
                p.y,
                p.timestamp_ms / last * duration_ms,
                pressure,
            ))
            .unwrap();
    }
    trace
}

fn builtin_session(sink: Arc<MemorySink>) -> Session {
    Session::new(
        Arc::new(Catalog::builtin().unwrap()),
        EvaluationConfig::default(),
        Box::new(sink),
    )
}

#[test]
fn letter_i_reference_scenario() {
    let reference = generate("i", 120.0, 180.0, 1.0).unwrap();
    assert_eq!(reference.len(), 6);
    assert_eq!(reference.points()[0].timestamp_ms, 0.0);

    let again = generate("i", 120.0, 180.0, 1.0).unwrap();
    assert_eq!(reference, again);
}

#[test]
fn exact_replay_of_i_is_validated() {
    let catalog = Catalog::builtin().unwrap();
    let exercise = catalog.exercise("ex-01-i-u-t").unwrap();
    let target = &exercise.letters[0];
    let competence = catalog.competence(&exercise.competence).unwrap();
    let reference = generate("i", exercise.anchor_x, exercise.anchor_y, exercise.scale).unwrap();

    let mut user = replay(&reference, target.speed_target_ms, 0.0, 0.5);
    user.finalize().unwrap();

    let evaluation = evaluate(&user, &reference, target, 0, competence).unwrap();
    assert_eq!(evaluation.scores.precision, 100);
    assert_eq!(evaluation.scores.speed, 100);
    assert_eq!(evaluation.scores.fluidity, 100);
    assert_eq!(evaluation.scores.pressure, 100);
    assert!(evaluation.aggregate >= 95, "{evaluation:?}");
    assert!(evaluation.validated);
    assert_eq!(evaluation.next_action, NextAction::Advance);
}

#[test]
fn offset_replay_loses_precision_monotonically() {
    let catalog = Catalog::builtin().unwrap();
    let exercise = catalog.exercise("ex-01-i-u-t").unwrap();
    let target = &exercise.letters[0];
    let competence = catalog.competence(&exercise.competence).unwrap();
    let reference = generate("i", exercise.anchor_x, exercise.anchor_y, exercise.scale).unwrap();

    let mut previous = u8::MAX;
    for dx in [0.0, 5.0, 10.0, 20.0, 40.0] {
        let mut user = replay(&reference, target.speed_target_ms, dx, 0.5);
        user.finalize().unwrap();
        let evaluation = evaluate(&user, &reference, target, 0, competence).unwrap();
        assert!(evaluation.scores.precision <= previous);
        previous = evaluation.scores.precision;
    }
    assert_eq!(previous, 0);
}

#[test]
fn far_offset_retries_on_precision() {
    let catalog = Catalog::builtin().unwrap();
    let exercise = catalog.exercise("ex-01-i-u-t").unwrap();
    let target = &exercise.letters[0];
    let competence = catalog.competence(&exercise.competence).unwrap();
    let reference = generate("i", exercise.anchor_x, exercise.anchor_y, exercise.scale).unwrap();

    let mut user = replay(&reference, target.speed_target_ms, 60.0, 0.5);
    user.finalize().unwrap();
    let evaluation = evaluate(&user, &reference, target, 0, competence).unwrap();
    assert!(!evaluation.validated);
    assert_eq!(
        evaluation.next_action,
        NextAction::Retry {
            focus: Dimension::Precision
        }
    );
}

#[test]
fn exact_replays_hold_their_slant() {
    let catalog = Catalog::builtin().unwrap();
    for exercise in &catalog.exercises {
        let competence = catalog.competence(&exercise.competence).unwrap();
        for target in &exercise.letters {
            let reference =
                generate(&target.letter, exercise.anchor_x, exercise.anchor_y, exercise.scale)
                    .unwrap();
            let mut user = replay(&reference, target.speed_target_ms, 0.0, 0.5);
            user.finalize().unwrap();
            let evaluation = evaluate(&user, &reference, target, 0, competence).unwrap();
            assert!(
                evaluation.scores.inclination >= 95,
                "'{}': {:?}",
                target.letter,
                evaluation.metrics
            );
        }
    }
}

#[test]
fn rotated_t_fails_inclination() {
    let catalog = Catalog::builtin().unwrap();
    let exercise = catalog.exercise("ex-01-i-u-t").unwrap();
    let target = exercise.letters.iter().find(|l| l.letter == "t").unwrap();
    let competence = catalog.competence(&exercise.competence).unwrap();
    let reference = generate("t", exercise.anchor_x, exercise.anchor_y, exercise.scale).unwrap();

    // Lay the letter 60 degrees off its slant around its centroid.
    let n = reference.len() as f64;
    let cx = reference.points().iter().map(|p| p.x).sum::<f64>() / n;
    let cy = reference.points().iter().map(|p| p.y).sum::<f64>() / n;
    let (sin, cos) = 60f64.to_radians().sin_cos();
    let last = reference.duration_ms();
    let user = Trace::from_samples(reference.points().iter().map(|p| {
        let (dx, dy) = (p.x - cx, p.y - cy);
        TracePoint::new(
            cx + dx * cos - dy * sin,
            cy + dx * sin + dy * cos,
            p.timestamp_ms / last * target.speed_target_ms,
            0.5,
        )
    }))
    .unwrap();

    let evaluation = evaluate(&user, &reference, target, 0, competence).unwrap();
    assert!(evaluation.scores.inclination < competence.thresholds.inclination);
    assert!(evaluation.tags.contains(&CommentTag::WrongSlant));
    assert!(!evaluation.validated);
}

#[test]
fn pressure_bands() {
    assert_eq!(classify_pressure(0.05).band, PressureBand::Absent);
    assert_eq!(classify_pressure(0.50).band, PressureBand::Ideal);
    assert_eq!(classify_pressure(0.90).band, PressureBand::TooHeavy);
}

#[test]
fn short_traces_are_rejected_until_five_points() {
    let sink = Arc::new(MemorySink::new());
    let mut session = builtin_session(sink.clone());

    let mut short = session.start_trace();
    for i in 0..3 {
        short
            .append(TracePoint::new(130.0 + i as f64 * 10.0, 280.0, i as f64 * 50.0, 0.5))
            .unwrap();
    }
    let err = session.submit("ex-01-i-u-t", 0, short, 0).unwrap_err();
    assert_eq!(
        err,
        ScribeError::InsufficientTrace {
            points: 3,
            required: 5
        }
    );
    assert!(err.is_retryable());
    assert_eq!(err.feedback_tag(), "trace-too-short");

    let mut five = session.start_trace();
    for i in 0..5 {
        five.append(TracePoint::new(130.0 + i as f64 * 10.0, 280.0, i as f64 * 50.0, 0.5))
            .unwrap();
    }
    assert!(session.submit("ex-01-i-u-t", 0, five, 0).is_ok());
    assert_eq!(sink.len(), 1);
}

#[test]
fn whole_curriculum_can_be_completed() {
    let sink = Arc::new(MemorySink::new());
    let mut session = builtin_session(sink.clone());
    let mut visited = Vec::new();

    while let NextStep::Exercise {
        exercise_id,
        letter_index,
        letter,
    } = session.next_step()
    {
        assert!(visited.len() < 20, "curriculum did not converge: {visited:?}");
        let exercise = session.catalog().exercise(&exercise_id).unwrap().clone();
        let target_ms = exercise.letters[letter_index].speed_target_ms;
        let reference = session.reference_for(&exercise_id, letter_index).unwrap();
        let trace = replay(&reference, target_ms, 0.0, 0.5);

        let evaluation = session
            .submit(&exercise_id, letter_index, trace, 1_700_000_000_000)
            .unwrap();
        assert!(evaluation.validated, "{letter}: {evaluation:?}");
        visited.push(letter);
    }

    assert_eq!(
        visited,
        ["i", "u", "t", "l", "e", "c", "o", "a", "n", "m"]
    );
    let state = session.tracker().state();
    for competence in &session.catalog().competences {
        assert_eq!(state.status(&competence.code), MasteryStatus::Mastered);
        assert!(state.progress(&competence.code).unwrap().mastered_at.is_some());
    }
    assert_eq!(sink.len(), 10);
}

#[test]
fn mastery_survives_later_failures() {
    let sink = Arc::new(MemorySink::new());
    let mut session = builtin_session(sink);
    let reference = session.reference_for("ex-01-i-u-t", 0).unwrap();

    session
        .submit("ex-01-i-u-t", 0, replay(&reference, 1500.0, 0.0, 0.5), 0)
        .unwrap();
    let mastered_at = session
        .tracker()
        .progress("CP-GRAPH-01")
        .unwrap()
        .mastered_at;

    for _ in 0..3 {
        let evaluation = session
            .submit("ex-01-i-u-t", 0, replay(&reference, 6000.0, 80.0, 0.95), 5_000)
            .unwrap();
        assert!(!evaluation.validated);
    }

    let progress = session.tracker().progress("CP-GRAPH-01").unwrap();
    assert_eq!(progress.status, MasteryStatus::Mastered);
    assert_eq!(progress.attempts, 4);
    assert_eq!(progress.mastered_at, mastered_at);
}

#[test]
fn jsonl_log_feeds_report() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("evaluations.jsonl");
    let mut session = Session::new(
        Arc::new(Catalog::builtin().unwrap()),
        EvaluationConfig::default(),
        Box::new(JsonLinesSink::open(&log).unwrap()),
    );
    let reference = session.reference_for("ex-01-i-u-t", 0).unwrap();
    session
        .submit("ex-01-i-u-t", 0, replay(&reference, 1500.0, 40.0, 0.5), 0)
        .unwrap();
    session
        .submit("ex-01-i-u-t", 0, replay(&reference, 1500.0, 0.0, 0.5), 0)
        .unwrap();

    let records = load_records_jsonl(&log).unwrap();
    assert_eq!(records.len(), 2);

    let report = SessionReport::new(records, Some(session.tracker().snapshot()));
    assert_eq!(report.session_id, Some(session.id()));
    let stats = &report.stats.per_competence["CP-GRAPH-01"];
    assert_eq!(stats.attempts, 2);
    assert_eq!(stats.validated, 1);
    assert_eq!(stats.attempts_to_validation, Some(2));
}
