//! The `scriptor evaluate` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use serde::Deserialize;

use scriptor_core::config::load_config_from;
use scriptor_core::engine::{Evaluation, NextAction};
use scriptor_core::model::{Competence, Dimension};
use scriptor_core::progression::NextStep;
use scriptor_core::session::Session;
use scriptor_core::trace::{Trace, TracePoint};
use scriptor_core::traits::JsonLinesSink;

use super::{describe_next, load_state_or_default, resolve_catalog};

pub struct EvaluateArgs {
    pub trace: PathBuf,
    pub exercise: Option<String>,
    pub letter_index: Option<usize>,
    pub catalog: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub state: Option<PathBuf>,
    pub log: Option<PathBuf>,
    pub start_ms: Option<i64>,
    pub format: String,
}

/// Recorded trace as written by a capture client.
#[derive(Debug, Deserialize)]
struct TraceFile {
    points: Vec<TracePoint>,
}

fn read_trace(path: &Path) -> Result<Trace> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read trace: {}", path.display()))?;
    let file: TraceFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse trace JSON: {}", path.display()))?;

    let mut trace = Trace::user_with_capacity(file.points.len());
    for (i, point) in file.points.into_iter().enumerate() {
        trace
            .append(point)
            .with_context(|| format!("{}: sample #{i} rejected", path.display()))?;
    }
    Ok(trace)
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let catalog = resolve_catalog(args.catalog.as_deref(), &config)?;
    let state = load_state_or_default(args.state.as_ref())?;
    let trace = read_trace(&args.trace)?;

    let log = args.log.unwrap_or_else(|| config.evaluation_log());
    let sink = JsonLinesSink::open(&log)?;
    tracing::debug!(path = %log.display(), "appending evaluations");

    let mut session = Session::new(Arc::new(catalog), config.evaluation, Box::new(sink))
        .with_state(state);

    let (exercise_id, letter_index) = match (args.exercise, args.letter_index) {
        (Some(id), index) => (id, index.unwrap_or(0)),
        (None, index) => match session.next_step() {
            NextStep::Exercise {
                exercise_id,
                letter_index,
                ..
            } => (exercise_id, index.unwrap_or(letter_index)),
            NextStep::CurriculumComplete => {
                anyhow::bail!("curriculum complete, pass --exercise to practice anyway")
            }
        },
    };

    let start_ms = args
        .start_ms
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

    let evaluation = session
        .submit(&exercise_id, letter_index, trace, start_ms)
        .map_err(|e| anyhow::anyhow!("{e} [{}]", e.feedback_tag()))
        .with_context(|| format!("cannot evaluate {exercise_id} letter #{letter_index}"))?;

    let competence = session
        .catalog()
        .competence(&evaluation.competence)
        .cloned()
        .context("evaluated competence missing from catalog")?;
    let next = session.next_step();

    match args.format.as_str() {
        "json" => {
            let out = serde_json::json!({
                "session_id": session.id(),
                "exercise_id": exercise_id,
                "letter_index": letter_index,
                "evaluation": evaluation,
                "next_step": next,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => print_evaluation(&evaluation, &competence, &exercise_id, letter_index, &next),
    }

    if let Some(path) = &args.state {
        session.into_state().save_json(path)?;
    }

    Ok(())
}

fn print_evaluation(
    evaluation: &Evaluation,
    competence: &Competence,
    exercise_id: &str,
    letter_index: usize,
    next: &NextStep,
) {
    println!(
        "Exercise {exercise_id} letter #{letter_index} '{}' ({})",
        evaluation.letter, competence.code
    );

    let mut table = Table::new();
    table.set_header(vec!["Dimension", "Score", "Required", "Result"]);
    for dimension in Dimension::ALL {
        let score = evaluation.scores.get(dimension);
        let (required, result) = match competence.thresholds.for_dimension(dimension) {
            Some(t) if score >= t => (t.to_string(), "pass"),
            Some(t) => (t.to_string(), "FAIL"),
            None => ("-".to_string(), "-"),
        };
        table.add_row(vec![
            Cell::new(dimension),
            Cell::new(score),
            Cell::new(required),
            Cell::new(result),
        ]);
    }
    println!("{table}");

    println!(
        "Aggregate: {} ({})",
        evaluation.aggregate,
        if evaluation.validated {
            "validated"
        } else {
            "not validated"
        }
    );
    for line in evaluation.feedback() {
        println!("  - {line}");
    }

    let action = match evaluation.next_action {
        NextAction::Advance => "advance".to_string(),
        NextAction::Retry { focus } => format!("retry (focus on {focus})"),
    };
    println!("Next action: {action}");
    println!("Next step: {}", describe_next(next));
}
