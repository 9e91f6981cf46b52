//! The `scriptor report` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use uuid::Uuid;

use scriptor_core::config::load_config_from;
use scriptor_core::progression::MasteryState;
use scriptor_core::report::{load_records_jsonl, SessionReport};

pub fn execute(
    log: Option<PathBuf>,
    config: Option<PathBuf>,
    session: Option<Uuid>,
    state: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let log = match log {
        Some(path) => path,
        None => load_config_from(config.as_deref())?.evaluation_log(),
    };
    let mut records = load_records_jsonl(&log)?;
    if let Some(session) = session {
        records.retain(|r| r.session_id == session);
    }
    let mastery = state.as_deref().map(MasteryState::load_json).transpose()?;

    let report = SessionReport::new(records, mastery);
    let stats = &report.stats;

    println!(
        "{} evaluation(s), {} validated ({:.1}%)",
        stats.attempts,
        stats.validated,
        stats.pass_rate() * 100.0
    );

    if !stats.per_competence.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            "Competence",
            "Attempts",
            "Validated",
            "Pass %",
            "Mean",
            "Best",
            "First pass",
        ]);
        for c in stats.per_competence.values() {
            table.add_row(vec![
                Cell::new(&c.competence),
                Cell::new(c.attempts),
                Cell::new(c.validated),
                Cell::new(format!("{:.1}%", c.pass_rate * 100.0)),
                Cell::new(format!("{:.1}", c.mean_aggregate)),
                Cell::new(c.best_aggregate),
                Cell::new(
                    c.attempts_to_validation
                        .map(|n| format!("attempt {n}"))
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ]);
        }
        println!("{table}");

        let mut table = Table::new();
        table.set_header(vec!["Letter", "Attempts", "Validated", "Mean", "Best", "Weakest"]);
        for l in stats.per_letter.values() {
            table.add_row(vec![
                Cell::new(&l.letter),
                Cell::new(l.attempts),
                Cell::new(l.validated),
                Cell::new(format!("{:.1}", l.mean_aggregate)),
                Cell::new(l.best_aggregate),
                Cell::new(
                    l.weakest()
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ]);
        }
        println!("{table}");
    }

    if let Some(path) = output {
        report.save_json(&path)?;
        println!("Report {} written to {}", report.id, path.display());
    }

    Ok(())
}
