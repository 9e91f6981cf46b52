//! The `scriptor progress` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use scriptor_core::config::load_config_from;
use scriptor_core::progression::{next_exercise, MasteryState, MasteryStatus};

use super::{describe_next, resolve_catalog};

pub fn execute(state_path: PathBuf, catalog: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let catalog = resolve_catalog(catalog.as_deref(), &config)?;
    let state = MasteryState::load_json(&state_path)?;

    println!("Catalog: {} ({})", catalog.name, catalog.id);

    let mut table = Table::new();
    table.set_header(vec![
        "Competence",
        "Name",
        "Status",
        "Attempts",
        "Best",
        "Letters",
        "Mastered at",
    ]);

    for competence in &catalog.competences {
        let progress = state.progress(&competence.code).cloned().unwrap_or_default();
        let status = match progress.status {
            MasteryStatus::NotStarted => "not started",
            MasteryStatus::InProgress => "in progress",
            MasteryStatus::Mastered => "mastered",
        };
        let letters = progress
            .validated_letters
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        let mastered_at = progress
            .mastered_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&competence.code),
            Cell::new(&competence.name),
            Cell::new(status),
            Cell::new(progress.attempts),
            Cell::new(progress.best_score),
            Cell::new(letters),
            Cell::new(mastered_at),
        ]);
    }
    println!("{table}");

    let orphaned: Vec<&String> = state
        .competences
        .keys()
        .filter(|code| catalog.competence(code).is_none())
        .collect();
    if !orphaned.is_empty() {
        tracing::warn!("state has progress for competences not in the catalog: {orphaned:?}");
    }

    println!("Next step: {}", describe_next(&next_exercise(&state, &catalog)));
    Ok(())
}
