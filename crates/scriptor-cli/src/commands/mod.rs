pub mod evaluate;
pub mod init;
pub mod letters;
pub mod progress;
pub mod reference;
pub mod report;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::Result;

use scriptor_core::config::ScribeConfig;
use scriptor_core::model::Catalog;
use scriptor_core::parser::{load_catalog, validate_catalog};
use scriptor_core::progression::{MasteryState, NextStep};

/// Catalog from the command line, then the config, then the builtin one.
pub fn resolve_catalog(explicit: Option<&Path>, config: &ScribeConfig) -> Result<Catalog> {
    let catalog = match explicit.or(config.catalog.as_deref()) {
        Some(path) => load_catalog(path)?,
        None => Catalog::builtin()?,
    };
    for w in validate_catalog(&catalog) {
        tracing::warn!("catalog {}: {w}", catalog.id);
    }
    Ok(catalog)
}

/// Saved mastery, or an empty state when the file does not exist yet.
pub fn load_state_or_default(path: Option<&PathBuf>) -> Result<MasteryState> {
    match path {
        Some(p) if p.exists() => MasteryState::load_json(p),
        _ => Ok(MasteryState::default()),
    }
}

pub fn describe_next(step: &NextStep) -> String {
    match step {
        NextStep::Exercise {
            exercise_id,
            letter_index,
            letter,
        } => format!("{exercise_id} letter #{letter_index} '{letter}'"),
        NextStep::CurriculumComplete => "curriculum complete".to_string(),
    }
}
