//! The `scriptor validate` command.

use std::path::PathBuf;

use anyhow::Result;

use scriptor_core::parser::{load_catalog_directory, parse_catalog, validate_catalog};

pub fn execute(catalog_path: PathBuf) -> Result<()> {
    let catalogs = if catalog_path.is_dir() {
        load_catalog_directory(&catalog_path)?
    } else {
        vec![parse_catalog(&catalog_path)?]
    };

    if catalogs.is_empty() {
        anyhow::bail!("no catalog found in {}", catalog_path.display());
    }

    let mut total_warnings = 0;

    for catalog in &catalogs {
        println!(
            "Catalog: {} ({} competences, {} exercises)",
            catalog.name,
            catalog.competences.len(),
            catalog.exercises.len()
        );

        let warnings = validate_catalog(catalog);
        for w in &warnings {
            let prefix = w
                .subject
                .as_ref()
                .map(|s| format!("  [{s}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All catalogs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
