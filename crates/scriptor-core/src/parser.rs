//! TOML catalog parser.
//!
//! Loads competence/exercise catalogs from TOML files and directories, and
//! validates them.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Catalog, Competence, Dimension, Exercise};
use crate::reference;

/// Intermediate TOML structure for parsing catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    catalog: TomlCatalogHeader,
    #[serde(default)]
    competences: Vec<Competence>,
    #[serde(default)]
    exercises: Vec<Exercise>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalogHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

/// Parse a single TOML file into a `Catalog`.
pub fn parse_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `Catalog` (useful for testing).
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(Catalog {
        id: parsed.catalog.id,
        name: parsed.catalog.name,
        description: parsed.catalog.description,
        competences: parsed.competences,
        exercises: parsed.exercises,
    })
}

/// Recursively load all `.toml` catalog files from a directory.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<Catalog>> {
    let mut catalogs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            catalogs.extend(load_catalog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_catalog(&path) {
                Ok(catalog) => catalogs.push(catalog),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(catalogs)
}

/// Load a catalog file, or the single catalog in a directory.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    if path.is_dir() {
        let mut catalogs = load_catalog_directory(path)?;
        match catalogs.len() {
            1 => Ok(catalogs.remove(0)),
            0 => anyhow::bail!("no catalog found in {}", path.display()),
            n => anyhow::bail!(
                "{} contains {n} catalogs, point at a single file",
                path.display()
            ),
        }
    } else {
        parse_catalog(path)
    }
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The competence code or exercise id (if applicable).
    pub subject: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn about(subject: &str, message: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.to_string()),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "[{subject}] {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Validate a catalog for common authoring mistakes.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Check for duplicate competence codes
    let mut seen_codes = HashSet::new();
    for competence in &catalog.competences {
        if !seen_codes.insert(competence.code.as_str()) {
            warnings.push(ValidationWarning::about(
                &competence.code,
                format!("duplicate competence code: {}", competence.code),
            ));
        }
    }

    // Check thresholds and prerequisites
    for competence in &catalog.competences {
        for dimension in Dimension::ALL {
            if let Some(required) = competence.thresholds.for_dimension(dimension) {
                if required > 100 {
                    warnings.push(ValidationWarning::about(
                        &competence.code,
                        format!("{dimension} threshold {required} is above 100"),
                    ));
                }
            }
        }
        for prerequisite in &competence.prerequisites {
            if !seen_codes.contains(prerequisite.as_str()) {
                warnings.push(ValidationWarning::about(
                    &competence.code,
                    format!("unknown prerequisite: {prerequisite}"),
                ));
            }
        }
    }

    for code in prerequisite_cycles(&catalog.competences) {
        warnings.push(ValidationWarning::about(
            &code,
            "prerequisite cycle: this competence can never be unlocked",
        ));
    }

    // Check exercises
    let mut seen_exercises = HashSet::new();
    for exercise in &catalog.exercises {
        if !seen_exercises.insert(exercise.id.as_str()) {
            warnings.push(ValidationWarning::about(
                &exercise.id,
                format!("duplicate exercise ID: {}", exercise.id),
            ));
        }
        if !seen_codes.contains(exercise.competence.as_str()) {
            warnings.push(ValidationWarning::about(
                &exercise.id,
                format!("unknown competence: {}", exercise.competence),
            ));
        }
        if exercise.letters.is_empty() {
            warnings.push(ValidationWarning::about(&exercise.id, "exercise has no letters"));
        }
        if !positive(exercise.scale) {
            warnings.push(ValidationWarning::about(
                &exercise.id,
                format!("scale must be positive, got {}", exercise.scale),
            ));
        }
        for target in &exercise.letters {
            if !reference::is_supported(&target.letter) {
                warnings.push(ValidationWarning::about(
                    &exercise.id,
                    format!("no reference shape for letter '{}'", target.letter),
                ));
            }
            if !positive(target.precision_tolerance_px) {
                warnings.push(ValidationWarning::about(
                    &exercise.id,
                    format!(
                        "letter '{}': precision_tolerance_px must be positive",
                        target.letter
                    ),
                ));
            }
            if !positive(target.speed_target_ms) {
                warnings.push(ValidationWarning::about(
                    &exercise.id,
                    format!("letter '{}': speed_target_ms must be positive", target.letter),
                ));
            }
        }
    }

    warnings
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Codes of competences that sit on a prerequisite cycle.
fn prerequisite_cycles(competences: &[Competence]) -> BTreeSet<String> {
    let graph: HashMap<&str, &BTreeSet<String>> = competences
        .iter()
        .map(|c| (c.code.as_str(), &c.prerequisites))
        .collect();

    let mut on_cycle = BTreeSet::new();
    let mut done: HashSet<&str> = HashSet::new();
    for competence in competences {
        let mut path = Vec::new();
        walk(competence.code.as_str(), &graph, &mut path, &mut done, &mut on_cycle);
    }
    on_cycle
}

fn walk<'a>(
    code: &'a str,
    graph: &HashMap<&'a str, &'a BTreeSet<String>>,
    path: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
    on_cycle: &mut BTreeSet<String>,
) {
    if let Some(pos) = path.iter().position(|c| *c == code) {
        on_cycle.extend(path[pos..].iter().map(|c| c.to_string()));
        return;
    }
    if done.contains(code) {
        return;
    }
    let Some(&prerequisites) = graph.get(code) else {
        return;
    };
    path.push(code);
    for prerequisite in prerequisites.iter() {
        walk(prerequisite.as_str(), graph, path, done, on_cycle);
    }
    path.pop();
    done.insert(code);
}
