//! Curriculum data model.
//!
//! Competences and exercises are static reference data: loaded once from the
//! catalog and never mutated while a session runs.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::parse_catalog_str;

/// Minimum sub-scores (0–100) required to validate a competence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryThresholds {
    pub precision: u8,
    pub speed: u8,
    pub fluidity: u8,
    pub inclination: u8,
    /// Pressure is only gated when the competence asks for it.
    #[serde(default)]
    pub pressure: Option<u8>,
}

impl MasteryThresholds {
    /// Threshold for one dimension, `None` when the dimension is not gated.
    pub fn for_dimension(&self, dimension: Dimension) -> Option<u8> {
        match dimension {
            Dimension::Precision => Some(self.precision),
            Dimension::Speed => Some(self.speed),
            Dimension::Fluidity => Some(self.fluidity),
            Dimension::Inclination => Some(self.inclination),
            Dimension::Pressure => self.pressure,
        }
    }
}

impl Default for MasteryThresholds {
    fn default() -> Self {
        Self {
            precision: 60,
            speed: 50,
            fluidity: 50,
            inclination: 50,
            pressure: None,
        }
    }
}

/// One of the five scored dimensions of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Precision,
    Speed,
    Fluidity,
    Inclination,
    Pressure,
}

impl Dimension {
    /// All dimensions in scoring order.
    pub const ALL: [Dimension; 5] = [
        Dimension::Precision,
        Dimension::Speed,
        Dimension::Fluidity,
        Dimension::Inclination,
        Dimension::Pressure,
    ];

    /// Weight in the aggregate score.
    pub fn weight(&self) -> f64 {
        match self {
            Dimension::Precision => 0.35,
            Dimension::Speed => 0.20,
            Dimension::Fluidity => 0.25,
            Dimension::Inclination => 0.15,
            Dimension::Pressure => 0.05,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Precision => write!(f, "precision"),
            Dimension::Speed => write!(f, "speed"),
            Dimension::Fluidity => write!(f, "fluidity"),
            Dimension::Inclination => write!(f, "inclination"),
            Dimension::Pressure => write!(f, "pressure"),
        }
    }
}

/// A curriculum skill unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competence {
    /// Unique code (e.g. "CP-GRAPH-01").
    pub code: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    pub thresholds: MasteryThresholds,
    /// Competences that must be mastered first.
    #[serde(default)]
    pub prerequisites: BTreeSet<String>,
}

/// Per-letter targets inside an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterTarget {
    /// Letter id in the reference shape table.
    pub letter: String,
    /// Mean distance at which precision reaches zero.
    pub precision_tolerance_px: f64,
    /// Expected trace duration.
    pub speed_target_ms: f64,
    /// Expected slant in degrees, counter-clockwise from horizontal.
    #[serde(default)]
    pub inclination_angle: Option<f64>,
    /// Reward points granted when the letter is validated.
    #[serde(default)]
    pub points: u32,
}

/// A competence bound to an ordered list of target letters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Code of the competence this exercise trains.
    pub competence: String,
    /// Where the reference is drawn on the canvas.
    #[serde(default = "default_anchor_x")]
    pub anchor_x: f64,
    #[serde(default = "default_anchor_y")]
    pub anchor_y: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Letters, completed in order.
    #[serde(default)]
    pub letters: Vec<LetterTarget>,
}

fn default_anchor_x() -> f64 {
    120.0
}

fn default_anchor_y() -> f64 {
    180.0
}

fn default_scale() -> f64 {
    1.0
}

impl Exercise {
    pub fn letter(&self, index: usize) -> Option<&LetterTarget> {
        self.letters.get(index)
    }

    /// Total reward points over all letters.
    pub fn total_points(&self) -> u32 {
        self.letters.iter().map(|l| l.points).sum()
    }
}

/// The competence and exercise catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub competences: Vec<Competence>,
    /// Exercises in curriculum order.
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

const BUILTIN_CATALOG: &str = include_str!("../data/cp-2025.toml");

impl Catalog {
    /// The embedded CP-2025 catalog.
    pub fn builtin() -> anyhow::Result<Self> {
        parse_catalog_str(BUILTIN_CATALOG, std::path::Path::new("builtin:cp-2025.toml"))
    }

    pub fn competence(&self, code: &str) -> Option<&Competence> {
        self.competences.iter().find(|c| c.code == code)
    }

    pub fn exercise(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }
}
