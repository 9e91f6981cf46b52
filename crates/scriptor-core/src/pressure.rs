//! Pen pressure classification.
//!
//! [`classify`] runs on every pointer-move event, so it is a pure function
//! over `f64` with no allocation. [`classify_series`] summarizes a finished
//! trace for the pressure sub-score.

use serde::{Deserialize, Serialize};

/// Below this a sample is treated as "no pressure reported".
pub const ABSENT_THRESHOLD: f64 = 0.1;

/// Series variance under which pressure counts as consistent.
pub const CONSISTENT_VARIANCE: f64 = 0.02;

/// Series variance at which the stability part of the score reaches zero.
const VARIANCE_CEILING: f64 = 0.08;

/// Share of the pressure score given to hitting the ideal band.
const TARGET_WEIGHT: f64 = 0.7;

/// Quality band of a pressure reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureBand {
    /// Practically zero, likely a mouse or finger instead of a stylus.
    Absent,
    TooLight,
    Ideal,
    TooHeavy,
}

impl PressureBand {
    /// Child-facing advice for this band.
    pub fn advisory(&self) -> &'static str {
        match self {
            PressureBand::Absent => "Use the stylus and press on the screen.",
            PressureBand::TooLight => "Press a little harder.",
            PressureBand::Ideal => "Nice pressure!",
            PressureBand::TooHeavy => "Press more gently.",
        }
    }
}

/// Ideal pressure band parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureProfile {
    #[serde(default = "default_center")]
    pub ideal_center: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_center() -> f64 {
    0.5
}

fn default_tolerance() -> f64 {
    0.15
}

impl Default for PressureProfile {
    fn default() -> Self {
        Self {
            ideal_center: default_center(),
            tolerance: default_tolerance(),
        }
    }
}

impl PressureProfile {
    pub fn classify(&self, pressure: f64) -> PressureState {
        classify(pressure, self.ideal_center, self.tolerance)
    }

    pub fn classify_series(&self, pressures: impl IntoIterator<Item = f64>) -> PressureSummary {
        summarize(pressures, self)
    }
}

/// Classification of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PressureState {
    pub band: PressureBand,
    /// Signed distance from the ideal center.
    pub deviation: f64,
    pub advisory: &'static str,
}

/// Classify a single pressure sample.
pub fn classify(pressure: f64, ideal_center: f64, tolerance: f64) -> PressureState {
    let band = band_for(pressure, ideal_center, tolerance);
    PressureState {
        band,
        deviation: pressure - ideal_center,
        advisory: band.advisory(),
    }
}

/// Classify a single sample against the default profile (0.5 ± 0.15).
pub fn classify_pressure(pressure: f64) -> PressureState {
    PressureProfile::default().classify(pressure)
}

fn band_for(pressure: f64, ideal_center: f64, tolerance: f64) -> PressureBand {
    if !pressure.is_finite() || pressure < ABSENT_THRESHOLD {
        PressureBand::Absent
    } else if pressure < ideal_center - tolerance {
        PressureBand::TooLight
    } else if pressure > ideal_center + tolerance {
        PressureBand::TooHeavy
    } else {
        PressureBand::Ideal
    }
}

/// Pressure quality over a whole trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureSummary {
    pub samples: usize,
    pub mean: f64,
    /// Population variance.
    pub variance: f64,
    /// Band of the mean pressure.
    pub band: PressureBand,
    /// Low variance and mean inside the ideal band.
    pub consistent: bool,
    pub ideal_center: f64,
    pub tolerance: f64,
}

/// Summarize a series of samples against the default profile.
pub fn classify_series(pressures: &[f64]) -> PressureSummary {
    summarize(pressures.iter().copied(), &PressureProfile::default())
}

fn summarize(pressures: impl IntoIterator<Item = f64>, profile: &PressureProfile) -> PressureSummary {
    // Welford, single pass.
    let mut samples = 0usize;
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for p in pressures {
        samples += 1;
        let delta = p - mean;
        mean += delta / samples as f64;
        m2 += delta * (p - mean);
    }
    let variance = if samples > 0 { m2 / samples as f64 } else { 0.0 };

    let band = if samples == 0 {
        PressureBand::Absent
    } else {
        band_for(mean, profile.ideal_center, profile.tolerance)
    };
    let consistent = samples > 0
        && variance < CONSISTENT_VARIANCE
        && (mean - profile.ideal_center).abs() <= profile.tolerance;

    PressureSummary {
        samples,
        mean,
        variance,
        band,
        consistent,
        ideal_center: profile.ideal_center,
        tolerance: profile.tolerance,
    }
}

impl PressureSummary {
    /// Pressure sub-score, 0 to 100.
    pub fn score(&self) -> u8 {
        if self.band == PressureBand::Absent {
            return 0;
        }
        let off = (self.mean - self.ideal_center).abs();
        let target_fit = if off <= self.tolerance {
            1.0
        } else if self.tolerance > 0.0 {
            (1.0 - (off - self.tolerance) / self.tolerance).max(0.0)
        } else {
            0.0
        };
        let stability = (1.0 - self.variance / VARIANCE_CEILING).clamp(0.0, 1.0);
        let score = 100.0 * (TARGET_WEIGHT * target_fit + (1.0 - TARGET_WEIGHT) * stability);
        score.round().clamp(0.0, 100.0) as u8
    }

    /// Pressure varied enough to be worth mentioning.
    pub fn is_unsteady(&self) -> bool {
        self.band != PressureBand::Absent && self.variance >= CONSISTENT_VARIANCE
    }
}
