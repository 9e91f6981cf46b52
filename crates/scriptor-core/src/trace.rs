//! Pen trace model.
//!
//! A [`Trace`] is an ordered sequence of timestamped, pressure-tagged points.
//! Reference traces are built finalized; user traces are opened at pen-down,
//! appended to on every pen-move, and finalized at pen-up.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScribeError};

/// A single pen sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    /// Canvas-space x coordinate.
    pub x: f64,
    /// Canvas-space y coordinate (grows downward).
    pub y: f64,
    /// Milliseconds since the trace started.
    pub timestamp_ms: f64,
    /// Normalized pen pressure, 0.0 to 1.0.
    #[serde(default = "default_pressure")]
    pub pressure: f64,
}

fn default_pressure() -> f64 {
    0.5
}

impl TracePoint {
    pub fn new(x: f64, y: f64, timestamp_ms: f64, pressure: f64) -> Self {
        Self {
            x,
            y,
            timestamp_ms,
            pressure,
        }
    }

    /// Euclidean distance to another point, ignoring time and pressure.
    pub fn distance_to(&self, other: &TracePoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Where a trace came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    /// Synthetic, generated from the letter table.
    Reference,
    /// Captured from the child's pen.
    User,
}

/// An ordered sequence of pen samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    kind: TraceKind,
    points: Vec<TracePoint>,
    finalized: bool,
}

impl Trace {
    /// Open an empty user trace (pen-down).
    pub fn user() -> Self {
        Self {
            kind: TraceKind::User,
            points: Vec::new(),
            finalized: false,
        }
    }

    /// Open a user trace with room for `capacity` samples.
    pub fn user_with_capacity(capacity: usize) -> Self {
        Self {
            kind: TraceKind::User,
            points: Vec::with_capacity(capacity),
            finalized: false,
        }
    }

    /// Build a finalized reference trace.
    pub fn reference(points: Vec<TracePoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(ScribeError::EmptyTrace);
        }
        if points
            .windows(2)
            .any(|w| w[1].timestamp_ms < w[0].timestamp_ms)
        {
            return Err(ScribeError::InvalidState(
                "reference timestamps must be non-decreasing".into(),
            ));
        }
        Ok(Self {
            kind: TraceKind::Reference,
            points,
            finalized: true,
        })
    }

    /// Single-point reference used when a letter has no shape.
    ///
    /// Evaluating against it fails with `DegenerateReference`.
    pub fn degenerate(x: f64, y: f64) -> Self {
        Self {
            kind: TraceKind::Reference,
            points: vec![TracePoint::new(x, y, 0.0, default_pressure())],
            finalized: true,
        }
    }

    /// Build a finalized user trace from already captured samples.
    pub fn from_samples(samples: impl IntoIterator<Item = TracePoint>) -> Result<Self> {
        let mut trace = Self::user();
        for point in samples {
            trace.append(point)?;
        }
        trace.finalize()?;
        Ok(trace)
    }

    /// Append a pen-move sample. Only valid on an open user trace.
    pub fn append(&mut self, point: TracePoint) -> Result<()> {
        if self.kind == TraceKind::Reference {
            return Err(ScribeError::InvalidState(
                "cannot append to a reference trace".into(),
            ));
        }
        if self.finalized {
            return Err(ScribeError::InvalidState(
                "cannot append to a finalized trace".into(),
            ));
        }
        if !(point.x.is_finite() && point.y.is_finite() && point.timestamp_ms.is_finite()) {
            return Err(ScribeError::InvalidState(format!(
                "non-finite sample ({}, {}) at {}ms",
                point.x, point.y, point.timestamp_ms
            )));
        }
        if let Some(last) = self.points.last() {
            if point.timestamp_ms < last.timestamp_ms {
                return Err(ScribeError::InvalidState(format!(
                    "timestamp went backwards: {}ms after {}ms",
                    point.timestamp_ms, last.timestamp_ms
                )));
            }
        }
        let pressure = if point.pressure.is_finite() {
            point.pressure.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.points.push(TracePoint { pressure, ..point });
        Ok(())
    }

    /// Freeze the trace (pen-up). Calling it again is a no-op.
    pub fn finalize(&mut self) -> Result<()> {
        if self.points.is_empty() {
            return Err(ScribeError::EmptyTrace);
        }
        self.finalized = true;
        Ok(())
    }

    pub fn kind(&self) -> TraceKind {
        self.kind
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn points(&self) -> &[TracePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TracePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TracePoint> {
        self.points.last()
    }

    /// Time between the first and last sample.
    pub fn duration_ms(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0.0,
        }
    }

    /// Total path length in canvas units.
    pub fn arc_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }

    /// Pressure samples in order.
    pub fn pressures(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.pressure)
    }
}

/// Redistribute `points` into exactly `n` positions equally spaced by path
/// distance.
///
/// A path with zero length yields `n` copies of its first point. An empty
/// path or `n < 2` is rejected.
pub fn resample(points: &[TracePoint], n: usize) -> Result<Vec<(f64, f64)>> {
    let Some(first) = points.first() else {
        return Err(ScribeError::DegenerateReference(
            "cannot resample an empty trace".into(),
        ));
    };
    if n < 2 {
        return Err(ScribeError::InvalidState(format!(
            "resample count must be at least 2, got {n}"
        )));
    }

    let mut cumulative = Vec::with_capacity(points.len());
    cumulative.push(0.0);
    for w in points.windows(2) {
        let last = cumulative[cumulative.len() - 1];
        cumulative.push(last + w[0].distance_to(&w[1]));
    }
    let total = cumulative[cumulative.len() - 1];
    if total <= f64::EPSILON {
        return Ok(vec![(first.x, first.y); n]);
    }

    let mut out = Vec::with_capacity(n);
    let mut j = 1;
    for i in 0..n {
        let target = total * i as f64 / (n - 1) as f64;
        while j < points.len() - 1 && cumulative[j] < target {
            j += 1;
        }
        let span = cumulative[j] - cumulative[j - 1];
        let t = if span > f64::EPSILON {
            ((target - cumulative[j - 1]) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let (a, b) = (&points[j - 1], &points[j]);
        out.push((a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)));
    }

    Ok(out)
}
