//! Reference trace generation from the letter shape table.
//!
//! Each letter is a row in [`LETTER_SHAPES`]: polyline and cubic Bézier
//! segments in a unit box (x right, y down, x-height at 0.5, baseline at
//! 1.0). Generation scales and translates the table into canvas space, so the
//! same arguments always produce the same points.

use crate::error::{Result, ScribeError};
use crate::trace::{Trace, TracePoint};

/// Canvas size of the unit box at scale 1.
pub const LETTER_BOX_PX: f64 = 100.0;

/// Nominal pen speed used to timestamp reference points.
pub const REFERENCE_SPEED_PX_PER_MS: f64 = 0.2;

const REFERENCE_PRESSURE: f64 = 0.5;

/// One piece of a letter outline in unit coordinates.
#[derive(Debug, Clone, Copy)]
pub enum Segment {
    /// Points joined by straight lines.
    Polyline(&'static [(f64, f64)]),
    /// Cubic Bézier curve sampled at `samples + 1` evenly spaced parameters.
    Cubic {
        from: (f64, f64),
        ctrl1: (f64, f64),
        ctrl2: (f64, f64),
        to: (f64, f64),
        samples: usize,
    },
}

impl Segment {
    fn emit(&self, out: &mut Vec<(f64, f64)>) {
        match *self {
            Segment::Polyline(points) => {
                for &p in points {
                    push_joined(out, p);
                }
            }
            Segment::Cubic {
                from,
                ctrl1,
                ctrl2,
                to,
                samples,
            } => {
                let samples = samples.max(1);
                for i in 0..=samples {
                    let t = i as f64 / samples as f64;
                    push_joined(out, cubic_at(from, ctrl1, ctrl2, to, t));
                }
            }
        }
    }
}

// Segments share their joint with the previous one; keep it once.
fn push_joined(out: &mut Vec<(f64, f64)>, p: (f64, f64)) {
    if out.last() != Some(&p) {
        out.push(p);
    }
}

fn cubic_at(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64), p3: (f64, f64), t: f64) -> (f64, f64) {
    let u = 1.0 - t;
    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    (
        a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0,
        a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1,
    )
}

/// An authored letter outline.
#[derive(Debug, Clone, Copy)]
pub struct LetterShape {
    pub id: &'static str,
    pub segments: &'static [Segment],
}

impl LetterShape {
    /// Outline points in unit coordinates, joints deduplicated.
    pub fn unit_points(&self) -> Vec<(f64, f64)> {
        let mut out = Vec::new();
        for segment in self.segments {
            segment.emit(&mut out);
        }
        out
    }
}

/// Cursive lowercase outlines, single pen stroke each (dots and crossbars
/// are separate strokes and not part of the trace).
pub static LETTER_SHAPES: &[LetterShape] = &[
    LetterShape {
        id: "i",
        segments: &[Segment::Polyline(&[
            (0.10, 1.00),
            (0.30, 0.75),
            (0.45, 0.50),
            (0.40, 0.80),
            (0.45, 0.97),
            (0.65, 0.90),
        ])],
    },
    LetterShape {
        id: "t",
        segments: &[Segment::Polyline(&[
            (0.05, 1.00),
            (0.25, 0.60),
            (0.35, 0.15),
            (0.30, 0.95),
            (0.50, 0.90),
        ])],
    },
    LetterShape {
        id: "u",
        segments: &[
            Segment::Polyline(&[(0.00, 1.00), (0.15, 0.50)]),
            Segment::Cubic {
                from: (0.15, 0.50),
                ctrl1: (0.10, 0.90),
                ctrl2: (0.35, 1.05),
                to: (0.50, 0.55),
                samples: 6,
            },
            Segment::Polyline(&[(0.50, 0.55), (0.50, 0.50), (0.52, 0.95), (0.70, 0.90)]),
        ],
    },
    LetterShape {
        id: "l",
        segments: &[
            Segment::Cubic {
                from: (0.00, 1.00),
                ctrl1: (0.35, 0.75),
                ctrl2: (0.45, 0.05),
                to: (0.30, 0.05),
                samples: 8,
            },
            Segment::Cubic {
                from: (0.30, 0.05),
                ctrl1: (0.15, 0.05),
                ctrl2: (0.20, 0.70),
                to: (0.30, 1.00),
                samples: 8,
            },
            Segment::Polyline(&[(0.30, 1.00), (0.50, 0.90)]),
        ],
    },
    LetterShape {
        id: "e",
        segments: &[
            Segment::Polyline(&[(0.00, 0.85), (0.45, 0.70)]),
            Segment::Cubic {
                from: (0.45, 0.70),
                ctrl1: (0.50, 0.50),
                ctrl2: (0.15, 0.45),
                to: (0.12, 0.75),
                samples: 6,
            },
            Segment::Cubic {
                from: (0.12, 0.75),
                ctrl1: (0.10, 1.00),
                ctrl2: (0.45, 1.05),
                to: (0.60, 0.90),
                samples: 6,
            },
        ],
    },
    LetterShape {
        id: "c",
        segments: &[
            Segment::Cubic {
                from: (0.60, 0.60),
                ctrl1: (0.45, 0.45),
                ctrl2: (0.05, 0.50),
                to: (0.10, 0.80),
                samples: 8,
            },
            Segment::Cubic {
                from: (0.10, 0.80),
                ctrl1: (0.15, 1.05),
                ctrl2: (0.50, 1.05),
                to: (0.65, 0.90),
                samples: 6,
            },
        ],
    },
    LetterShape {
        id: "o",
        segments: &[
            Segment::Cubic {
                from: (0.35, 0.50),
                ctrl1: (0.21, 0.50),
                ctrl2: (0.10, 0.61),
                to: (0.10, 0.75),
                samples: 5,
            },
            Segment::Cubic {
                from: (0.10, 0.75),
                ctrl1: (0.10, 0.89),
                ctrl2: (0.21, 1.00),
                to: (0.35, 1.00),
                samples: 5,
            },
            Segment::Cubic {
                from: (0.35, 1.00),
                ctrl1: (0.49, 1.00),
                ctrl2: (0.60, 0.89),
                to: (0.60, 0.75),
                samples: 5,
            },
            Segment::Cubic {
                from: (0.60, 0.75),
                ctrl1: (0.60, 0.61),
                ctrl2: (0.49, 0.50),
                to: (0.35, 0.50),
                samples: 5,
            },
        ],
    },
    LetterShape {
        id: "a",
        segments: &[
            Segment::Cubic {
                from: (0.55, 0.60),
                ctrl1: (0.40, 0.45),
                ctrl2: (0.05, 0.55),
                to: (0.10, 0.85),
                samples: 6,
            },
            Segment::Cubic {
                from: (0.10, 0.85),
                ctrl1: (0.15, 1.05),
                ctrl2: (0.50, 1.00),
                to: (0.55, 0.55),
                samples: 6,
            },
            Segment::Polyline(&[(0.55, 0.55), (0.55, 0.50), (0.58, 0.95), (0.75, 0.90)]),
        ],
    },
    LetterShape {
        id: "n",
        segments: &[
            Segment::Polyline(&[(0.00, 1.00), (0.10, 0.50), (0.12, 1.00)]),
            Segment::Cubic {
                from: (0.12, 1.00),
                ctrl1: (0.15, 0.40),
                ctrl2: (0.50, 0.40),
                to: (0.50, 0.70),
                samples: 6,
            },
            Segment::Polyline(&[(0.50, 0.70), (0.52, 0.97), (0.70, 0.90)]),
        ],
    },
    LetterShape {
        id: "m",
        segments: &[
            Segment::Polyline(&[(0.00, 1.00), (0.08, 0.50), (0.10, 1.00)]),
            Segment::Cubic {
                from: (0.10, 1.00),
                ctrl1: (0.12, 0.45),
                ctrl2: (0.40, 0.45),
                to: (0.40, 0.70),
                samples: 6,
            },
            Segment::Polyline(&[(0.40, 0.70), (0.41, 1.00)]),
            Segment::Cubic {
                from: (0.41, 1.00),
                ctrl1: (0.43, 0.45),
                ctrl2: (0.72, 0.45),
                to: (0.72, 0.70),
                samples: 6,
            },
            Segment::Polyline(&[(0.72, 0.70), (0.74, 0.97), (0.90, 0.90)]),
        ],
    },
];

/// Find the shape for a letter id.
pub fn lookup(letter: &str) -> Option<&'static LetterShape> {
    LETTER_SHAPES.iter().find(|shape| shape.id == letter)
}

/// Letter ids with an authored shape, in table order.
pub fn supported_letters() -> impl Iterator<Item = &'static str> {
    LETTER_SHAPES.iter().map(|shape| shape.id)
}

pub fn is_supported(letter: &str) -> bool {
    lookup(letter).is_some()
}

/// Generate the reference trace for `letter` anchored at the top-left of its
/// unit box.
pub fn generate(letter: &str, anchor_x: f64, anchor_y: f64, scale: f64) -> Result<Trace> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(ScribeError::InvalidState(format!(
            "reference scale must be positive, got {scale}"
        )));
    }
    if !(anchor_x.is_finite() && anchor_y.is_finite()) {
        return Err(ScribeError::InvalidState(format!(
            "reference anchor must be finite, got ({anchor_x}, {anchor_y})"
        )));
    }
    let shape = lookup(letter).ok_or_else(|| ScribeError::UnknownLetter(letter.to_string()))?;

    let size = scale * LETTER_BOX_PX;
    let mut points: Vec<TracePoint> = Vec::new();
    let mut travelled = 0.0;
    for (ux, uy) in shape.unit_points() {
        let x = anchor_x + ux * size;
        let y = anchor_y + uy * size;
        if let Some(prev) = points.last() {
            travelled += (x - prev.x).hypot(y - prev.y);
        }
        points.push(TracePoint::new(
            x,
            y,
            travelled / REFERENCE_SPEED_PX_PER_MS,
            REFERENCE_PRESSURE,
        ));
    }

    Trace::reference(points)
}

/// [`generate`], falling back to a single-point trace at the anchor when the
/// letter has no shape or the parameters are invalid.
pub fn generate_or_degenerate(letter: &str, anchor_x: f64, anchor_y: f64, scale: f64) -> Trace {
    match generate(letter, anchor_x, anchor_y, scale) {
        Ok(trace) => trace,
        Err(e) => {
            tracing::warn!("reference for '{letter}' unavailable, using degenerate trace: {e}");
            Trace::degenerate(anchor_x, anchor_y)
        }
    }
}
