//! Trace evaluation engine.
//!
//! Scores a finalized user trace against a reference trace on five
//! dimensions (precision, speed, fluidity, inclination, pressure), combines
//! them into an aggregate, and gates validation per dimension on the
//! competence thresholds. Evaluation is synchronous and pure: no I/O, no
//! shared state, and allocation bounded by the resample count plus one pass
//! over the user samples.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScribeError};
use crate::model::{Competence, Dimension, LetterTarget, MasteryThresholds};
use crate::pressure::{PressureBand, PressureProfile, PressureSummary};
use crate::trace::{resample, Trace, TraceKind};

/// Relative duration error that still earns a full speed score.
const SPEED_TOLERANCE: f64 = 0.25;

/// Relative duration error at which the speed score reaches zero.
const SPEED_CUTOFF: f64 = 1.0;

/// Excess jerk (rad²) that halves the fluidity score.
const FLUIDITY_JERK_SCALE: f64 = 0.5;

/// Slant deviation at which the inclination score reaches zero.
const INCLINATION_CUTOFF_DEG: f64 = 45.0;

/// Traces shorter than this are never scored, whatever the config says.
pub const MIN_USER_POINTS_FLOOR: usize = 5;

/// Parameters for the evaluation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Arc-length control points used for shape comparison.
    #[serde(default = "default_resample_points")]
    pub resample_points: usize,
    /// Fewer user samples than this are rejected as too short.
    #[serde(default = "default_min_user_points")]
    pub min_user_points: usize,
    /// Ideal pressure band.
    #[serde(default)]
    pub pressure: PressureProfile,
}

fn default_resample_points() -> usize {
    20
}

fn default_min_user_points() -> usize {
    5
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            resample_points: default_resample_points(),
            min_user_points: default_min_user_points(),
            pressure: PressureProfile::default(),
        }
    }
}

/// The five sub-scores, each 0 to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub precision: u8,
    pub speed: u8,
    pub fluidity: u8,
    pub inclination: u8,
    pub pressure: u8,
}

impl SubScores {
    pub fn get(&self, dimension: Dimension) -> u8 {
        match dimension {
            Dimension::Precision => self.precision,
            Dimension::Speed => self.speed,
            Dimension::Fluidity => self.fluidity,
            Dimension::Inclination => self.inclination,
            Dimension::Pressure => self.pressure,
        }
    }

    /// Weighted sum of the sub-scores, rounded to an integer in [0, 100].
    pub fn aggregate(&self) -> u8 {
        let total: f64 = Dimension::ALL
            .iter()
            .map(|d| d.weight() * f64::from(self.get(*d)))
            .sum();
        total.round().clamp(0.0, 100.0) as u8
    }
}

/// Short feedback markers derived from the scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommentTag {
    Imprecise,
    TooFast,
    TooSlow,
    Jerky,
    WrongSlant,
    NoPressure,
    PressureTooLight,
    PressureTooHeavy,
    UnsteadyPressure,
    ConsistentPressure,
    Excellent,
}

impl CommentTag {
    /// Child-facing feedback text.
    pub fn message(&self) -> &'static str {
        match self {
            CommentTag::Imprecise => "Try to follow the model letter more closely.",
            CommentTag::TooFast => "Slow down a little.",
            CommentTag::TooSlow => "Try to write in one smooth go.",
            CommentTag::Jerky => "Keep your hand moving smoothly.",
            CommentTag::WrongSlant => "Watch the slant of your letter.",
            CommentTag::NoPressure => "Use the stylus and press on the screen.",
            CommentTag::PressureTooLight => "Press a little harder.",
            CommentTag::PressureTooHeavy => "Press more gently.",
            CommentTag::UnsteadyPressure => "Try to keep the same pressure all along.",
            CommentTag::ConsistentPressure => "Your pressure was nice and even.",
            CommentTag::Excellent => "Excellent work!",
        }
    }
}

/// What the caller should present after this evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NextAction {
    /// Thresholds met, move on.
    Advance,
    /// Try the letter again, concentrating on `focus`.
    Retry { focus: Dimension },
}

/// Raw measurements the sub-scores were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceMetrics {
    pub user_points: usize,
    /// Mean distance between resampled user and reference points.
    pub mean_distance_px: f64,
    pub duration_ms: f64,
    pub speed_target_ms: f64,
    /// Mean squared change of turning angle along the user trace.
    pub jerk: f64,
    pub reference_jerk: f64,
    /// Dominant stroke angle in degrees, `None` when undefined.
    pub angle_deg: Option<f64>,
    pub angle_deviation_deg: Option<f64>,
    pub pressure: PressureSummary,
}

/// Result of one scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub competence: String,
    pub letter: String,
    /// Pen-down time of the trace, milliseconds since the Unix epoch.
    pub started_at_ms: i64,
    pub scores: SubScores,
    pub aggregate: u8,
    pub validated: bool,
    pub tags: Vec<CommentTag>,
    pub next_action: NextAction,
    pub metrics: TraceMetrics,
}

impl Evaluation {
    /// Feedback lines for the UI, in tag order.
    pub fn feedback(&self) -> Vec<&'static str> {
        self.tags.iter().map(CommentTag::message).collect()
    }
}

/// `true` iff every gated sub-score meets its threshold.
pub fn verdict(scores: &SubScores, thresholds: &MasteryThresholds) -> bool {
    Dimension::ALL.iter().all(|d| match thresholds.for_dimension(*d) {
        Some(required) => scores.get(*d) >= required,
        None => true,
    })
}

/// Recommend the next action: advance when validated, otherwise retry with
/// focus on the dimension furthest below its threshold.
pub fn recommend(scores: &SubScores, thresholds: &MasteryThresholds) -> NextAction {
    let mut worst: Option<(Dimension, u8)> = None;
    for dimension in Dimension::ALL {
        let Some(required) = thresholds.for_dimension(dimension) else {
            continue;
        };
        let score = scores.get(dimension);
        if score >= required {
            continue;
        }
        let shortfall = required - score;
        if worst.map_or(true, |(_, s)| shortfall > s) {
            worst = Some((dimension, shortfall));
        }
    }
    match worst {
        Some((focus, _)) => NextAction::Retry { focus },
        None => NextAction::Advance,
    }
}

/// Evaluation engine holding its scoring parameters.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvaluationConfig,
}

impl Evaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Score `user` against `reference` for one letter of a competence.
    pub fn evaluate(
        &self,
        user: &Trace,
        reference: &Trace,
        target: &LetterTarget,
        trace_start_ms: i64,
        competence: &Competence,
    ) -> Result<Evaluation> {
        if user.kind() != TraceKind::User {
            return Err(ScribeError::InvalidState(
                "only a user trace can be evaluated".into(),
            ));
        }
        if !user.is_finalized() {
            return Err(ScribeError::InvalidState(
                "user trace must be finalized before evaluation".into(),
            ));
        }
        let required = self.config.min_user_points.max(MIN_USER_POINTS_FLOOR);
        if user.len() < required {
            return Err(ScribeError::InsufficientTrace {
                points: user.len(),
                required,
            });
        }
        if reference.len() < 2 {
            return Err(ScribeError::DegenerateReference(format!(
                "reference for '{}' has {} point(s)",
                target.letter,
                reference.len()
            )));
        }
        if reference.arc_length() <= f64::EPSILON {
            return Err(ScribeError::DegenerateReference(format!(
                "reference for '{}' has zero length",
                target.letter
            )));
        }

        let n = self.config.resample_points;
        let user_path = resample(user.points(), n)?;
        let reference_path = resample(reference.points(), n)?;

        let mean_distance_px = user_path
            .iter()
            .zip(&reference_path)
            .map(|(u, r)| (u.0 - r.0).hypot(u.1 - r.1))
            .sum::<f64>()
            / n as f64;
        let precision = precision_score(mean_distance_px, target.precision_tolerance_px);

        let duration_ms = user.duration_ms();
        let speed = speed_score(duration_ms, target.speed_target_ms);

        let jerk = turning_jerk(&user_path);
        let reference_jerk = turning_jerk(&reference_path);
        let fluidity = fluidity_score(jerk, reference_jerk);

        let angle_deg = dominant_angle(&user_path);
        let angle_deviation_deg = match (angle_deg, target.inclination_angle) {
            (Some(angle), Some(expected)) => Some(axis_deviation(angle, expected)),
            _ => None,
        };
        let inclination = match (target.inclination_angle, angle_deviation_deg) {
            (None, _) => 100,
            (Some(_), Some(dev)) => falloff(dev, INCLINATION_CUTOFF_DEG),
            (Some(_), None) => 0,
        };

        let pressure_summary = self.config.pressure.classify_series(user.pressures());
        let pressure = pressure_summary.score();

        let scores = SubScores {
            precision,
            speed,
            fluidity,
            inclination,
            pressure,
        };
        let aggregate = scores.aggregate();
        let validated = verdict(&scores, &competence.thresholds);
        let next_action = recommend(&scores, &competence.thresholds);
        let metrics = TraceMetrics {
            user_points: user.len(),
            mean_distance_px,
            duration_ms,
            speed_target_ms: target.speed_target_ms,
            jerk,
            reference_jerk,
            angle_deg,
            angle_deviation_deg,
            pressure: pressure_summary,
        };
        let tags = comment_tags(&scores, &metrics, aggregate, validated);

        tracing::debug!(
            competence = %competence.code,
            letter = %target.letter,
            precision,
            speed,
            fluidity,
            inclination,
            pressure,
            aggregate,
            validated,
            "trace evaluated"
        );

        Ok(Evaluation {
            competence: competence.code.clone(),
            letter: target.letter.clone(),
            started_at_ms: trace_start_ms,
            scores,
            aggregate,
            validated,
            tags,
            next_action,
            metrics,
        })
    }
}

/// Evaluate with the default parameters.
pub fn evaluate(
    user: &Trace,
    reference: &Trace,
    target: &LetterTarget,
    trace_start_ms: i64,
    competence: &Competence,
) -> Result<Evaluation> {
    Evaluator::default().evaluate(user, reference, target, trace_start_ms, competence)
}

/// Linear falloff: 100 at zero, 0 at `cutoff` and beyond.
fn falloff(value: f64, cutoff: f64) -> u8 {
    if cutoff.is_nan() || cutoff <= 0.0 {
        return if value <= f64::EPSILON { 100 } else { 0 };
    }
    (100.0 * (1.0 - value / cutoff)).round().clamp(0.0, 100.0) as u8
}

fn precision_score(mean_distance_px: f64, tolerance_px: f64) -> u8 {
    falloff(mean_distance_px, tolerance_px)
}

fn speed_score(duration_ms: f64, target_ms: f64) -> u8 {
    if target_ms.is_nan() || target_ms <= 0.0 {
        return 100;
    }
    let deviation = (duration_ms - target_ms).abs() / target_ms;
    if deviation <= SPEED_TOLERANCE {
        return 100;
    }
    falloff(deviation - SPEED_TOLERANCE, SPEED_CUTOFF - SPEED_TOLERANCE)
}

fn fluidity_score(jerk: f64, reference_jerk: f64) -> u8 {
    let excess = (jerk - reference_jerk).max(0.0);
    (100.0 / (1.0 + excess / FLUIDITY_JERK_SCALE))
        .round()
        .clamp(0.0, 100.0) as u8
}

fn wrap_angle(mut a: f64) -> f64 {
    while a > PI {
        a -= 2.0 * PI;
    }
    while a <= -PI {
        a += 2.0 * PI;
    }
    a
}

/// Mean squared change of the turning angle between consecutive segments.
///
/// Zero-length segments carry no direction and are skipped.
pub fn turning_jerk(path: &[(f64, f64)]) -> f64 {
    let mut prev_direction: Option<f64> = None;
    let mut prev_turn: Option<f64> = None;
    let mut sum = 0.0;
    let mut count = 0usize;

    for w in path.windows(2) {
        let (dx, dy) = (w[1].0 - w[0].0, w[1].1 - w[0].1);
        if dx.hypot(dy) <= f64::EPSILON {
            continue;
        }
        let direction = dy.atan2(dx);
        if let Some(prev) = prev_direction {
            let turn = wrap_angle(direction - prev);
            if let Some(last_turn) = prev_turn {
                let change = turn - last_turn;
                sum += change * change;
                count += 1;
            }
            prev_turn = Some(turn);
        }
        prev_direction = Some(direction);
    }

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Angle of the principal axis of the point cloud, in degrees within
/// [0, 180), counter-clockwise from horizontal with canvas y flipped up.
///
/// Returns `None` when every point coincides.
pub fn dominant_angle(path: &[(f64, f64)]) -> Option<f64> {
    if path.is_empty() {
        return None;
    }
    let n = path.len() as f64;
    let mx = path.iter().map(|p| p.0).sum::<f64>() / n;
    let my = path.iter().map(|p| -p.1).sum::<f64>() / n;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &(x, y) in path {
        let (dx, dy) = (x - mx, -y - my);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx + syy <= f64::EPSILON {
        return None;
    }
    let angle = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    Some(angle.to_degrees().rem_euclid(180.0))
}

/// Deviation between two undirected axes, in degrees within [0, 90].
pub fn axis_deviation(angle_deg: f64, expected_deg: f64) -> f64 {
    let expected = expected_deg.rem_euclid(360.0).rem_euclid(180.0);
    let diff = (angle_deg - expected).abs().rem_euclid(180.0);
    diff.min(180.0 - diff)
}

fn comment_tags(
    scores: &SubScores,
    metrics: &TraceMetrics,
    aggregate: u8,
    validated: bool,
) -> Vec<CommentTag> {
    let mut tags = Vec::new();
    if scores.precision < 50 {
        tags.push(CommentTag::Imprecise);
    }
    if scores.speed < 60 {
        if metrics.duration_ms < metrics.speed_target_ms {
            tags.push(CommentTag::TooFast);
        } else {
            tags.push(CommentTag::TooSlow);
        }
    }
    if scores.fluidity < 50 {
        tags.push(CommentTag::Jerky);
    }
    if scores.inclination < 50 {
        tags.push(CommentTag::WrongSlant);
    }
    match metrics.pressure.band {
        PressureBand::Absent => tags.push(CommentTag::NoPressure),
        PressureBand::TooLight => tags.push(CommentTag::PressureTooLight),
        PressureBand::TooHeavy => tags.push(CommentTag::PressureTooHeavy),
        PressureBand::Ideal => {}
    }
    if metrics.pressure.is_unsteady() {
        tags.push(CommentTag::UnsteadyPressure);
    } else if metrics.pressure.consistent {
        tags.push(CommentTag::ConsistentPressure);
    }
    if validated && aggregate >= 90 {
        tags.push(CommentTag::Excellent);
    }
    tags
}
