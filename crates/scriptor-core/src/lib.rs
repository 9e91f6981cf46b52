//! scriptor-core: handwriting competency evaluation.
//!
//! Scores stylus traces of cursive letters against generated reference
//! traces, classifies pen pressure, and tracks competence mastery through a
//! curriculum catalog. Everything here is synchronous; callers own the input
//! loop and the clock.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod pressure;
pub mod progression;
pub mod reference;
pub mod report;
pub mod session;
pub mod statistics;
pub mod trace;
pub mod traits;

pub use error::{Result, ScribeError};
