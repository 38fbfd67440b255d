//! Shared data types for idlestop
//!
//! This crate defines the vocabulary used between the evaluator, the config
//! layer and the CLI:
//! - Markers and per-marker verdicts
//! - Machine idle state and the final shutdown decision
//! - Policies for the ambiguous cases (empty directory, malformed marker)
//! - The evaluation report printed by the CLI

mod report;
mod types;

pub use report::*;
pub use types::*;
