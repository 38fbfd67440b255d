//! Idleness evaluator for idlestop
//!
//! This crate is the heart of idlestop, containing:
//! - Marker scanning (`MarkerSource`, directory and in-memory implementations)
//! - Per-marker verdicts (busy / timed out)
//! - Aggregation into a machine idle state, with the optional quiet period
//! - Billing cycle position and the shutdown decision
//!
//! Nothing here reads the clock or the uptime: both are passed in.

mod aggregate;
mod billing;
mod evaluator;
mod markers;
mod verdict;

pub use aggregate::*;
pub use billing::*;
pub use evaluator::*;
pub use markers::*;
pub use verdict::*;
