//! Host adapter trait interfaces for idlestop
//!
//! This crate defines the capability-based interface between the evaluator
//! and the machine it runs on. It contains no platform code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
