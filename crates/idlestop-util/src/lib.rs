//! Shared utilities for idlestop
//!
//! This crate provides:
//! - Error types
//! - Time utilities (injectable wall clock, whole-minute arithmetic)
//! - Default paths for the config file and the marker directory

mod error;
mod paths;
mod time;

pub use error::*;
pub use paths::*;
pub use time::*;
