//! One-shot idle check: evaluate the marker directory and, when asked to,
//! act on the decision.
//!
//! The binary wires real host adapters into [`Runner`]; tests use `MockHost`.

mod render;
mod runner;

pub use render::*;
pub use runner::*;
