//! Linux host adapter for idlestop
//!
//! Provides:
//! - Uptime from `/proc/uptime`
//! - Shutdown through an external command (`/sbin/shutdown -h now` by default)

mod shutdown;
mod uptime;

pub use shutdown::*;
pub use uptime::*;
