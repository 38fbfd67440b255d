//! Validated policy structures

use crate::schema::{RawBillingConfig, RawConfig, RawMarkerConfig, RawShutdownConfig};
use crate::validation::parse_extension;
use idlestop_api::{EmptyDirPolicy, MalformedMarkerPolicy};
use idlestop_util::{DEFAULT_MARKER_DIR, DEFAULT_MARKER_EXTENSION};
use std::path::PathBuf;

/// Billing unit length used when none is configured (EC2 hourly billing)
pub const DEFAULT_CYCLE_LENGTH_MINUTES: u64 = 60;

/// Shut down once fewer than this many paid minutes remain
pub const DEFAULT_THRESHOLD_MINUTES: u64 = 5;

pub const DEFAULT_SHUTDOWN_MESSAGE: &str = "Shutdown by idlestop due to inactivity";

/// Validated policy ready for use by the evaluator
#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub markers: MarkerPolicy,
    pub billing: BillingPolicy,
    pub shutdown: ShutdownPolicy,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            markers: MarkerPolicy::from_raw(raw.markers),
            billing: BillingPolicy::from_raw(raw.billing),
            shutdown: ShutdownPolicy::from_raw(raw.shutdown),
        }
    }
}

/// Where markers are read from and how the ambiguous cases are judged
#[derive(Debug, Clone)]
pub struct MarkerPolicy {
    pub dir: PathBuf,
    /// Without the leading dot
    pub extension: String,
    pub empty_dir: EmptyDirPolicy,
    pub malformed: MalformedMarkerPolicy,
    /// 0 disables the quiet period
    pub idle_quiet_minutes: u64,
}

impl MarkerPolicy {
    fn from_raw(raw: RawMarkerConfig) -> Self {
        let defaults = Self::default();
        Self {
            dir: raw.dir.unwrap_or(defaults.dir),
            extension: raw
                .extension
                .and_then(|e| parse_extension(&e).ok())
                .unwrap_or(defaults.extension),
            empty_dir: raw.empty_dir.unwrap_or_default(),
            malformed: raw.malformed.unwrap_or_default(),
            idle_quiet_minutes: raw.idle_quiet_minutes.unwrap_or(0),
        }
    }
}

impl Default for MarkerPolicy {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_MARKER_DIR),
            extension: DEFAULT_MARKER_EXTENSION.to_string(),
            empty_dir: EmptyDirPolicy::default(),
            malformed: MalformedMarkerPolicy::default(),
            idle_quiet_minutes: 0,
        }
    }
}

/// Billing cycle of the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPolicy {
    pub cycle_length_minutes: u64,
    pub threshold_minutes: u64,
    /// 0 means cycles start at boot
    pub paid_on_boot_minutes: u64,
}

impl BillingPolicy {
    fn from_raw(raw: RawBillingConfig) -> Self {
        let defaults = Self::default();
        Self {
            cycle_length_minutes: raw
                .cycle_length_minutes
                .unwrap_or(defaults.cycle_length_minutes),
            threshold_minutes: raw.threshold_minutes.unwrap_or(defaults.threshold_minutes),
            paid_on_boot_minutes: raw.paid_on_boot_minutes.unwrap_or(0),
        }
    }
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            cycle_length_minutes: DEFAULT_CYCLE_LENGTH_MINUTES,
            threshold_minutes: DEFAULT_THRESHOLD_MINUTES,
            paid_on_boot_minutes: 0,
        }
    }
}

/// How a shutdown decision is carried out
#[derive(Debug, Clone)]
pub struct ShutdownPolicy {
    pub command: Vec<String>,
    pub message: String,
    pub dry_run: bool,
}

impl ShutdownPolicy {
    fn from_raw(raw: RawShutdownConfig) -> Self {
        let defaults = Self::default();
        Self {
            command: raw.command.unwrap_or(defaults.command),
            message: raw.message.unwrap_or(defaults.message),
            dry_run: raw.dry_run,
        }
    }
}

impl Default for ShutdownPolicy {
    fn default() -> Self {
        Self {
            command: vec!["/sbin/shutdown".into(), "-h".into(), "now".into()],
            message: DEFAULT_SHUTDOWN_MESSAGE.into(),
            dry_run: false,
        }
    }
}
