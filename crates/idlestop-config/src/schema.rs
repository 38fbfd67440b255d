//! Raw configuration schema (as parsed from TOML)

use idlestop_api::{EmptyDirPolicy, MalformedMarkerPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Where markers live and how ambiguous ones are judged
    #[serde(default)]
    pub markers: RawMarkerConfig,

    /// Billing cycle of the cloud provider
    #[serde(default)]
    pub billing: RawBillingConfig,

    /// How the OS shutdown is carried out
    #[serde(default)]
    pub shutdown: RawShutdownConfig,
}

/// Marker directory settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawMarkerConfig {
    /// Marker directory (default: /tmp/idle-tracking)
    pub dir: Option<PathBuf>,

    /// Marker file extension, with or without the leading dot (default: log)
    pub extension: Option<String>,

    /// "idle" or "busy" when the directory holds no markers
    pub empty_dir: Option<EmptyDirPolicy>,

    /// "fail" or "busy" when a marker cannot be parsed
    pub malformed: Option<MalformedMarkerPolicy>,

    /// Minutes every marker must have been timed out before the machine counts as idle
    pub idle_quiet_minutes: Option<u64>,
}

/// Billing settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawBillingConfig {
    /// Length of one billing unit. EC2 classic: 60. GCE: 1.
    pub cycle_length_minutes: Option<u64>,

    /// Shut down an idle machine once fewer minutes than this remain in the cycle
    pub threshold_minutes: Option<u64>,

    /// Minutes paid up front at boot. GCE: 10. 0 disables the boot block.
    pub paid_on_boot_minutes: Option<u64>,
}

/// Shutdown execution settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawShutdownConfig {
    /// Command and arguments; the message is appended as the last argument
    pub command: Option<Vec<String>>,

    /// Broadcast message passed to the shutdown command
    pub message: Option<String>,

    /// Decide and log, but never run the command
    #[serde(default)]
    pub dry_run: bool,
}
