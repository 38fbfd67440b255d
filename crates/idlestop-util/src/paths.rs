//! Default paths for idlestop components
//!
//! - Config: `$XDG_CONFIG_HOME/idlestop/config.toml` or `~/.config/idlestop/config.toml`
//! - Markers: `/tmp/idle-tracking`, shared with the job runners that write them

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const IDLESTOP_CONFIG_ENV: &str = "IDLESTOP_CONFIG";

/// Environment variable for overriding the marker directory
pub const IDLESTOP_MARKER_DIR_ENV: &str = "IDLESTOP_MARKER_DIR";

/// Directory job runners write their marker files to unless configured otherwise
pub const DEFAULT_MARKER_DIR: &str = "/tmp/idle-tracking";

/// Extension (without the dot) a file needs to count as a marker
pub const DEFAULT_MARKER_EXTENSION: &str = "log";

const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "idlestop";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$IDLESTOP_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/idlestop/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/idlestop/config.toml`
/// 4. `/etc/idlestop/config.toml` (no HOME, e.g. under cron as a system user)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(IDLESTOP_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking IDLESTOP_CONFIG.
/// Used where the env var is handled separately (clap).
pub fn config_path_without_env() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_contains_idlestop() {
        let path = config_path_without_env();
        assert!(path.to_string_lossy().contains("idlestop"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn default_extension_has_no_dot() {
        assert!(!DEFAULT_MARKER_EXTENSION.starts_with('.'));
    }
}
