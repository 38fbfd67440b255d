//! Configuration parsing and validation for idlestop
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Marker directory, extension and the empty/malformed policies
//! - Billing cycle length, shutdown threshold and paid-on-boot block
//! - Shutdown command
//! - Validation with clear error messages

mod policy;
mod schema;
mod validation;

pub use policy::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Policy> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load the config file if it exists, built-in defaults otherwise.
///
/// Only for the default location: an explicitly requested file that is
/// missing should go through [`load_config`] and fail.
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<Policy> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(Policy::default());
    }
    load_config(path)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Policy> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Policy::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use idlestop_api::EmptyDirPolicy;
    use std::io::Write;

    #[test]
    fn parse_minimal_config() {
        let config = r#"
            config_version = 1

            [markers]
            dir = "/var/run/ci-jobs"
            empty_dir = "busy"
        "#;

        let policy = parse_config(config).unwrap();
        assert_eq!(policy.markers.dir.to_str(), Some("/var/run/ci-jobs"));
        assert_eq!(policy.markers.empty_dir, EmptyDirPolicy::Busy);
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let config = r#"
            config_version = 1
            [billing]
            cycle_length_minutes = 0
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { errors }) if errors.len() == 1));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "config_version = 1\n[billing]\nthreshold_minutes = 3").unwrap();

        let policy = load_config(file.path()).unwrap();
        assert_eq!(policy.billing.threshold_minutes, 3);
    }

    #[test]
    fn missing_default_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let policy = load_config_or_default(&path).unwrap();
        assert_eq!(policy.billing.cycle_length_minutes, DEFAULT_CYCLE_LENGTH_MINUTES);

        assert!(matches!(load_config(&path), Err(ConfigError::ReadError(_))));
    }
}
