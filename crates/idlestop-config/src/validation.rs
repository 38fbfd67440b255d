//! Configuration validation

use crate::schema::{RawBillingConfig, RawConfig, RawMarkerConfig, RawShutdownConfig};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("[markers] {message}")]
    MarkerError { message: String },

    #[error("Invalid marker extension '{value}': {message}")]
    InvalidExtension { value: String, message: String },

    #[error("[billing] {field} must be greater than 0")]
    ZeroBillingValue { field: &'static str },

    #[error("[shutdown] {message}")]
    ShutdownError { message: String },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_markers(&config.markers));
    errors.extend(validate_billing(&config.billing));
    errors.extend(validate_shutdown(&config.shutdown));

    errors
}

fn validate_markers(markers: &RawMarkerConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(dir) = &markers.dir
        && dir.as_os_str().is_empty()
    {
        errors.push(ValidationError::MarkerError {
            message: "dir cannot be empty".into(),
        });
    }

    if let Some(ext) = &markers.extension
        && let Err(message) = parse_extension(ext)
    {
        errors.push(ValidationError::InvalidExtension {
            value: ext.clone(),
            message,
        });
    }

    errors
}

fn validate_billing(billing: &RawBillingConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if billing.cycle_length_minutes == Some(0) {
        errors.push(ValidationError::ZeroBillingValue {
            field: "cycle_length_minutes",
        });
    }

    // Remaining time is always at least one minute, so 0 would never shut down
    if billing.threshold_minutes == Some(0) {
        errors.push(ValidationError::ZeroBillingValue {
            field: "threshold_minutes",
        });
    }

    errors
}

fn validate_shutdown(shutdown: &RawShutdownConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(command) = &shutdown.command {
        match command.first() {
            None => errors.push(ValidationError::ShutdownError {
                message: "command cannot be empty".into(),
            }),
            Some(program) if program.trim().is_empty() => {
                errors.push(ValidationError::ShutdownError {
                    message: "command program cannot be blank".into(),
                })
            }
            Some(_) => {}
        }
    }

    errors
}

/// Normalize a marker extension: strip one leading dot, reject anything
/// that cannot be a single filename extension.
pub fn parse_extension(s: &str) -> Result<String, String> {
    let ext = s.strip_prefix('.').unwrap_or(s);

    if ext.is_empty() {
        return Err("extension cannot be empty".into());
    }
    if ext.contains('.') {
        return Err("only a single extension is supported".into());
    }
    if ext.contains('/') || ext.contains('\\') {
        return Err("extension cannot contain path separators".into());
    }
    if ext.chars().any(char::is_whitespace) {
        return Err("extension cannot contain whitespace".into());
    }

    Ok(ext.to_string())
}
