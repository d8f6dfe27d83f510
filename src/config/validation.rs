//! Configuration validation
//!
//! Checks a [`MailConfig`] before the store is opened:
//! - Pool and cache sizes are non-zero
//! - The database path names a file

use super::mail_config::MailConfig;
use crate::GameMailError;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a gamemail configuration
pub fn validate_config(config: &MailConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.database.pool_size == 0 {
        errors.push(ValidationError::new(
            "database.pool_size",
            "Pool size must be greater than 0",
        ));
    }

    if config.database.path.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "database.path",
            "Database path must not be empty",
        ));
    } else if config.database.path.file_name().is_none() {
        errors.push(ValidationError::new(
            "database.path",
            format!(
                "Database path '{}' does not name a file",
                config.database.path.display()
            ),
        ));
    }

    if config.cache.capacity == 0 {
        errors.push(ValidationError::new(
            "cache.capacity",
            "Cache capacity must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate and fold every problem into one crate error
pub fn validate_config_result(config: &MailConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        GameMailError::Config(format!(
            "Invalid configuration:\n  {}",
            messages.join("\n  ")
        ))
    })
}
