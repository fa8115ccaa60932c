//! Command argument validation utilities
//!
//! Checks applied after clap parsing, for rules clap cannot express.

use anyhow::{Result, anyhow};

/// Validation errors for command arguments
#[derive(Debug, PartialEq)]
pub enum CommandValidationError {
    /// Required argument was not provided
    MissingRequired { argument: String },
    /// Invalid argument value
    InvalidValue {
        argument: String,
        value: String,
        reason: String,
    },
}

impl std::fmt::Display for CommandValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandValidationError::MissingRequired { argument } => {
                write!(f, "{} is required", argument)
            }
            CommandValidationError::InvalidValue {
                argument,
                value,
                reason,
            } => {
                write!(f, "Invalid value '{}' for {}: {}", value, argument, reason)
            }
        }
    }
}

impl std::error::Error for CommandValidationError {}

/// Convert validation error to anyhow::Error
pub fn validation_error_to_anyhow(error: CommandValidationError) -> anyhow::Error {
    anyhow!(error.to_string())
}

/// Validate get command arguments
///
/// The target must be non-blank and at least one attempt must be made.
pub fn validate_get_args(target: &str, repeat: u32) -> Result<()> {
    if target.trim().is_empty() {
        return Err(validation_error_to_anyhow(
            CommandValidationError::MissingRequired {
                argument: "a path or URL".to_string(),
            },
        ));
    }
    if repeat == 0 {
        return Err(validation_error_to_anyhow(
            CommandValidationError::InvalidValue {
                argument: "--repeat".to_string(),
                value: repeat.to_string(),
                reason: "must be at least 1".to_string(),
            },
        ));
    }
    Ok(())
}

/// Validate an explicitly passed token
///
/// `None` is fine (the environment or anonymous access is used instead).
pub fn validate_token(token: &Option<String>) -> Result<()> {
    if let Some(token) = token
        && token.trim().is_empty()
    {
        return Err(validation_error_to_anyhow(
            CommandValidationError::InvalidValue {
                argument: "--token".to_string(),
                value: token.clone(),
                reason: "token cannot be empty or whitespace only".to_string(),
            },
        ));
    }
    Ok(())
}
