//! Error types for the Lambda deployment system.
//!
//! This module provides the error hierarchy for every stage of a run:
//! configuration loading, parameter validation, remote AWS calls and
//! reconciliation.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the Lambda deployment system.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Deployment parameters are incomplete.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Remote control-plane errors.
    #[error("AWS API error: {0}")]
    Remote(#[from] RemoteError),

    /// Reconciliation errors.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// A configuration value is out of range or malformed.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Name of the offending field.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// The local code archive could not be read.
    #[error("Failed to read archive {path}: {message}")]
    ArchiveUnreadable {
        /// Path to the archive.
        path: PathBuf,
        /// Underlying IO error description.
        message: String,
    },
}

/// A single failed parameter rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the parameter that failed.
    pub field: &'static str,
    /// Human readable description.
    pub message: String,
}

/// Every rule violated by a deployment parameter set.
///
/// Violations are accumulated rather than reported one at a time so the
/// operator can fix the whole configuration in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    /// The violated rules, in evaluation order.
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// Returns true if any violation concerns the given field.
    #[must_use]
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error in inputs:")?;
        for violation in &self.violations {
            write!(f, " {}.", violation.message)?;
        }
        Ok(())
    }
}

/// Errors returned by the remote Lambda and IAM control planes.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// A resource that must exist was not found.
    #[error("{resource} not found: {name}")]
    NotFound {
        /// Kind of resource (function, role).
        resource: &'static str,
        /// Name of the missing resource.
        name: String,
    },

    /// The resource is busy with a previous mutation.
    #[error("{operation} conflicted with an in-progress update: {message}")]
    Conflict {
        /// Remote operation that was rejected.
        operation: &'static str,
        /// Message from the remote service.
        message: String,
    },

    /// Any other failed remote call.
    #[error("{operation} failed: {message}")]
    ApiRequestFailed {
        /// Remote operation that failed.
        operation: &'static str,
        /// Message from the remote service.
        message: String,
    },

    /// The remote service answered with something unusable.
    #[error("Invalid response from {operation}: {message}")]
    InvalidResponse {
        /// Remote operation that produced the response.
        operation: &'static str,
        /// Description of the response issue.
        message: String,
    },
}

/// Reconciliation errors.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Configuration kept conflicting until the deadline passed.
    #[error(
        "Gave up updating configuration of '{function}' after {attempts} attempts: deadline of {deadline_secs}s exceeded"
    )]
    DeadlineExceeded {
        /// Function being converged.
        function: String,
        /// Number of update attempts made.
        attempts: u32,
        /// Configured deadline in seconds.
        deadline_secs: u64,
    },

    /// The function was deleted but its role could not be.
    #[error("Function '{function}' was deleted but role '{role}' could not be: {reason}")]
    RoleDeletionFailed {
        /// Deleted function.
        function: String,
        /// Role that survived.
        role: String,
        /// Reason for failure.
        reason: String,
    },

    /// The run was interrupted by the operator.
    #[error("Operation cancelled: {reason}")]
    Cancelled {
        /// Reason for cancellation.
        reason: String,
    },
}

/// Result type alias for deployment operations.
pub type Result<T> = std::result::Result<T, DeployError>;

impl DeployError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if the remote resource was busy with another mutation.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Remote(RemoteError::Conflict { .. }))
    }

    /// Returns true if a required remote resource was missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote(RemoteError::NotFound { .. }))
    }

    /// Returns true if configuration convergence ran out of time.
    #[must_use]
    pub const fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::Reconcile(ReconcileError::DeadlineExceeded { .. }))
    }
}

impl RemoteError {
    /// Creates an API request error.
    #[must_use]
    pub fn api(operation: &'static str, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            operation,
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(operation: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            operation,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_every_violation() {
        let err = ValidationError {
            violations: vec![
                Violation {
                    field: "name",
                    message: String::from("Function name cannot be empty"),
                },
                Violation {
                    field: "runtime",
                    message: String::from("Runtime must be specified"),
                },
            ],
        };

        let message = err.to_string();
        assert!(message.contains("Function name cannot be empty"));
        assert!(message.contains("Runtime must be specified"));
        assert!(err.mentions("runtime"));
        assert!(!err.mentions("handler"));
    }

    #[test]
    fn test_classification() {
        let conflict = DeployError::from(RemoteError::Conflict {
            operation: "UpdateFunctionConfiguration",
            message: String::from("update in progress"),
        });
        assert!(conflict.is_conflict());
        assert!(!conflict.is_not_found());

        let deadline = DeployError::from(ReconcileError::DeadlineExceeded {
            function: String::from("svc"),
            attempts: 3,
            deadline_secs: 20,
        });
        assert!(deadline.is_deadline_exceeded());
        assert!(!deadline.is_conflict());
    }
}
