//! Parameter validation for deployment specs.
//!
//! Rules depend on whether the function is about to be created or updated:
//! creating a function additionally needs a runtime and a handler.

use crate::error::{ValidationError, Violation};
use tracing::debug;

use super::spec::DeploymentSpec;

/// Which remote mutation a deployment spec is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// The function does not exist yet.
    Create,
    /// The function already exists.
    Update,
}

/// Validator for deployment parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParameterValidator;

impl ParameterValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a deployment spec, collecting every violated rule.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing all missing or invalid fields.
    pub fn validate(
        &self,
        spec: &DeploymentSpec,
        mode: ValidationMode,
    ) -> std::result::Result<(), ValidationError> {
        let mut violations = Vec::new();

        if spec.function_name().is_empty() {
            violations.push(Violation {
                field: "name",
                message: String::from("Function name cannot be empty"),
            });
        }

        if spec.code_source().is_none() {
            violations.push(Violation {
                field: "code",
                message: String::from("Either bucket and key or archive path must be supplied"),
            });
        }

        if mode == ValidationMode::Create {
            if spec.runtime().is_empty() {
                violations.push(Violation {
                    field: "runtime",
                    message: String::from("Runtime must be specified"),
                });
            }
            if spec.handler().is_empty() {
                violations.push(Violation {
                    field: "handler",
                    message: String::from("Handler must be specified"),
                });
            }
        }

        if violations.is_empty() {
            debug!("Parameters valid for {:?}", mode);
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }

    /// Validates only a function name, as used by deletion.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the name is blank.
    pub fn validate_name(&self, name: &str) -> std::result::Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError {
                violations: vec![Violation {
                    field: "name",
                    message: String::from("Function name cannot be empty"),
                }],
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_spec() -> DeploymentSpec {
        DeploymentSpec::new("svc-a")
            .with_zip_file("a.zip")
            .with_runtime("python3.12", "app.handler")
    }

    #[test]
    fn test_complete_spec_passes_both_modes() {
        let validator = ParameterValidator::new();
        let spec = complete_spec();

        assert!(validator.validate(&spec, ValidationMode::Create).is_ok());
        assert!(validator.validate(&spec, ValidationMode::Update).is_ok());
    }

    #[test]
    fn test_missing_name() {
        let validator = ParameterValidator::new();
        let mut spec = complete_spec();
        spec.name = String::from("   ");

        let err = validator
            .validate(&spec, ValidationMode::Update)
            .expect_err("blank name must fail");
        assert!(err.mentions("name"));
        assert!(err.to_string().contains("Function name"));
    }

    #[test]
    fn test_missing_code_source() {
        let validator = ParameterValidator::new();
        let mut spec = complete_spec();
        spec.zip_file = String::new();
        spec.s3_bucket = String::from("bucket");

        let err = validator
            .validate(&spec, ValidationMode::Update)
            .expect_err("bucket without key must fail");
        assert!(err.mentions("code"));
        assert!(err.to_string().contains("bucket and key or archive path"));
    }

    #[test]
    fn test_s3_reference_alone_is_enough() {
        let validator = ParameterValidator::new();
        let mut spec = complete_spec().with_s3_code("bucket", "key.zip");
        spec.zip_file = String::new();

        assert!(validator.validate(&spec, ValidationMode::Create).is_ok());
    }

    #[test]
    fn test_create_rules_skipped_on_update() {
        let validator = ParameterValidator::new();
        let spec = DeploymentSpec::new("svc-a").with_zip_file("a.zip");

        assert!(validator.validate(&spec, ValidationMode::Update).is_ok());

        let err = validator
            .validate(&spec, ValidationMode::Create)
            .expect_err("create needs runtime and handler");
        assert!(err.mentions("runtime"));
        assert!(err.mentions("handler"));
    }

    #[test]
    fn test_violations_accumulate() {
        let validator = ParameterValidator::new();
        let spec = DeploymentSpec::default();

        let err = validator
            .validate(&spec, ValidationMode::Create)
            .expect_err("empty spec must fail");
        assert_eq!(err.violations.len(), 4);
    }

    #[test]
    fn test_validate_name() {
        let validator = ParameterValidator::new();
        assert!(validator.validate_name("svc").is_ok());
        assert!(validator.validate_name(" ").is_err());
    }
}
