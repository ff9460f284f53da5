//! IAM policy documents.
//!
//! Structural model of the JSON documents sent to IAM: the trust policy that
//! lets Lambda assume a role and the generated least-privilege logging policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ConfigError, DeployError, Result};

/// IAM policy language version.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Service principal of AWS Lambda.
pub const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";

/// An IAM policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// Policy language version.
    pub version: String,
    /// Statements.
    pub statement: Vec<PolicyStatement>,
}

/// A single statement of a policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    /// `Allow` or `Deny`.
    pub effect: String,
    /// Actions covered by the statement.
    pub action: Vec<String>,
    /// Principal (trust policies only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<BTreeMap<String, String>>,
    /// Resource the statement applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl PolicyStatement {
    fn allow(actions: &[&str], resource: String) -> Self {
        Self {
            effect: String::from("Allow"),
            action: actions.iter().map(|a| (*a).to_string()).collect(),
            principal: None,
            resource: Some(resource),
        }
    }
}

impl PolicyDocument {
    /// Trust policy allowing the Lambda service to assume the role.
    #[must_use]
    pub fn lambda_trust_policy() -> Self {
        Self {
            version: String::from(POLICY_VERSION),
            statement: vec![PolicyStatement {
                effect: String::from("Allow"),
                action: vec![String::from("sts:AssumeRole")],
                principal: Some(BTreeMap::from([(
                    String::from("Service"),
                    String::from(LAMBDA_SERVICE_PRINCIPAL),
                )])),
                resource: None,
            }],
        }
    }

    /// Minimal logging policy scoped to the function's own log group.
    #[must_use]
    pub fn basic_execution_policy(region: Option<&str>, account_id: &str, function_name: &str) -> Self {
        let region = region.unwrap_or("*");
        Self {
            version: String::from(POLICY_VERSION),
            statement: vec![
                PolicyStatement::allow(
                    &["logs:CreateLogGroup"],
                    format!("arn:aws:logs:{region}:{account_id}:*"),
                ),
                PolicyStatement::allow(
                    &["logs:CreateLogStream", "logs:PutLogEvents"],
                    format!("arn:aws:logs:{region}:{account_id}:log-group:/aws/lambda/{function_name}:*"),
                ),
            ],
        }
    }

    /// Serializes the document to the JSON text IAM expects.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| DeployError::internal(format!("Failed to serialize policy: {e}")))
    }
}

/// Checks that a user-supplied policy is a JSON object.
///
/// Only the outer shape is checked; IAM performs the full grammar check.
///
/// # Errors
///
/// Returns a configuration error if the text is not a JSON object.
pub fn check_custom_policy(document: &str) -> Result<()> {
    match serde_json::from_str::<serde_json::Value>(document) {
        Ok(serde_json::Value::Object(_)) => Ok(()),
        Ok(_) => Err(DeployError::Config(ConfigError::InvalidValue {
            field: String::from("policy"),
            message: String::from("policy document must be a JSON object"),
        })),
        Err(e) => Err(DeployError::Config(ConfigError::InvalidValue {
            field: String::from("policy"),
            message: format!("policy document is not valid JSON: {e}"),
        })),
    }
}
