//! Types exchanged with the Lambda and IAM control planes.
//!
//! These are SDK-independent so the reconciliation logic can be driven by
//! any [`ComputeApi`](super::ComputeApi) / [`IdentityApi`](super::IdentityApi)
//! implementation.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::DeploymentSpec;

/// An IAM role as returned by the identity API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    /// Role name.
    pub name: String,
    /// Role ARN.
    pub arn: String,
}

/// Reference to a managed policy (created or attached).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRef {
    /// Policy name.
    pub name: String,
    /// Policy ARN.
    pub arn: String,
}

/// A deployed Lambda function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FunctionRecord {
    /// Function name.
    pub name: String,
    /// Function ARN.
    pub arn: Option<String>,
    /// ARN of the execution role.
    pub role: Option<String>,
    /// Runtime identifier.
    pub runtime: Option<String>,
    /// Handler identifier.
    pub handler: Option<String>,
    /// Memory in MB.
    pub memory_mb: Option<u32>,
    /// Timeout in seconds.
    pub timeout_secs: Option<u32>,
}

/// Function code ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodePackage {
    /// Object already in S3.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
    },
    /// Raw zip bytes.
    ZipFile(Vec<u8>),
}

impl CodePackage {
    /// Short description for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::S3 { bucket, key } => format!("s3://{bucket}/{key}"),
            Self::ZipFile(bytes) => format!("zip archive ({} bytes)", bytes.len()),
        }
    }
}

/// Request to create a new function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFunctionRequest {
    /// Function name.
    pub name: String,
    /// Execution role ARN.
    pub role_arn: String,
    /// Runtime identifier.
    pub runtime: String,
    /// Handler identifier.
    pub handler: String,
    /// Memory in MB, if specified.
    pub memory_mb: Option<u32>,
    /// Timeout in seconds, if specified.
    pub timeout_secs: Option<u32>,
    /// Environment variables, if specified.
    pub environment: Option<BTreeMap<String, String>>,
    /// Code to deploy.
    pub code: CodePackage,
}

impl CreateFunctionRequest {
    /// Builds a creation request from a spec, a role and a code package.
    #[must_use]
    pub fn from_spec(spec: &DeploymentSpec, role_arn: impl Into<String>, code: CodePackage) -> Self {
        Self {
            name: spec.function_name().to_string(),
            role_arn: role_arn.into(),
            runtime: spec.runtime().to_string(),
            handler: spec.handler().to_string(),
            memory_mb: non_zero(spec.memory_mb),
            timeout_secs: non_zero(spec.timeout_secs),
            environment: spec.environment.clone(),
            code,
        }
    }
}

/// Partial configuration update. `None` fields are left untouched remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationUpdate {
    /// Function name.
    pub function_name: String,
    /// New memory in MB.
    pub memory_mb: Option<u32>,
    /// New timeout in seconds.
    pub timeout_secs: Option<u32>,
    /// New environment variables.
    pub environment: Option<BTreeMap<String, String>>,
    /// New execution role ARN.
    pub role_arn: Option<String>,
}

impl ConfigurationUpdate {
    /// Builds the update from a spec, keeping only fields that were specified.
    #[must_use]
    pub fn from_spec(spec: &DeploymentSpec) -> Self {
        Self {
            function_name: spec.function_name().to_string(),
            memory_mb: non_zero(spec.memory_mb),
            timeout_secs: non_zero(spec.timeout_secs),
            environment: spec.environment.clone(),
            role_arn: spec.role_arn_override().map(str::to_string),
        }
    }
}

const fn non_zero(value: u32) -> Option<u32> {
    if value == 0 { None } else { Some(value) }
}

/// Extracts the account id from an ARN (`arn:partition:service:region:account:resource`).
#[must_use]
pub fn account_id_from_arn(arn: &str) -> Option<&str> {
    let mut parts = arn.split(':');
    if parts.next() != Some("arn") {
        return None;
    }
    parts.nth(3).filter(|account| !account.is_empty())
}

/// Extracts the role name from a role ARN, dropping any IAM path.
#[must_use]
pub fn role_name_from_arn(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_from_arn() {
        assert_eq!(
            account_id_from_arn("arn:aws:iam::123456789012:role/svc-a"),
            Some("123456789012")
        );
        assert_eq!(account_id_from_arn("arn:aws:iam:::role/svc-a"), None);
        assert_eq!(account_id_from_arn("not-an-arn"), None);
    }

    #[test]
    fn test_role_name_from_arn() {
        assert_eq!(role_name_from_arn("arn:aws:iam::123456789012:role/svc-a"), "svc-a");
        assert_eq!(
            role_name_from_arn("arn:aws:iam::123456789012:role/service/svc-a"),
            "svc-a"
        );
        assert_eq!(role_name_from_arn("svc-a"), "svc-a");
    }

    #[test]
    fn test_configuration_update_skips_unspecified_fields() {
        let mut spec = DeploymentSpec::new("svc");
        spec.memory_mb = 0;
        spec.timeout_secs = 30;
        spec.role_arn = Some(String::from(" "));

        let update = ConfigurationUpdate::from_spec(&spec);
        assert_eq!(update.memory_mb, None);
        assert_eq!(update.timeout_secs, Some(30));
        assert_eq!(update.environment, None);
        assert_eq!(update.role_arn, None);
    }

    #[test]
    fn test_create_request_from_spec() {
        let mut spec = DeploymentSpec::new("svc").with_runtime("nodejs20.x", "index.handler");
        spec.environment = Some(BTreeMap::from([(String::from("A"), String::from("1"))]));

        let request = CreateFunctionRequest::from_spec(
            &spec,
            "arn:aws:iam::1:role/svc",
            CodePackage::ZipFile(vec![1, 2, 3]),
        );
        assert_eq!(request.memory_mb, Some(128));
        assert_eq!(request.timeout_secs, Some(60));
        assert_eq!(request.runtime, "nodejs20.x");
        assert_eq!(request.environment.map(|e| e.len()), Some(1));
    }
}
