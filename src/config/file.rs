//! Layered deployment parameters.
//!
//! Parameters arrive from a YAML file, environment variables and CLI flags.
//! Each source is read into a [`DeployFile`] layer whose keys match the CLI
//! flag names; layers are merged and then frozen into a [`DeploymentSpec`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ConfigError, DeployError, Result};

use super::spec::{DEFAULT_MEMORY_MB, DEFAULT_TIMEOUT_SECS, DeploymentSpec};

/// One layer of deployment parameters. Unset keys are `None`.
///
/// Keys that match no parameter are ignored, so one file can be shared with
/// other commands (for example `delete_role`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployFile {
    /// Function name.
    #[serde(default)]
    pub name: Option<String>,
    /// Custom authorization policy (JSON text).
    #[serde(default)]
    pub policy: Option<String>,
    /// Generate the basic execution policy.
    #[serde(default)]
    pub autogenerate_execution_policy: Option<bool>,
    /// Runtime identifier.
    #[serde(default)]
    pub runtime: Option<String>,
    /// Handler identifier.
    #[serde(default)]
    pub handler_name: Option<String>,
    /// S3 bucket of the code package.
    #[serde(default)]
    pub s3_bucket: Option<String>,
    /// S3 key of the code package.
    #[serde(default)]
    pub s3_key: Option<String>,
    /// Local zip archive.
    #[serde(default)]
    pub zip_file: Option<String>,
    /// Memory in MB.
    #[serde(default)]
    pub memory: Option<u32>,
    /// Timeout in seconds.
    #[serde(default)]
    pub time_out: Option<u32>,
    /// Environment variables.
    #[serde(default)]
    pub environment_variables: Option<EnvironmentVariables>,
    /// AWS region.
    #[serde(default)]
    pub region: Option<String>,
    /// Explicit execution role ARN.
    #[serde(default)]
    pub role_arn: Option<String>,
    /// Execution role name.
    #[serde(default)]
    pub role_name: Option<String>,
    /// Free-form operation tag.
    #[serde(default)]
    pub action_type: Option<String>,
}

/// Environment variables, either as a mapping or as a JSON object string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvironmentVariables {
    /// A YAML mapping.
    Map(BTreeMap<String, String>),
    /// A JSON object encoded as a string, as passed on the command line.
    Json(String),
}

impl EnvironmentVariables {
    /// Resolves the variables into a map.
    ///
    /// A blank JSON string means "not specified" and yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON string is not an object of strings.
    pub fn resolve(self) -> Result<Option<BTreeMap<String, String>>> {
        match self {
            Self::Map(map) => Ok(Some(map)),
            Self::Json(raw) if raw.trim().is_empty() => Ok(None),
            Self::Json(raw) => serde_json::from_str(raw.trim()).map(Some).map_err(|e| {
                DeployError::Config(ConfigError::InvalidValue {
                    field: String::from("environment_variables"),
                    message: format!("expected a JSON object of strings: {e}"),
                })
            }),
        }
    }
}

impl DeployFile {
    /// Keys read from a config file. Anything else is skipped.
    pub const KEYS: &'static [&'static str] = &[
        "name",
        "policy",
        "autogenerate_execution_policy",
        "runtime",
        "handler_name",
        "s3_bucket",
        "s3_key",
        "zip_file",
        "memory",
        "time_out",
        "environment_variables",
        "region",
        "role_arn",
        "role_name",
        "action_type",
    ];

    /// Overlays `other` on top of `self`; keys set in `other` win.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            name: other.name.or(self.name),
            policy: other.policy.or(self.policy),
            autogenerate_execution_policy: other
                .autogenerate_execution_policy
                .or(self.autogenerate_execution_policy),
            runtime: other.runtime.or(self.runtime),
            handler_name: other.handler_name.or(self.handler_name),
            s3_bucket: other.s3_bucket.or(self.s3_bucket),
            s3_key: other.s3_key.or(self.s3_key),
            zip_file: other.zip_file.or(self.zip_file),
            memory: other.memory.or(self.memory),
            time_out: other.time_out.or(self.time_out),
            environment_variables: other.environment_variables.or(self.environment_variables),
            region: other.region.or(self.region),
            role_arn: other.role_arn.or(self.role_arn),
            role_name: other.role_name.or(self.role_name),
            action_type: other.action_type.or(self.action_type),
        }
    }

    /// Freezes the merged layers into a deployment spec.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variables cannot be parsed.
    pub fn into_spec(self) -> Result<DeploymentSpec> {
        let environment = self
            .environment_variables
            .map(EnvironmentVariables::resolve)
            .transpose()?
            .flatten();

        Ok(DeploymentSpec {
            name: self.name.unwrap_or_default(),
            s3_bucket: self.s3_bucket.unwrap_or_default(),
            s3_key: self.s3_key.unwrap_or_default(),
            zip_file: self.zip_file.unwrap_or_default(),
            memory_mb: self.memory.unwrap_or(DEFAULT_MEMORY_MB),
            timeout_secs: self.time_out.unwrap_or(DEFAULT_TIMEOUT_SECS),
            handler: self.handler_name.unwrap_or_default(),
            runtime: self.runtime.unwrap_or_default(),
            environment,
            policy: self.policy,
            autogenerate_execution_policy: self.autogenerate_execution_policy.unwrap_or(false),
            role_arn: self.role_arn,
            role_name: self.role_name.unwrap_or_default(),
            region: self.region,
            action: self.action_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_match_fields() {
        let value = serde_yaml::to_value(DeployFile::default()).expect("serializable");
        let fields: Vec<&str> = value
            .as_mapping()
            .expect("struct serializes to a mapping")
            .keys()
            .filter_map(serde_yaml::Value::as_str)
            .collect();

        assert_eq!(fields, DeployFile::KEYS);
    }

    #[test]
    fn test_later_layer_wins() {
        let file = DeployFile {
            name: Some(String::from("from-file")),
            runtime: Some(String::from("python3.12")),
            memory: Some(256),
            ..DeployFile::default()
        };
        let flags = DeployFile {
            name: Some(String::from("from-flag")),
            ..DeployFile::default()
        };

        let merged = file.merge(flags);
        assert_eq!(merged.name.as_deref(), Some("from-flag"));
        assert_eq!(merged.runtime.as_deref(), Some("python3.12"));
        assert_eq!(merged.memory, Some(256));
    }

    #[test]
    fn test_defaults_applied() {
        let spec = DeployFile::default().into_spec().expect("empty layer converts");
        assert_eq!(spec.memory_mb, DEFAULT_MEMORY_MB);
        assert_eq!(spec.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(spec.environment.is_none());
        assert!(!spec.autogenerate_execution_policy);
    }

    #[test]
    fn test_environment_from_json_string() {
        let layer = DeployFile {
            environment_variables: Some(EnvironmentVariables::Json(String::from(
                r#"{"STAGE":"prod","LOG_LEVEL":"debug"}"#,
            ))),
            ..DeployFile::default()
        };

        let spec = layer.into_spec().expect("valid JSON");
        let env = spec.environment.expect("environment set");
        assert_eq!(env.get("STAGE").map(String::as_str), Some("prod"));
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn test_blank_environment_string_is_unset() {
        let layer = DeployFile {
            environment_variables: Some(EnvironmentVariables::Json(String::from("  "))),
            ..DeployFile::default()
        };
        assert!(layer.into_spec().expect("blank is fine").environment.is_none());
    }

    #[test]
    fn test_invalid_environment_json() {
        let layer = DeployFile {
            environment_variables: Some(EnvironmentVariables::Json(String::from("[1, 2]"))),
            ..DeployFile::default()
        };
        assert!(layer.into_spec().is_err());
    }
}
