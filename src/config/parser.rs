//! Configuration parser for loading deployment parameter files.
//!
//! This module handles loading parameters from YAML files, `.env` files and
//! environment variables, with proper precedence and error handling.

use crate::error::{ConfigError, DeployError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

use super::file::DeployFile;

/// Environment variable overriding the region.
pub const ENV_REGION: &str = "LAMBDA_DEPLOY_REGION";

/// Environment variable overriding the role ARN.
pub const ENV_ROLE_ARN: &str = "LAMBDA_DEPLOY_ROLE_ARN";

/// Environment variable overriding the role name.
pub const ENV_ROLE_NAME: &str = "LAMBDA_DEPLOY_ROLE_NAME";

/// Configuration parser for loading deployment parameters.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving the `.env` file.
    base_path: Option<std::path::PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads parameters from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<DeployFile> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(DeployError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses parameters from a YAML string.
    ///
    /// An empty document yields an empty layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<DeployFile> {
        debug!("Parsing YAML configuration");

        if content.trim().is_empty() {
            return Ok(DeployFile::default());
        }

        let parse_error = |e: serde_yaml::Error| {
            DeployError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        };

        let document: serde_yaml::Value = serde_yaml::from_str(content).map_err(&parse_error)?;
        for key in Self::unknown_keys(&document) {
            warn!("Ignoring unknown configuration key: {key}");
        }

        let file: DeployFile = serde_yaml::from_value(document).map_err(&parse_error)?;

        debug!(
            "Parsed configuration for function: {}",
            file.name.as_deref().unwrap_or("<unnamed>")
        );
        Ok(file)
    }

    /// Top-level keys of a document that match no parameter.
    fn unknown_keys(document: &serde_yaml::Value) -> Vec<String> {
        document
            .as_mapping()
            .map(|mapping| {
                mapping
                    .keys()
                    .map(|key| key.as_str().map_or_else(|| format!("{key:?}"), str::to_string))
                    .filter(|key| !DeployFile::KEYS.contains(&key.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Loads a file layer (or an empty one) with environment overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: Option<&Path>) -> Result<DeployFile> {
        let mut file = match path {
            Some(path) => self.load_file(path)?,
            None => DeployFile::default(),
        };

        Self::apply_env_overrides(&mut file);

        Ok(file)
    }

    /// Applies environment variable overrides to a file layer.
    fn apply_env_overrides(file: &mut DeployFile) {
        if let Ok(region) = std::env::var(ENV_REGION) {
            debug!("Overriding region from environment");
            file.region = Some(region);
        }

        if let Ok(role_arn) = std::env::var(ENV_ROLE_ARN) {
            debug!("Overriding role_arn from environment");
            file.role_arn = Some(role_arn);
        }

        if let Ok(role_name) = std::env::var(ENV_ROLE_NAME) {
            debug!("Overriding role_name from environment");
            file.role_name = Some(role_name);
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| std::path::PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                DeployError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::file::EnvironmentVariables;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r"
name: svc-a
zip_file: a.zip
";
        let parser = ConfigParser::new();
        let file = parser.parse_yaml(yaml, None).expect("valid YAML");

        assert_eq!(file.name.as_deref(), Some("svc-a"));
        assert_eq!(file.zip_file.as_deref(), Some("a.zip"));
        assert!(file.memory.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
name: orders-api
policy: '{"Version":"2012-10-17","Statement":[]}'
autogenerate_execution_policy: true
runtime: python3.12
handler_name: app.handler
s3_bucket: artifacts
s3_key: orders/app.zip
memory: 512
time_out: 30
environment_variables:
  STAGE: prod
region: eu-west-1
"#;
        let parser = ConfigParser::new();
        let file = parser.parse_yaml(yaml, None).expect("valid YAML");

        assert_eq!(file.autogenerate_execution_policy, Some(true));
        assert_eq!(file.memory, Some(512));
        assert_eq!(file.time_out, Some(30));
        match file.environment_variables {
            Some(EnvironmentVariables::Map(ref env)) => {
                assert_eq!(env.get("STAGE").map(String::as_str), Some("prod"));
            }
            ref other => panic!("unexpected environment: {other:?}"),
        }
    }

    #[test]
    fn test_environment_as_json_string() {
        let yaml = r#"
name: svc
environment_variables: '{"A":"1"}'
"#;
        let parser = ConfigParser::new();
        let file = parser.parse_yaml(yaml, None).expect("valid YAML");
        assert_eq!(
            file.environment_variables,
            Some(EnvironmentVariables::Json(String::from(r#"{"A":"1"}"#)))
        );
    }

    #[test]
    fn test_unknown_keys_are_skipped() {
        let parser = ConfigParser::new();
        let file = parser
            .parse_yaml("name: svc-a\nzip_file: a.zip\ndelete_role: N\n", None)
            .expect("extra keys are ignored");

        assert_eq!(file.name.as_deref(), Some("svc-a"));
        assert_eq!(file.zip_file.as_deref(), Some("a.zip"));
    }

    #[test]
    fn test_unknown_keys_listed() {
        let document: serde_yaml::Value =
            serde_yaml::from_str("name: svc-a\ndelete_role: N\nmemroy: 128\n").expect("valid YAML");

        assert_eq!(
            ConfigParser::unknown_keys(&document),
            vec![String::from("delete_role"), String::from("memroy")]
        );
    }

    #[test]
    fn test_known_key_with_wrong_type_rejected() {
        let parser = ConfigParser::new();
        let result = parser.parse_yaml("name: svc-a\nmemory: lots\n", None);
        assert!(matches!(
            result,
            Err(DeployError::Config(ConfigError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_empty_document() {
        let parser = ConfigParser::new();
        let file = parser.parse_yaml("  \n", None).expect("empty is fine");
        assert_eq!(file, DeployFile::default());
    }

    #[test]
    fn test_load_file_from_disk() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("lambda.yaml");
        std::fs::write(&path, "name: svc-a\nmemory: 256\n").expect("write config");

        let file = ConfigParser::new()
            .with_base_path(dir.path())
            .load_file(&path)
            .expect("load config");
        assert_eq!(file.name.as_deref(), Some("svc-a"));
        assert_eq!(file.memory, Some(256));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let result = ConfigParser::new().load_file(dir.path().join("absent.yaml"));
        assert!(matches!(
            result,
            Err(DeployError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
