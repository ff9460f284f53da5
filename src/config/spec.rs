//! Deployment specification types.
//!
//! A [`DeploymentSpec`] is the fully merged desired state of one Lambda
//! function. It is built once per invocation and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Default memory size in MB when nothing is configured.
pub const DEFAULT_MEMORY_MB: u32 = 128;

/// Default timeout in seconds when nothing is configured.
pub const DEFAULT_TIMEOUT_SECS: u32 = 60;

/// Desired state of a single Lambda function and its execution role.
///
/// The `Debug` output lists environment variable names only and replaces
/// the policy document with its length.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DeploymentSpec {
    /// Function name.
    pub name: String,
    /// S3 bucket holding the code package.
    pub s3_bucket: String,
    /// S3 key of the code package.
    pub s3_key: String,
    /// Local zip archive holding the code package.
    pub zip_file: String,
    /// Memory size in MB. Zero leaves the remote value untouched.
    pub memory_mb: u32,
    /// Timeout in seconds. Zero leaves the remote value untouched.
    pub timeout_secs: u32,
    /// Handler identifier.
    pub handler: String,
    /// Runtime identifier (e.g. `python3.12`).
    pub runtime: String,
    /// Environment variables. `None` leaves the remote environment untouched.
    pub environment: Option<BTreeMap<String, String>>,
    /// Custom authorization policy document (JSON).
    pub policy: Option<String>,
    /// Whether to generate a basic logging policy for the role.
    pub autogenerate_execution_policy: bool,
    /// Explicit execution role ARN, bypassing role provisioning.
    pub role_arn: Option<String>,
    /// Name of the execution role. Empty means "same as the function".
    pub role_name: String,
    /// AWS region.
    pub region: Option<String>,
    /// Free-form operation tag.
    pub action: Option<String>,
}

/// Where the function code comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSource<'a> {
    /// An object already uploaded to S3.
    S3 {
        /// Bucket name.
        bucket: &'a str,
        /// Object key.
        key: &'a str,
    },
    /// A zip archive on the local filesystem.
    Archive(&'a Path),
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

impl DeploymentSpec {
    /// Creates a spec for the given function name with default sizing.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            memory_mb: DEFAULT_MEMORY_MB,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            ..Self::default()
        }
    }

    /// Trimmed function name.
    #[must_use]
    pub fn function_name(&self) -> &str {
        self.name.trim()
    }

    /// Name of the execution role, falling back to the function name.
    #[must_use]
    pub fn role_name(&self) -> &str {
        non_blank(&self.role_name).unwrap_or_else(|| self.function_name())
    }

    /// Resolves the code source. Bucket and key win over a local archive.
    #[must_use]
    pub fn code_source(&self) -> Option<CodeSource<'_>> {
        if let (Some(bucket), Some(key)) = (non_blank(&self.s3_bucket), non_blank(&self.s3_key)) {
            return Some(CodeSource::S3 { bucket, key });
        }
        non_blank(&self.zip_file).map(|path| CodeSource::Archive(Path::new(path)))
    }

    /// Custom policy document, if a non-blank one was supplied.
    #[must_use]
    pub fn custom_policy(&self) -> Option<&str> {
        self.policy.as_deref().and_then(non_blank)
    }

    /// Explicit role ARN, if a non-blank one was supplied.
    #[must_use]
    pub fn role_arn_override(&self) -> Option<&str> {
        self.role_arn.as_deref().and_then(non_blank)
    }

    /// Configured region, if any.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref().and_then(non_blank)
    }

    /// Names of the configured environment variables, without their values.
    #[must_use]
    pub fn environment_keys(&self) -> Vec<&str> {
        self.environment
            .as_ref()
            .map(|env| env.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Runtime identifier, trimmed.
    #[must_use]
    pub fn runtime(&self) -> &str {
        self.runtime.trim()
    }

    /// Handler identifier, trimmed.
    #[must_use]
    pub fn handler(&self) -> &str {
        self.handler.trim()
    }

    /// Sets the code source to an S3 object.
    #[must_use]
    pub fn with_s3_code(mut self, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        self.s3_bucket = bucket.into();
        self.s3_key = key.into();
        self
    }

    /// Sets the code source to a local archive.
    #[must_use]
    pub fn with_zip_file(mut self, path: impl Into<String>) -> Self {
        self.zip_file = path.into();
        self
    }

    /// Sets runtime and handler.
    #[must_use]
    pub fn with_runtime(mut self, runtime: impl Into<String>, handler: impl Into<String>) -> Self {
        self.runtime = runtime.into();
        self.handler = handler.into();
        self
    }
}

impl fmt::Debug for DeploymentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentSpec")
            .field("name", &self.name)
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_key", &self.s3_key)
            .field("zip_file", &self.zip_file)
            .field("memory_mb", &self.memory_mb)
            .field("timeout_secs", &self.timeout_secs)
            .field("handler", &self.handler)
            .field("runtime", &self.runtime)
            .field("environment_keys", &self.environment.as_ref().map(|_| self.environment_keys()))
            .field("policy_bytes", &self.policy.as_ref().map(String::len))
            .field("autogenerate_execution_policy", &self.autogenerate_execution_policy)
            .field("role_arn", &self.role_arn)
            .field("role_name", &self.role_name)
            .field("region", &self.region)
            .field("action", &self.action)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_wins_over_archive() {
        let spec = DeploymentSpec::new("svc")
            .with_s3_code("bucket", "code.zip")
            .with_zip_file("local.zip");

        assert_eq!(
            spec.code_source(),
            Some(CodeSource::S3 {
                bucket: "bucket",
                key: "code.zip"
            })
        );
    }

    #[test]
    fn test_half_s3_reference_falls_back_to_archive() {
        let spec = DeploymentSpec::new("svc")
            .with_s3_code("bucket", "  ")
            .with_zip_file("local.zip");

        assert_eq!(
            spec.code_source(),
            Some(CodeSource::Archive(Path::new("local.zip")))
        );
    }

    #[test]
    fn test_no_code_source() {
        let spec = DeploymentSpec::new("svc").with_s3_code("bucket", "");
        assert_eq!(spec.code_source(), None);
    }

    #[test]
    fn test_role_name_defaults_to_function_name() {
        let mut spec = DeploymentSpec::new(" svc-a ");
        assert_eq!(spec.role_name(), "svc-a");

        spec.role_name = String::from("shared-role");
        assert_eq!(spec.role_name(), "shared-role");
    }

    #[test]
    fn test_blank_optionals_are_ignored() {
        let mut spec = DeploymentSpec::new("svc");
        spec.policy = Some(String::from("   "));
        spec.role_arn = Some(String::new());
        spec.region = Some(String::from(" "));

        assert!(spec.custom_policy().is_none());
        assert!(spec.role_arn_override().is_none());
        assert!(spec.region().is_none());
    }

    #[test]
    fn test_debug_hides_secret_values() {
        let mut spec = DeploymentSpec::new("svc-a");
        spec.environment = Some(BTreeMap::from([(
            String::from("DB_PASSWORD"),
            String::from("hunter2"),
        )]));
        spec.policy = Some(String::from(r#"{"Statement":"s3cr3t"}"#));

        let rendered = format!("{spec:?}");
        assert!(rendered.contains("DB_PASSWORD"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("s3cr3t"));
        assert_eq!(spec.environment_keys(), vec!["DB_PASSWORD"]);
    }
}
