//! Function reconciliation.
//!
//! The reconciler asks the control plane whether the function exists and
//! takes exactly one of two paths:
//!
//! - **create**: provision the execution role, then create the function;
//! - **update**: replace the code, then converge the configuration.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::aws::{ArchiveReader, CodePackage, ComputeApi, CreateFunctionRequest, FunctionRecord, IdentityApi, PolicyRef};
use crate::config::{CodeSource, DeploymentSpec, ParameterValidator, ValidationMode};
use crate::error::{DeployError, Result};

use super::converge::{ConfigurationConverger, DEFAULT_DEADLINE, DEFAULT_RETRY_INTERVAL};
use super::role::RoleProvisioner;

/// Path taken by an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAction {
    /// The function did not exist and was created.
    Created,
    /// The function existed and was updated.
    Updated,
}

impl std::fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
        }
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    /// Function name.
    pub function_name: String,
    /// Path taken.
    pub action: UpsertAction,
    /// Function ARN, if the control plane reported one.
    pub function_arn: Option<String>,
    /// Execution role ARN in effect.
    pub role_arn: Option<String>,
    /// Whether the execution role was created by this run.
    pub role_created: bool,
    /// Policies attached to a provisioned role.
    pub attached_policies: Vec<PolicyRef>,
    /// Where the code came from.
    pub code: String,
    /// Configuration update attempts (update path only).
    pub configuration_attempts: Option<u32>,
}

/// Reconciles one function against the Lambda control plane.
pub struct FunctionReconciler<'a, C: ComputeApi, I: IdentityApi, A: ArchiveReader> {
    /// Compute API.
    compute: &'a C,
    /// Identity API.
    identity: &'a I,
    /// Archive reader for local code.
    archives: &'a A,
    /// Parameter validator.
    validator: ParameterValidator,
    /// Convergence deadline.
    deadline: Duration,
    /// Convergence retry interval.
    retry_interval: Duration,
}

impl<'a, C: ComputeApi, I: IdentityApi, A: ArchiveReader> FunctionReconciler<'a, C, I, A> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(compute: &'a C, identity: &'a I, archives: &'a A) -> Self {
        Self {
            compute,
            identity,
            archives,
            validator: ParameterValidator::new(),
            deadline: DEFAULT_DEADLINE,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Overrides the configuration convergence timings.
    #[must_use]
    pub const fn with_convergence(mut self, deadline: Duration, retry_interval: Duration) -> Self {
        self.deadline = deadline;
        self.retry_interval = retry_interval;
        self
    }

    /// Creates the function if absent, otherwise updates it.
    ///
    /// # Errors
    ///
    /// Returns a validation error for incomplete parameters, or the first
    /// failing remote call. Nothing is rolled back on failure.
    pub async fn upsert(&self, spec: &DeploymentSpec) -> Result<UpsertOutcome> {
        // Name and code source are needed on both paths.
        self.validator.validate(spec, ValidationMode::Update)?;

        let name = spec.function_name();
        info!("Reconciling function: {name}");

        match self.compute.get_function(name).await? {
            None => {
                info!("Function {name} not found, creating it");
                self.create(spec).await
            }
            Some(existing) => {
                info!("Function {name} exists, updating it");
                self.update(spec, existing).await
            }
        }
    }

    async fn create(&self, spec: &DeploymentSpec) -> Result<UpsertOutcome> {
        self.validator.validate(spec, ValidationMode::Create)?;

        let (role_arn, role_created, attached_policies) = match spec.role_arn_override() {
            Some(arn) => {
                debug!("Using explicit role {arn}");
                (arn.to_string(), false, Vec::new())
            }
            None => {
                let role = RoleProvisioner::new(self.identity).ensure_role(spec).await?;
                (role.arn, role.created, role.attached_policies)
            }
        };

        let code = self.package_code(spec).await?;
        let code_description = code.describe();
        let request = CreateFunctionRequest::from_spec(spec, role_arn.clone(), code);

        info!("Creating function {} from {code_description}", request.name);
        let record = self.compute.create_function(&request).await?;
        info!(
            "Created function {}",
            record.arn.as_deref().unwrap_or(&record.name)
        );

        Ok(UpsertOutcome {
            function_name: record.name,
            action: UpsertAction::Created,
            function_arn: record.arn,
            role_arn: Some(role_arn),
            role_created,
            attached_policies,
            code: code_description,
            configuration_attempts: None,
        })
    }

    async fn update(&self, spec: &DeploymentSpec, existing: FunctionRecord) -> Result<UpsertOutcome> {
        self.validator.validate(spec, ValidationMode::Update)?;

        let code = self.package_code(spec).await?;
        let code_description = code.describe();

        info!("Updating code of {} from {code_description}", existing.name);
        self.compute
            .update_function_code(spec.function_name(), &code)
            .await?;

        let report = ConfigurationConverger::new(self.compute)
            .with_deadline(self.deadline)
            .with_retry_interval(self.retry_interval)
            .converge(spec)
            .await?;

        let role_arn = spec
            .role_arn_override()
            .map(str::to_string)
            .or(existing.role);

        Ok(UpsertOutcome {
            function_name: existing.name,
            action: UpsertAction::Updated,
            function_arn: existing.arn,
            role_arn,
            role_created: false,
            attached_policies: Vec::new(),
            code: code_description,
            configuration_attempts: Some(report.attempts),
        })
    }

    /// Resolves the code source into an uploadable package.
    async fn package_code(&self, spec: &DeploymentSpec) -> Result<CodePackage> {
        match spec.code_source() {
            Some(CodeSource::S3 { bucket, key }) => Ok(CodePackage::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Some(CodeSource::Archive(path)) => {
                let bytes = self.archives.read_all(path).await?;
                Ok(CodePackage::ZipFile(bytes))
            }
            None => Err(DeployError::internal("no code source resolved after validation")),
        }
    }
}
