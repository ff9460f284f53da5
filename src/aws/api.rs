//! Capability traits for the remote control planes.
//!
//! Every reconciliation component receives these as injected dependencies;
//! only the binary constructs the SDK-backed implementations.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

use super::types::{ConfigurationUpdate, CodePackage, CreateFunctionRequest, FunctionRecord, PolicyRef, Role};

/// IAM operations used to provision and remove execution roles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Looks up a role. Returns `None` if it does not exist.
    async fn get_role(&self, name: &str) -> Result<Option<Role>>;

    /// Creates a role with the given trust policy document.
    async fn create_role(&self, name: &str, trust_policy: &str) -> Result<Role>;

    /// Creates a customer-managed policy.
    async fn create_policy(&self, document: &str, name: &str) -> Result<PolicyRef>;

    /// Attaches a managed policy to a role.
    async fn attach_role_policy(&self, policy_arn: &str, role_name: &str) -> Result<()>;

    /// Lists the managed policies attached to a role.
    async fn list_attached_role_policies(&self, role_name: &str) -> Result<Vec<PolicyRef>>;

    /// Detaches a managed policy from a role.
    async fn detach_role_policy(&self, policy_arn: &str, role_name: &str) -> Result<()>;

    /// Deletes a customer-managed policy.
    async fn delete_policy(&self, policy_arn: &str) -> Result<()>;

    /// Deletes a role.
    async fn delete_role(&self, name: &str) -> Result<()>;
}

/// Lambda operations used to reconcile a function.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Fetches a function. Returns `None` if it does not exist.
    async fn get_function(&self, name: &str) -> Result<Option<FunctionRecord>>;

    /// Creates a function.
    async fn create_function(&self, request: &CreateFunctionRequest) -> Result<FunctionRecord>;

    /// Replaces the code of an existing function.
    async fn update_function_code(&self, name: &str, code: &CodePackage) -> Result<()>;

    /// Updates function configuration.
    ///
    /// Fails with [`RemoteError::Conflict`](crate::error::RemoteError::Conflict)
    /// while a previous update is still in progress.
    async fn update_function_configuration(&self, update: &ConfigurationUpdate) -> Result<()>;

    /// Deletes a function.
    async fn delete_function(&self, name: &str) -> Result<()>;
}

/// Reads local code archives.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArchiveReader: Send + Sync {
    /// Reads the whole archive, byte for byte.
    async fn read_all(&self, path: &Path) -> Result<Vec<u8>>;
}
