//! Execution role provisioning.
//!
//! A role is created at most once per role name and never overwritten.
//! Policies are attached only when the role has none attached at all.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aws::{
    IdentityApi, PolicyDocument, PolicyRef, account_id_from_arn, check_custom_policy,
};
use crate::config::DeploymentSpec;
use crate::error::{RemoteError, Result};

/// Name of the policy created from a user-supplied document.
#[must_use]
pub fn custom_policy_name(function_name: &str) -> String {
    format!("{function_name}_policy")
}

/// Name of the generated logging policy.
#[must_use]
pub fn execution_policy_name(function_name: &str) -> String {
    format!("{function_name}_execution_policy")
}

/// Execution role after provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRole {
    /// Role name.
    pub name: String,
    /// Role ARN.
    pub arn: String,
    /// Policies attached to the role, in attachment order.
    pub attached_policies: Vec<PolicyRef>,
    /// Whether this run created the role.
    pub created: bool,
}

/// Ensures a function has an execution role with at least one policy.
#[derive(Debug)]
pub struct RoleProvisioner<'a, I: IdentityApi> {
    /// Identity API.
    identity: &'a I,
}

impl<'a, I: IdentityApi> RoleProvisioner<'a, I> {
    /// Creates a new provisioner.
    #[must_use]
    pub const fn new(identity: &'a I) -> Self {
        Self { identity }
    }

    /// Looks up or creates the execution role and attaches policies to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the custom policy is malformed, or if any lookup,
    /// creation, listing or attachment call fails.
    pub async fn ensure_role(&self, spec: &DeploymentSpec) -> Result<ExecutionRole> {
        let role_name = spec.role_name();
        let function_name = spec.function_name();

        if let Some(document) = spec.custom_policy() {
            check_custom_policy(document)?;
        }

        let (role, created) = match self.identity.get_role(role_name).await? {
            Some(role) => {
                debug!("Reusing execution role {}", role.arn);
                (role, false)
            }
            None => {
                info!("Creating execution role: {role_name}");
                let trust_policy = PolicyDocument::lambda_trust_policy().to_json()?;
                let role = self.identity.create_role(role_name, &trust_policy).await?;
                info!("Created execution role: {}", role.arn);
                (role, true)
            }
        };

        let mut attached = self.identity.list_attached_role_policies(role_name).await?;

        if !attached.is_empty() {
            info!(
                "Role {role_name} already has {} attached policies, leaving them untouched",
                attached.len()
            );
            return Ok(ExecutionRole {
                name: role.name,
                arn: role.arn,
                attached_policies: attached,
                created,
            });
        }

        if spec.autogenerate_execution_policy {
            let account_id = account_id_from_arn(&role.arn).ok_or_else(|| {
                RemoteError::invalid_response(
                    "GetRole",
                    format!("cannot read account id from role ARN {}", role.arn),
                )
            })?;
            let document =
                PolicyDocument::basic_execution_policy(spec.region(), account_id, function_name)
                    .to_json()?;
            let policy = self
                .create_and_attach(&document, &execution_policy_name(function_name), role_name)
                .await?;
            attached.push(policy);
        }

        if let Some(document) = spec.custom_policy() {
            let policy = self
                .create_and_attach(document, &custom_policy_name(function_name), role_name)
                .await?;
            attached.push(policy);
        }

        if attached.is_empty() {
            warn!("Role {role_name} has no policies attached; the function will run without permissions");
        }

        Ok(ExecutionRole {
            name: role.name,
            arn: role.arn,
            attached_policies: attached,
            created,
        })
    }

    /// Creates a managed policy and attaches it to the role.
    async fn create_and_attach(
        &self,
        document: &str,
        policy_name: &str,
        role_name: &str,
    ) -> Result<PolicyRef> {
        info!("Creating policy {policy_name}");
        let policy = self.identity.create_policy(document, policy_name).await?;

        self.identity
            .attach_role_policy(&policy.arn, role_name)
            .await?;
        info!("Attached policy {} to role {role_name}", policy.arn);

        Ok(policy)
    }

    /// Detaches every policy from a role, deletes the policies this tool
    /// created for the function, then deletes the role.
    ///
    /// # Errors
    ///
    /// Returns the first failing remote call.
    pub async fn remove_role(&self, role_name: &str, function_name: &str) -> Result<Vec<PolicyRef>> {
        let owned = [
            custom_policy_name(function_name),
            execution_policy_name(function_name),
        ];

        let attached = self.identity.list_attached_role_policies(role_name).await?;
        let mut deleted = Vec::new();

        for policy in attached {
            debug!("Detaching {} from {role_name}", policy.arn);
            self.identity
                .detach_role_policy(&policy.arn, role_name)
                .await?;

            if owned.contains(&policy.name) {
                info!("Deleting policy {}", policy.name);
                self.identity.delete_policy(&policy.arn).await?;
                deleted.push(policy);
            }
        }

        info!("Deleting role {role_name}");
        self.identity.delete_role(role_name).await?;

        Ok(deleted)
    }
}
