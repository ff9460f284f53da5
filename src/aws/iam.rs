//! IAM implementation of [`IdentityApi`].

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_iam::Client;
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::operation::get_role::GetRoleError;
use tracing::{debug, trace};

use crate::error::{RemoteError, Result};

use super::api::IdentityApi;
use super::types::{PolicyRef, Role};

/// IAM client backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct IamClient {
    /// SDK client.
    client: Client,
}

impl IamClient {
    /// Creates a client from shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

fn to_role(role: &aws_sdk_iam::types::Role) -> Role {
    Role {
        name: role.role_name().to_string(),
        arn: role.arn().to_string(),
    }
}

#[async_trait]
impl IdentityApi for IamClient {
    async fn get_role(&self, name: &str) -> Result<Option<Role>> {
        trace!("GetRole {name}");
        match self.client.get_role().role_name(name).send().await {
            Ok(output) => {
                let role = output
                    .role()
                    .ok_or_else(|| RemoteError::invalid_response("GetRole", "response carried no role"))?;
                Ok(Some(to_role(role)))
            }
            Err(sdk_err) => {
                if sdk_err
                    .as_service_error()
                    .is_some_and(GetRoleError::is_no_such_entity_exception)
                {
                    debug!("Role {name} does not exist");
                    Ok(None)
                } else {
                    Err(RemoteError::api("GetRole", DisplayErrorContext(&sdk_err).to_string()).into())
                }
            }
        }
    }

    async fn create_role(&self, name: &str, trust_policy: &str) -> Result<Role> {
        let output = self
            .client
            .create_role()
            .role_name(name)
            .assume_role_policy_document(trust_policy)
            .send()
            .await
            .map_err(|e| RemoteError::api("CreateRole", DisplayErrorContext(&e).to_string()))?;

        let role = output
            .role()
            .ok_or_else(|| RemoteError::invalid_response("CreateRole", "response carried no role"))?;
        Ok(to_role(role))
    }

    async fn create_policy(&self, document: &str, name: &str) -> Result<PolicyRef> {
        let output = self
            .client
            .create_policy()
            .policy_name(name)
            .policy_document(document)
            .send()
            .await
            .map_err(|e| RemoteError::api("CreatePolicy", DisplayErrorContext(&e).to_string()))?;

        let arn = output
            .policy()
            .and_then(|p| p.arn())
            .ok_or_else(|| RemoteError::invalid_response("CreatePolicy", "response carried no policy ARN"))?;

        Ok(PolicyRef {
            name: name.to_string(),
            arn: arn.to_string(),
        })
    }

    async fn attach_role_policy(&self, policy_arn: &str, role_name: &str) -> Result<()> {
        self.client
            .attach_role_policy()
            .policy_arn(policy_arn)
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| RemoteError::api("AttachRolePolicy", DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    async fn list_attached_role_policies(&self, role_name: &str) -> Result<Vec<PolicyRef>> {
        let mut policies = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .list_attached_role_policies()
                .role_name(role_name)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| {
                    RemoteError::api("ListAttachedRolePolicies", DisplayErrorContext(&e).to_string())
                })?;

            policies.extend(output.attached_policies().iter().filter_map(|p| {
                Some(PolicyRef {
                    name: p.policy_name()?.to_string(),
                    arn: p.policy_arn()?.to_string(),
                })
            }));

            match output.marker() {
                Some(next) => marker = Some(next.to_string()),
                None => break,
            }
        }

        debug!("Role {role_name} has {} attached policies", policies.len());
        Ok(policies)
    }

    async fn detach_role_policy(&self, policy_arn: &str, role_name: &str) -> Result<()> {
        self.client
            .detach_role_policy()
            .policy_arn(policy_arn)
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| RemoteError::api("DetachRolePolicy", DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    async fn delete_policy(&self, policy_arn: &str) -> Result<()> {
        self.client
            .delete_policy()
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| RemoteError::api("DeletePolicy", DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> Result<()> {
        self.client
            .delete_role()
            .role_name(name)
            .send()
            .await
            .map_err(|e| RemoteError::api("DeleteRole", DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}
