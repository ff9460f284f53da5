//! Function deletion, optionally taking the execution role with it.

use serde::Serialize;
use tracing::{info, warn};

use crate::aws::{ComputeApi, IdentityApi, PolicyRef, role_name_from_arn};
use crate::config::ParameterValidator;
use crate::error::{ReconcileError, RemoteError, Result};

use super::role::RoleProvisioner;

/// Result of a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    /// Deleted function.
    pub function_name: String,
    /// Execution role the function was using.
    pub role_arn: Option<String>,
    /// Whether the role was deleted as well.
    pub role_deleted: bool,
    /// Policies deleted along with the role.
    pub deleted_policies: Vec<PolicyRef>,
}

/// Deletes functions and, on request, their execution roles.
#[derive(Debug)]
pub struct DeletionCoordinator<'a, C: ComputeApi, I: IdentityApi> {
    compute: &'a C,
    identity: &'a I,
    validator: ParameterValidator,
}

impl<'a, C: ComputeApi, I: IdentityApi> DeletionCoordinator<'a, C, I> {
    /// Creates a new coordinator.
    #[must_use]
    pub const fn new(compute: &'a C, identity: &'a I) -> Self {
        Self {
            compute,
            identity,
            validator: ParameterValidator::new(),
        }
    }

    /// Deletes a function.
    ///
    /// The role is read from the function before the function goes away,
    /// and only removed afterwards.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, [`RemoteError::NotFound`]
    /// if the function does not exist, or
    /// [`ReconcileError::RoleDeletionFailed`] if the function was deleted
    /// but its role could not be.
    pub async fn delete(&self, name: &str, also_delete_role: bool) -> Result<DeleteOutcome> {
        self.validator.validate_name(name)?;
        let name = name.trim();

        let record = self
            .compute
            .get_function(name)
            .await?
            .ok_or_else(|| RemoteError::NotFound {
                resource: "function",
                name: name.to_string(),
            })?;
        let role_arn = record.role;

        info!("Deleting function {name}");
        self.compute.delete_function(name).await?;
        info!("Deleted function {name}");

        let mut outcome = DeleteOutcome {
            function_name: name.to_string(),
            role_arn,
            role_deleted: false,
            deleted_policies: Vec::new(),
        };

        if !also_delete_role {
            return Ok(outcome);
        }

        let Some(arn) = outcome.role_arn.as_deref() else {
            warn!("Function {name} reported no execution role, nothing to delete");
            return Ok(outcome);
        };

        let role_name = role_name_from_arn(arn);
        match RoleProvisioner::new(self.identity)
            .remove_role(role_name, name)
            .await
        {
            Ok(deleted) => {
                info!("Deleted execution role {role_name}");
                outcome.role_deleted = true;
                outcome.deleted_policies = deleted;
                Ok(outcome)
            }
            Err(err) => Err(ReconcileError::RoleDeletionFailed {
                function: name.to_string(),
                role: role_name.to_string(),
                reason: err.to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::{FunctionRecord, MockComputeApi, MockIdentityApi};
    use crate::error::DeployError;
    use mockall::Sequence;

    const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/service-role/svc-a";

    fn function_with_role() -> FunctionRecord {
        FunctionRecord {
            name: String::from("svc-a"),
            role: Some(String::from(ROLE_ARN)),
            ..FunctionRecord::default()
        }
    }

    fn policy(name: &str) -> PolicyRef {
        PolicyRef {
            name: name.to_string(),
            arn: format!("arn:aws:iam::123456789012:policy/{name}"),
        }
    }

    #[tokio::test]
    async fn test_delete_function_only() {
        let mut compute = MockComputeApi::new();
        let mut identity = MockIdentityApi::new();
        compute
            .expect_get_function()
            .returning(|_| Ok(Some(function_with_role())));
        compute
            .expect_delete_function()
            .withf(|name| name == "svc-a")
            .times(1)
            .returning(|_| Ok(()));
        identity.expect_delete_role().never();
        identity.expect_list_attached_role_policies().never();

        let outcome = DeletionCoordinator::new(&compute, &identity)
            .delete("svc-a", false)
            .await
            .expect("function deleted");

        assert!(!outcome.role_deleted);
        assert_eq!(outcome.role_arn.as_deref(), Some(ROLE_ARN));
    }

    #[tokio::test]
    async fn test_role_removed_after_function() {
        let mut seq = Sequence::new();
        let mut compute = MockComputeApi::new();
        let mut identity = MockIdentityApi::new();

        compute
            .expect_get_function()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(function_with_role())));
        compute
            .expect_delete_function()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        identity
            .expect_list_attached_role_policies()
            .withf(|role| role == "svc-a")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![policy("svc-a_execution_policy"), policy("SharedReadOnly")]));
        identity
            .expect_detach_role_policy()
            .times(2)
            .returning(|_, _| Ok(()));
        identity
            .expect_delete_policy()
            .withf(|arn| arn.ends_with("/svc-a_execution_policy"))
            .times(1)
            .returning(|_| Ok(()));
        identity
            .expect_delete_role()
            .withf(|role| role == "svc-a")
            .times(1)
            .returning(|_| Ok(()));

        let outcome = DeletionCoordinator::new(&compute, &identity)
            .delete(" svc-a ", true)
            .await
            .expect("function and role deleted");

        assert!(outcome.role_deleted);
        assert_eq!(outcome.deleted_policies, vec![policy("svc-a_execution_policy")]);
    }

    #[tokio::test]
    async fn test_missing_function_is_not_found() {
        let mut compute = MockComputeApi::new();
        let identity = MockIdentityApi::new();
        compute.expect_get_function().returning(|_| Ok(None));
        compute.expect_delete_function().never();

        let result = DeletionCoordinator::new(&compute, &identity)
            .delete("ghost", true)
            .await;

        assert!(result.is_err_and(|e| e.is_not_found()));
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let mut compute = MockComputeApi::new();
        let identity = MockIdentityApi::new();
        compute.expect_get_function().never();

        let result = DeletionCoordinator::new(&compute, &identity)
            .delete("   ", false)
            .await;

        assert!(matches!(result, Err(DeployError::Validation(_))));
    }

    #[tokio::test]
    async fn test_role_failure_reported_after_function_deleted() {
        let mut compute = MockComputeApi::new();
        let mut identity = MockIdentityApi::new();
        compute
            .expect_get_function()
            .returning(|_| Ok(Some(function_with_role())));
        compute
            .expect_delete_function()
            .times(1)
            .returning(|_| Ok(()));
        identity
            .expect_list_attached_role_policies()
            .returning(|_| Ok(vec![]));
        identity
            .expect_delete_role()
            .returning(|_| Err(RemoteError::api("DeleteRole", "role in use").into()));

        let result = DeletionCoordinator::new(&compute, &identity)
            .delete("svc-a", true)
            .await;

        match result {
            Err(DeployError::Reconcile(ReconcileError::RoleDeletionFailed { function, role, reason })) => {
                assert_eq!(function, "svc-a");
                assert_eq!(role, "svc-a");
                assert!(reason.contains("role in use"));
            }
            other => panic!("expected role deletion failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_function_without_role_skips_role_deletion() {
        let mut compute = MockComputeApi::new();
        let mut identity = MockIdentityApi::new();
        compute.expect_get_function().returning(|_| {
            Ok(Some(FunctionRecord {
                name: String::from("svc-a"),
                ..FunctionRecord::default()
            }))
        });
        compute.expect_delete_function().returning(|_| Ok(()));
        identity.expect_delete_role().never();

        let outcome = DeletionCoordinator::new(&compute, &identity)
            .delete("svc-a", true)
            .await
            .expect("function deleted");
        assert!(!outcome.role_deleted);
    }
}
