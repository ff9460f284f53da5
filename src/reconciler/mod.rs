//! Reconciliation of Lambda functions and their execution roles.
//!
//! This module compares the requested deployment with what the control
//! plane reports and takes the create or update path accordingly. It also
//! owns role provisioning, configuration convergence and deletion.

mod converge;
mod delete;
mod function;
mod role;

pub use converge::{ConfigurationConverger, ConvergenceReport, DEFAULT_DEADLINE, DEFAULT_RETRY_INTERVAL};
pub use delete::{DeleteOutcome, DeletionCoordinator};
pub use function::{FunctionReconciler, UpsertAction, UpsertOutcome};
pub use role::{ExecutionRole, RoleProvisioner, custom_policy_name, execution_policy_name};
