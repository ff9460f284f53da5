// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Lambda Deploy
//!
//! Idempotent creation, update and deletion of AWS Lambda functions,
//! including provisioning of their IAM execution roles.
//!
//! ## Overview
//!
//! A single `upsert` either creates a missing function or updates an
//! existing one:
//!
//! - Parameters come from a YAML file, `.env`, environment variables and CLI flags
//! - A missing execution role is created with the Lambda trust policy
//! - A basic logging policy and a custom policy can be attached to the role
//! - Configuration updates that conflict with an in-flight code update are
//!   retried until a deadline passes
//!
//! ## Architecture
//!
//! 1. **Parameters**: merged into a [`config::DeploymentSpec`] and validated
//! 2. **Observed state**: queried from the Lambda control plane
//! 3. **Reconciler**: takes the create or update path
//!
//! ## Modules
//!
//! - [`config`]: Parameter loading, merging and validation
//! - [`aws`]: API traits and their AWS SDK implementations
//! - [`reconciler`]: Role provisioning, upsert, convergence and deletion
//! - [`cli`]: Command-line interface
//! - [`error`]: Error types
//!
//! ## Example
//!
//! ```yaml
//! name: svc-a
//! runtime: python3.12
//! handler_name: app.handler
//! zip_file: build/svc-a.zip
//! memory: 256
//! autogenerate_execution_policy: true
//! environment_variables:
//!   STAGE: prod
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod aws;
pub mod cli;
pub mod config;
pub mod error;
pub mod reconciler;

// ============================================================================
// Re-exports
// ============================================================================

pub use aws::{ArchiveReader, ComputeApi, FsArchiveReader, IamClient, IdentityApi, LambdaClient};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, DeployFile, DeploymentSpec, ParameterValidator, ValidationMode};
pub use error::{DeployError, Result};
pub use reconciler::{
    ConfigurationConverger, DeleteOutcome, DeletionCoordinator, FunctionReconciler, RoleProvisioner,
    UpsertOutcome,
};
