//! AWS integration module.
//!
//! This module provides the capability traits the reconciler depends on,
//! their implementations on top of the AWS SDK, and the policy documents
//! sent to IAM.

mod api;
mod archive;
mod iam;
mod lambda;
mod policy;
mod sdk;
mod types;

pub use api::{ArchiveReader, ComputeApi, IdentityApi};
#[cfg(test)]
pub use api::{MockArchiveReader, MockComputeApi, MockIdentityApi};
pub use archive::FsArchiveReader;
pub use iam::IamClient;
pub use lambda::LambdaClient;
pub use policy::{LAMBDA_SERVICE_PRINCIPAL, POLICY_VERSION, PolicyDocument, PolicyStatement, check_custom_policy};
pub use sdk::load_sdk_config;
pub use types::{
    CodePackage, ConfigurationUpdate, CreateFunctionRequest, FunctionRecord, PolicyRef, Role,
    account_id_from_arn, role_name_from_arn,
};
