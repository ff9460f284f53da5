//! Configuration module for the Lambda deployment system.
//!
//! This module handles all parameter-related functionality:
//! - Loading YAML parameter files, `.env` files and environment overrides
//! - Merging parameter layers into a [`DeploymentSpec`]
//! - Validation of parameters for the create and update paths

mod spec;
mod file;
mod parser;
mod validator;

pub use spec::{CodeSource, DEFAULT_MEMORY_MB, DEFAULT_TIMEOUT_SECS, DeploymentSpec};
pub use file::{DeployFile, EnvironmentVariables};
pub use parser::{ConfigParser, ENV_REGION, ENV_ROLE_ARN, ENV_ROLE_NAME};
pub use validator::{ParameterValidator, ValidationMode};
