//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.
//! Long flag names keep underscores so they match the config file keys.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DeployFile, EnvironmentVariables};

/// lambda-deploy - Create, update and delete AWS Lambda functions.
#[derive(Parser, Debug)]
#[command(name = "lambda-deploy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the function if it does not exist, otherwise update it.
    #[command(name = "upsert_lambda", visible_alias = "ul")]
    UpsertLambda(Box<UpsertArgs>),

    /// Delete a function and optionally its execution role.
    #[command(name = "delete_lambda", visible_alias = "dl")]
    DeleteLambda {
        /// Function name.
        #[arg(short, long)]
        name: String,

        /// Also delete the execution role ("Y" to confirm).
        #[arg(long = "delete_role", default_value = "N")]
        delete_role: String,
    },
}

/// Arguments of `upsert_lambda`. Unset flags fall through to the
/// environment, then the config file, then the defaults.
///
/// Single-letter aliases (`-n`, `-p`, `-r`) are short flags. Longer aliases
/// such as `--rt` or `--mem` are only accepted with two dashes.
#[derive(Args, Debug, Default)]
pub struct UpsertArgs {
    /// Path to a YAML file with deployment parameters.
    #[arg(long, env = "LAMBDA_DEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Function name.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Custom authorization policy document (JSON).
    #[arg(short, long)]
    pub policy: Option<String>,

    /// Generate a policy allowing the function to write its logs.
    #[arg(long = "autogenerate_execution_policy", visible_alias = "dep")]
    pub autogenerate_execution_policy: bool,

    /// Runtime identifier, e.g. python3.12.
    #[arg(long, visible_alias = "rt")]
    pub runtime: Option<String>,

    /// Handler identifier, e.g. app.handler.
    #[arg(long = "handler_name", visible_alias = "hn")]
    pub handler_name: Option<String>,

    /// S3 bucket holding the code package.
    #[arg(long = "s3_bucket", visible_alias = "s3")]
    pub s3_bucket: Option<String>,

    /// S3 key of the code package.
    #[arg(long = "s3_key", visible_alias = "key")]
    pub s3_key: Option<String>,

    /// Local zip archive with the code package.
    #[arg(long = "zip_file", visible_alias = "zip")]
    pub zip_file: Option<String>,

    /// Memory in MB [default: 128].
    #[arg(long, visible_alias = "mem")]
    pub memory: Option<u32>,

    /// Timeout in seconds [default: 60].
    #[arg(long = "time_out", visible_alias = "to")]
    pub time_out: Option<u32>,

    /// Environment variables as a JSON object.
    #[arg(long = "environment_variables", visible_alias = "ev")]
    pub environment_variables: Option<String>,

    /// AWS region.
    #[arg(short, long, visible_alias = "r")]
    pub region: Option<String>,

    /// Use this execution role instead of provisioning one.
    #[arg(long = "role_arn", visible_alias = "ra")]
    pub role_arn: Option<String>,

    /// Execution role name (defaults to the function name).
    #[arg(long = "role_name")]
    pub role_name: Option<String>,

    /// Free-form tag recorded with the deployment.
    #[arg(long = "action_type")]
    pub action_type: Option<String>,
}

impl UpsertArgs {
    /// Converts the flags into the topmost parameter layer.
    #[must_use]
    pub fn to_layer(&self) -> DeployFile {
        DeployFile {
            name: self.name.clone(),
            policy: self.policy.clone(),
            autogenerate_execution_policy: self.autogenerate_execution_policy.then_some(true),
            runtime: self.runtime.clone(),
            handler_name: self.handler_name.clone(),
            s3_bucket: self.s3_bucket.clone(),
            s3_key: self.s3_key.clone(),
            zip_file: self.zip_file.clone(),
            memory: self.memory,
            time_out: self.time_out,
            environment_variables: self
                .environment_variables
                .clone()
                .map(EnvironmentVariables::Json),
            region: self.region.clone(),
            role_arn: self.role_arn.clone(),
            role_name: self.role_name.clone(),
            action_type: self.action_type.clone(),
        }
    }
}

/// Interprets the `--delete_role` answer. Only `Y` opts in.
#[must_use]
pub fn parse_delete_role_flag(value: &str) -> bool {
    value.trim() == "Y"
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
