//! CLI module for the lambda-deploy tool.
//!
//! This module provides the command-line interface for creating, updating
//! and deleting Lambda functions.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat, UpsertArgs, parse_delete_role_flag};
pub use output::OutputFormatter;
