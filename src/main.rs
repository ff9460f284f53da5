//! lambda-deploy CLI entrypoint.
//!
//! This is the main entrypoint for the lambda-deploy command-line tool.

use std::future::Future;
use std::path::Path;
use std::process::ExitCode;

use lambda_deploy::aws::{FsArchiveReader, IamClient, LambdaClient, load_sdk_config};
use lambda_deploy::cli::{Cli, Commands, OutputFormat, OutputFormatter, UpsertArgs, parse_delete_role_flag};
use lambda_deploy::config::{ConfigParser, DeploymentSpec, ENV_REGION};
use lambda_deploy::error::{ReconcileError, Result};
use lambda_deploy::reconciler::{DeletionCoordinator, FunctionReconciler};

use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.output);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);
    match runtime.block_on(run(cli, &formatter)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{}", formatter.format_error(&e.to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool, output: OutputFormat) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    match output {
        OutputFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        OutputFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
    }
}

/// Main async entry point.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    match cli.command {
        Commands::UpsertLambda(args) => with_interrupt(cmd_upsert(&args, formatter)).await,
        Commands::DeleteLambda { name, delete_role } => {
            with_interrupt(cmd_delete(&name, parse_delete_role_flag(&delete_role), formatter)).await
        }
    }
}

/// Runs a command until it finishes or Ctrl-C is pressed.
async fn with_interrupt<F>(command: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::select! {
        result = command => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            Err(ReconcileError::Cancelled {
                reason: String::from("interrupted by user"),
            }
            .into())
        }
    }
}

/// Creates or updates a function.
async fn cmd_upsert(args: &UpsertArgs, formatter: &OutputFormatter) -> Result<()> {
    let spec = resolve_spec(args)?;
    debug!("Resolved deployment parameters: {spec:?}");

    let sdk_config = load_sdk_config(spec.region()).await;
    let lambda = LambdaClient::new(&sdk_config);
    let iam = IamClient::new(&sdk_config);
    let archives = FsArchiveReader::new();

    let outcome = FunctionReconciler::new(&lambda, &iam, &archives)
        .upsert(&spec)
        .await?;

    info!("Function {} {}", outcome.function_name, outcome.action);
    eprintln!("{}", formatter.format_upsert(&outcome, &spec));
    Ok(())
}

/// Deletes a function.
async fn cmd_delete(name: &str, delete_role: bool, formatter: &OutputFormatter) -> Result<()> {
    ConfigParser::new().load_dotenv()?;
    let region = std::env::var(ENV_REGION).ok();
    let sdk_config = load_sdk_config(region.as_deref()).await;
    let lambda = LambdaClient::new(&sdk_config);
    let iam = IamClient::new(&sdk_config);

    let outcome = DeletionCoordinator::new(&lambda, &iam)
        .delete(name, delete_role)
        .await?;

    eprintln!("{}", formatter.format_delete(&outcome));
    Ok(())
}

/// Merges config file, environment and flags into a deployment spec.
fn resolve_spec(args: &UpsertArgs) -> Result<DeploymentSpec> {
    let config_path = args.config.as_deref();

    let base = config_path
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| Path::new(".").to_path_buf(), Path::to_path_buf);
    let parser = ConfigParser::new().with_base_path(base);
    parser.load_dotenv()?;

    parser
        .load_with_env(config_path)?
        .merge(args.to_layer())
        .into_spec()
}
