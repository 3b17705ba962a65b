//! bqgate CLI - guarded BigQuery execution from the terminal.
//!
//! Every query goes through the gateway: destructive statements are held
//! until the configured approval channel says yes.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bqgate_config::{ApprovalMode, Config, LoadOptions};
use bqgate_gateway::QueryTools;
use clap::{Parser, Subcommand};
use tracing::debug;

mod commands;
pub mod config_bridge;
mod frontend;
pub mod sampler;
mod theme;

use commands::{config, execute, lookup, tools};

/// bqgate - guarded BigQuery execution
#[derive(Parser)]
#[command(name = "bqgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a configuration file, merged over all other layers
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Approval channel: token_echo, elicitation or sampling
    #[arg(long, global = true)]
    approval: Option<ApprovalMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the schema of a table or view
    Schema {
        /// Table ID in format project.dataset.table
        table_id: String,
    },

    /// Show a routine (TVF, stored procedure, function)
    Routine {
        /// Routine ID in format project.dataset.routine_name
        routine_id: String,
    },

    /// Execute a query with safety checks
    Execute {
        /// SQL text
        query: String,

        /// Google Cloud project to run in
        #[arg(short, long)]
        project: String,

        /// Confirmation token from an earlier challenge
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Read queries from stdin and execute them in one session
    Shell {
        /// Google Cloud project to run in
        #[arg(short, long)]
        project: String,
    },

    /// List the available tools
    Tools {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show resolved configuration with source annotations
    Show {
        /// Output format (toml or json)
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
    /// Validate the current configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let options = LoadOptions {
        workspace_root: std::env::current_dir().ok(),
        home_override: None,
        explicit: cli.config.clone(),
    };

    // Config inspection reports its own load errors.
    match &cli.command {
        Commands::Config { command } => {
            match command {
                ConfigCommands::Show { format } => config::show_config(&options, format)?,
                ConfigCommands::Validate => config::validate_config(&options)?,
            }
            return Ok(ExitCode::SUCCESS);
        },
        Commands::Tools { json } => {
            tools::list_tools(*json)?;
            return Ok(ExitCode::SUCCESS);
        },
        _ => {},
    }

    let resolved = Config::load(&options).context("failed to load configuration")?;
    let cfg = resolved.config;

    let mut log_config = config_bridge::to_log_config(&cfg);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = bqgate_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let mode = cli.approval.unwrap_or(cfg.gateway.approval);
    debug!(approval = %mode, files = ?resolved.loaded_files, "configuration loaded");
    let gateway = config_bridge::to_gateway(&cfg, mode)?;

    match cli.command {
        Commands::Schema { table_id } => {
            Ok(lookup::show_schema(&QueryTools::new(gateway), &table_id).await)
        },
        Commands::Routine { routine_id } => {
            Ok(lookup::show_routine(&QueryTools::new(gateway), &routine_id).await)
        },
        Commands::Execute {
            query,
            project,
            token,
        } => execute::run_execute(&gateway, &query, &project, token).await,
        Commands::Shell { project } => execute::run_shell(&gateway, &project).await,
        Commands::Tools { .. } | Commands::Config { .. } => Ok(ExitCode::SUCCESS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_execute_arguments() {
        let cli = Cli::try_parse_from([
            "bqgate",
            "--approval",
            "sampling",
            "execute",
            "DROP TABLE foo",
            "--project",
            "proj",
            "--token",
            "abc",
        ])
        .unwrap();

        assert_eq!(cli.approval, Some(ApprovalMode::Sampling));
        match cli.command {
            Commands::Execute {
                query,
                project,
                token,
            } => {
                assert_eq!(query, "DROP TABLE foo");
                assert_eq!(project, "proj");
                assert_eq!(token.as_deref(), Some("abc"));
            },
            _ => panic!("expected execute"),
        }
    }

    #[test]
    fn test_unknown_approval_mode_is_rejected() {
        let parsed = Cli::try_parse_from(["bqgate", "--approval", "vibes", "tools"]);
        assert!(parsed.is_err());
    }
}
