mod cli;
mod config;
mod deployment;
mod execution;
mod fleet;
mod http;
mod logging;
mod metrics;
mod orchestration;
mod session;
mod types;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Commands, ServeArgs};
use crate::config::SystemConfig;
use crate::types::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Version doesn't need config; everything else loads it early for logging
    let system_config = match &cli.command {
        Some(Commands::Version) => None,
        _ => SystemConfig::load_from_file(&cli.config).ok(),
    };

    crate::logging::init(
        cli.log_level_override(),
        cli.log_format_override(),
        system_config.as_ref(),
    )?;

    crate::metrics::init_metrics();

    info!("Starting sshgate");

    match cli.command.clone().unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => cli::run_server(cli, args, system_config).await,
        Commands::Exec(args) => cli::run_exec(cli, args, system_config).await,
        Commands::Status => cli::show_status(cli, system_config).await,
        Commands::Workflow(args) => cli::run_workflow(cli, args, system_config).await,
        Commands::Validate => cli::validate_config(cli, system_config).await,
        Commands::Version => cli::show_version().await,
    }
}
