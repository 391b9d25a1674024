use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, instrument, warn};

use crate::config::{HostRegistry, SystemConfig};
use crate::deployment::DeploymentManager;
use crate::execution::CommandExecutor;
use crate::session::{SshRunner, SshSettings};
use crate::types::{CommandSpec, Error, Result};

#[derive(Parser)]
#[command(name = "sshgate")]
#[command(about = "Remote command execution gateway over SSH")]
#[command(long_about = "
A single-binary service that runs shell commands on a registered fleet of
hosts over SSH, one fresh session per command, and reports normalized results.
")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// System configuration file path
    #[arg(short, long, default_value = "/etc/sshgate/config.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run the HTTP gateway (default if no subcommand given)
    Serve(ServeArgs),
    /// Run one command on one host and print the result
    Exec(ExecArgs),
    /// Probe every registered host and print the fleet report
    Status,
    /// Run a configured workflow, stopping at the first failed step
    Workflow(WorkflowArgs),
    /// Validate the configuration file
    Validate,
    /// Show version information
    Version,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ServeArgs {
    /// Override listen address (format: "host:port")
    #[arg(long)]
    pub listen: Option<String>,

    /// Set log format
    #[arg(long)]
    pub log_format: Option<LogFormat>,
}

#[derive(Args, Clone, Debug)]
pub struct ExecArgs {
    /// Host address to run the command on
    #[arg(long)]
    pub host: String,

    /// Login user, overriding the registry
    #[arg(long)]
    pub user: Option<String>,

    /// Command line to run remotely
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub command: Vec<String>,
}

#[derive(Args, Clone, Debug)]
pub struct WorkflowArgs {
    /// Workflow name as configured under [workflows]
    pub name: String,
}

impl Cli {
    /// Get effective log level considering verbose/quiet flags
    pub fn effective_log_level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else if self.quiet {
            LogLevel::Error
        } else {
            self.log_level.clone().unwrap_or(LogLevel::Info)
        }
    }

    /// Convert LogLevel enum to string for logging module
    pub fn log_level_to_str(&self) -> &'static str {
        match self.effective_log_level() {
            LogLevel::Trace => crate::logging::level::TRACE,
            LogLevel::Debug => crate::logging::level::DEBUG,
            LogLevel::Info => crate::logging::level::INFO,
            LogLevel::Warn => crate::logging::level::WARN,
            LogLevel::Error => crate::logging::level::ERROR,
        }
    }

    /// Explicit log level from flags, if any
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.log_level.is_some() || self.verbose || self.quiet {
            Some(self.log_level_to_str())
        } else {
            None
        }
    }

    /// Get log format override from CLI arguments
    pub fn log_format_override(&self) -> Option<&'static str> {
        match &self.command {
            Some(Commands::Serve(args)) => args.log_format.as_ref().map(|fmt| match fmt {
                LogFormat::Json => crate::logging::format::JSON,
                LogFormat::Pretty => crate::logging::format::PRETTY,
            }),
            _ => None,
        }
    }
}

/// Wire the SSH runner, host registry and executor from configuration
pub fn build_executor(config: &SystemConfig) -> CommandExecutor {
    let runner = Arc::new(SshRunner::new(SshSettings::from_config(&config.ssh)));
    let registry = Arc::new(HostRegistry::from_config(config));

    CommandExecutor::new(runner, registry).with_max_output_bytes(config.limits.max_output_bytes)
}

/// Load and validate configuration unless it was already loaded
fn load_config(cli: &Cli, system_config: Option<SystemConfig>) -> Result<SystemConfig> {
    let config = match system_config {
        Some(config) => config,
        None => {
            info!("Loading system configuration...");
            SystemConfig::load_from_file(&cli.config)?
        }
    };
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Application(format!("Failed to encode report: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// Run the HTTP gateway
#[instrument(skip(cli, args, system_config))]
pub async fn run_server(
    cli: Cli,
    args: ServeArgs,
    system_config: Option<SystemConfig>,
) -> Result<()> {
    let mut system_config = load_config(&cli, system_config)?;

    if let Some(listen) = args.listen {
        system_config.server.listen = listen;
        system_config.validate()?;
    }

    info!(
        config_path = %cli.config.display(),
        listen = %system_config.server.listen,
        hosts = system_config.hosts.len(),
        "Configuration loaded successfully"
    );

    let executor = build_executor(&system_config);
    let shutdown_signal = setup_shutdown_signal();

    crate::http::start_server(system_config, executor, shutdown_signal).await?;
    Ok(())
}

/// Run one command and print its result
#[instrument(skip(cli, args, system_config))]
pub async fn run_exec(cli: Cli, args: ExecArgs, system_config: Option<SystemConfig>) -> Result<()> {
    let system_config = load_config(&cli, system_config)?;
    let executor = build_executor(&system_config);

    let mut spec = CommandSpec::new(args.host, args.command.join(" "));
    spec.user = args.user;

    let result = executor.execute(&spec).await;
    print_json(&result)?;

    if result.success() {
        Ok(())
    } else {
        Err(Error::Application(format!(
            "Command failed on {}: {}",
            spec.host,
            result.error()
        )))
    }
}

/// Poll the fleet and print the report
#[instrument(skip(cli, system_config))]
pub async fn show_status(cli: Cli, system_config: Option<SystemConfig>) -> Result<()> {
    let system_config = load_config(&cli, system_config)?;
    let executor = build_executor(&system_config);

    let report = crate::fleet::poll_fleet(&executor, executor.registry()).await;
    print_json(&report)
}

/// Run a named workflow and print its report
#[instrument(skip(cli, args, system_config))]
pub async fn run_workflow(
    cli: Cli,
    args: WorkflowArgs,
    system_config: Option<SystemConfig>,
) -> Result<()> {
    let system_config = load_config(&cli, system_config)?;
    let executor = build_executor(&system_config);
    let manager = DeploymentManager::from_config(executor, &system_config);

    let report = manager.run_named_workflow(&args.name).await?;
    print_json(&report)?;

    if report.success {
        Ok(())
    } else {
        Err(Error::Application(format!(
            "Workflow '{}' stopped after {} step(s)",
            args.name,
            report.steps.len()
        )))
    }
}

/// Validate configuration file
#[instrument(skip(cli, system_config))]
pub async fn validate_config(cli: Cli, system_config: Option<SystemConfig>) -> Result<()> {
    info!("Validating configuration file...");

    let config = match system_config {
        Some(config) => config,
        None => SystemConfig::load_from_file(&cli.config)?,
    };

    match config.validate() {
        Ok(()) => info!(
            config_path = %cli.config.display(),
            hosts = config.hosts.len(),
            profiles = config.deploy.profiles.len(),
            workflows = config.workflows.len(),
            "System configuration is valid"
        ),
        Err(e) => {
            error!(
                config_path = %cli.config.display(),
                error = %e,
                "System configuration validation failed"
            );
            return Err(e);
        }
    }

    for (name, workflow) in &config.workflows {
        let _workflow_span = crate::logging::workflow_span(name).entered();
        info!(steps = workflow.steps.len(), "Workflow configuration loaded");
    }

    if config.ssh.default_user.is_none() {
        for host in config.hosts.iter().filter(|h| h.user.is_none()) {
            warn!(
                host = %host.address,
                "Host has no user and no ssh.default_user is set; requests must name a user"
            );
        }
    }

    Ok(())
}

/// Show version information
#[instrument]
pub async fn show_version() -> Result<()> {
    println!("sshgate {}", env!("CARGO_PKG_VERSION"));
    println!("Description: {}", env!("CARGO_PKG_DESCRIPTION"));
    println!();

    println!("Build Information:");
    println!(
        "  Build Profile: {}",
        if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        }
    );
    println!();

    println!("Runtime Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Architecture: {}", std::env::consts::ARCH);

    Ok(())
}

/// Set up graceful shutdown signal handling for Linux
pub async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}
