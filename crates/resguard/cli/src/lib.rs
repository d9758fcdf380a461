//! ResGuard CLI - Command-line interface for the resource ledger
//!
//! Each invocation loads the ledger from the state directory, runs one
//! command and saves it back:
//! - Register processes and request/release/remove resources
//! - Inspect the pool, the safety check and the operation history
//! - Adjust capacity, reset the ledger, manage named snapshots

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;

use commands::{admin, process, snapshot, Context};
pub use config::ResGuardConfig;
pub use error::{CliError, CliResult};
pub use output::print_error;

/// ResGuard CLI application
#[derive(Parser)]
#[command(name = "resguard")]
#[command(about = "ResGuard - deadlock-free resource allocation ledger", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "RESGUARD_CONFIG")]
    config: Option<String>,

    /// State directory (overrides [system].state_dir)
    #[arg(short, long, env = "RESGUARD_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Process(process::ProcessCommands),

    #[command(flatten)]
    Admin(admin::AdminCommands),

    /// Manage named snapshots
    Snapshot {
        #[command(subcommand)]
        command: snapshot::SnapshotCommands,
    },

    /// Show configuration
    Config,
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let config = ResGuardConfig::load(cli.config.as_deref())?;

    // Initialize tracing; stdout is reserved for command output
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();

    let ctx = Context::new(config, cli.state_dir);

    match cli.command {
        Commands::Process(command) => process::execute(command, &ctx),
        Commands::Admin(command) => admin::execute(command, &ctx),
        Commands::Snapshot { command } => snapshot::execute(command, &ctx),
        Commands::Config => {
            let source = cli
                .config
                .map(PathBuf::from)
                .or_else(ResGuardConfig::default_config_path);
            match source {
                Some(path) => println!("Config file: {}", path.display()),
                None => println!("Config file: (none)"),
            }
            println!("State dir: {}", ctx.state_dir.display());
            println!(
                "{}",
                toml::to_string_pretty(&ctx.config).map_err(|e| CliError::Config(e.to_string()))?
            );
            Ok(())
        }
    }
}
