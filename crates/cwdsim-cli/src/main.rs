//! cwdsim command line interface.
//!
//! Batch driver for the water balance engine: validate a run configuration,
//! inspect the work it implies, or execute it.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Soil-moisture water balance batch runner
#[derive(Parser)]
#[command(name = "cwdsim")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AET/CWD water balance simulation over terrain grids", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute every (site, climate-source) tuple in a configuration
    Run(commands::run::RunArgs),
    /// Check a configuration and the presence of its inputs
    Validate(commands::validate::ValidateArgs),
    /// Print the tuples and artifacts a configuration implies
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Info(args) => commands::info::execute(args),
    }
}
