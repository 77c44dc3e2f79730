use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod sink;

#[derive(Parser)]
#[command(name = "exercise-snack", version, about = "Exercise Snack: hourly movement-break reminders")]
struct Cli {
    /// Path to config.toml (defaults to ~/.config/exercise-snack/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's remaining reminders
    Plan(commands::plan::PlanArgs),
    /// Print the menu-bar status line
    Status(commands::status::StatusArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Run the reminder daemon in the foreground
    Run(commands::run::RunArgs),
}

fn main() {
    let cli = Cli::parse();

    // stdout carries command output; diagnostics go to stderr.
    let default_filter = match cli.command {
        Commands::Run(_) => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let result = commands::config_path(cli.config).and_then(|path| match cli.command {
        Commands::Plan(args) => commands::plan::run(&path, args),
        Commands::Status(args) => commands::status::run(&path, args),
        Commands::Config { action } => commands::config::run(&path, action),
        Commands::Run(args) => commands::run::run(&path, args),
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
