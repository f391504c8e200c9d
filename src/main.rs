//! Fogline CLI - run, inspect and batch territory-control games.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Fogline - a deterministic territory-control game kernel
#[derive(Parser, Debug)]
#[command(name = "fogline")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Game setup flags shared by `run` and `batch`
#[derive(clap::Args, Debug, Clone)]
struct GameArgs {
    /// Game settings file (JSON); flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Balance table file (JSON)
    #[arg(long)]
    balance: Option<PathBuf>,

    /// Random seed (default: random)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Generation preset name
    #[arg(long)]
    preset: Option<String>,

    /// Map size name or side length
    #[arg(long)]
    size: Option<String>,

    /// Number of roaming adversaries (default: 4)
    #[arg(short, long, default_value = "4")]
    agents: usize,

    /// Ticks before the game ends
    #[arg(short, long)]
    ticks: Option<u64>,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single headless game between roaming adversaries
    Run {
        #[command(flatten)]
        game: GameArgs,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,

        /// Suppress the setup banner
        #[arg(short, long)]
        quiet: bool,
    },

    /// Generate a map and print a summary
    Map {
        /// Random seed (default: 0)
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Generation preset name
        #[arg(long, default_value = "default")]
        preset: String,

        /// Map size name or side length
        #[arg(long)]
        size: Option<String>,

        /// Print an ASCII preview this many characters wide
        #[arg(long)]
        preview: Option<u16>,
    },

    /// Run several games concurrently and aggregate the standings
    Batch {
        #[command(flatten)]
        game: GameArgs,

        /// Number of games (seeds increment from --seed)
        #[arg(short = 'n', long, default_value = "8")]
        games: u64,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match args.command {
        Commands::Run {
            game,
            format,
            progress,
            quiet,
        } => cli::setup(&game).and_then(|setup| cli::run::execute(setup, format, progress, quiet)),

        Commands::Map {
            seed,
            preset,
            size,
            preview,
        } => cli::map::execute(seed, &preset, size.as_deref(), preview),

        Commands::Batch {
            game,
            games,
            format,
            progress,
        } => cli::setup(&game).and_then(|setup| cli::batch::execute(setup, games, format, progress)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
