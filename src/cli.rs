//! CLI command implementations for Fogline.

pub(crate) mod batch;
pub(crate) mod map;
pub(crate) mod run;

mod output;

use clap::ValueEnum;
use fogline::config::{BalanceConfig, GameConfig};
use fogline::error::{ConfigError, EngineError, ManagerError};
use std::error::Error;
use std::fmt;

use crate::GameArgs;

/// Output format for `run` and `batch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Resolved game setup after files and flags are merged.
#[derive(Debug, Clone)]
pub(crate) struct Setup {
    /// Game settings.
    pub(crate) config: GameConfig,
    /// Balance table.
    pub(crate) balance: BalanceConfig,
    /// Adversaries to add.
    pub(crate) agents: usize,
}

/// Merge config files with command-line overrides.
pub(crate) fn setup(args: &GameArgs) -> Result<Setup, CliError> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let balance = match &args.balance {
        Some(path) => BalanceConfig::load(path)?,
        None => BalanceConfig::default(),
    };

    // A config file's seed wins over a random one
    if let Some(seed) = args.seed {
        config.seed = seed;
    } else if args.config.is_none() {
        use std::time::{SystemTime, UNIX_EPOCH};
        config.seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
            .unwrap_or(42);
    }
    if let Some(preset) = &args.preset {
        config.preset.clone_from(preset);
    }
    if let Some(size) = &args.size {
        config.map_size = Some(size.clone());
    }
    if let Some(ticks) = args.ticks {
        config.win_after_ticks = ticks;
    }
    if args.agents == 0 {
        return Err(CliError::new("at least one agent is required"));
    }
    config.max_agents = config.max_agents.max(args.agents);

    Ok(Setup {
        config,
        balance,
        agents: args.agents,
    })
}

/// Adversary ids `bot-1`, `bot-2`, ...
pub(crate) fn agent_ids(count: usize) -> impl Iterator<Item = String> {
    (1..=count).map(|i| format!("bot-{i}"))
}

/// Build a tokio runtime for a command.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::new(format!("Failed to start runtime: {e}")))
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ManagerError> for CliError {
    fn from(e: ManagerError) -> Self {
        Self::new(e.to_string())
    }
}
