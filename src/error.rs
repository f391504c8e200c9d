//! Error types for each layer of the kernel.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::AgentId;
use crate::world::invariants::InvariantViolation;

/// Identifier of a game instance.
pub type GameId = String;

/// Errors raised by a single game engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The game has already been started.
    #[error("game already started")]
    AlreadyStarted,
    /// `start` was called with nobody joined.
    #[error("cannot start a game with no agents")]
    NoAgents,
    /// The operation needs a running game.
    #[error("game is not running (status: {0})")]
    NotRunning(&'static str),
    /// The game has ended and takes no more agents.
    #[error("game is no longer accepting agents")]
    JoinClosed,
    /// The join cap is reached.
    #[error("game is full ({0} agents)")]
    Full(usize),
    /// An agent with this id already joined.
    #[error("agent {0} already joined")]
    DuplicateAgent(AgentId),
    /// No open tile is left for a spawn.
    #[error("no free spawn tile for agent {0}")]
    NoSpawn(AgentId),
    /// The agent is not part of this game.
    #[error("unknown agent {0}")]
    UnknownAgent(AgentId),
    /// A committed effect referenced state that no longer exists.
    #[error("apply failed at tick {tick}: {reason}")]
    Apply {
        /// Tick being applied.
        tick: u64,
        /// What went wrong.
        reason: String,
    },
    /// World invariants were broken after a commit.
    #[error("invariant violations at tick {tick}: {}", format_violations(.violations))]
    Invariants {
        /// Tick that produced the violations.
        tick: u64,
        /// Every violation found.
        violations: Vec<InvariantViolation>,
    },
}

fn format_violations(violations: &[InvariantViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl EngineError {
    /// Whether this error leaves the instance unusable.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Apply { .. } | EngineError::Invariants { .. })
    }
}

/// Errors raised by the multi-game manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// No game with this id.
    #[error("unknown game {0}")]
    UnknownGame(GameId),
    /// A game with this id already exists.
    #[error("game {0} already exists")]
    DuplicateGame(GameId),
    /// The engine rejected the operation.
    #[error("game {game_id}: {source}")]
    Engine {
        /// Game that failed.
        game_id: GameId,
        /// Underlying engine error.
        #[source]
        source: EngineError,
    },
}

/// Errors loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON for the expected structure.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from a decision source.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DecisionError {
    /// The source did not answer before the deadline.
    #[error("decision timed out after {0} ms")]
    Timeout(u64),
    /// The source is unreachable or failed.
    #[error("decision source unavailable: {0}")]
    Unavailable(String),
    /// The source has nothing for this agent.
    #[error("no decision for agent {0}")]
    NoDecision(AgentId),
}

/// Reasons an intent string could not become an action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    /// No JSON object found in the text.
    #[error("no JSON object in decision output")]
    NoJson,
    /// The JSON did not parse.
    #[error("malformed intent JSON: {0}")]
    Malformed(String),
    /// The text is longer than the accepted limit.
    #[error("decision output is {len} bytes, limit is {max}")]
    TooLong {
        /// Bytes received.
        len: usize,
        /// Bytes accepted.
        max: usize,
    },
    /// The `action` field is missing.
    #[error("intent has no action field")]
    MissingAction,
    /// The action name is not recognised.
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    /// A parameter is missing or has the wrong shape.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParam {
        /// Parameter name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
