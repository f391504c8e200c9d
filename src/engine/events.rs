//! Event log entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecisionError;
use crate::world::AgentId;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An agent entered the game.
    AgentJoined,
    /// The game began ticking.
    GameStarted,
    /// Ticking was suspended.
    GamePaused,
    /// Ticking resumed.
    GameResumed,
    /// A decision source failed or timed out.
    DecisionFailure,
    /// Decision output could not be parsed.
    IntentRejected,
    /// An unowned tile was claimed.
    TileClaimed,
    /// An owned tile changed hands.
    TileCaptured,
    /// An agent died.
    AgentKilled,
    /// A dead agent came back.
    AgentRespawned,
    /// A structure was built.
    StructureBuilt,
    /// A structure was destroyed.
    StructureDestroyed,
    /// A trap fired.
    TrapTriggered,
    /// A chat message was sent.
    Chat,
    /// The game reached a win condition.
    GameFinished,
    /// The game hit an engine-fatal error.
    GameFailed,
}

/// One entry in a game's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Tick the event belongs to.
    pub tick: u64,
    /// Event kind.
    pub kind: EventKind,
    /// Agent the event is about, if any.
    pub agent: Option<AgentId>,
    /// Kind-specific details.
    pub payload: Value,
}

impl EventLogEntry {
    /// Create an entry.
    #[must_use]
    pub const fn new(tick: u64, kind: EventKind, agent: Option<AgentId>, payload: Value) -> Self {
        Self {
            tick,
            kind,
            agent,
            payload,
        }
    }
}

/// A decision that had to be replaced by WAIT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionFailure {
    /// Tick the decision was for.
    pub tick: u64,
    /// Agent whose decision failed.
    pub agent: AgentId,
    /// Why.
    pub error: DecisionError,
}

/// A chat message delivered during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender.
    pub from: AgentId,
    /// Recipient, or `None` for a broadcast.
    pub to: Option<AgentId>,
    /// Message body.
    pub text: String,
}

impl ChatMessage {
    /// Whether `agent` may read this message.
    #[must_use]
    pub fn is_for(&self, agent: &AgentId) -> bool {
        self.to.as_ref().is_none_or(|to| to == agent) || &self.from == agent
    }
}
