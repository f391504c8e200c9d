// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Fogline: a deterministic simulation kernel for territory-control games
//! played by language-model agents.
//!
//! Agents on a procedurally generated grid see only what their vision allows,
//! submit one natural-language intent per tick, and compete for tiles. Every
//! intent in a tick is validated against the same pre-tick world, conflicts
//! are resolved deterministically, and the committed effects are applied as
//! one atomic step.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │      GameManager (tokio tasks)      │
//! ├─────────────────────────────────────┤
//! │   GameEngine (tick state machine)   │
//! ├──────────────────┬──────────────────┤
//! │ HandlerRegistry  │ ConflictResolver │
//! ├──────────────────┴──────────────────┤
//! │   World + Visibility + Mapgen       │
//! └─────────────────────────────────────┘
//! ```
//!
//! Same seed and same intents give the same world, tick after tick.

pub mod actions;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod manager;
pub mod mapgen;
pub mod resolver;
pub mod visibility;
pub mod world;

pub use actions::{Action, ActionKind, ActionResult, HandlerRegistry, parse_intent};
pub use config::{BalanceConfig, GameConfig};
pub use decision::{DecisionContext, DecisionSource, IdleDecisions, RoamingDecisions, ScriptedDecisions};
pub use engine::{AgentSpec, GameEngine, GameSnapshot, GameStatus, TickDelta, Viewer};
pub use error::{ConfigError, DecisionError, EngineError, GameId, IntentError, ManagerError};
pub use manager::{Broadcaster, ChannelBroadcaster, GameManager, NullBroadcaster};
pub use mapgen::{MapPreset, MapSize};
pub use resolver::{ClaimStrength, ConflictResolver};
pub use world::{Agent, AgentId, Coord, Direction, World};
