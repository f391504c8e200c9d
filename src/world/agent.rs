//! Agent state management.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::BalanceConfig;
use crate::world::{Coord, Inventory, InventoryLimits};

/// Unique identifier for an agent.
///
/// Agent ids are compared lexicographically; that order is the tie-break
/// for every simultaneous conflict.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Create an id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AgentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Who decides for an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Controller {
    /// A human player's strategy, executed by the LLM policy.
    Player {
        /// Owning player account.
        player_id: String,
    },
    /// A built-in adversary.
    Adversary {
        /// Behaviour profile tag.
        profile: String,
    },
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Controller::Player { player_id } => write!(f, "player:{player_id}"),
            Controller::Adversary { profile } => write!(f, "adversary:{profile}"),
        }
    }
}

/// One of the four independent upgrade tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeTrack {
    /// Widens the sight radius.
    Vision,
    /// Lengthens the recall list.
    Memory,
    /// Raises damage and claim strength.
    Strength,
    /// Adds inventory slots and stack size.
    Storage,
}

impl UpgradeTrack {
    /// Parse a track name.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "vision" => Some(UpgradeTrack::Vision),
            "memory" => Some(UpgradeTrack::Memory),
            "strength" => Some(UpgradeTrack::Strength),
            "storage" => Some(UpgradeTrack::Storage),
            _ => None,
        }
    }
}

/// Upgrade levels, each starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrades {
    /// Vision level.
    pub vision: u8,
    /// Memory level.
    pub memory: u8,
    /// Strength level.
    pub strength: u8,
    /// Storage level.
    pub storage: u8,
}

impl Default for Upgrades {
    fn default() -> Self {
        Self {
            vision: 1,
            memory: 1,
            strength: 1,
            storage: 1,
        }
    }
}

impl Upgrades {
    /// Current level of a track.
    #[must_use]
    pub const fn level(self, track: UpgradeTrack) -> u8 {
        match track {
            UpgradeTrack::Vision => self.vision,
            UpgradeTrack::Memory => self.memory,
            UpgradeTrack::Strength => self.strength,
            UpgradeTrack::Storage => self.storage,
        }
    }

    /// Raise a track by one level.
    pub fn raise(&mut self, track: UpgradeTrack) {
        let level = match track {
            UpgradeTrack::Vision => &mut self.vision,
            UpgradeTrack::Memory => &mut self.memory,
            UpgradeTrack::Strength => &mut self.strength,
            UpgradeTrack::Storage => &mut self.storage,
        };
        *level = level.saturating_add(1);
    }
}

/// State for a single agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Who decides for this agent.
    pub controller: Controller,
    /// Player-authored natural-language strategy.
    pub strategy: String,
    /// Current position (meaningless while dead).
    pub position: Coord,
    /// Where the agent respawns.
    pub spawn: Coord,
    /// Hit points.
    pub hp: u32,
    /// Hit point cap.
    pub max_hp: u32,
    /// Energy pool.
    pub energy: u32,
    /// Energy cap.
    pub max_energy: u32,
    /// Upgrade levels.
    pub upgrades: Upgrades,
    /// Carried items and equipment.
    pub inventory: Inventory,
    /// Recent notes, newest last, bounded by the memory upgrade.
    pub recall: VecDeque<String>,
    /// Whether the agent is alive.
    pub alive: bool,
    /// Ticks until respawn while dead.
    pub respawn_in: Option<u32>,
    /// Agents killed by this one.
    pub kills: u32,
    /// Times this agent died.
    pub deaths: u32,
}

impl Agent {
    /// Create a fresh agent at its spawn point.
    #[must_use]
    pub fn new(
        id: AgentId,
        name: impl Into<String>,
        controller: Controller,
        strategy: impl Into<String>,
        spawn: Coord,
        balance: &BalanceConfig,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            controller,
            strategy: strategy.into(),
            position: spawn,
            spawn,
            hp: balance.agent.max_hp,
            max_hp: balance.agent.max_hp,
            energy: balance.agent.starting_energy.min(balance.agent.max_energy),
            max_energy: balance.agent.max_energy,
            upgrades: Upgrades::default(),
            inventory: Inventory::default(),
            recall: VecDeque::new(),
            alive: true,
            respawn_in: None,
            kills: 0,
            deaths: 0,
        }
    }

    /// Vision radius after the vision upgrade.
    #[must_use]
    pub fn vision_radius(&self, base_radius: u32) -> u32 {
        base_radius + u32::from(self.upgrades.vision.saturating_sub(1))
    }

    /// Recall list length allowed by the memory upgrade.
    #[must_use]
    pub fn recall_capacity(&self, balance: &BalanceConfig) -> usize {
        balance.agent.memory_size + usize::from(self.upgrades.memory.saturating_sub(1))
    }

    /// Inventory limits allowed by the storage upgrade.
    #[must_use]
    pub fn inventory_limits(&self, balance: &BalanceConfig) -> InventoryLimits {
        let storage = self.upgrades.storage.max(1);
        InventoryLimits {
            slots: balance.costs.inventory_slots + usize::from(storage - 1),
            stack: balance.costs.stack_size.saturating_mul(u32::from(storage)),
        }
    }

    /// Record a note, dropping the oldest beyond `capacity`.
    pub fn remember(&mut self, note: impl Into<String>, capacity: usize) {
        self.recall.push_back(note.into());
        while self.recall.len() > capacity {
            self.recall.pop_front();
        }
    }

    /// Mark the agent dead and start the respawn countdown.
    pub fn kill(&mut self, respawn_ticks: u32) {
        self.alive = false;
        self.hp = 0;
        self.deaths += 1;
        self.respawn_in = Some(respawn_ticks);
    }

    /// Bring the agent back at `at` with full hp.
    pub fn respawn(&mut self, at: Coord, starting_energy: u32) {
        self.alive = true;
        self.hp = self.max_hp;
        self.energy = starting_energy.min(self.max_energy);
        self.position = at;
        self.respawn_in = None;
    }
}
