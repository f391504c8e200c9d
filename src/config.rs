//! Game and balance configuration.
//!
//! Both structures are plain data with documented defaults. They can be
//! loaded from JSON files; missing fields take their defaults, and the CLI
//! overrides individual values from flags.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::actions::MAX_INTENT_LEN;
use crate::error::ConfigError;
use crate::mapgen::{MapPreset, MapSize};

/// Per-agent starting values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDefaults {
    /// Maximum (and starting) hit points.
    pub max_hp: u32,
    /// Maximum energy.
    pub max_energy: u32,
    /// Energy on spawn and respawn.
    pub starting_energy: u32,
    /// Base vision radius before upgrades.
    pub vision_radius: u32,
    /// Recall list length at memory level 1.
    pub memory_size: usize,
    /// Maximum tiles per MOVE.
    pub speed: u16,
    /// Maximum Chebyshev distance for CLAIM targets.
    pub claim_radius: u16,
    /// Ticks a dead agent waits before respawning.
    pub respawn_ticks: u32,
    /// Energy regenerated every tick.
    pub energy_regen: u32,
    /// One extra energy per this many owned tiles.
    pub tiles_per_energy: u32,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            max_hp: 10,
            max_energy: 100,
            starting_energy: 50,
            vision_radius: 3,
            memory_size: 5,
            speed: 1,
            claim_radius: 1,
            respawn_ticks: 5,
            energy_regen: 2,
            tiles_per_energy: 10,
        }
    }
}

/// Combat and structure constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatBalance {
    /// Damage of an unarmed strength-1 hit.
    pub base_damage: u32,
    /// Damage a trap deals to a hostile agent stepping on it.
    pub trap_damage: u32,
    /// Floor for any hit after armor.
    pub min_damage: u32,
    /// Hit points of a new wall.
    pub wall_hp: u32,
    /// Hit points of a new beacon.
    pub beacon_hp: u32,
    /// Hit points of a new trap.
    pub trap_hp: u32,
    /// Vision radius around each owned beacon.
    pub beacon_vision_bonus: u32,
    /// Claim strength before the strength upgrade is added.
    pub base_claim_strength: u32,
}

impl Default for CombatBalance {
    fn default() -> Self {
        Self {
            base_damage: 1,
            trap_damage: 3,
            min_damage: 1,
            wall_hp: 20,
            beacon_hp: 10,
            trap_hp: 5,
            beacon_vision_bonus: 4,
            base_claim_strength: 1,
        }
    }
}

/// Energy costs and item limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionCosts {
    /// Energy per tile moved.
    pub move_energy: u32,
    /// Energy to claim an unowned tile.
    pub claim_energy: u32,
    /// Energy to capture a tile owned by someone else.
    pub capture_energy: u32,
    /// Energy per FIGHT.
    pub fight_energy: u32,
    /// Energy per SCAN.
    pub scan_energy: u32,
    /// SCAN reveals a circle this many times the vision radius.
    pub scan_radius_multiplier: u32,
    /// Energy per PLACE.
    pub place_energy: u32,
    /// Energy per CRAFT.
    pub craft_energy: u32,
    /// Energy per HARVEST.
    pub harvest_energy: u32,
    /// Energy per INTERACT.
    pub interact_energy: u32,
    /// Energy per MESSAGE.
    pub message_energy: u32,
    /// Units gathered per HARVEST.
    pub harvest_yield: u32,
    /// Ticks before a dropped item despawns.
    pub item_despawn_ticks: u64,
    /// Ticks before a placed trap despawns.
    pub trap_lifetime_ticks: u64,
    /// Inventory slots at storage level 1.
    pub inventory_slots: usize,
    /// Stack size at storage level 1.
    pub stack_size: u32,
    /// Longest accepted chat message, in characters.
    pub max_message_len: usize,
    /// Longest decision output parsed as an intent, in bytes.
    pub max_intent_len: usize,
}

impl Default for ActionCosts {
    fn default() -> Self {
        Self {
            move_energy: 1,
            claim_energy: 3,
            capture_energy: 6,
            fight_energy: 4,
            scan_energy: 10,
            scan_radius_multiplier: 2,
            place_energy: 5,
            craft_energy: 3,
            harvest_energy: 2,
            interact_energy: 1,
            message_energy: 0,
            harvest_yield: 1,
            item_despawn_ticks: 30,
            trap_lifetime_ticks: 100,
            inventory_slots: 6,
            stack_size: 20,
            max_message_len: 280,
            max_intent_len: MAX_INTENT_LEN,
        }
    }
}

/// Upgrade energy costs indexed by current level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeCosts {
    /// `costs[level - 1]` is the price of going from `level` to `level + 1`.
    pub costs: Vec<u32>,
}

impl Default for UpgradeCosts {
    fn default() -> Self {
        Self {
            costs: vec![20, 40, 80, 160],
        }
    }
}

impl UpgradeCosts {
    /// Highest reachable level.
    #[must_use]
    pub fn max_level(&self) -> u8 {
        u8::try_from(self.costs.len() + 1).unwrap_or(u8::MAX)
    }

    /// Price of the next level, or `None` at the cap.
    #[must_use]
    pub fn cost_from(&self, current_level: u8) -> Option<u32> {
        let idx = usize::from(current_level.checked_sub(1)?);
        self.costs.get(idx).copied()
    }
}

/// Scoring weights for final score calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Points per owned tile.
    pub territory: f64,
    /// Points per kill.
    pub kill: f64,
    /// Points per standing owned structure.
    pub structure: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            territory: 1.0,
            kill: 5.0,
            structure: 2.0,
        }
    }
}

/// Complete balance table. Injected at game creation, never mutated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Agent starting values.
    pub agent: AgentDefaults,
    /// Combat constants.
    pub combat: CombatBalance,
    /// Action energy costs and item limits.
    pub costs: ActionCosts,
    /// Upgrade cost table.
    pub upgrades: UpgradeCosts,
    /// Final score weights.
    pub scoring: ScoringWeights,
}

impl BalanceConfig {
    /// Load from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_json(path)
    }
}

/// Per-game settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// World seed.
    pub seed: u64,
    /// Requested map size name or side length; `None` uses the preset's size.
    pub map_size: Option<String>,
    /// Preset name.
    pub preset: String,
    /// Override for the preset's resource density.
    pub resource_density: Option<f64>,
    /// Override for the preset's difficulty multiplier.
    pub difficulty_multiplier: Option<f64>,
    /// Wall-clock time between ticks.
    pub tick_interval_ms: u64,
    /// Per-agent decision deadline.
    pub decision_timeout_ms: u64,
    /// Game ends once this many ticks have run.
    pub win_after_ticks: u64,
    /// Game ends when one agent owns this fraction of passable tiles (0 disables).
    pub domination_fraction: f64,
    /// Join cap.
    pub max_agents: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            map_size: None,
            preset: MapPreset::Default.name().to_string(),
            resource_density: None,
            difficulty_multiplier: None,
            tick_interval_ms: 1_000,
            decision_timeout_ms: 5_000,
            win_after_ticks: 500,
            domination_fraction: 0.75,
            max_agents: 16,
        }
    }
}

impl GameConfig {
    /// Load from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_json(path)
    }

    /// Resolved preset, falling back to `default` for unknown names.
    #[must_use]
    pub fn resolved_preset(&self) -> MapPreset {
        MapPreset::parse_or_default(&self.preset)
    }

    /// Resolved size: explicit request, else the preset's recommendation.
    #[must_use]
    pub fn resolved_size(&self) -> MapSize {
        match &self.map_size {
            Some(requested) => MapSize::parse_or_default(requested),
            None => self.resolved_preset().recommended_size(),
        }
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_cost_table() {
        let costs = UpgradeCosts::default();
        assert_eq!(costs.max_level(), 5);
        assert_eq!(costs.cost_from(1), Some(20));
        assert_eq!(costs.cost_from(4), Some(160));
        assert_eq!(costs.cost_from(5), None);
        assert_eq!(costs.cost_from(0), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let balance: BalanceConfig =
            serde_json::from_str(r#"{"combat": {"base_damage": 4}}"#).unwrap();
        assert_eq!(balance.combat.base_damage, 4);
        assert_eq!(balance.combat.trap_damage, CombatBalance::default().trap_damage);
        assert_eq!(balance.agent, AgentDefaults::default());
    }

    #[test]
    fn test_game_config_size_resolution() {
        let mut config = GameConfig {
            preset: "frozen_wastes".to_string(),
            ..GameConfig::default()
        };
        assert_eq!(config.resolved_size(), MapPreset::FrozenWastes.recommended_size());

        config.map_size = Some("large".to_string());
        assert_eq!(config.resolved_size(), MapSize::Large);

        config.map_size = Some("enormous".to_string());
        assert_eq!(config.resolved_size(), MapSize::Medium);
    }

    #[test]
    fn test_unknown_preset_falls_back() {
        let config = GameConfig {
            preset: "moon_base".to_string(),
            ..GameConfig::default()
        };
        assert_eq!(config.resolved_preset(), MapPreset::Default);
    }
}
