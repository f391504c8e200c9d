//! Snapshots and tick deltas, filtered per viewer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::actions::ActionResult;
use crate::engine::{ChatMessage, EventLogEntry, FinalScore, GameStatus};
use crate::error::GameId;
use crate::mapgen::MapPreset;
use crate::world::{Agent, AgentId, Coord, ObjectId, Tile, WorldObject};

/// Who is looking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "agent", rename_all = "snake_case")]
pub enum Viewer {
    /// Sees everything.
    Operator,
    /// Sees through one agent's fog of war.
    Agent(AgentId),
}

/// Public information about an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentView {
    /// Identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Position.
    pub position: Coord,
    /// Hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Whether it is alive.
    pub alive: bool,
}

impl From<&Agent> for AgentView {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.name.clone(),
            position: agent.position,
            hp: agent.hp,
            max_hp: agent.max_hp,
            alive: agent.alive,
        }
    }
}

/// Point-in-time view of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Game id.
    pub game_id: GameId,
    /// Last completed tick.
    pub tick: u64,
    /// Lifecycle state.
    pub status: GameStatus,
    /// Whether ticking is suspended.
    pub paused: bool,
    /// Map side length.
    pub map_size: u16,
    /// Generation preset.
    pub preset: MapPreset,
    /// Tiles in view, row-major.
    pub tiles: Vec<Tile>,
    /// Agents in view.
    pub agents: Vec<AgentView>,
    /// Objects in view.
    pub objects: Vec<WorldObject>,
    /// Full state of the viewing agent.
    pub own: Option<Agent>,
    /// Tiles the viewing agent has ever seen.
    pub explored: Option<usize>,
    /// Current standings, operator only.
    pub scores: Vec<FinalScore>,
}

/// Everything that changed in one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickDelta {
    /// Game id.
    pub game_id: GameId,
    /// Tick that produced the delta.
    pub tick: u64,
    /// Lifecycle state after the tick.
    pub status: Option<GameStatus>,
    /// One result per acting agent.
    pub results: Vec<ActionResult>,
    /// Tiles whose owner changed.
    pub tiles: Vec<Tile>,
    /// Agents after the tick.
    pub agents: Vec<AgentView>,
    /// Objects created or modified.
    pub objects: Vec<WorldObject>,
    /// Objects removed, with their last position.
    pub removed: Vec<(ObjectId, Coord)>,
    /// Chat delivered this tick.
    pub chat: Vec<ChatMessage>,
    /// Events logged this tick.
    pub events: Vec<EventLogEntry>,
}

impl TickDelta {
    /// The part of this delta `agent` may see, given its visible tiles.
    #[must_use]
    pub fn filtered_for(&self, agent: &AgentId, visible: &BTreeSet<Coord>) -> TickDelta {
        TickDelta {
            game_id: self.game_id.clone(),
            tick: self.tick,
            status: self.status,
            results: self.results.iter().filter(|r| &r.agent == agent).cloned().collect(),
            tiles: self.tiles.iter().filter(|t| visible.contains(&t.coord)).cloned().collect(),
            agents: self
                .agents
                .iter()
                .filter(|a| &a.id == agent || visible.contains(&a.position))
                .cloned()
                .collect(),
            objects: self
                .objects
                .iter()
                .filter(|o| visible.contains(&o.position))
                .cloned()
                .collect(),
            removed: self
                .removed
                .iter()
                .filter(|(_, at)| visible.contains(at))
                .copied()
                .collect(),
            chat: self.chat.iter().filter(|m| m.is_for(agent)).cloned().collect(),
            events: self
                .events
                .iter()
                .filter(|e| e.agent.as_ref() == Some(agent))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionKind;
    use crate::world::{Biome, Terrain};

    #[test]
    fn test_filter_hides_out_of_view() {
        let me = AgentId::new("me");
        let other = AgentId::new("other");
        let view = |id: &AgentId, x| AgentView {
            id: id.clone(),
            name: id.to_string(),
            position: Coord::new(x, 0),
            hp: 10,
            max_hp: 10,
            alive: true,
        };
        let tile = |x, owner: &AgentId| Tile {
            coord: Coord::new(x, 0),
            terrain: Terrain::Plains,
            biome: Biome::Grassland,
            owner: Some(owner.clone()),
        };
        let delta = TickDelta {
            game_id: "g".to_string(),
            tick: 4,
            results: vec![
                ActionResult::ok(&me, ActionKind::Wait, "waited"),
                ActionResult::ok(&other, ActionKind::Claim, "claimed"),
            ],
            tiles: vec![tile(1, &me), tile(9, &other)],
            agents: vec![view(&me, 9), view(&other, 9)],
            chat: vec![
                ChatMessage {
                    from: other.clone(),
                    to: None,
                    text: "hello".to_string(),
                },
                ChatMessage {
                    from: other.clone(),
                    to: Some(AgentId::new("third")),
                    text: "secret".to_string(),
                },
            ],
            ..TickDelta::default()
        };
        let visible: BTreeSet<Coord> = [Coord::new(0, 0), Coord::new(1, 0)].into_iter().collect();
        let mine = delta.filtered_for(&me, &visible);
        assert_eq!(mine.results.len(), 1);
        assert_eq!(mine.tiles.len(), 1);
        assert_eq!(mine.agents.len(), 1);
        assert_eq!(mine.agents[0].id, me);
        assert_eq!(mine.chat.len(), 1);
    }
}
