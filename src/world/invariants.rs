//! World invariants - sanity checks that detect bugs.
//!
//! These should never trigger in a correctly resolved tick. The engine runs
//! them after every commit; a violation fails that game instance only.

use std::collections::{BTreeMap, BTreeSet};

use crate::world::{AgentId, Coord, ObjectKind, World};

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Check all world invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(world: &World) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut occupied: BTreeMap<Coord, &AgentId> = BTreeMap::new();

    for (id, agent) in &world.agents {
        if *id != agent.id {
            violations.push(violation(format!("Agent keyed {id} carries id {}", agent.id)));
        }
        if agent.hp > agent.max_hp {
            violations.push(violation(format!(
                "Agent {id} has hp {} > max {}",
                agent.hp, agent.max_hp
            )));
        }
        if agent.energy > agent.max_energy {
            violations.push(violation(format!(
                "Agent {id} has energy {} > max {}",
                agent.energy, agent.max_energy
            )));
        }
        if !agent.alive {
            if agent.respawn_in.is_none() {
                violations.push(violation(format!("Dead agent {id} has no respawn timer")));
            }
            continue;
        }
        if agent.hp == 0 {
            violations.push(violation(format!("Living agent {id} has zero hp")));
        }
        if !world.map.is_passable(agent.position) {
            violations.push(violation(format!(
                "Agent {id} stands on impassable or out-of-bounds tile {}",
                agent.position
            )));
        }
        if let Some(other) = occupied.insert(agent.position, id) {
            violations.push(violation(format!(
                "Agents {other} and {id} share tile {}",
                agent.position
            )));
        }
    }

    for (coord, owner) in world.map.owned() {
        if !world.agents.contains_key(owner) {
            violations.push(violation(format!("Tile {coord} owned by unknown agent {owner}")));
        }
    }

    let mut seen = BTreeSet::new();
    for (id, object) in &world.objects {
        if *id != object.id || !seen.insert(object.id) {
            violations.push(violation(format!("Object keyed {id} carries id {}", object.id)));
        }
        if object.id >= world.peek_object_id() {
            violations.push(violation(format!(
                "Object {id} is ahead of the id allocator {}",
                world.peek_object_id()
            )));
        }
        if !world.map.in_bounds(object.position) {
            violations.push(violation(format!(
                "Object {id} out of bounds at {}",
                object.position
            )));
        }
        match &object.kind {
            ObjectKind::Structure { hp: 0, .. } => {
                violations.push(violation(format!("Structure {id} survived with zero hp")));
            }
            ObjectKind::Resource { remaining: 0, .. } => {
                violations.push(violation(format!("Exhausted resource node {id} survived")));
            }
            ObjectKind::DroppedItem { stack } if stack.quantity == 0 => {
                violations.push(violation(format!("Dropped item {id} is empty")));
            }
            _ => {}
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BalanceConfig;
    use crate::mapgen::MapPreset;
    use crate::world::{Agent, Biome, Cell, Controller, Map, StructureKind, Terrain};

    fn create_valid_world() -> World {
        let mut map = Map::filled(10, Cell::new(Terrain::Plains, Biome::Grassland)).unwrap();
        map.set_owner(Coord::new(2, 2), AgentId::new("a"));
        let mut world = World::new(1, MapPreset::Default, map);
        for (id, at) in [("a", Coord::new(2, 2)), ("b", Coord::new(7, 7))] {
            let agent = Agent::new(
                AgentId::new(id),
                id,
                Controller::Adversary {
                    profile: "test".to_string(),
                },
                "",
                at,
                &BalanceConfig::default(),
            );
            world.agents.insert(agent.id.clone(), agent);
        }
        world
    }

    #[test]
    fn test_valid_world_passes() {
        let world = create_valid_world();
        assert!(check_invariants(&world).is_empty());
    }

    #[test]
    fn test_shared_tile_detected() {
        let mut world = create_valid_world();
        world.agent_mut(&AgentId::new("b")).unwrap().position = Coord::new(2, 2);
        let violations = check_invariants(&world);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("share tile"));
    }

    #[test]
    fn test_dead_agents_do_not_occupy() {
        let mut world = create_valid_world();
        let b = world.agent_mut(&AgentId::new("b")).unwrap();
        b.position = Coord::new(2, 2);
        b.kill(5);
        assert!(check_invariants(&world).is_empty());
    }

    #[test]
    fn test_unknown_owner_detected() {
        let mut world = create_valid_world();
        world.map.set_owner(Coord::new(0, 0), AgentId::new("ghost"));
        let violations = check_invariants(&world);
        assert!(violations.iter().any(|v| v.message.contains("unknown agent")));
    }

    #[test]
    fn test_zero_hp_structure_detected() {
        let mut world = create_valid_world();
        world.add_object(
            Coord::new(4, 4),
            ObjectKind::Structure {
                kind: StructureKind::Wall,
                hp: 0,
                owner: None,
            },
        );
        assert_eq!(check_invariants(&world).len(), 1);
    }

    #[test]
    fn test_hp_above_max_detected() {
        let mut world = create_valid_world();
        world.agent_mut(&AgentId::new("a")).unwrap().hp = 99;
        assert_eq!(check_invariants(&world).len(), 1);
    }
}
