//! MOVE.

use crate::actions::handlers::mismatch;
use crate::actions::{Action, ActionHandler, ActionKind, Effect, Proposal, WorldView};
use crate::world::Agent;

/// Walks in a straight line, up to the agent's speed.
///
/// Every tile on the way must be in bounds, passable and not walled off.
/// Other agents are ignored here; destination contests are the resolver's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveHandler;

impl ActionHandler for MoveHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Move
    }

    fn propose(&self, action: &Action, view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        let Action::Move { direction, distance } = *action else {
            return Err(mismatch(ActionKind::Move, action));
        };
        let speed = view.balance.agent.speed.max(1);
        if distance == 0 {
            return Err("distance must be at least 1".to_string());
        }
        if distance > speed {
            return Err(format!("distance {distance} exceeds speed {speed}"));
        }

        let world = view.world;
        let mut at = agent.position;
        for _ in 0..distance {
            let next = at
                .step(direction, 1, world.size())
                .ok_or_else(|| format!("moving {direction:?} from {at} leaves the map").to_lowercase())?;
            if !world.map.is_passable(next) {
                return Err(format!("{next} is impassable"));
            }
            if !world.is_walkable_for(next, &agent.id) {
                return Err(format!("{next} is blocked by a wall"));
            }
            at = next;
        }

        let cost = view.balance.costs.move_energy * u32::from(distance);
        Ok(Proposal::new(
            Effect::MoveAgent {
                from: agent.position,
                to: at,
                portal: None,
            },
            cost,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::handlers::test_support::{add_agent, world};
    use crate::config::BalanceConfig;
    use crate::world::{Coord, Direction, ObjectKind, StructureKind};

    fn propose(world: &crate::world::World, balance: &BalanceConfig, direction: Direction, distance: u16) -> Result<Proposal, String> {
        let view = WorldView::new(world, balance, 1);
        let agent = world.agents.values().next().unwrap();
        MoveHandler.propose(&Action::Move { direction, distance }, &view, agent)
    }

    #[test]
    fn test_move_one_tile() {
        let mut w = world();
        add_agent(&mut w, "a", Coord::new(5, 5));
        let balance = BalanceConfig::default();
        let proposal = propose(&w, &balance, Direction::East, 1).unwrap();
        assert_eq!(
            proposal.effect,
            Effect::MoveAgent {
                from: Coord::new(5, 5),
                to: Coord::new(6, 5),
                portal: None
            }
        );
        assert_eq!(proposal.energy_cost, balance.costs.move_energy);
    }

    #[test]
    fn test_move_rejections() {
        let mut w = world();
        add_agent(&mut w, "a", Coord::new(1, 0));
        let balance = BalanceConfig::default();
        assert!(propose(&w, &balance, Direction::North, 1).unwrap_err().contains("leaves the map"));
        assert!(propose(&w, &balance, Direction::West, 1).unwrap_err().contains("impassable"));
        assert!(propose(&w, &balance, Direction::East, 0).is_err());
        assert!(propose(&w, &balance, Direction::East, 2).unwrap_err().contains("speed"));
    }

    #[test]
    fn test_speed_allows_longer_moves() {
        let mut w = world();
        add_agent(&mut w, "a", Coord::new(2, 2));
        let mut balance = BalanceConfig::default();
        balance.agent.speed = 3;
        let proposal = propose(&w, &balance, Direction::South, 3).unwrap();
        assert!(matches!(proposal.effect, Effect::MoveAgent { to, .. } if to == Coord::new(2, 5)));
        assert_eq!(proposal.energy_cost, 3 * balance.costs.move_energy);
    }

    #[test]
    fn test_foreign_wall_blocks() {
        let mut w = world();
        add_agent(&mut w, "a", Coord::new(5, 5));
        w.add_object(
            Coord::new(5, 6),
            ObjectKind::Structure {
                kind: StructureKind::Wall,
                hp: 10,
                owner: None,
            },
        );
        let balance = BalanceConfig::default();
        assert!(propose(&w, &balance, Direction::South, 1).unwrap_err().contains("wall"));
    }
}
