//! PLACE, CRAFT and UPGRADE.

use crate::actions::handlers::mismatch;
use crate::actions::recipes::{describe_materials, structure_materials};
use crate::actions::{Action, ActionHandler, ActionKind, Effect, Proposal, WorldView};
use crate::world::Agent;

/// Builds a structure underfoot or on a neighbouring tile.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceHandler;

impl ActionHandler for PlaceHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Place
    }

    fn propose(&self, action: &Action, view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        let Action::Place { structure, direction } = *action else {
            return Err(mismatch(ActionKind::Place, action));
        };
        let world = view.world;
        let at = match direction {
            None => agent.position,
            Some(direction) => agent
                .position
                .step(direction, 1, world.size())
                .ok_or_else(|| "target tile is off the map".to_string())?,
        };
        if !world.map.is_passable(at) {
            return Err(format!("cannot build on impassable {at}"));
        }
        if let Some(existing) = world.structure_at(at) {
            return Err(format!("{at} already holds {}", existing.label()));
        }
        if let Some(other) = world.agent_at(at).filter(|o| o.id != agent.id) {
            return Err(format!("{} is standing on {at}", other.id));
        }
        if let Some(owner) = world.map.owner(at).filter(|o| **o != agent.id) {
            return Err(format!("{at} belongs to {owner}"));
        }
        let materials = structure_materials(structure);
        if !agent.inventory.has_materials(materials) {
            return Err(format!("building needs {}", describe_materials(materials)));
        }
        Ok(Proposal::new(
            Effect::Place { structure, at },
            view.balance.costs.place_energy,
        ))
    }
}

/// Turns carried materials into an item.
#[derive(Debug, Clone, Copy, Default)]
pub struct CraftHandler;

impl ActionHandler for CraftHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Craft
    }

    fn propose(&self, action: &Action, view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        let Action::Craft { recipe } = *action else {
            return Err(mismatch(ActionKind::Craft, action));
        };
        let materials = recipe.materials();
        let mut after = agent.inventory.clone();
        if !after.remove_materials(materials) {
            return Err(format!("{} needs {}", recipe.name(), describe_materials(materials)));
        }
        if after.room_for(recipe.output(), agent.inventory_limits(view.balance)) == 0 {
            return Err(format!("no room for {}", recipe.name()));
        }
        Ok(Proposal::new(
            Effect::Craft { recipe },
            view.balance.costs.craft_energy,
        ))
    }
}

/// Buys the next level of an upgrade track with energy.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeHandler;

impl ActionHandler for UpgradeHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Upgrade
    }

    fn propose(&self, action: &Action, view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        let Action::Upgrade { track } = *action else {
            return Err(mismatch(ActionKind::Upgrade, action));
        };
        let level = agent.upgrades.level(track);
        let table = &view.balance.upgrades;
        if level >= table.max_level() {
            return Err(format!("{track:?} is already at max level {level}").to_lowercase());
        }
        let cost = table
            .cost_from(level)
            .ok_or_else(|| format!("no price for level {}", level + 1))?;
        Ok(Proposal::new(Effect::Upgrade { track }, cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::CraftRecipe;
    use crate::actions::handlers::test_support::{add_agent, world};
    use crate::config::BalanceConfig;
    use crate::world::{AgentId, Coord, Direction, ItemKind, ItemStack, ResourceKind, StructureKind, UpgradeTrack};

    fn give(world: &mut crate::world::World, id: &AgentId, resource: ResourceKind, qty: u32) {
        let balance = BalanceConfig::default();
        let agent = world.agent_mut(id).unwrap();
        let limits = agent.inventory_limits(&balance);
        agent.inventory.add(ItemStack::new(ItemKind::material(resource), qty), limits);
    }

    #[test]
    fn test_place_wall() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        let balance = BalanceConfig::default();
        let place = Action::Place {
            structure: StructureKind::Wall,
            direction: Some(Direction::East),
        };
        {
            let view = WorldView::new(&w, &balance, 1);
            let err = PlaceHandler.propose(&place, &view, w.agent(&a).unwrap()).unwrap_err();
            assert!(err.contains("3 stone"));
        }
        give(&mut w, &a, ResourceKind::Stone, 3);
        let view = WorldView::new(&w, &balance, 1);
        let proposal = PlaceHandler.propose(&place, &view, w.agent(&a).unwrap()).unwrap();
        assert_eq!(
            proposal.effect,
            Effect::Place {
                structure: StructureKind::Wall,
                at: Coord::new(5, 4)
            }
        );
    }

    #[test]
    fn test_place_on_foreign_land_or_agent() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        add_agent(&mut w, "b", Coord::new(4, 5));
        w.map.set_owner(Coord::new(3, 4), AgentId::new("b"));
        give(&mut w, &a, ResourceKind::Stone, 6);
        let balance = BalanceConfig::default();
        let view = WorldView::new(&w, &balance, 1);
        let agent = w.agent(&a).unwrap();
        let place = |direction| {
            PlaceHandler.propose(
                &Action::Place {
                    structure: StructureKind::Wall,
                    direction: Some(direction),
                },
                &view,
                agent,
            )
        };
        assert!(place(Direction::South).unwrap_err().contains("standing"));
        assert!(place(Direction::West).unwrap_err().contains("belongs"));
    }

    #[test]
    fn test_craft_requires_materials() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        give(&mut w, &a, ResourceKind::Ore, 2);
        let balance = BalanceConfig::default();
        {
            let view = WorldView::new(&w, &balance, 1);
            let sword = Action::Craft {
                recipe: CraftRecipe::Sword,
            };
            assert!(CraftHandler.propose(&sword, &view, w.agent(&a).unwrap()).is_err());
        }
        give(&mut w, &a, ResourceKind::Wood, 1);
        let view = WorldView::new(&w, &balance, 1);
        let sword = Action::Craft {
            recipe: CraftRecipe::Sword,
        };
        let proposal = CraftHandler.propose(&sword, &view, w.agent(&a).unwrap()).unwrap();
        assert_eq!(proposal.energy_cost, balance.costs.craft_energy);
    }

    #[test]
    fn test_upgrade_costs_and_cap() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        let balance = BalanceConfig::default();
        let upgrade = Action::Upgrade {
            track: UpgradeTrack::Strength,
        };
        {
            let view = WorldView::new(&w, &balance, 1);
            let proposal = UpgradeHandler.propose(&upgrade, &view, w.agent(&a).unwrap()).unwrap();
            assert_eq!(proposal.energy_cost, 20);
        }
        w.agent_mut(&a).unwrap().upgrades.strength = balance.upgrades.max_level();
        let view = WorldView::new(&w, &balance, 1);
        assert!(
            UpgradeHandler
                .propose(&upgrade, &view, w.agent(&a).unwrap())
                .unwrap_err()
                .contains("max level")
        );
    }
}
