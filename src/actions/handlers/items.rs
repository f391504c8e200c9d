//! PICKUP, DROP, USE and HARVEST.

use crate::actions::handlers::{mismatch, object_in_reach};
use crate::actions::{Action, ActionHandler, ActionKind, Effect, Proposal, WorldView};
use crate::world::{Agent, ItemKind, ItemStack, ObjectKind};

/// Picks up a dropped item lying on the agent's tile.
#[derive(Debug, Clone, Copy, Default)]
pub struct PickupHandler;

impl ActionHandler for PickupHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Pickup
    }

    fn propose(&self, action: &Action, view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        let Action::Pickup { object } = *action else {
            return Err(mismatch(ActionKind::Pickup, action));
        };
        let here = agent.position;
        let item = object_in_reach(view, agent, object, "dropped item underfoot", |o| {
            o.position == here && matches!(o.kind, ObjectKind::DroppedItem { .. })
        })?;
        let ObjectKind::DroppedItem { stack } = item.kind else {
            return Err(format!("{} is not a dropped item", item.label()));
        };
        let limits = agent.inventory_limits(view.balance);
        if agent.inventory.room_for(stack, limits) == 0 {
            return Err("inventory is full".to_string());
        }
        Ok(Proposal::free(Effect::Pickup { object: item.id }))
    }
}

/// Drops items from an inventory slot onto the agent's tile.
#[derive(Debug, Clone, Copy, Default)]
pub struct DropHandler;

impl ActionHandler for DropHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Drop
    }

    fn propose(&self, action: &Action, _view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        let Action::Drop { slot, quantity } = *action else {
            return Err(mismatch(ActionKind::Drop, action));
        };
        let stack = agent
            .inventory
            .slots
            .get(slot)
            .ok_or_else(|| format!("inventory slot {slot} is empty"))?;
        let quantity = quantity.unwrap_or(stack.quantity);
        if quantity == 0 {
            return Err("quantity must be at least 1".to_string());
        }
        if quantity > stack.quantity {
            return Err(format!("slot {slot} holds only {}", stack.quantity));
        }
        Ok(Proposal::free(Effect::Drop {
            slot,
            quantity,
            at: agent.position,
        }))
    }
}

/// Drinks a potion or equips gear from an inventory slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct UseHandler;

impl ActionHandler for UseHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Use
    }

    fn propose(&self, action: &Action, _view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        let Action::Use { slot } = *action else {
            return Err(mismatch(ActionKind::Use, action));
        };
        let stack = agent
            .inventory
            .slots
            .get(slot)
            .ok_or_else(|| format!("inventory slot {slot} is empty"))?;
        match stack.kind {
            ItemKind::Potion { .. } if agent.hp >= agent.max_hp => {
                Err("already at full health".to_string())
            }
            ItemKind::Material { resource } => {
                Err(format!("{} cannot be used directly", resource.name()))
            }
            _ => Ok(Proposal::free(Effect::Use { slot })),
        }
    }
}

/// Gathers from a resource node on or next to the agent's tile.
#[derive(Debug, Clone, Copy, Default)]
pub struct HarvestHandler;

impl ActionHandler for HarvestHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Harvest
    }

    fn propose(&self, action: &Action, view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        let Action::Harvest { object } = *action else {
            return Err(mismatch(ActionKind::Harvest, action));
        };
        let node = object_in_reach(view, agent, object, "resource node", |o| {
            matches!(o.kind, ObjectKind::Resource { .. })
        })?;
        let ObjectKind::Resource { resource, remaining } = node.kind else {
            return Err(format!("{} is not a resource node", node.label()));
        };
        if remaining == 0 {
            return Err(format!("{} is exhausted", node.label()));
        }
        let stack = ItemStack::new(ItemKind::material(resource), 1);
        if agent.inventory.room_for(stack, agent.inventory_limits(view.balance)) == 0 {
            return Err(format!("no room for {}", resource.name()));
        }
        Ok(Proposal::new(
            Effect::Harvest { object: node.id },
            view.balance.costs.harvest_energy,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::handlers::test_support::{add_agent, world};
    use crate::config::BalanceConfig;
    use crate::world::{Coord, ObjectId, ResourceKind};

    #[test]
    fn test_pickup_underfoot_only() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        let stack = ItemStack::new(ItemKind::Potion { heal: 5 }, 1);
        let near = w.add_object(Coord::new(4, 5), ObjectKind::DroppedItem { stack });
        let here = w.add_object(Coord::new(4, 4), ObjectKind::DroppedItem { stack });
        let balance = BalanceConfig::default();
        let view = WorldView::new(&w, &balance, 1);
        let agent = w.agent(&a).unwrap();

        let auto = PickupHandler.propose(&Action::Pickup { object: None }, &view, agent).unwrap();
        assert_eq!(auto.effect, Effect::Pickup { object: here });
        assert!(
            PickupHandler
                .propose(&Action::Pickup { object: Some(near) }, &view, agent)
                .is_err()
        );
        assert!(
            PickupHandler
                .propose(&Action::Pickup { object: Some(ObjectId(99)) }, &view, agent)
                .is_err()
        );
    }

    #[test]
    fn test_drop_and_use() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        let balance = BalanceConfig::default();
        {
            let agent = w.agent_mut(&a).unwrap();
            let limits = agent.inventory_limits(&balance);
            agent.inventory.add(ItemStack::new(ItemKind::material(ResourceKind::Wood), 3), limits);
            agent.inventory.add(ItemStack::new(ItemKind::Potion { heal: 5 }, 1), limits);
            agent.inventory.add(ItemStack::new(ItemKind::Weapon { bonus: 2 }, 1), limits);
        }
        let view = WorldView::new(&w, &balance, 1);
        let agent = w.agent(&a).unwrap();

        let drop = DropHandler
            .propose(&Action::Drop { slot: 0, quantity: None }, &view, agent)
            .unwrap();
        assert!(matches!(drop.effect, Effect::Drop { quantity: 3, .. }));
        assert!(
            DropHandler
                .propose(&Action::Drop { slot: 0, quantity: Some(4) }, &view, agent)
                .is_err()
        );
        assert!(DropHandler.propose(&Action::Drop { slot: 7, quantity: None }, &view, agent).is_err());

        assert!(UseHandler.propose(&Action::Use { slot: 0 }, &view, agent).is_err());
        assert!(
            UseHandler
                .propose(&Action::Use { slot: 1 }, &view, agent)
                .unwrap_err()
                .contains("full health")
        );
        assert!(UseHandler.propose(&Action::Use { slot: 2 }, &view, agent).is_ok());
    }

    #[test]
    fn test_harvest_nearest_node() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        let far = w.add_object(
            Coord::new(6, 4),
            ObjectKind::Resource {
                resource: ResourceKind::Ore,
                remaining: 3,
            },
        );
        let near = w.add_object(
            Coord::new(5, 5),
            ObjectKind::Resource {
                resource: ResourceKind::Wood,
                remaining: 3,
            },
        );
        let balance = BalanceConfig::default();
        let view = WorldView::new(&w, &balance, 1);
        let agent = w.agent(&a).unwrap();
        let auto = HarvestHandler.propose(&Action::Harvest { object: None }, &view, agent).unwrap();
        assert_eq!(auto.effect, Effect::Harvest { object: near });
        assert_eq!(auto.energy_cost, balance.costs.harvest_energy);
        assert!(
            HarvestHandler
                .propose(&Action::Harvest { object: Some(far) }, &view, agent)
                .unwrap_err()
                .contains("out of reach")
        );
    }
}
