//! Commit a resolution plan to the world.
//!
//! Moves land first, then every other effect in agent-id order, then all
//! damage at once. Any inconsistency aborts with an error; the caller applies
//! to a scratch copy so a failed tick leaves the previous world intact.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Value, json};

use crate::actions::Effect;
use crate::actions::recipes::structure_materials;
use crate::config::BalanceConfig;
use crate::engine::{ChatMessage, EventKind};
use crate::resolver::{Committed, ResolutionPlan};
use crate::world::{
    Agent, AgentId, Coord, InteractiveKind, ItemKind, ItemStack, ObjectId, ObjectKind, StructureKind,
    World, WorldObject,
};

/// What a commit changed, for the tick delta and event log.
#[derive(Debug, Default)]
pub(crate) struct Applied {
    /// Tiles whose owner changed.
    pub(crate) tiles: BTreeSet<Coord>,
    /// Objects created or modified.
    pub(crate) touched: BTreeSet<ObjectId>,
    /// Objects removed, with their last position.
    pub(crate) removed: Vec<(ObjectId, Coord)>,
    /// Chat delivered.
    pub(crate) chat: Vec<ChatMessage>,
    /// One-tick reveals: agent, center, radius.
    pub(crate) reveals: Vec<(AgentId, Coord, u32)>,
    /// Events to log.
    pub(crate) events: Vec<(EventKind, Option<AgentId>, Value)>,
}

impl Applied {
    fn event(&mut self, kind: EventKind, agent: &AgentId, payload: Value) {
        self.events.push((kind, Some(agent.clone()), payload));
    }
}

/// Apply `plan` to `world` for `tick`.
pub(crate) fn apply_plan(
    world: &mut World,
    plan: &ResolutionPlan,
    balance: &BalanceConfig,
    tick: u64,
) -> Result<Applied, String> {
    let mut applied = Applied::default();

    for commit in &plan.committed {
        let agent = agent_mut(world, &commit.agent)?;
        agent.energy = agent.energy.checked_sub(commit.energy_cost).ok_or_else(|| {
            format!(
                "{} cannot pay {} energy with {}",
                commit.agent, commit.energy_cost, agent.energy
            )
        })?;
        if let Effect::MoveAgent { to, .. } = commit.effect {
            agent.position = to;
        }
    }

    for commit in &plan.committed {
        apply_effect(world, commit, balance, tick, &mut applied)?;
    }

    apply_agent_damage(world, plan, balance, tick, &mut applied)?;
    apply_structure_damage(world, plan, &mut applied);
    Ok(applied)
}

fn agent_mut<'w>(world: &'w mut World, id: &AgentId) -> Result<&'w mut Agent, String> {
    world.agent_mut(id).ok_or_else(|| format!("agent {id} vanished"))
}

/// Put `stack` on the ground at `at`.
fn spill(world: &mut World, at: Coord, stack: ItemStack, expires: u64, applied: &mut Applied) {
    if stack.quantity == 0 {
        return;
    }
    let id = world.insert_object(|id| {
        WorldObject::new(id, at, ObjectKind::DroppedItem { stack }).expiring_at(expires)
    });
    applied.touched.insert(id);
}

/// Give `stack` to `agent`, spilling what does not fit.
fn give(
    world: &mut World,
    id: &AgentId,
    stack: ItemStack,
    balance: &BalanceConfig,
    expires: u64,
    applied: &mut Applied,
) -> Result<(), String> {
    let agent = agent_mut(world, id)?;
    let limits = agent.inventory_limits(balance);
    let left = agent.inventory.add(stack, limits);
    let at = agent.position;
    spill(world, at, ItemStack::new(stack.kind, left), expires, applied);
    Ok(())
}

fn remember(world: &mut World, id: &AgentId, note: String, balance: &BalanceConfig) {
    if let Some(agent) = world.agent_mut(id) {
        let capacity = agent.recall_capacity(balance);
        agent.remember(note, capacity);
    }
}

#[allow(clippy::too_many_lines)]
fn apply_effect(
    world: &mut World,
    commit: &Committed,
    balance: &BalanceConfig,
    tick: u64,
    applied: &mut Applied,
) -> Result<(), String> {
    let who = &commit.agent;
    let expires = tick + balance.costs.item_despawn_ticks;

    match &commit.effect {
        Effect::Wait | Effect::MoveAgent { .. } | Effect::Attack { .. } | Effect::DamageStructure { .. } => {}

        Effect::ClaimTile { tile, .. } => {
            let previous = world.map.set_owner(*tile, who.clone());
            if previous.as_ref() != Some(who) {
                applied.tiles.insert(*tile);
                let kind = if previous.is_some() {
                    EventKind::TileCaptured
                } else {
                    EventKind::TileClaimed
                };
                applied.event(kind, who, json!({ "tile": tile, "from": previous }));
                if let Some(loser) = previous {
                    remember(world, &loser, format!("tick {tick}: {who} captured {tile}"), balance);
                }
            }
        }

        Effect::Pickup { object } => {
            let item = world
                .remove_object(*object)
                .ok_or_else(|| format!("pickup of missing object {object}"))?;
            let ObjectKind::DroppedItem { stack } = item.kind else {
                return Err(format!("{object} is not a dropped item"));
            };
            let agent = agent_mut(world, who)?;
            let limits = agent.inventory_limits(balance);
            let left = agent.inventory.add(stack, limits);
            if left > 0 {
                let rest = ItemStack::new(stack.kind, left);
                world.objects.insert(
                    item.id,
                    WorldObject {
                        kind: ObjectKind::DroppedItem { stack: rest },
                        ..item
                    },
                );
                applied.touched.insert(*object);
            } else {
                applied.removed.push((item.id, item.position));
            }
        }

        Effect::Drop { slot, quantity, at } => {
            let stack = agent_mut(world, who)?
                .inventory
                .take(*slot, *quantity)
                .ok_or_else(|| format!("{who} has nothing in slot {slot}"))?;
            spill(world, *at, stack, expires, applied);
        }

        Effect::Use { slot } => {
            let agent = agent_mut(world, who)?;
            let stack = agent
                .inventory
                .take(*slot, 1)
                .ok_or_else(|| format!("{who} has nothing in slot {slot}"))?;
            match stack.kind {
                ItemKind::Potion { heal } => agent.hp = (agent.hp + heal).min(agent.max_hp),
                ItemKind::Material { .. } => return Err(format!("{who} used a material")),
                gear => {
                    if let Some(old) = agent.inventory.equip(gear) {
                        give(world, who, ItemStack::new(old, 1), balance, expires, applied)?;
                    }
                }
            }
        }

        Effect::Place { structure, at } => {
            if !agent_mut(world, who)?
                .inventory
                .remove_materials(structure_materials(*structure))
            {
                return Err(format!("{who} lacks materials for {structure:?}"));
            }
            let combat = &balance.combat;
            let hp = match structure {
                StructureKind::Wall => combat.wall_hp,
                StructureKind::Beacon => combat.beacon_hp,
                StructureKind::Trap => combat.trap_hp,
            };
            let kind = ObjectKind::Structure {
                kind: *structure,
                hp,
                owner: Some(who.clone()),
            };
            let lifetime = (*structure == StructureKind::Trap).then_some(tick + balance.costs.trap_lifetime_ticks);
            let id = world.insert_object(|id| {
                let object = WorldObject::new(id, *at, kind);
                match lifetime {
                    Some(expiry) => object.expiring_at(expiry),
                    None => object,
                }
            });
            applied.touched.insert(id);
            applied.event(
                EventKind::StructureBuilt,
                who,
                json!({ "object": id, "structure": structure, "at": at }),
            );
        }

        Effect::Craft { recipe } => {
            if !agent_mut(world, who)?.inventory.remove_materials(recipe.materials()) {
                return Err(format!("{who} lacks materials for {}", recipe.name()));
            }
            give(world, who, recipe.output(), balance, expires, applied)?;
        }

        Effect::Harvest { object } => {
            let node = world
                .objects
                .get_mut(object)
                .ok_or_else(|| format!("harvest of missing node {object}"))?;
            let ObjectKind::Resource { resource, remaining } = &mut node.kind else {
                return Err(format!("{object} is not a resource node"));
            };
            *remaining = remaining
                .checked_sub(commit.amount)
                .ok_or_else(|| format!("node {object} over-harvested"))?;
            let (resource, exhausted, position) = (*resource, *remaining == 0, node.position);
            if exhausted {
                world.remove_object(*object);
                applied.removed.push((*object, position));
            } else {
                applied.touched.insert(*object);
            }
            let stack = ItemStack::new(ItemKind::material(resource), commit.amount);
            give(world, who, stack, balance, expires, applied)?;
        }

        Effect::Interact { object } => {
            let landmark = world
                .objects
                .get_mut(object)
                .ok_or_else(|| format!("interaction with missing object {object}"))?;
            let position = landmark.position;
            let ObjectKind::Interactive {
                kind,
                activated,
                message,
                item,
                ..
            } = &mut landmark.kind
            else {
                return Err(format!("{object} is not a landmark"));
            };
            let kind = *kind;
            let note = message.clone();
            let reward = match kind {
                InteractiveKind::Shrine | InteractiveKind::Cache => {
                    *activated = true;
                    item.take()
                }
                InteractiveKind::Obelisk | InteractiveKind::Portal => None,
            };
            applied.touched.insert(*object);

            match kind {
                InteractiveKind::Shrine => {
                    let agent = agent_mut(world, who)?;
                    agent.hp = agent.max_hp;
                }
                InteractiveKind::Obelisk => {
                    let agent = agent_mut(world, who)?;
                    let radius = agent.vision_radius(balance.agent.vision_radius)
                        * balance.costs.scan_radius_multiplier.max(1);
                    applied.reveals.push((who.clone(), position, radius));
                }
                InteractiveKind::Cache | InteractiveKind::Portal => {}
            }
            if let Some(stack) = reward {
                give(world, who, stack, balance, expires, applied)?;
            }
            if let Some(text) = note {
                remember(world, who, format!("tick {tick}: the {kind:?} reads \"{text}\""), balance);
            }
        }

        Effect::Reveal { center, radius } => {
            applied.reveals.push((who.clone(), *center, *radius));
        }

        Effect::Upgrade { track } => {
            agent_mut(world, who)?.upgrades.raise(*track);
        }

        Effect::Chat { text, to } => {
            let recipients: Vec<AgentId> = match to {
                Some(to) => vec![to.clone()],
                None => world.agents.keys().filter(|id| *id != who).cloned().collect(),
            };
            for recipient in &recipients {
                remember(world, recipient, format!("tick {tick}: {who} says \"{text}\""), balance);
            }
            applied.chat.push(ChatMessage {
                from: who.clone(),
                to: to.clone(),
                text: text.clone(),
            });
            applied.event(EventKind::Chat, who, json!({ "to": to, "text": text }));
        }
    }
    Ok(())
}

fn apply_agent_damage(
    world: &mut World,
    plan: &ResolutionPlan,
    balance: &BalanceConfig,
    tick: u64,
    applied: &mut Applied,
) -> Result<(), String> {
    let mut credit: BTreeMap<&AgentId, BTreeSet<AgentId>> = BTreeMap::new();
    for commit in &plan.committed {
        if let Effect::Attack { target } = &commit.effect {
            credit.entry(target).or_default().insert(commit.agent.clone());
        }
    }
    for (victim, hit) in &plan.trap_hits {
        applied.event(EventKind::TrapTriggered, victim, json!({ "trap": hit.trap, "damage": hit.damage }));
        let owner = world
            .objects
            .get(&hit.trap)
            .and_then(|t| t.as_structure())
            .and_then(|(_, owner)| owner.cloned());
        if let Some(owner) = owner {
            credit.entry(victim).or_default().insert(owner);
        }
    }

    for (victim, damage) in plan.damage_by_target() {
        let agent = agent_mut(world, &victim)?;
        if !agent.alive {
            continue;
        }
        agent.hp = agent.hp.saturating_sub(damage);
        if agent.hp > 0 {
            continue;
        }

        let at = agent.position;
        let dropped = agent.inventory.drain();
        agent.kill(balance.agent.respawn_ticks);
        let killers: Vec<AgentId> = credit
            .get(&victim)
            .map(|set| set.iter().filter(|k| **k != victim).cloned().collect())
            .unwrap_or_default();
        for stack in dropped {
            spill(world, at, stack, tick + balance.costs.item_despawn_ticks, applied);
        }
        for killer in &killers {
            if let Some(k) = world.agent_mut(killer) {
                k.kills += 1;
            }
            remember(world, killer, format!("tick {tick}: you killed {victim} at {at}"), balance);
        }
        let by = killers.iter().map(AgentId::as_str).collect::<Vec<_>>().join(", ");
        remember(world, &victim, format!("tick {tick}: you died at {at} (by {by})"), balance);
        applied.event(EventKind::AgentKilled, &victim, json!({ "at": at, "by": killers }));
    }
    Ok(())
}

fn apply_structure_damage(world: &mut World, plan: &ResolutionPlan, applied: &mut Applied) {
    for (object, damage) in plan.structure_damage() {
        let Some(structure) = world.objects.get_mut(&object) else {
            continue;
        };
        let ObjectKind::Structure { hp, owner, .. } = &mut structure.kind else {
            continue;
        };
        *hp = hp.saturating_sub(damage);
        if *hp > 0 {
            applied.touched.insert(object);
            continue;
        }
        let owner = owner.clone();
        let label = structure.label();
        let at = structure.position;
        world.remove_object(object);
        applied.removed.push((object, at));
        applied.events.push((
            EventKind::StructureDestroyed,
            owner,
            json!({ "object": object, "label": label, "at": at }),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::handlers::test_support::{add_agent, world};
    use crate::actions::{ActionKind, Proposal, ProposedEffect};
    use crate::resolver::ConflictResolver;
    use crate::world::ResourceKind;

    fn commit(world: &World, proposals: Vec<ProposedEffect>) -> (World, Applied) {
        let balance = BalanceConfig::default();
        let plan = ConflictResolver::new().resolve(world, &balance, proposals);
        let mut next = world.clone();
        let applied = apply_plan(&mut next, &plan, &balance, 1).unwrap();
        (next, applied)
    }

    #[test]
    fn test_simultaneous_hits_kill_once() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(1, 1));
        let b = add_agent(&mut w, "b", Coord::new(3, 1));
        let v = add_agent(&mut w, "v", Coord::new(2, 1));
        w.agent_mut(&v).unwrap().hp = 2;
        let hit = |id: &AgentId| {
            ProposedEffect::new(
                id.clone(),
                ActionKind::Fight,
                Proposal::new(Effect::Attack { target: v.clone() }, 4),
            )
        };
        let (next, applied) = commit(&w, vec![hit(&a), hit(&b)]);
        let victim = next.agent(&v).unwrap();
        assert!(!victim.alive);
        assert_eq!(victim.deaths, 1);
        assert_eq!(next.agent(&a).unwrap().kills, 1);
        assert_eq!(next.agent(&b).unwrap().kills, 1);
        assert_eq!(next.agent(&a).unwrap().energy, w.agent(&a).unwrap().energy - 4);
        assert_eq!(
            applied.events.iter().filter(|e| e.0 == EventKind::AgentKilled).count(),
            1
        );
    }

    #[test]
    fn test_death_spills_inventory() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(1, 1));
        let v = add_agent(&mut w, "v", Coord::new(2, 1));
        {
            let victim = w.agent_mut(&v).unwrap();
            victim.hp = 1;
            victim.inventory.slots.push(ItemStack::new(ItemKind::material(ResourceKind::Ore), 3));
        }
        let hit = ProposedEffect::new(a, ActionKind::Fight, Proposal::free(Effect::Attack { target: v }));
        let (next, _) = commit(&w, vec![hit]);
        let spilled: Vec<_> = next.objects_at(Coord::new(2, 1)).collect();
        assert_eq!(spilled.len(), 1);
        assert!(spilled[0].despawn_at.is_some());
    }

    #[test]
    fn test_harvest_exhausts_node() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(1, 1));
        let node = w.add_object(
            Coord::new(1, 2),
            ObjectKind::Resource {
                resource: ResourceKind::Wood,
                remaining: 1,
            },
        );
        let harvest = ProposedEffect::new(
            a.clone(),
            ActionKind::Harvest,
            Proposal::new(Effect::Harvest { object: node }, 2),
        );
        let (next, applied) = commit(&w, vec![harvest]);
        assert!(next.objects.get(&node).is_none());
        assert_eq!(applied.removed, vec![(node, Coord::new(1, 2))]);
        assert_eq!(next.agent(&a).unwrap().inventory.count(ResourceKind::Wood), 1);
    }

    #[test]
    fn test_capture_logs_and_notifies() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(1, 1));
        let b = add_agent(&mut w, "b", Coord::new(9, 9));
        w.map.set_owner(Coord::new(1, 1), b.clone());
        let claim = ProposedEffect::new(
            a.clone(),
            ActionKind::Claim,
            Proposal::new(
                Effect::ClaimTile {
                    tile: Coord::new(1, 1),
                    capture: true,
                },
                6,
            ),
        );
        let (next, applied) = commit(&w, vec![claim]);
        assert_eq!(next.map.owner(Coord::new(1, 1)), Some(&a));
        assert!(applied.tiles.contains(&Coord::new(1, 1)));
        assert_eq!(applied.events[0].0, EventKind::TileCaptured);
        assert_eq!(next.agent(&b).unwrap().recall.len(), 1);
    }
}
