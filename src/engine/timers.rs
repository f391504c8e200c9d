//! Per-tick timers: respawns, despawns and energy regeneration.

use serde_json::json;
use tracing::warn;

use crate::config::BalanceConfig;
use crate::engine::EventKind;
use crate::engine::apply::Applied;
use crate::world::{AgentId, World};

/// Advance every timer by one tick.
pub(crate) fn advance_timers(world: &mut World, balance: &BalanceConfig, tick: u64, applied: &mut Applied) {
    respawn(world, balance, tick, applied);
    despawn(world, tick, applied);
    regenerate(world, balance);
}

fn respawn(world: &mut World, balance: &BalanceConfig, tick: u64, applied: &mut Applied) {
    let due: Vec<AgentId> = world
        .agents
        .values_mut()
        .filter(|a| !a.alive)
        .filter_map(|agent| {
            let left = agent.respawn_in.get_or_insert(0);
            *left = left.saturating_sub(1);
            (*left == 0).then(|| agent.id.clone())
        })
        .collect();

    for (index, id) in due.iter().enumerate() {
        let Some(home) = world.agent(id).map(|a| a.spawn) else {
            continue;
        };
        let at = if world.is_open(home) {
            Some(home)
        } else {
            world.find_spawn(tick.wrapping_mul(31).wrapping_add(index as u64))
        };
        let Some(at) = at else {
            warn!(tick, agent = %id, "no open tile to respawn on, retrying next tick");
            continue;
        };
        if let Some(agent) = world.agent_mut(id) {
            agent.respawn(at, balance.agent.starting_energy);
            applied.events.push((EventKind::AgentRespawned, Some(id.clone()), json!({ "at": at })));
        }
    }
}

fn despawn(world: &mut World, tick: u64, applied: &mut Applied) {
    let expired: Vec<_> = world
        .objects
        .values()
        .filter(|o| o.despawn_at.is_some_and(|at| at <= tick))
        .map(|o| (o.id, o.position))
        .collect();
    for (id, at) in expired {
        world.remove_object(id);
        applied.touched.remove(&id);
        applied.removed.push((id, at));
    }
}

fn regenerate(world: &mut World, balance: &BalanceConfig) {
    let per_tiles = balance.agent.tiles_per_energy.max(1) as usize;
    let bonuses: Vec<(AgentId, u32)> = world
        .live_agents()
        .map(|a| {
            let territory = u32::try_from(world.map.count_owned(&a.id) / per_tiles).unwrap_or(u32::MAX);
            let total = balance
                .agent
                .energy_regen
                .saturating_add(territory)
                .saturating_add(a.inventory.trinket_regen());
            (a.id.clone(), total)
        })
        .collect();
    for (id, gain) in bonuses {
        if let Some(agent) = world.agent_mut(&id) {
            agent.energy = agent.energy.saturating_add(gain).min(agent.max_energy);
        }
    }
}
