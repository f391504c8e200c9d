//! Deterministic conflict resolution.
//!
//! Takes the validated proposals of one tick and decides which of them
//! commit. The outcome depends only on the pre-tick world and the set of
//! proposals, never on submission order: every tie is broken by agent id.
//!
//! Conflict classes:
//! - Moves: one winner per destination (lowest id). A move into a tile whose
//!   occupant stays put fails, and that failure cascades until nothing
//!   changes. Swaps and longer cycles succeed because every target is vacated.
//! - Claims: highest claim strength per tile, ties to the lowest id.
//! - Combat and structure damage: computed from the pre-tick snapshot and
//!   summed per target by the engine, so hits are simultaneous.
//! - Object contests (pickup, placement tile, single-use landmark, harvest
//!   yield): allotted in id order.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actions::{ActionKind, ActionResult, Effect, ProposedEffect};
use crate::config::BalanceConfig;
use crate::world::{Agent, AgentId, Coord, InteractiveKind, ObjectId, ObjectKind, World};

/// Effective strength of a claim.
pub trait ClaimStrength: Send + Sync + fmt::Debug {
    /// Strength of `agent`'s claim this tick.
    fn strength(&self, agent: &Agent, balance: &BalanceConfig) -> u32;
}

/// Base claim strength plus the strength upgrade level.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClaimStrength;

impl ClaimStrength for DefaultClaimStrength {
    fn strength(&self, agent: &Agent, balance: &BalanceConfig) -> u32 {
        balance.combat.base_claim_strength + u32::from(agent.upgrades.strength)
    }
}

/// Damage `attacker` deals to a target with `armor` reduction.
#[must_use]
pub fn hit_damage(attacker: &Agent, armor: u32, balance: &BalanceConfig) -> u32 {
    let combat = &balance.combat;
    let raw = combat.base_damage
        + u32::from(attacker.upgrades.strength.saturating_sub(1))
        + attacker.inventory.weapon_bonus();
    raw.saturating_sub(armor).max(combat.min_damage)
}

/// A committed effect with its resolved magnitude.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committed {
    /// Acting agent.
    pub agent: AgentId,
    /// Action kind.
    pub kind: ActionKind,
    /// Energy to charge.
    pub energy_cost: u32,
    /// The effect.
    pub effect: Effect,
    /// Damage dealt or units harvested; zero for other effects.
    pub amount: u32,
}

/// A trap firing on an agent that walked onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapHit {
    /// The trap.
    pub trap: ObjectId,
    /// Damage dealt.
    pub damage: u32,
}

/// Everything that commits this tick, plus one result per input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionPlan {
    /// Committed effects in agent-id order.
    pub committed: Vec<Committed>,
    /// Trap triggers keyed by victim.
    pub trap_hits: BTreeMap<AgentId, TrapHit>,
    /// One result per input proposal, in agent-id order.
    pub results: Vec<ActionResult>,
}

impl ResolutionPlan {
    /// Total damage per agent from attacks and traps.
    #[must_use]
    pub fn damage_by_target(&self) -> BTreeMap<AgentId, u32> {
        let mut totals: BTreeMap<AgentId, u32> = BTreeMap::new();
        for commit in &self.committed {
            if let Effect::Attack { target } = &commit.effect {
                *totals.entry(target.clone()).or_default() += commit.amount;
            }
        }
        for (victim, hit) in &self.trap_hits {
            *totals.entry(victim.clone()).or_default() += hit.damage;
        }
        totals
    }

    /// Total damage per structure.
    #[must_use]
    pub fn structure_damage(&self) -> BTreeMap<ObjectId, u32> {
        let mut totals: BTreeMap<ObjectId, u32> = BTreeMap::new();
        for commit in &self.committed {
            if let Effect::DamageStructure { object } = commit.effect {
                *totals.entry(object).or_default() += commit.amount;
            }
        }
        totals
    }

    /// Result for one agent.
    #[must_use]
    pub fn result_for(&self, agent: &AgentId) -> Option<&ActionResult> {
        self.results.iter().find(|r| &r.agent == agent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    Pending,
    Commit(u32),
    Fail(String),
}

/// Orders and filters one tick's proposals.
#[derive(Debug)]
pub struct ConflictResolver {
    claim_strength: Box<dyn ClaimStrength>,
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConflictResolver {
    /// Resolver with the default claim strength.
    #[must_use]
    pub fn new() -> Self {
        Self::with_claim_strength(Box::new(DefaultClaimStrength))
    }

    /// Resolver with a custom claim strength policy.
    #[must_use]
    pub fn with_claim_strength(claim_strength: Box<dyn ClaimStrength>) -> Self {
        Self { claim_strength }
    }

    /// Resolve a tick's proposals against the pre-tick world.
    #[must_use]
    pub fn resolve(
        &self,
        world: &World,
        balance: &BalanceConfig,
        mut proposals: Vec<ProposedEffect>,
    ) -> ResolutionPlan {
        proposals.sort_by(|a, b| a.agent.cmp(&b.agent));
        let mut verdicts = vec![Verdict::Pending; proposals.len()];

        let mut seen = BTreeSet::new();
        for (i, p) in proposals.iter().enumerate() {
            if !seen.insert(&p.agent) {
                verdicts[i] = Verdict::Fail("only one action per tick".to_string());
            }
        }

        let arrivals = resolve_moves(world, &proposals, &mut verdicts);
        let trap_hits = trap_hits(world, balance, &proposals, &verdicts);
        resolve_places(&proposals, &arrivals, &mut verdicts);
        self.resolve_claims(world, balance, &proposals, &mut verdicts);
        resolve_damage(world, balance, &proposals, &mut verdicts);
        resolve_object_contests(world, balance, &proposals, &mut verdicts);

        let mut plan = ResolutionPlan {
            trap_hits,
            ..ResolutionPlan::default()
        };
        for (proposal, verdict) in proposals.into_iter().zip(verdicts) {
            let amount = match verdict {
                Verdict::Fail(reason) => {
                    plan.results
                        .push(ActionResult::failed(&proposal.agent, proposal.kind, reason));
                    continue;
                }
                Verdict::Commit(amount) => amount,
                Verdict::Pending => 0,
            };
            plan.results.push(ActionResult::ok(
                &proposal.agent,
                proposal.kind,
                describe(world, &proposal, amount),
            ));
            plan.committed.push(Committed {
                agent: proposal.agent,
                kind: proposal.kind,
                energy_cost: proposal.energy_cost,
                effect: proposal.effect,
                amount,
            });
        }
        plan
    }

    fn resolve_claims(
        &self,
        world: &World,
        balance: &BalanceConfig,
        proposals: &[ProposedEffect],
        verdicts: &mut [Verdict],
    ) {
        let mut by_tile: BTreeMap<Coord, Vec<(Reverse<u32>, usize)>> = BTreeMap::new();
        for (i, p) in pending(proposals, verdicts) {
            if let Effect::ClaimTile { tile, .. } = p.effect {
                let strength = world
                    .agent(&p.agent)
                    .map_or(0, |a| self.claim_strength.strength(a, balance));
                by_tile.entry(tile).or_default().push((Reverse(strength), i));
            }
        }
        for (tile, mut contenders) in by_tile {
            // Index order is agent-id order.
            contenders.sort();
            let (_, winner) = contenders[0];
            for &(_, loser) in &contenders[1..] {
                verdicts[loser] = Verdict::Fail(format!(
                    "lost claim contest for {tile} to {}",
                    proposals[winner].agent
                ));
            }
        }
    }
}

fn pending<'a>(
    proposals: &'a [ProposedEffect],
    verdicts: &'a [Verdict],
) -> impl Iterator<Item = (usize, &'a ProposedEffect)> + 'a {
    proposals
        .iter()
        .enumerate()
        .filter(|(i, _)| verdicts[*i] == Verdict::Pending)
}

/// Resolve movement; returns the destinations of successful moves.
fn resolve_moves(
    world: &World,
    proposals: &[ProposedEffect],
    verdicts: &mut [Verdict],
) -> BTreeMap<Coord, AgentId> {
    let mut by_dest: BTreeMap<Coord, Vec<usize>> = BTreeMap::new();
    for (i, p) in pending(proposals, verdicts) {
        if let Effect::MoveAgent { to, .. } = p.effect {
            by_dest.entry(to).or_default().push(i);
        }
    }

    let mut active: BTreeMap<usize, Coord> = BTreeMap::new();
    for (dest, movers) in by_dest {
        let winner = movers[0];
        active.insert(winner, dest);
        for &loser in &movers[1..] {
            verdicts[loser] = Verdict::Fail(format!(
                "tile occupied: {} moves to {dest} first",
                proposals[winner].agent
            ));
        }
    }

    let occupants: BTreeMap<Coord, &AgentId> =
        world.live_agents().map(|a| (a.position, &a.id)).collect();
    loop {
        let moving: BTreeSet<&AgentId> = active.keys().map(|&i| &proposals[i].agent).collect();
        let blocked: Vec<(usize, &AgentId)> = active
            .iter()
            .filter_map(|(&i, dest)| {
                let occupant = *occupants.get(dest)?;
                (occupant != &proposals[i].agent && !moving.contains(occupant))
                    .then_some((i, occupant))
            })
            .collect();
        if blocked.is_empty() {
            break;
        }
        for (i, occupant) in blocked {
            if let Some(dest) = active.remove(&i) {
                verdicts[i] = Verdict::Fail(format!("tile occupied: {occupant} holds {dest}"));
            }
        }
    }

    active
        .into_iter()
        .map(|(i, dest)| (dest, proposals[i].agent.clone()))
        .collect()
}

fn trap_hits(
    world: &World,
    balance: &BalanceConfig,
    proposals: &[ProposedEffect],
    verdicts: &[Verdict],
) -> BTreeMap<AgentId, TrapHit> {
    let mut hits = BTreeMap::new();
    for (_, p) in pending(proposals, verdicts) {
        let Effect::MoveAgent { to, .. } = p.effect else {
            continue;
        };
        let Some(agent) = world.agent(&p.agent) else {
            continue;
        };
        if let Some(trap) = world.objects_at(to).find(|o| o.is_hostile_trap(&p.agent)) {
            let damage = balance
                .combat
                .trap_damage
                .saturating_sub(agent.inventory.armor_reduction())
                .max(balance.combat.min_damage);
            hits.insert(p.agent.clone(), TrapHit { trap: trap.id, damage });
        }
    }
    hits
}

fn resolve_places(
    proposals: &[ProposedEffect],
    arrivals: &BTreeMap<Coord, AgentId>,
    verdicts: &mut [Verdict],
) {
    let mut by_tile: BTreeMap<Coord, Vec<usize>> = BTreeMap::new();
    for (i, p) in pending(proposals, verdicts) {
        if let Effect::Place { at, .. } = p.effect {
            by_tile.entry(at).or_default().push(i);
        }
    }
    for (at, builders) in by_tile {
        if let Some(arriving) = arrivals.get(&at) {
            for &i in &builders {
                verdicts[i] = Verdict::Fail(format!("{arriving} moved onto {at}"));
            }
            continue;
        }
        for &loser in &builders[1..] {
            verdicts[loser] = Verdict::Fail(format!(
                "{} builds on {at} first",
                proposals[builders[0]].agent
            ));
        }
    }
}

fn resolve_damage(
    world: &World,
    balance: &BalanceConfig,
    proposals: &[ProposedEffect],
    verdicts: &mut [Verdict],
) {
    for i in 0..proposals.len() {
        if verdicts[i] != Verdict::Pending {
            continue;
        }
        let p = &proposals[i];
        let Some(attacker) = world.agent(&p.agent) else {
            continue;
        };
        verdicts[i] = match &p.effect {
            Effect::Attack { target } => match world.agent(target) {
                Some(victim) => Verdict::Commit(hit_damage(
                    attacker,
                    victim.inventory.armor_reduction(),
                    balance,
                )),
                None => Verdict::Fail(format!("unknown agent {target}")),
            },
            Effect::DamageStructure { .. } => Verdict::Commit(hit_damage(attacker, 0, balance)),
            _ => continue,
        };
    }
}

fn resolve_object_contests(
    world: &World,
    balance: &BalanceConfig,
    proposals: &[ProposedEffect],
    verdicts: &mut [Verdict],
) {
    let mut single_use: BTreeMap<ObjectId, usize> = BTreeMap::new();
    let mut harvested: BTreeMap<ObjectId, u32> = BTreeMap::new();

    for i in 0..proposals.len() {
        if verdicts[i] != Verdict::Pending {
            continue;
        }
        let p = &proposals[i];
        let contested = match p.effect {
            Effect::Pickup { object } => Some(object),
            Effect::Interact { object } => world
                .objects
                .get(&object)
                .filter(|o| {
                    matches!(
                        o.kind,
                        ObjectKind::Interactive {
                            kind: InteractiveKind::Shrine | InteractiveKind::Cache,
                            ..
                        }
                    )
                })
                .map(|o| o.id),
            Effect::Harvest { object } => {
                let remaining = match world.objects.get(&object).map(|o| &o.kind) {
                    Some(ObjectKind::Resource { remaining, .. }) => *remaining,
                    _ => 0,
                };
                let taken = harvested.entry(object).or_default();
                let amount = balance.costs.harvest_yield.max(1).min(remaining.saturating_sub(*taken));
                verdicts[i] = if amount == 0 {
                    Verdict::Fail(format!("node {object} is exhausted"))
                } else {
                    *taken += amount;
                    Verdict::Commit(amount)
                };
                None
            }
            _ => None,
        };
        if let Some(object) = contested {
            if let Some(&winner) = single_use.get(&object) {
                verdicts[i] = Verdict::Fail(format!(
                    "{} took {object} first",
                    proposals[winner].agent
                ));
            } else {
                single_use.insert(object, i);
            }
        }
    }
}

fn describe(world: &World, proposal: &ProposedEffect, amount: u32) -> String {
    let label = |id: &ObjectId| {
        world
            .objects
            .get(id)
            .map_or_else(|| id.to_string(), |o| o.label())
    };
    match &proposal.effect {
        Effect::Wait => "waited".to_string(),
        Effect::MoveAgent { to, portal: None, .. } => format!("moved to {to}"),
        Effect::MoveAgent {
            to,
            portal: Some(p),
            ..
        } => format!("stepped through {} to {to}", label(p)),
        Effect::ClaimTile { tile, .. } if world.map.owner(*tile) == Some(&proposal.agent) => {
            format!("{tile} is already yours")
        }
        Effect::ClaimTile { tile, capture: true } => format!("captured {tile}"),
        Effect::ClaimTile { tile, capture: false } => format!("claimed {tile}"),
        Effect::Attack { target } => format!("hit {target} for {amount}"),
        Effect::DamageStructure { object } => format!("hit {} for {amount}", label(object)),
        Effect::Pickup { object } => format!("picked up {}", label(object)),
        Effect::Drop { quantity, at, .. } => format!("dropped {quantity} at {at}"),
        Effect::Use { slot } => format!("used slot {slot}"),
        Effect::Place { structure, at } => format!("built {} at {at}", format!("{structure:?}").to_lowercase()),
        Effect::Craft { recipe } => format!("crafted {}", recipe.name()),
        Effect::Harvest { object } => format!("harvested {amount} from {}", label(object)),
        Effect::Reveal { radius, .. } => format!("scanned radius {radius}"),
        Effect::Interact { object } => format!("activated {}", label(object)),
        Effect::Upgrade { track } => format!("upgraded {}", format!("{track:?}").to_lowercase()),
        Effect::Chat { to: Some(to), .. } => format!("messaged {to}"),
        Effect::Chat { to: None, .. } => "broadcast a message".to_string(),
    }
}
