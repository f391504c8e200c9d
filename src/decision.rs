//! Decision sources.
//!
//! A [`DecisionSource`] turns an agent's view of the world into intent text,
//! usually by asking a language model. The engine asks every live agent
//! concurrently and substitutes WAIT for anything that fails or runs late.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, join_all};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actions::{Action, ActionResult, FightTarget};
use crate::config::ActionCosts;
use crate::engine::AgentView;
use crate::error::{DecisionError, GameId};
use crate::world::{Agent, AgentId, Coord, Direction, ItemKind, ObjectKind, Tile, WorldObject};

/// What an agent knows when deciding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    /// Game the agent plays in.
    pub game_id: GameId,
    /// Tick being decided.
    pub tick: u64,
    /// Map side length.
    pub map_size: u16,
    /// The agent itself, in full.
    pub agent: Agent,
    /// Tiles the agent owns.
    pub owned_tiles: usize,
    /// Visible tiles.
    pub tiles: Vec<Tile>,
    /// Other visible agents.
    pub agents: Vec<AgentView>,
    /// Visible objects.
    pub objects: Vec<WorldObject>,
    /// Result of the agent's previous action.
    pub last_result: Option<ActionResult>,
    /// Energy prices.
    pub costs: ActionCosts,
}

impl DecisionContext {
    /// Visible tile at `coord`.
    #[must_use]
    pub fn tile(&self, coord: Coord) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.coord == coord)
    }

    /// Visible live agent at `coord`, other than self.
    #[must_use]
    pub fn agent_at(&self, coord: Coord) -> Option<&AgentView> {
        self.agents.iter().find(|a| a.alive && a.position == coord)
    }
}

/// Produces intent text for one agent.
pub trait DecisionSource: Send + Sync {
    /// Ask for `agent`'s next action.
    fn get_action<'a>(
        &'a self,
        agent: &'a AgentId,
        context: &'a DecisionContext,
    ) -> BoxFuture<'a, Result<String, DecisionError>>;
}

/// Ask every agent concurrently, each under its own deadline.
pub async fn collect_decisions(
    source: &dyn DecisionSource,
    contexts: &[DecisionContext],
    deadline: Duration,
) -> BTreeMap<AgentId, Result<String, DecisionError>> {
    let timeout_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
    let asks = contexts.iter().map(|context| async move {
        let id = &context.agent.id;
        let answer = match tokio::time::timeout(deadline, source.get_action(id, context)).await {
            Ok(answer) => answer,
            Err(_) => Err(DecisionError::Timeout(timeout_ms)),
        };
        (id.clone(), answer)
    });
    let answers: BTreeMap<_, _> = join_all(asks).await.into_iter().collect();
    debug!(agents = answers.len(), "collected decisions");
    answers
}

/// Always waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleDecisions;

impl DecisionSource for IdleDecisions {
    fn get_action<'a>(
        &'a self,
        _agent: &'a AgentId,
        _context: &'a DecisionContext,
    ) -> BoxFuture<'a, Result<String, DecisionError>> {
        Box::pin(async { Ok(Action::Wait.to_intent()) })
    }
}

/// Seeded heuristic play: fight neighbours, claim, harvest, wander.
///
/// The same seed, tick and view always produce the same action.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoamingDecisions {
    seed: u64,
}

impl RoamingDecisions {
    /// Heuristic player seeded with `seed`.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Pick an action for the agent in `context`.
    #[must_use]
    pub fn choose(self, context: &DecisionContext) -> Action {
        let me = &context.agent;
        let stream = context.tick.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ id_hash(&me.id);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ stream);
        let costs = &context.costs;

        if me.energy >= costs.fight_energy
            && let Some(enemy) = context
                .agents
                .iter()
                .find(|a| a.alive && a.id != me.id && a.position.touches(me.position))
        {
            return Action::Fight {
                target: FightTarget::Agent(enemy.id.clone()),
            };
        }

        if me.hp * 2 < me.max_hp
            && let Some(slot) = me
                .inventory
                .slots
                .iter()
                .position(|s| matches!(s.kind, ItemKind::Potion { .. }))
        {
            return Action::Use { slot };
        }

        let owner = context.tile(me.position).and_then(|t| t.owner.as_ref());
        let claim_cost = if owner.is_some() { costs.capture_energy } else { costs.claim_energy };
        if owner != Some(&me.id) && me.energy >= claim_cost {
            return Action::Claim { target: None };
        }

        let node_nearby = context.objects.iter().any(|o| {
            o.position.touches(me.position)
                && matches!(o.kind, ObjectKind::Resource { remaining, .. } if remaining > 0)
        });
        if node_nearby && me.energy >= costs.harvest_energy && rng.gen_bool(0.3) {
            return Action::Harvest { object: None };
        }

        if me.energy < costs.move_energy {
            return Action::Wait;
        }
        let mut options: Vec<(Direction, bool)> = Direction::ALL
            .into_iter()
            .filter_map(|direction| {
                let to = me.position.step(direction, 1, context.map_size)?;
                let tile = context.tile(to)?;
                (tile.terrain.is_passable() && context.agent_at(to).is_none())
                    .then_some((direction, tile.owner.as_ref() != Some(&me.id)))
            })
            .collect();
        options.shuffle(&mut rng);
        options.sort_by_key(|&(_, unclaimed)| !unclaimed);
        match options.first() {
            Some(&(direction, _)) => Action::Move { direction, distance: 1 },
            None => Action::Wait,
        }
    }
}

impl DecisionSource for RoamingDecisions {
    fn get_action<'a>(
        &'a self,
        _agent: &'a AgentId,
        context: &'a DecisionContext,
    ) -> BoxFuture<'a, Result<String, DecisionError>> {
        let action = self.choose(context);
        Box::pin(async move { Ok(action.to_intent()) })
    }
}

fn id_hash(id: &AgentId) -> u64 {
    // FNV-1a
    id.as_str()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |h, b| (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3))
}

/// Replays queued responses per agent.
///
/// An agent with nothing queued waits. Responses can be delayed to exercise
/// the decision deadline.
#[derive(Debug, Default)]
pub struct ScriptedDecisions {
    queues: Mutex<BTreeMap<AgentId, VecDeque<Result<String, DecisionError>>>>,
    delay: Option<Duration>,
}

impl ScriptedDecisions {
    /// Empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `delay`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue raw intent text for `agent`.
    #[must_use]
    pub fn then(self, agent: impl Into<AgentId>, text: impl Into<String>) -> Self {
        self.push(agent.into(), Ok(text.into()));
        self
    }

    /// Queue an action for `agent`.
    #[must_use]
    pub fn then_action(self, agent: impl Into<AgentId>, action: &Action) -> Self {
        self.then(agent, action.to_intent())
    }

    /// Queue a failure for `agent`.
    #[must_use]
    pub fn then_fail(self, agent: impl Into<AgentId>, error: DecisionError) -> Self {
        self.push(agent.into(), Err(error));
        self
    }

    /// Append a response for `agent`.
    pub fn push(&self, agent: AgentId, response: Result<String, DecisionError>) {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(agent)
            .or_default()
            .push_back(response);
    }

    fn next(&self, agent: &AgentId) -> Result<String, DecisionError> {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(agent)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(Action::Wait.to_intent()))
    }
}

impl DecisionSource for ScriptedDecisions {
    fn get_action<'a>(
        &'a self,
        agent: &'a AgentId,
        _context: &'a DecisionContext,
    ) -> BoxFuture<'a, Result<String, DecisionError>> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.next(agent)
        })
    }
}
