//! Game engine: one instance's lifecycle and tick pipeline.
//!
//! A tick runs in phases:
//! 1. collect one intent per live agent (WAIT on failure or timeout)
//! 2. validate every intent against the pre-tick world, in parallel
//! 3. resolve conflicts
//! 4. apply the committed effects
//! 5. run timers (respawns, despawns, energy)
//! 6. recompute visibility
//! 7. check invariants and emit the tick delta
//!
//! Phases 4 and 5 work on a scratch copy of the world that replaces the live
//! one only after the invariant check passes. A failed tick marks the
//! instance `Failed`; other instances are unaffected.

mod apply;
mod events;
mod score;
mod timers;
mod view;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

pub use events::{ChatMessage, DecisionFailure, EventKind, EventLogEntry};
pub use score::{FinalScore, compute_scores};
pub use view::{AgentView, GameSnapshot, TickDelta, Viewer};

use crate::actions::{
    Action, ActionKind, ActionRequest, ActionResult, HandlerRegistry, ProposedEffect, WorldView, parse_intent_within,
};
use crate::config::{BalanceConfig, GameConfig};
use crate::decision::{DecisionContext, DecisionSource, collect_decisions};
use crate::error::{EngineError, GameId};
use crate::mapgen::{self, GenOptions};
use crate::resolver::{ClaimStrength, ConflictResolver};
use crate::visibility::VisibilityTracker;
use crate::world::invariants::check_invariants;
use crate::world::{Agent, AgentId, Controller, Coord, World};

use self::apply::{Applied, apply_plan};
use self::timers::advance_timers;

/// Lifecycle state of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Accepting agents, not ticking.
    Waiting,
    /// Ticking.
    Running,
    /// A win condition was reached.
    Finished,
    /// An engine-fatal error stopped the game.
    Failed,
}

impl GameStatus {
    /// Lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Running => "running",
            GameStatus::Finished => "finished",
            GameStatus::Failed => "failed",
        }
    }

    /// Whether the game can no longer tick.
    #[must_use]
    pub const fn is_over(self) -> bool {
        matches!(self, GameStatus::Finished | GameStatus::Failed)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Request to add an agent to a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Unique id within the game.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Who decides for it.
    pub controller: Controller,
    /// Free-text strategy handed to the decision source.
    pub strategy: String,
}

impl AgentSpec {
    /// A built-in adversary with a behaviour profile.
    #[must_use]
    pub fn adversary(id: impl Into<AgentId>, profile: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            controller: Controller::Adversary {
                profile: profile.into(),
            },
            strategy: String::new(),
        }
    }

    /// A player-owned agent.
    #[must_use]
    pub fn player(
        id: impl Into<AgentId>,
        name: impl Into<String>,
        player_id: impl Into<String>,
        strategy: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            controller: Controller::Player {
                player_id: player_id.into(),
            },
            strategy: strategy.into(),
        }
    }
}

/// One game instance.
#[derive(Debug)]
pub struct GameEngine {
    game_id: GameId,
    config: GameConfig,
    balance: BalanceConfig,
    world: World,
    status: GameStatus,
    paused: bool,
    tick: u64,
    passable_tiles: usize,
    joined: u64,
    registry: HandlerRegistry,
    resolver: ConflictResolver,
    visibility: VisibilityTracker,
    last_results: BTreeMap<AgentId, ActionResult>,
    last_delta: Option<TickDelta>,
    events: Vec<EventLogEntry>,
    failures: Vec<DecisionFailure>,
    final_scores: Option<Vec<FinalScore>>,
}

impl GameEngine {
    /// Create a game, generating its world from `config`.
    #[must_use]
    pub fn new(game_id: impl Into<GameId>, config: GameConfig, balance: BalanceConfig) -> Self {
        let preset = config.resolved_preset();
        let size = config.resolved_size();
        let mut options = GenOptions::for_preset(preset);
        if let Some(density) = config.resource_density {
            options.resource_density = density;
        }
        if let Some(difficulty) = config.difficulty_multiplier {
            options.difficulty_multiplier = difficulty;
        }
        options.trap_hp = balance.combat.trap_hp;
        let world = mapgen::generate_with(config.seed, size, preset, options);
        Self::with_world(game_id, config, balance, world)
    }

    /// Create a game around an existing world.
    #[must_use]
    pub fn with_world(game_id: impl Into<GameId>, config: GameConfig, balance: BalanceConfig, world: World) -> Self {
        let game_id = game_id.into();
        let passable_tiles = world.map.passable_count();
        let mut visibility = VisibilityTracker::new();
        visibility.update(&world, &balance);
        info!(
            game_id = %game_id,
            size = world.size(),
            preset = %world.preset,
            objects = world.objects.len(),
            "game created"
        );
        Self {
            game_id,
            config,
            balance,
            world,
            status: GameStatus::Waiting,
            paused: false,
            tick: 0,
            passable_tiles,
            joined: 0,
            registry: HandlerRegistry::with_defaults(),
            resolver: ConflictResolver::new(),
            visibility,
            last_results: BTreeMap::new(),
            last_delta: None,
            events: Vec::new(),
            failures: Vec::new(),
            final_scores: None,
        }
    }

    /// Replace the handler registry.
    #[must_use]
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the claim strength policy.
    #[must_use]
    pub fn with_claim_strength(mut self, strength: Box<dyn ClaimStrength>) -> Self {
        self.resolver = ConflictResolver::with_claim_strength(strength);
        self
    }

    /// Game id.
    #[must_use]
    pub fn id(&self) -> &GameId {
        &self.game_id
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// Whether ticking is suspended.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Last completed tick; zero before the first.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The live world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Game settings.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Balance table.
    #[must_use]
    pub const fn balance(&self) -> &BalanceConfig {
        &self.balance
    }

    /// Visible and explored sets.
    #[must_use]
    pub const fn visibility(&self) -> &VisibilityTracker {
        &self.visibility
    }

    /// Results of the last tick, by agent.
    #[must_use]
    pub const fn last_results(&self) -> &BTreeMap<AgentId, ActionResult> {
        &self.last_results
    }

    /// Operator delta of the last tick.
    #[must_use]
    pub const fn last_delta(&self) -> Option<&TickDelta> {
        self.last_delta.as_ref()
    }

    /// The last tick's delta as `agent` sees it.
    #[must_use]
    pub fn delta_for(&self, agent: &AgentId) -> Option<TickDelta> {
        let delta = self.last_delta.as_ref()?;
        let visible = self.visibility.visible(agent)?;
        Some(delta.filtered_for(agent, visible))
    }

    /// Standings fixed when the game finished.
    #[must_use]
    pub fn final_scores(&self) -> Option<&[FinalScore]> {
        self.final_scores.as_deref()
    }

    /// Current standings.
    #[must_use]
    pub fn scores(&self) -> Vec<FinalScore> {
        compute_scores(&self.world, &self.balance.scoring)
    }

    /// Take the accumulated event log.
    pub fn drain_events(&mut self) -> Vec<EventLogEntry> {
        std::mem::take(&mut self.events)
    }

    /// Take the accumulated decision failures.
    pub fn drain_failures(&mut self) -> Vec<DecisionFailure> {
        std::mem::take(&mut self.failures)
    }

    /// Add an agent at a free spawn tile.
    ///
    /// Agents may join until the game is over.
    ///
    /// # Errors
    ///
    /// Fails if the game is over or full, the id is taken, or no spawn tile is
    /// free.
    pub fn join(&mut self, spec: AgentSpec) -> Result<AgentId, EngineError> {
        if self.status.is_over() {
            return Err(EngineError::JoinClosed);
        }
        if self.world.agents.len() >= self.config.max_agents {
            return Err(EngineError::Full(self.config.max_agents));
        }
        if self.world.agents.contains_key(&spec.id) {
            return Err(EngineError::DuplicateAgent(spec.id));
        }
        let spawn = self
            .world
            .find_spawn(self.joined)
            .ok_or_else(|| EngineError::NoSpawn(spec.id.clone()))?;
        self.joined += 1;

        let agent = Agent::new(
            spec.id.clone(),
            spec.name,
            spec.controller,
            spec.strategy,
            spawn,
            &self.balance,
        );
        info!(game_id = %self.game_id, agent = %agent.id, controller = %agent.controller, %spawn, "agent joined");
        self.log(
            EventKind::AgentJoined,
            Some(agent.id.clone()),
            json!({ "name": agent.name, "at": spawn }),
        );
        self.world.agents.insert(agent.id.clone(), agent);
        self.visibility.update(&self.world, &self.balance);
        Ok(spec.id)
    }

    /// Begin ticking.
    ///
    /// # Errors
    ///
    /// Fails if the game already started or has no agents.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.status != GameStatus::Waiting {
            return Err(EngineError::AlreadyStarted);
        }
        if self.world.agents.is_empty() {
            return Err(EngineError::NoAgents);
        }
        self.status = GameStatus::Running;
        info!(game_id = %self.game_id, agents = self.world.agents.len(), "game started");
        self.log(EventKind::GameStarted, None, json!({ "agents": self.world.agents.len() }));
        Ok(())
    }

    /// Suspend scheduled ticks.
    ///
    /// # Errors
    ///
    /// Fails unless the game is running.
    pub fn pause(&mut self) -> Result<(), EngineError> {
        self.ensure_running()?;
        if !self.paused {
            self.paused = true;
            info!(game_id = %self.game_id, tick = self.tick, "game paused");
            self.log(EventKind::GamePaused, None, Value::Null);
        }
        Ok(())
    }

    /// Resume scheduled ticks.
    ///
    /// # Errors
    ///
    /// Fails unless the game is running.
    pub fn resume(&mut self) -> Result<(), EngineError> {
        self.ensure_running()?;
        if self.paused {
            self.paused = false;
            info!(game_id = %self.game_id, tick = self.tick, "game resumed");
            self.log(EventKind::GameResumed, None, Value::Null);
        }
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        match self.status {
            GameStatus::Running => Ok(()),
            other => Err(EngineError::NotRunning(other.name())),
        }
    }

    /// Run one tick, asking `source` for every live agent's intent.
    ///
    /// Ignores the pause flag.
    ///
    /// # Errors
    ///
    /// Fails if the game is not running. An engine-fatal error also marks the
    /// game `Failed` and leaves the world as it was before the tick.
    pub async fn run_tick(&mut self, source: &dyn DecisionSource) -> Result<TickDelta, EngineError> {
        self.ensure_running()?;
        let tick = self.tick + 1;

        // Phase 1: collect intents
        let contexts: Vec<DecisionContext> = self
            .world
            .live_agents()
            .map(|agent| self.decision_context(agent, tick))
            .collect();
        let deadline = Duration::from_millis(self.config.decision_timeout_ms);
        let answers = collect_decisions(source, &contexts, deadline).await;

        let mut requests = Vec::with_capacity(answers.len());
        let mut rejected = Vec::new();
        for (agent, answer) in answers {
            match answer {
                Ok(text) => match parse_intent_within(&text, self.balance.costs.max_intent_len) {
                    Ok(action) => requests.push(ActionRequest::new(agent, action, tick)),
                    Err(err) => {
                        debug!(game_id = %self.game_id, tick, agent = %agent, error = %err, "intent rejected");
                        self.log_at(
                            tick,
                            EventKind::IntentRejected,
                            Some(agent.clone()),
                            json!({ "error": err.to_string() }),
                        );
                        rejected.push(ActionResult::failed(
                            &agent,
                            ActionKind::Wait,
                            format!("intent rejected: {err}"),
                        ));
                    }
                },
                Err(error) => {
                    warn!(game_id = %self.game_id, tick, agent = %agent, %error, "decision failed, waiting");
                    self.log_at(
                        tick,
                        EventKind::DecisionFailure,
                        Some(agent.clone()),
                        json!({ "error": error.to_string() }),
                    );
                    self.failures.push(DecisionFailure {
                        tick,
                        agent: agent.clone(),
                        error,
                    });
                    requests.push(ActionRequest::wait(agent, tick));
                }
            }
        }
        self.advance(&requests, rejected)
    }

    /// Run one tick with the given actions. Live agents without one wait.
    ///
    /// # Errors
    ///
    /// Same as [`GameEngine::run_tick`].
    pub fn step(&mut self, mut actions: BTreeMap<AgentId, Action>) -> Result<TickDelta, EngineError> {
        self.ensure_running()?;
        let tick = self.tick + 1;
        let mut requests: Vec<ActionRequest> = self
            .world
            .live_agents()
            .map(|agent| {
                let action = actions.remove(&agent.id).unwrap_or(Action::Wait);
                ActionRequest::new(agent.id.clone(), action, tick)
            })
            .collect();
        requests.extend(
            actions
                .into_iter()
                .map(|(agent, action)| ActionRequest::new(agent, action, tick)),
        );
        self.advance(&requests, Vec::new())
    }

    fn advance(&mut self, requests: &[ActionRequest], mut results: Vec<ActionResult>) -> Result<TickDelta, EngineError> {
        let tick = self.tick + 1;

        // Phase 2: validate against the pre-tick world
        let view = WorldView::new(&self.world, &self.balance, tick);
        let registry = &self.registry;
        let evaluated: Vec<Result<ProposedEffect, ActionResult>> = requests
            .par_iter()
            .map(|request| {
                registry
                    .evaluate(request, &view)
                    .map_err(|reason| ActionResult::failed(&request.agent, request.action.kind(), reason))
            })
            .collect();
        let mut proposals = Vec::with_capacity(evaluated.len());
        for outcome in evaluated {
            match outcome {
                Ok(proposal) => proposals.push(proposal),
                Err(result) => results.push(result),
            }
        }

        // Phase 3: resolve
        let plan = self.resolver.resolve(&self.world, &self.balance, proposals);
        results.extend(plan.results.iter().cloned());
        results.sort_by(|a, b| a.agent.cmp(&b.agent));

        // Phase 4: apply to a scratch copy
        let mut next = self.world.clone();
        let mut applied = match apply_plan(&mut next, &plan, &self.balance, tick) {
            Ok(applied) => applied,
            Err(reason) => return Err(self.fail(EngineError::Apply { tick, reason })),
        };

        // Phase 5: timers
        advance_timers(&mut next, &self.balance, tick, &mut applied);

        // Invariants gate the swap; a broken scratch world never goes live.
        let violations = check_invariants(&next);
        if !violations.is_empty() {
            return Err(self.fail(EngineError::Invariants { tick, violations }));
        }
        self.world = next;
        self.tick = tick;

        // Phase 6: visibility
        for (agent, center, radius) in &applied.reveals {
            let tiles: Vec<Coord> = self.world.map.circle(*center, *radius).collect();
            self.visibility.reveal(agent, tiles);
        }
        self.visibility.update(&self.world, &self.balance);

        let first_event = self.events.len();
        for (kind, agent, payload) in std::mem::take(&mut applied.events) {
            self.log(kind, agent, payload);
        }
        self.check_finish();

        // Phase 7: emit the delta
        let tick_events = self.events[first_event..].to_vec();

        self.last_results = results.iter().map(|r| (r.agent.clone(), r.clone())).collect();
        let delta = self.build_delta(results, applied, tick_events);
        debug!(
            game_id = %self.game_id,
            tick,
            committed = plan.committed.len(),
            changed_tiles = delta.tiles.len(),
            "tick complete"
        );
        self.last_delta = Some(delta.clone());
        Ok(delta)
    }

    fn fail(&mut self, err: EngineError) -> EngineError {
        self.status = GameStatus::Failed;
        error!(game_id = %self.game_id, tick = self.tick, error = %err, "game failed");
        self.log_at(self.tick + 1, EventKind::GameFailed, None, json!({ "error": err.to_string() }));
        err
    }

    fn check_finish(&mut self) {
        let mut owned: BTreeMap<&AgentId, usize> = BTreeMap::new();
        for (_, owner) in self.world.map.owned() {
            *owned.entry(owner).or_default() += 1;
        }
        let leader = owned
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(id, n)| ((*id).clone(), *n));

        let fraction = self.config.domination_fraction;
        #[allow(clippy::cast_precision_loss)]
        let dominant = leader
            .as_ref()
            .filter(|(_, n)| {
                fraction > 0.0 && self.passable_tiles > 0 && *n as f64 >= fraction * self.passable_tiles as f64
            })
            .map(|(id, _)| id.clone());
        let reason = if let Some(winner) = dominant {
            json!({ "reason": "domination", "winner": winner })
        } else if self.tick >= self.config.win_after_ticks {
            json!({ "reason": "tick_limit", "leader": leader.map(|(id, _)| id) })
        } else {
            return;
        };

        self.status = GameStatus::Finished;
        let scores = self.scores();
        info!(
            game_id = %self.game_id,
            tick = self.tick,
            winner = scores.first().map_or("", |s| s.agent.as_str()),
            "game finished"
        );
        self.log(EventKind::GameFinished, None, json!({ "result": reason, "scores": scores }));
        self.final_scores = Some(scores);
    }

    fn log(&mut self, kind: EventKind, agent: Option<AgentId>, payload: Value) {
        self.log_at(self.tick, kind, agent, payload);
    }

    fn log_at(&mut self, tick: u64, kind: EventKind, agent: Option<AgentId>, payload: Value) {
        self.events.push(EventLogEntry::new(tick, kind, agent, payload));
    }

    fn decision_context(&self, agent: &Agent, tick: u64) -> DecisionContext {
        let empty = BTreeSet::new();
        let visible = self.visibility.visible(&agent.id).unwrap_or(&empty);
        DecisionContext {
            game_id: self.game_id.clone(),
            tick,
            map_size: self.world.size(),
            agent: agent.clone(),
            owned_tiles: self.world.map.count_owned(&agent.id),
            tiles: visible.iter().filter_map(|&c| self.world.map.tile(c)).collect(),
            agents: self
                .world
                .agents
                .values()
                .filter(|other| other.id != agent.id && visible.contains(&other.position))
                .map(AgentView::from)
                .collect(),
            objects: self
                .world
                .objects
                .values()
                .filter(|o| visible.contains(&o.position))
                .cloned()
                .collect(),
            last_result: self.last_results.get(&agent.id).cloned(),
            costs: self.balance.costs,
        }
    }

    fn build_delta(&self, results: Vec<ActionResult>, applied: Applied, events: Vec<EventLogEntry>) -> TickDelta {
        TickDelta {
            game_id: self.game_id.clone(),
            tick: self.tick,
            status: Some(self.status),
            results,
            tiles: applied
                .tiles
                .iter()
                .filter_map(|&c| self.world.map.tile(c))
                .collect(),
            agents: self.world.agents.values().map(AgentView::from).collect(),
            objects: applied
                .touched
                .iter()
                .filter_map(|id| self.world.objects.get(id))
                .cloned()
                .collect(),
            removed: applied.removed,
            chat: applied.chat,
            events,
        }
    }

    /// The game as `viewer` sees it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAgent`] for an agent viewer not in the game.
    pub fn snapshot(&self, viewer: &Viewer) -> Result<GameSnapshot, EngineError> {
        let world = &self.world;
        let mut snapshot = GameSnapshot {
            game_id: self.game_id.clone(),
            tick: self.tick,
            status: self.status,
            paused: self.paused,
            map_size: world.size(),
            preset: world.preset,
            tiles: Vec::new(),
            agents: Vec::new(),
            objects: Vec::new(),
            own: None,
            explored: None,
            scores: Vec::new(),
        };
        match viewer {
            Viewer::Operator => {
                snapshot.tiles = world.map.iter().filter_map(|(c, _)| world.map.tile(c)).collect();
                snapshot.agents = world.agents.values().map(AgentView::from).collect();
                snapshot.objects = world.objects.values().cloned().collect();
                snapshot.scores = self.scores();
            }
            Viewer::Agent(id) => {
                let me = world.agent(id).ok_or_else(|| EngineError::UnknownAgent(id.clone()))?;
                let empty = BTreeSet::new();
                let visible = self.visibility.visible(id).unwrap_or(&empty);
                snapshot.tiles = visible.iter().filter_map(|&c| world.map.tile(c)).collect();
                snapshot.agents = world
                    .agents
                    .values()
                    .filter(|a| a.id == *id || visible.contains(&a.position))
                    .map(AgentView::from)
                    .collect();
                snapshot.objects = world
                    .objects
                    .values()
                    .filter(|o| visible.contains(&o.position))
                    .cloned()
                    .collect();
                snapshot.own = Some(me.clone());
                snapshot.explored = self.visibility.explored(id).map(BTreeSet::len);
            }
        }
        Ok(snapshot)
    }
}
