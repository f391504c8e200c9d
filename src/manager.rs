//! Multi-game manager.
//!
//! Owns every live [`GameEngine`] behind its own async mutex and drives each
//! running game from a dedicated tokio task on the game's tick interval. A
//! game whose tick fails fatally is dropped from the registry; the others
//! keep running.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::actions::HandlerRegistry;
use crate::config::{BalanceConfig, GameConfig};
use crate::decision::DecisionSource;
use crate::engine::{AgentSpec, FinalScore, GameEngine, GameSnapshot, GameStatus, TickDelta, Viewer};
use crate::error::{EngineError, GameId, ManagerError};
use crate::world::AgentId;

/// Receives every tick delta a managed game produces.
pub trait Broadcaster: Send + Sync {
    /// Deliver `delta` for `game_id`.
    fn publish(&self, game_id: &GameId, delta: &TickDelta);
}

/// Drops every delta.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBroadcaster;

impl Broadcaster for NullBroadcaster {
    fn publish(&self, _game_id: &GameId, _delta: &TickDelta) {}
}

/// Fans deltas out over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<(GameId, TickDelta)>,
}

impl ChannelBroadcaster {
    /// Channel holding up to `capacity` undelivered deltas per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// A new receiver that sees deltas published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<(GameId, TickDelta)> {
        self.sender.subscribe()
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn publish(&self, game_id: &GameId, delta: &TickDelta) {
        // No subscribers is fine.
        let _ = self.sender.send((game_id.clone(), delta.clone()));
    }
}

/// One row of [`GameManager::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Game id.
    pub game_id: GameId,
    /// Lifecycle state.
    pub status: GameStatus,
    /// Whether ticking is suspended.
    pub paused: bool,
    /// Last completed tick.
    pub tick: u64,
    /// Agents joined.
    pub agents: usize,
}

struct GameHandle {
    engine: Arc<AsyncMutex<GameEngine>>,
    stop: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

type Registry = Mutex<HashMap<GameId, GameHandle>>;

/// Builds the action handler table for each new game.
pub type RegistryFactory = Arc<dyn Fn() -> HandlerRegistry + Send + Sync>;

/// Registry of concurrently running games.
pub struct GameManager {
    games: Arc<Registry>,
    balance: BalanceConfig,
    decisions: Arc<dyn DecisionSource>,
    broadcaster: Arc<dyn Broadcaster>,
    handlers: RegistryFactory,
}

impl fmt::Debug for GameManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let games = self.games.lock().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<&GameId> = games.keys().collect();
        ids.sort();
        f.debug_struct("GameManager").field("games", &ids).finish_non_exhaustive()
    }
}

impl GameManager {
    /// Manager whose games share `balance` and ask `decisions` for intents.
    #[must_use]
    pub fn new(balance: BalanceConfig, decisions: Arc<dyn DecisionSource>) -> Self {
        Self {
            games: Arc::new(Mutex::new(HashMap::new())),
            balance,
            decisions,
            broadcaster: Arc::new(NullBroadcaster),
            handlers: Arc::new(HandlerRegistry::with_defaults),
        }
    }

    /// Publish tick deltas to `broadcaster`.
    #[must_use]
    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn Broadcaster>) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    /// Give every game created from now on the handlers `factory` builds.
    #[must_use]
    pub fn with_registry(mut self, factory: impl Fn() -> HandlerRegistry + Send + Sync + 'static) -> Self {
        self.handlers = Arc::new(factory);
        self
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, HashMap<GameId, GameHandle>> {
        self.games.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn engine(&self, game_id: &str) -> Result<Arc<AsyncMutex<GameEngine>>, ManagerError> {
        self.registry()
            .get(game_id)
            .map(|handle| Arc::clone(&handle.engine))
            .ok_or_else(|| ManagerError::UnknownGame(game_id.to_string()))
    }

    fn engine_error(game_id: &str, source: EngineError) -> ManagerError {
        ManagerError::Engine {
            game_id: game_id.to_string(),
            source,
        }
    }

    /// Generate a world and register a waiting game.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::DuplicateGame`] if the id is taken.
    pub fn create(&self, game_id: impl Into<GameId>, config: GameConfig) -> Result<GameId, ManagerError> {
        let game_id = game_id.into();
        if self.registry().contains_key(&game_id) {
            return Err(ManagerError::DuplicateGame(game_id));
        }
        let engine =
            GameEngine::new(game_id.clone(), config, self.balance.clone()).with_registry((self.handlers)());
        let mut games = self.registry();
        if games.contains_key(&game_id) {
            return Err(ManagerError::DuplicateGame(game_id));
        }
        games.insert(
            game_id.clone(),
            GameHandle {
                engine: Arc::new(AsyncMutex::new(engine)),
                stop: None,
                task: None,
            },
        );
        Ok(game_id)
    }

    /// Add an agent to a game.
    ///
    /// # Errors
    ///
    /// Fails for an unknown game or when the engine refuses the agent.
    pub async fn join(&self, game_id: &str, spec: AgentSpec) -> Result<AgentId, ManagerError> {
        let engine = self.engine(game_id)?;
        let mut engine = engine.lock().await;
        engine.join(spec).map_err(|e| Self::engine_error(game_id, e))
    }

    /// Start a game and its ticking task.
    ///
    /// # Errors
    ///
    /// Fails for an unknown game or when the engine refuses to start.
    pub async fn start(&self, game_id: &str) -> Result<(), ManagerError> {
        let engine = self.engine(game_id)?;
        let interval = {
            let mut guard = engine.lock().await;
            guard.start().map_err(|e| Self::engine_error(game_id, e))?;
            Duration::from_millis(guard.config().tick_interval_ms.max(1))
        };

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(tick_loop(TickLoop {
            game_id: game_id.to_string(),
            engine,
            decisions: Arc::clone(&self.decisions),
            broadcaster: Arc::clone(&self.broadcaster),
            games: Arc::downgrade(&self.games),
            stop: stop_rx,
            interval,
        }));
        if let Some(handle) = self.registry().get_mut(game_id) {
            handle.stop = Some(stop_tx);
            handle.task = Some(task);
        } else {
            task.abort();
        }
        Ok(())
    }

    /// Suspend scheduled ticks.
    ///
    /// # Errors
    ///
    /// Fails for an unknown game or one that is not running.
    pub async fn pause(&self, game_id: &str) -> Result<(), ManagerError> {
        let engine = self.engine(game_id)?;
        let mut engine = engine.lock().await;
        engine.pause().map_err(|e| Self::engine_error(game_id, e))
    }

    /// Resume scheduled ticks.
    ///
    /// # Errors
    ///
    /// Fails for an unknown game or one that is not running.
    pub async fn resume(&self, game_id: &str) -> Result<(), ManagerError> {
        let engine = self.engine(game_id)?;
        let mut engine = engine.lock().await;
        engine.resume().map_err(|e| Self::engine_error(game_id, e))
    }

    /// Run one tick now, paused or not.
    ///
    /// # Errors
    ///
    /// Fails for an unknown game or a rejected tick. A fatal tick also removes
    /// the game.
    pub async fn force_tick(&self, game_id: &str) -> Result<TickDelta, ManagerError> {
        let engine = self.engine(game_id)?;
        let mut guard = engine.lock().await;
        match guard.run_tick(self.decisions.as_ref()).await {
            Ok(delta) => {
                self.broadcaster.publish(&game_id.to_string(), &delta);
                Ok(delta)
            }
            Err(err) => {
                if err.is_fatal() {
                    drop(guard);
                    self.discard(game_id);
                }
                Err(Self::engine_error(game_id, err))
            }
        }
    }

    fn discard(&self, game_id: &str) {
        if let Some(mut handle) = self.registry().remove(game_id) {
            if let Some(stop) = handle.stop.take() {
                let _ = stop.send(true);
            }
            warn!(game_id, "failed game removed");
        }
    }

    /// Stop a game and forget it. A tick already in progress completes first.
    ///
    /// Returns the standings at the moment it stopped.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownGame`] if no such game is registered.
    pub async fn stop(&self, game_id: &str) -> Result<Vec<FinalScore>, ManagerError> {
        let mut handle = self
            .registry()
            .remove(game_id)
            .ok_or_else(|| ManagerError::UnknownGame(game_id.to_string()))?;
        if let Some(stop) = handle.stop.take() {
            let _ = stop.send(true);
        }
        if let Some(task) = handle.task.take()
            && let Err(err) = task.await
        {
            warn!(game_id, error = %err, "tick task ended abnormally");
        }
        let engine = handle.engine.lock().await;
        info!(game_id, tick = engine.tick(), "game stopped");
        Ok(engine
            .final_scores()
            .map_or_else(|| engine.scores(), <[FinalScore]>::to_vec))
    }

    /// Wait until a started game finishes or fails, then return its standings.
    ///
    /// A failed game has already been removed when this returns.
    ///
    /// # Errors
    ///
    /// Fails for an unknown game or one that ended `Failed`.
    pub async fn wait(&self, game_id: &str) -> Result<Vec<FinalScore>, ManagerError> {
        let (engine, task) = {
            let mut games = self.registry();
            let handle = games
                .get_mut(game_id)
                .ok_or_else(|| ManagerError::UnknownGame(game_id.to_string()))?;
            (Arc::clone(&handle.engine), handle.task.take())
        };
        if let Some(task) = task
            && let Err(err) = task.await
        {
            warn!(game_id, error = %err, "tick task ended abnormally");
        }
        let engine = engine.lock().await;
        match engine.status() {
            GameStatus::Failed => Err(ManagerError::Engine {
                game_id: game_id.to_string(),
                source: EngineError::NotRunning(GameStatus::Failed.name()),
            }),
            _ => Ok(engine
                .final_scores()
                .map_or_else(|| engine.scores(), <[FinalScore]>::to_vec)),
        }
    }

    /// Every registered game, ordered by id.
    pub async fn list(&self) -> Vec<GameSummary> {
        let engines: Vec<Arc<AsyncMutex<GameEngine>>> =
            self.registry().values().map(|h| Arc::clone(&h.engine)).collect();
        let mut summaries = Vec::with_capacity(engines.len());
        for engine in engines {
            let engine = engine.lock().await;
            summaries.push(GameSummary {
                game_id: engine.id().clone(),
                status: engine.status(),
                paused: engine.is_paused(),
                tick: engine.tick(),
                agents: engine.world().agents.len(),
            });
        }
        summaries.sort_by(|a, b| a.game_id.cmp(&b.game_id));
        summaries
    }

    /// A game as `viewer` sees it.
    ///
    /// # Errors
    ///
    /// Fails for an unknown game or an unknown agent viewer.
    pub async fn snapshot(&self, game_id: &str, viewer: &Viewer) -> Result<GameSnapshot, ManagerError> {
        let engine = self.engine(game_id)?;
        let engine = engine.lock().await;
        engine.snapshot(viewer).map_err(|e| Self::engine_error(game_id, e))
    }
}

struct TickLoop {
    game_id: GameId,
    engine: Arc<AsyncMutex<GameEngine>>,
    decisions: Arc<dyn DecisionSource>,
    broadcaster: Arc<dyn Broadcaster>,
    games: Weak<Registry>,
    stop: watch::Receiver<bool>,
    interval: Duration,
}

async fn tick_loop(mut run: TickLoop) {
    let mut interval = tokio::time::interval(run.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately.
    interval.tick().await;
    debug!(game_id = %run.game_id, interval = ?run.interval, "tick task started");

    loop {
        tokio::select! {
            biased;
            changed = run.stop.changed() => {
                if changed.is_err() || *run.stop.borrow() {
                    break;
                }
                continue;
            }
            _ = interval.tick() => {}
        }

        let mut engine = run.engine.lock().await;
        if engine.status().is_over() {
            break;
        }
        if engine.is_paused() {
            continue;
        }
        match engine.run_tick(run.decisions.as_ref()).await {
            Ok(delta) => {
                run.broadcaster.publish(&run.game_id, &delta);
                if engine.status().is_over() {
                    info!(game_id = %run.game_id, tick = engine.tick(), status = %engine.status(), "tick task finished");
                    break;
                }
            }
            Err(err) if err.is_fatal() => {
                error!(game_id = %run.game_id, error = %err, "removing failed game");
                drop(engine);
                if let Some(games) = run.games.upgrade() {
                    games.lock().unwrap_or_else(PoisonError::into_inner).remove(&run.game_id);
                }
                break;
            }
            Err(err) => {
                warn!(game_id = %run.game_id, error = %err, "tick rejected, stopping");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::IdleDecisions;

    fn manager() -> GameManager {
        GameManager::new(BalanceConfig::default(), Arc::new(IdleDecisions))
    }

    fn small_config(seed: u64) -> GameConfig {
        GameConfig {
            seed,
            map_size: Some("small".to_string()),
            ..GameConfig::default()
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let manager = manager();
        manager.create("g1", small_config(1)).unwrap();
        assert!(matches!(
            manager.create("g1", small_config(1)),
            Err(ManagerError::DuplicateGame(_))
        ));
        assert!(matches!(
            manager.join("nope", AgentSpec::adversary("a", "x")).await,
            Err(ManagerError::UnknownGame(_))
        ));
    }

    #[tokio::test]
    async fn test_force_tick_publishes() {
        let broadcaster = ChannelBroadcaster::new(8);
        let mut rx = broadcaster.subscribe();
        let manager = manager().with_broadcaster(Arc::new(broadcaster));
        manager.create("g", small_config(2)).unwrap();
        manager.join("g", AgentSpec::adversary("a", "x")).await.unwrap();
        manager.start("g").await.unwrap();
        manager.pause("g").await.unwrap();
        let delta = manager.force_tick("g").await.unwrap();
        let (game, published) = rx.recv().await.unwrap();
        assert_eq!(game, "g");
        assert_eq!(published.tick, delta.tick);
        manager.stop("g").await.unwrap();
        assert!(manager.list().await.is_empty());
    }
}
