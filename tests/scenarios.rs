//! End-to-end tick scenarios on hand-built worlds.
//!
//! Run with: cargo test scenarios

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use fogline::actions::{Action, ActionHandler, ActionKind, Effect, FightTarget, HandlerRegistry, Proposal, WorldView};
use fogline::config::{BalanceConfig, GameConfig};
use fogline::engine::{EventKind, GameEngine, GameStatus, Viewer};
use fogline::error::EngineError;
use fogline::mapgen::MapPreset;
use fogline::world::{
    Agent, AgentId, Biome, Cell, Controller, Coord, Direction, ItemKind, ItemStack, Map, Terrain, World,
};

/// Open 20x20 plains.
fn open_world() -> World {
    let map = Map::from_fn(20, |_| Cell::new(Terrain::Plains, Biome::Grassland));
    World::new(7, MapPreset::Default, map)
}

fn place(world: &mut World, id: &str, at: Coord, balance: &BalanceConfig) -> AgentId {
    let agent = Agent::new(
        AgentId::new(id),
        id,
        Controller::Adversary {
            profile: "scenario".to_string(),
        },
        "",
        at,
        balance,
    );
    world.agents.insert(agent.id.clone(), agent);
    AgentId::new(id)
}

fn started(world: World, balance: BalanceConfig) -> GameEngine {
    let mut engine = GameEngine::with_world("scenario", GameConfig::default(), balance, world);
    engine.start().unwrap();
    engine
}

fn actions(list: Vec<(&AgentId, Action)>) -> BTreeMap<AgentId, Action> {
    list.into_iter().map(|(id, action)| (id.clone(), action)).collect()
}

#[test]
fn test_move_contest_goes_to_lower_id() {
    let balance = BalanceConfig::default();
    let mut world = open_world();
    let a = place(&mut world, "a", Coord::new(2, 3), &balance);
    let b = place(&mut world, "b", Coord::new(4, 3), &balance);
    let mut engine = started(world, balance);

    let delta = engine
        .step(actions(vec![
            (&a, Action::Move { direction: Direction::East, distance: 1 }),
            (&b, Action::Move { direction: Direction::West, distance: 1 }),
        ]))
        .unwrap();

    let world = engine.world();
    assert_eq!(world.agent(&a).unwrap().position, Coord::new(3, 3));
    assert_eq!(world.agent(&b).unwrap().position, Coord::new(4, 3));
    let loser = delta.results.iter().find(|r| r.agent == b).unwrap();
    assert!(!loser.success);
    assert!(loser.message.contains("tile occupied"), "{}", loser.message);

    // The loser paid nothing.
    let starting = engine.balance().agent.starting_energy;
    let regen = engine.balance().agent.energy_regen;
    assert_eq!(world.agent(&b).unwrap().energy, starting + regen);
    assert_eq!(world.agent(&a).unwrap().energy, starting - 1 + regen);
}

#[test]
fn test_simultaneous_hits_both_land() {
    let mut balance = BalanceConfig::default();
    balance.combat.base_damage = 1;
    balance.combat.min_damage = 1;
    let mut world = open_world();
    let a = place(&mut world, "a", Coord::new(4, 5), &balance);
    let b = place(&mut world, "b", Coord::new(6, 5), &balance);
    let c = place(&mut world, "c", Coord::new(5, 5), &balance);
    world.agent_mut(&c).unwrap().hp = 3;
    let mut engine = started(world, balance);

    let delta = engine
        .step(actions(vec![
            (&a, Action::Fight { target: FightTarget::Agent(c.clone()) }),
            (&b, Action::Fight { target: FightTarget::Agent(c.clone()) }),
        ]))
        .unwrap();

    assert!(delta.results.iter().filter(|r| r.kind == ActionKind::Fight).all(|r| r.success));
    let victim = engine.world().agent(&c).unwrap();
    assert!(victim.alive);
    assert_eq!(victim.hp, 1);
}

#[test]
fn test_vision_radius_three_covers_29_tiles() {
    let balance = BalanceConfig::default();
    assert_eq!(balance.agent.vision_radius, 3);
    let mut world = open_world();
    let a = place(&mut world, "a", Coord::new(10, 10), &balance);
    let engine = started(world, balance);

    let snapshot = engine.snapshot(&Viewer::Agent(a.clone())).unwrap();
    assert_eq!(snapshot.tiles.len(), 29);
    assert_eq!(snapshot.explored, Some(29));
    assert!(engine.visibility().can_see(&a, Coord::new(13, 10)));
    assert!(!engine.visibility().can_see(&a, Coord::new(13, 11)));
}

#[test]
fn test_claiming_own_tile_is_idempotent() {
    let balance = BalanceConfig::default();
    let mut world = open_world();
    let a = place(&mut world, "a", Coord::new(8, 8), &balance);
    world.map.set_owner(Coord::new(8, 8), a.clone());
    let mut engine = started(world, balance);
    let before = engine.world().agent(&a).unwrap().energy;

    for _ in 0..2 {
        let delta = engine
            .step(actions(vec![(&a, Action::Claim { target: None })]))
            .unwrap();
        assert!(delta.results[0].success);
        assert!(delta.tiles.is_empty());
    }

    let world = engine.world();
    assert_eq!(world.map.owner(Coord::new(8, 8)), Some(&a));
    assert_eq!(world.map.count_owned(&a), 1);
    let regen = engine.balance().agent.energy_regen;
    assert_eq!(world.agent(&a).unwrap().energy, before + 2 * regen);
}

#[test]
fn test_kill_spills_inventory_and_respawns() {
    let mut balance = BalanceConfig::default();
    balance.agent.respawn_ticks = 2;
    let mut world = open_world();
    let a = place(&mut world, "a", Coord::new(4, 5), &balance);
    let c = place(&mut world, "c", Coord::new(5, 5), &balance);
    let victim = world.agent_mut(&c).unwrap();
    victim.hp = 1;
    let limits = victim.inventory_limits(&balance);
    let leftover = victim
        .inventory
        .add(ItemStack::new(ItemKind::Potion { heal: 3 }, 2), limits);
    assert_eq!(leftover, 0);
    let mut engine = started(world, balance);

    engine
        .step(actions(vec![(&a, Action::Fight { target: FightTarget::Agent(c.clone()) })]))
        .unwrap();
    let world = engine.world();
    assert!(!world.agent(&c).unwrap().alive);
    assert_eq!(world.agent(&a).unwrap().kills, 1);
    assert!(world.objects_at(Coord::new(5, 5)).next().is_some());

    engine.step(BTreeMap::new()).unwrap();
    engine.step(BTreeMap::new()).unwrap();
    let victim = engine.world().agent(&c).unwrap();
    assert!(victim.alive);
    assert_eq!(victim.position, Coord::new(5, 5));
    assert_eq!(engine.status(), GameStatus::Running);
}

fn finished_reason(engine: &mut GameEngine) -> Option<String> {
    engine
        .drain_events()
        .into_iter()
        .find(|e| e.kind == EventKind::GameFinished)
        .and_then(|e| e.payload["result"]["reason"].as_str().map(str::to_string))
}

/// 20x20 world where `a` already owns `owned` tiles and stands on an unowned one.
fn nearly_dominated(owned: usize, config: GameConfig) -> (GameEngine, AgentId) {
    let balance = BalanceConfig::default();
    let mut world = open_world();
    let a = place(&mut world, "a", Coord::new(19, 19), &balance);
    for i in 0..owned {
        let i = u16::try_from(i).unwrap();
        world.map.set_owner(Coord::new(i % 20, i / 20), a.clone());
    }
    let mut engine = GameEngine::with_world("domination", config, balance, world);
    engine.start().unwrap();
    (engine, a)
}

#[test]
fn test_domination_ends_game_early() {
    let config = GameConfig {
        domination_fraction: 0.5,
        win_after_ticks: 10,
        ..GameConfig::default()
    };
    let (mut engine, a) = nearly_dominated(199, config);

    engine
        .step(actions(vec![(&a, Action::Claim { target: None })]))
        .unwrap();

    assert_eq!(engine.world().map.count_owned(&a), 200);
    assert_eq!(engine.status(), GameStatus::Finished);
    assert_eq!(engine.tick(), 1);
    assert_eq!(finished_reason(&mut engine).as_deref(), Some("domination"));
    assert_eq!(engine.final_scores().unwrap()[0].agent, a);
}

#[test]
fn test_one_tile_short_of_domination_keeps_running() {
    let config = GameConfig {
        domination_fraction: 0.5,
        win_after_ticks: 10,
        ..GameConfig::default()
    };
    let (mut engine, a) = nearly_dominated(198, config);

    engine
        .step(actions(vec![(&a, Action::Claim { target: None })]))
        .unwrap();

    assert_eq!(engine.status(), GameStatus::Running);
    assert_eq!(finished_reason(&mut engine), None);
}

#[test]
fn test_domination_outranks_tick_limit() {
    let config = GameConfig {
        domination_fraction: 0.5,
        win_after_ticks: 1,
        ..GameConfig::default()
    };
    let (mut engine, a) = nearly_dominated(199, config);

    engine
        .step(actions(vec![(&a, Action::Claim { target: None })]))
        .unwrap();

    assert_eq!(engine.status(), GameStatus::Finished);
    assert_eq!(finished_reason(&mut engine).as_deref(), Some("domination"));
}

/// WAIT that walks the agent one tile west regardless of terrain.
#[derive(Debug)]
struct SinkingWait;

impl ActionHandler for SinkingWait {
    fn kind(&self) -> ActionKind {
        ActionKind::Wait
    }

    fn propose(&self, _action: &Action, _view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        let to = Coord::new(agent.position.x - 1, agent.position.y);
        Ok(Proposal::free(Effect::MoveAgent {
            from: agent.position,
            to,
            portal: None,
        }))
    }
}

#[test]
fn test_broken_tick_rolls_back_and_fails_game() {
    let balance = BalanceConfig::default();
    let map = Map::from_fn(20, |c| {
        if c.x == 0 {
            Cell::new(Terrain::Water, Biome::Ocean)
        } else {
            Cell::new(Terrain::Plains, Biome::Grassland)
        }
    });
    let mut world = World::new(7, MapPreset::Default, map);
    let a = place(&mut world, "a", Coord::new(1, 4), &balance);
    let mut registry = HandlerRegistry::with_defaults();
    registry.register(Box::new(SinkingWait));
    let mut engine = started(world, balance).with_registry(registry);
    let before = engine.world().agent(&a).unwrap().clone();

    let err = engine.step(BTreeMap::new()).unwrap_err();

    assert!(matches!(err, EngineError::Invariants { tick: 1, .. }), "{err}");
    assert!(err.is_fatal());
    assert_eq!(engine.status(), GameStatus::Failed);
    assert_eq!(engine.tick(), 0);
    assert_eq!(engine.world().agent(&a).unwrap(), &before);
    let events = engine.drain_events();
    assert!(events.iter().any(|e| e.kind == EventKind::GameFailed));
    assert!(matches!(engine.step(BTreeMap::new()), Err(EngineError::NotRunning("failed"))));
}
