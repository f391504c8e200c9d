#![no_main]

use std::collections::BTreeSet;

use arbitrary::Arbitrary;
use fogline::actions::{Action, ActionRequest, Effect, HandlerRegistry, WorldView};
use fogline::config::BalanceConfig;
use fogline::mapgen::MapPreset;
use fogline::resolver::ConflictResolver;
use fogline::world::{Agent, AgentId, Biome, Cell, Controller, Coord, Direction, Map, Terrain, World};
use libfuzzer_sys::fuzz_target;

const SIDE: u16 = 8;

/// One agent and what it tries this tick.
#[derive(Arbitrary, Debug)]
struct Actor {
    x: u8,
    y: u8,
    energy: u8,
    intent: Intent,
}

#[derive(Arbitrary, Debug)]
enum Intent {
    Move { heading: u8, distance: u8 },
    Claim { dx: i8, dy: i8 },
    Fight { victim: u8 },
    Wait,
}

fn direction(heading: u8) -> Direction {
    Direction::ALL[usize::from(heading) % Direction::ALL.len()]
}

fuzz_target!(|actors: Vec<Actor>| {
    if actors.len() > 12 {
        return;
    }
    let balance = BalanceConfig::default();
    let map = Map::from_fn(SIDE, |c| {
        if (c.x + c.y) % 7 == 3 {
            Cell::new(Terrain::Mountain, Biome::Mountain)
        } else {
            Cell::new(Terrain::Plains, Biome::Grassland)
        }
    });
    let mut world = World::new(0, MapPreset::Default, map);

    let mut placed = Vec::new();
    for (i, actor) in actors.iter().enumerate() {
        let at = Coord::new(u16::from(actor.x) % SIDE, u16::from(actor.y) % SIDE);
        if !world.is_open(at) {
            continue;
        }
        let id = AgentId::new(format!("agent-{i:02}"));
        let mut agent = Agent::new(
            id.clone(),
            id.as_str(),
            Controller::Adversary {
                profile: "fuzz".to_string(),
            },
            "",
            at,
            &balance,
        );
        agent.energy = u32::from(actor.energy).min(agent.max_energy);
        world.agents.insert(id.clone(), agent);
        placed.push((id, actor));
    }
    let ids: Vec<AgentId> = placed.iter().map(|(id, _)| id.clone()).collect();

    let requests: Vec<ActionRequest> = placed
        .iter()
        .map(|(id, actor)| {
            let action = match &actor.intent {
                Intent::Move { heading, distance } => Action::Move {
                    direction: direction(*heading),
                    distance: u16::from(*distance % 4),
                },
                Intent::Claim { dx, dy } => {
                    let from = world.agent(id).map_or(Coord::new(0, 0), |a| a.position);
                    let x = (i32::from(from.x) + i32::from(*dx % 3)).clamp(0, i32::from(SIDE) - 1);
                    let y = (i32::from(from.y) + i32::from(*dy % 3)).clamp(0, i32::from(SIDE) - 1);
                    Action::Claim {
                        target: Some(Coord::new(x as u16, y as u16)),
                    }
                }
                Intent::Fight { victim } if !ids.is_empty() => Action::Fight {
                    target: fogline::actions::FightTarget::Agent(ids[usize::from(*victim) % ids.len()].clone()),
                },
                _ => Action::Wait,
            };
            ActionRequest::new(id.clone(), action, 1)
        })
        .collect();

    let registry = HandlerRegistry::with_defaults();
    let view = WorldView::new(&world, &balance, 1);
    let proposals: Vec<_> = requests
        .iter()
        .filter_map(|request| registry.evaluate(request, &view).ok())
        .collect();
    let proposed = proposals.len();

    let plan = ConflictResolver::new().resolve(&world, &balance, proposals);

    // One result per proposal and no two movers on one tile.
    assert_eq!(plan.results.len(), proposed);
    let mut destinations = BTreeSet::new();
    let mut claimed = BTreeSet::new();
    for committed in &plan.committed {
        let agent = world.agent(&committed.agent).expect("committed agent exists");
        assert!(committed.energy_cost <= agent.energy);
        match &committed.effect {
            Effect::MoveAgent { to, .. } => assert!(destinations.insert(*to), "two movers reach {to}"),
            Effect::ClaimTile { tile, .. } => assert!(claimed.insert(*tile), "two claims commit on {tile}"),
            _ => {}
        }
    }
});
