#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use fogline::actions::parse_intent;
use fogline::config::{BalanceConfig, GameConfig};
use fogline::engine::{AgentSpec, GameEngine, GameStatus};
use fogline::world::AgentId;
use fogline::world::invariants::check_invariants;
use libfuzzer_sys::fuzz_target;

/// A short game: seed plus raw intent text per agent per tick.
#[derive(Arbitrary, Debug)]
struct TickInput {
    seed: u64,
    agents: u8,
    ticks: Vec<Vec<String>>,
}

fuzz_target!(|input: TickInput| {
    let agents = usize::from(input.agents % 4) + 1;
    if input.ticks.len() > 16 {
        return;
    }
    let config = GameConfig {
        seed: input.seed,
        map_size: Some("small".to_string()),
        win_after_ticks: 1_000,
        ..GameConfig::default()
    };
    let mut engine = GameEngine::new("fuzz", config, BalanceConfig::default());
    let ids: Vec<AgentId> = (0..agents).map(|i| AgentId::new(format!("a{i}"))).collect();
    for id in &ids {
        if engine.join(AgentSpec::adversary(id.clone(), "fuzz")).is_err() {
            return;
        }
    }
    engine.start().expect("agents joined");

    for texts in &input.ticks {
        let actions: BTreeMap<_, _> = ids
            .iter()
            .zip(texts)
            .filter_map(|(id, text)| parse_intent(text).ok().map(|action| (id.clone(), action)))
            .collect();
        let delta = engine.step(actions).expect("tick succeeds");
        assert_eq!(delta.tick, engine.tick());
        assert_eq!(engine.status(), GameStatus::Running);
        assert!(check_invariants(engine.world()).is_empty());
    }
});
