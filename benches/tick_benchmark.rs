//! Benchmarks for the tick pipeline.
//!
//! Runs full ticks (decisions, validation, resolution, apply, visibility) with
//! roaming adversaries on a small map.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use fogline::config::{BalanceConfig, GameConfig};
use fogline::decision::RoamingDecisions;
use fogline::engine::{AgentSpec, GameEngine};

fn started_engine(agents: usize) -> GameEngine {
    let config = GameConfig {
        seed: 42,
        map_size: Some("small".to_string()),
        win_after_ticks: u64::MAX,
        max_agents: agents,
        ..GameConfig::default()
    };
    let mut engine = GameEngine::new("bench", config, BalanceConfig::default());
    for i in 0..agents {
        engine
            .join(AgentSpec::adversary(format!("bot-{i}").as_str(), "roaming"))
            .unwrap();
    }
    engine.start().unwrap();
    engine
}

fn bench_ticks(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let decisions = RoamingDecisions::new(42);

    for agents in [4usize, 16] {
        c.bench_function(&format!("10_ticks_{agents}_agents"), |b| {
            b.iter_batched(
                || started_engine(agents),
                |mut engine| {
                    runtime.block_on(async {
                        for _ in 0..10 {
                            black_box(engine.run_tick(&decisions).await.unwrap());
                        }
                    });
                    engine
                },
                BatchSize::SmallInput,
            );
        });
    }
}

criterion_group!(benches, bench_ticks);
criterion_main!(benches);
