//! Batch command implementation.

use std::sync::Arc;
use std::time::Instant;

use super::output::{BatchStats, JsonBatchResult, format_batch_text};
use super::{CliError, OutputFormat, Setup, agent_ids, runtime};
use fogline::decision::RoamingDecisions;
use fogline::engine::AgentSpec;
use fogline::manager::GameManager;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

/// Execute the batch command.
///
/// # Errors
///
/// Returns an error if a game cannot be created or started.
pub(crate) fn execute(setup: Setup, games: u64, format: OutputFormat, progress: bool) -> Result<(), CliError> {
    if games == 0 {
        return Err(CliError::new("at least one game is required"));
    }
    let Setup {
        config,
        balance,
        agents,
    } = setup;
    let base_seed = config.seed;

    if format == OutputFormat::Text {
        println!("Running {games} games from seed {base_seed}...");
        println!("Agents per game: {agents}");
        println!();
    }

    let bar = progress.then(|| {
        let bar = ProgressBar::new(games);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar
    });

    let start = Instant::now();
    let stats = runtime()?.block_on(async {
        let manager = GameManager::new(balance, Arc::new(RoamingDecisions::new(base_seed)));
        let mut ids = Vec::new();
        for i in 0..games {
            let mut config = config.clone();
            config.seed = base_seed.wrapping_add(i);
            config.tick_interval_ms = 1;
            let id = manager.create(format!("batch-{i}"), config)?;
            for agent in agent_ids(agents) {
                manager.join(&id, AgentSpec::adversary(agent.as_str(), "roaming")).await?;
            }
            manager.start(&id).await?;
            ids.push(id);
        }

        let mut stats = BatchStats::default();
        let manager = &manager;
        let mut pending: FuturesUnordered<_> = ids
            .iter()
            .map(|id| async move { (id, manager.wait(id).await) })
            .collect();
        while let Some((id, outcome)) = pending.next().await {
            match outcome {
                Ok(scores) => stats.add_result(&scores),
                Err(err) => {
                    warn!(game_id = %id, error = %err, "game did not finish");
                    stats.add_failure();
                }
            }
            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }
        Ok::<BatchStats, CliError>(stats)
    })?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let elapsed = start.elapsed();

    match format {
        OutputFormat::Text => {
            print!("{}", format_batch_text(&stats));
            println!();
            println!("Completed in {:.2}s", elapsed.as_secs_f64());
        }
        OutputFormat::Json => {
            let result = JsonBatchResult {
                games_played: stats.games_played,
                games_failed: stats.games_failed,
                agents: stats.rows(),
            };
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
