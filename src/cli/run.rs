//! Run command implementation.

use super::output::{JsonGameResult, format_text};
use super::{CliError, OutputFormat, Setup, agent_ids, runtime};
use fogline::decision::RoamingDecisions;
use fogline::engine::{AgentSpec, FinalScore, GameEngine};
use indicatif::{ProgressBar, ProgressStyle};

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the game cannot be set up or fails mid-run.
pub(crate) fn execute(setup: Setup, format: OutputFormat, progress: bool, quiet: bool) -> Result<(), CliError> {
    let Setup {
        config,
        balance,
        agents,
    } = setup;
    let seed = config.seed;
    let tick_limit = config.win_after_ticks;

    if !quiet {
        println!("Running game with seed {seed}...");
        println!("Map: {} / {}", config.resolved_preset(), config.resolved_size());
        println!("Agents: {agents}");
        println!();
    }

    let mut engine = GameEngine::new(format!("run-{seed}"), config, balance);
    for id in agent_ids(agents) {
        engine.join(AgentSpec::adversary(id.as_str(), "roaming"))?;
    }
    engine.start()?;

    let bar = progress.then(|| {
        let bar = ProgressBar::new(tick_limit);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ticks ({per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar
    });

    let decisions = RoamingDecisions::new(seed);
    runtime()?.block_on(async {
        while !engine.status().is_over() {
            engine.run_tick(&decisions).await?;
            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }
        Ok::<(), CliError>(())
    })?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let scores = engine
        .final_scores()
        .map_or_else(|| engine.scores(), <[FinalScore]>::to_vec);
    let status = engine.status().name();

    match format {
        OutputFormat::Text => {
            print!("{}", format_text(seed, engine.tick(), status, &scores));
        }
        OutputFormat::Json => {
            let result = JsonGameResult {
                seed,
                status,
                ticks: engine.tick(),
                scores: &scores,
            };
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
