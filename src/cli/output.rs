//! Output formatting utilities for CLI.

// Averages over game counts.
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;

use fogline::engine::FinalScore;
use serde::Serialize;

/// JSON-serializable game result.
#[derive(Debug, Serialize)]
pub(super) struct JsonGameResult<'a> {
    /// Random seed used.
    pub(super) seed: u64,
    /// Final lifecycle state.
    pub(super) status: &'a str,
    /// Ticks played.
    pub(super) ticks: u64,
    /// Standings, best first.
    pub(super) scores: &'a [FinalScore],
}

/// Format one game's standings as human-readable text.
pub(super) fn format_text(seed: u64, ticks: u64, status: &str, scores: &[FinalScore]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Game Result (seed: {seed})\n"));
    match scores.first() {
        Some(best) => output.push_str(&format!("  Leader: {} ({})\n", best.name, best.agent)),
        None => output.push_str("  Leader: none\n"),
    }
    output.push_str(&format!("  Ticks: {ticks} ({status})\n\n"));

    for (rank, score) in scores.iter().enumerate() {
        output.push_str(&format!(
            "  #{} {}: {:.0} points ({} tiles, {} kills, {} deaths, {} structures)\n",
            rank + 1,
            score.agent,
            score.score,
            score.territory,
            score.kills,
            score.deaths,
            score.structures
        ));
    }

    output
}

/// Batch statistics aggregated per agent id.
#[derive(Debug, Default)]
pub(super) struct BatchStats {
    /// Games that finished.
    pub(super) games_played: u64,
    /// Games that failed or were cut short.
    pub(super) games_failed: u64,
    /// Per-agent tallies.
    agents: BTreeMap<String, AgentTally>,
}

#[derive(Debug, Default, Clone, Copy)]
struct AgentTally {
    wins: u64,
    total_score: f64,
    total_territory: u64,
    total_kills: u64,
}

impl BatchStats {
    /// Add one game's standings.
    pub(super) fn add_result(&mut self, scores: &[FinalScore]) {
        self.games_played += 1;
        for (rank, score) in scores.iter().enumerate() {
            let tally = self.agents.entry(score.agent.to_string()).or_default();
            if rank == 0 {
                tally.wins += 1;
            }
            tally.total_score += score.score;
            tally.total_territory += score.territory as u64;
            tally.total_kills += u64::from(score.kills);
        }
    }

    /// Count a game that produced no standings.
    pub(super) fn add_failure(&mut self) {
        self.games_failed += 1;
    }

    fn per_game(&self, total: f64) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        total / self.games_played as f64
    }

    /// Per-agent rows for display.
    pub(super) fn rows(&self) -> Vec<JsonBatchAgent> {
        self.agents
            .iter()
            .map(|(agent, tally)| JsonBatchAgent {
                agent: agent.clone(),
                wins: tally.wins,
                win_rate: self.per_game(tally.wins as f64),
                avg_score: self.per_game(tally.total_score),
                avg_territory: self.per_game(tally.total_territory as f64),
                avg_kills: self.per_game(tally.total_kills as f64),
            })
            .collect()
    }
}

/// JSON-serializable batch result.
#[derive(Debug, Serialize)]
pub(super) struct JsonBatchResult {
    /// Games that finished.
    pub(super) games_played: u64,
    /// Games that failed.
    pub(super) games_failed: u64,
    /// Per-agent statistics.
    pub(super) agents: Vec<JsonBatchAgent>,
}

/// JSON-serializable per-agent batch stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonBatchAgent {
    /// Agent id.
    agent: String,
    /// Games led at the end.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Average score.
    avg_score: f64,
    /// Average tiles owned at the end.
    avg_territory: f64,
    /// Average kills.
    avg_kills: f64,
}

/// Format batch statistics as human-readable text.
pub(super) fn format_batch_text(stats: &BatchStats) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Batch Results ({} games, {} failed)\n\n",
        stats.games_played, stats.games_failed
    ));
    output.push_str(&format!(
        "  {:<10} {:>6} {:>8} {:>10} {:>10} {:>8}\n",
        "Agent", "Wins", "Win%", "Avg Score", "Avg Tiles", "Kills"
    ));
    for row in stats.rows() {
        output.push_str(&format!(
            "  {:<10} {:>6} {:>7.1}% {:>10.1} {:>10.1} {:>8.2}\n",
            row.agent,
            row.wins,
            row.win_rate * 100.0,
            row.avg_score,
            row.avg_territory,
            row.avg_kills
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use fogline::world::AgentId;

    fn score(agent: &str, points: f64, territory: usize) -> FinalScore {
        FinalScore {
            agent: AgentId::new(agent),
            name: agent.to_string(),
            territory,
            kills: 1,
            deaths: 0,
            structures: 0,
            score: points,
        }
    }

    #[test]
    fn test_batch_stats_average() {
        let mut stats = BatchStats::default();
        stats.add_result(&[score("bot-1", 10.0, 10), score("bot-2", 4.0, 4)]);
        stats.add_result(&[score("bot-2", 8.0, 8), score("bot-1", 6.0, 6)]);
        stats.add_failure();
        let rows = stats.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].wins, 1);
        assert!((rows[0].avg_score - 8.0).abs() < f64::EPSILON);
        assert!((rows[1].win_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.games_failed, 1);
    }

    #[test]
    fn test_format_text_lists_ranks() {
        let text = format_text(7, 100, "finished", &[score("bot-1", 12.0, 12)]);
        assert!(text.contains("seed: 7"));
        assert!(text.contains("#1 bot-1"));
    }
}
