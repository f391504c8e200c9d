//! Final standings.

use serde::{Deserialize, Serialize};

use crate::config::ScoringWeights;
use crate::world::{AgentId, World};

/// One agent's standing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalScore {
    /// Agent.
    pub agent: AgentId,
    /// Display name.
    pub name: String,
    /// Tiles owned.
    pub territory: usize,
    /// Kills credited.
    pub kills: u32,
    /// Times died.
    pub deaths: u32,
    /// Standing structures built by the agent.
    pub structures: usize,
    /// Weighted total.
    pub score: f64,
}

/// Standings for every agent, best first; ties go to the lower id.
#[must_use]
pub fn compute_scores(world: &World, weights: &ScoringWeights) -> Vec<FinalScore> {
    let mut scores: Vec<FinalScore> = world
        .agents
        .values()
        .map(|agent| {
            let territory = world.map.count_owned(&agent.id);
            let structures = world
                .objects
                .values()
                .filter(|o| o.as_structure().is_some_and(|(_, owner)| owner == Some(&agent.id)))
                .count();
            #[allow(clippy::cast_precision_loss)]
            let score = territory as f64 * weights.territory
                + f64::from(agent.kills) * weights.kill
                + structures as f64 * weights.structure;
            FinalScore {
                agent: agent.id.clone(),
                name: agent.name.clone(),
                territory,
                kills: agent.kills,
                deaths: agent.deaths,
                structures,
                score,
            }
        })
        .collect();
    scores.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.agent.cmp(&b.agent)));
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::handlers::test_support::{add_agent, world};
    use crate::world::{Coord, ObjectKind, StructureKind};

    #[test]
    fn test_weighted_and_sorted() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(1, 1));
        let b = add_agent(&mut w, "b", Coord::new(5, 5));
        w.map.set_owner(Coord::new(1, 1), a.clone());
        w.map.set_owner(Coord::new(5, 5), b.clone());
        w.map.set_owner(Coord::new(5, 6), b.clone());
        w.agent_mut(&a).unwrap().kills = 1;
        w.add_object(
            Coord::new(2, 2),
            ObjectKind::Structure {
                kind: StructureKind::Wall,
                hp: 20,
                owner: Some(b.clone()),
            },
        );
        let scores = compute_scores(&w, &ScoringWeights::default());
        assert_eq!(scores[0].agent, a);
        assert!((scores[0].score - 6.0).abs() < f64::EPSILON);
        assert_eq!(scores[1].structures, 1);
        assert!((scores[1].score - 4.0).abs() < f64::EPSILON);
    }
}
