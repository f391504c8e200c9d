//! Fog of war.
//!
//! Each agent sees a filled circle around itself plus a circle around each
//! beacon it owns. SCAN and obelisks add a reveal that lasts one tick. The
//! explored set of an agent only ever grows.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::BalanceConfig;
use crate::world::{Agent, AgentId, Coord, Map, World, WorldObject};

/// Tiles `agent` can see this tick, ignoring one-tick reveals.
///
/// Dead agents see nothing.
#[must_use]
pub fn compute_visible<'a>(
    agent: &Agent,
    objects: impl IntoIterator<Item = &'a WorldObject>,
    base_radius: u32,
    beacon_bonus: u32,
    map: &Map,
) -> BTreeSet<Coord> {
    if !agent.alive {
        return BTreeSet::new();
    }
    let mut visible: BTreeSet<Coord> = map.circle(agent.position, agent.vision_radius(base_radius)).collect();
    for beacon in objects.into_iter().filter(|o| o.is_beacon_of(&agent.id)) {
        visible.extend(map.circle(beacon.position, beacon_bonus));
    }
    visible
}

/// Per-agent visible and explored sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityTracker {
    visible: BTreeMap<AgentId, BTreeSet<Coord>>,
    explored: BTreeMap<AgentId, BTreeSet<Coord>>,
    #[serde(skip)]
    reveals: BTreeMap<AgentId, BTreeSet<Coord>>,
}

impl VisibilityTracker {
    /// Empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-tick reveal for `agent`, applied by the next [`update`](Self::update).
    pub fn reveal(&mut self, agent: &AgentId, tiles: impl IntoIterator<Item = Coord>) {
        self.reveals.entry(agent.clone()).or_default().extend(tiles);
    }

    /// Recompute every agent's visible set and grow the explored sets.
    ///
    /// Returns how many tiles each agent explored for the first time.
    pub fn update(&mut self, world: &World, balance: &BalanceConfig) -> BTreeMap<AgentId, usize> {
        let mut reveals = std::mem::take(&mut self.reveals);
        let mut discovered = BTreeMap::new();
        for agent in world.agents.values() {
            let mut visible = compute_visible(
                agent,
                world.objects.values(),
                balance.agent.vision_radius,
                balance.combat.beacon_vision_bonus,
                &world.map,
            );
            if let Some(extra) = reveals.remove(&agent.id) {
                visible.extend(extra);
            }
            let explored = self.explored.entry(agent.id.clone()).or_default();
            let before = explored.len();
            explored.extend(visible.iter().copied());
            if explored.len() > before {
                discovered.insert(agent.id.clone(), explored.len() - before);
            }
            self.visible.insert(agent.id.clone(), visible);
        }
        discovered
    }

    /// Tiles `agent` sees this tick.
    #[must_use]
    pub fn visible(&self, agent: &AgentId) -> Option<&BTreeSet<Coord>> {
        self.visible.get(agent)
    }

    /// Tiles `agent` has ever seen.
    #[must_use]
    pub fn explored(&self, agent: &AgentId) -> Option<&BTreeSet<Coord>> {
        self.explored.get(agent)
    }

    /// Whether `agent` sees `coord` this tick.
    #[must_use]
    pub fn can_see(&self, agent: &AgentId, coord: Coord) -> bool {
        self.visible.get(agent).is_some_and(|v| v.contains(&coord))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::handlers::test_support::{add_agent, world};
    use crate::world::{ObjectKind, StructureKind};

    #[test]
    fn test_radius_three_circle() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(10, 10));
        let balance = BalanceConfig::default();
        let visible = compute_visible(w.agent(&a).unwrap(), w.objects.values(), 3, 4, &w.map);
        assert_eq!(visible.len(), 29);
        assert!(visible.contains(&Coord::new(13, 10)));
        assert!(!visible.contains(&Coord::new(13, 11)));
        assert_eq!(balance.agent.vision_radius, 3);
    }

    #[test]
    fn test_clipped_at_edge() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(0, 1));
        let visible = compute_visible(w.agent(&a).unwrap(), w.objects.values(), 1, 0, &w.map);
        assert_eq!(visible.len(), 4);
    }

    #[test]
    fn test_beacon_extends_vision() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(2, 2));
        w.add_object(
            Coord::new(12, 12),
            ObjectKind::Structure {
                kind: StructureKind::Beacon,
                hp: 10,
                owner: Some(a.clone()),
            },
        );
        let visible = compute_visible(w.agent(&a).unwrap(), w.objects.values(), 1, 2, &w.map);
        assert!(visible.contains(&Coord::new(12, 14)));
        assert!(!visible.contains(&Coord::new(8, 8)));
    }

    #[test]
    fn test_dead_agent_sees_nothing() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(5, 5));
        w.agent_mut(&a).unwrap().kill(3);
        assert!(compute_visible(w.agent(&a).unwrap(), w.objects.values(), 3, 4, &w.map).is_empty());
    }

    #[test]
    fn test_explored_grows_and_reveal_lasts_one_tick() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(2, 2));
        let balance = BalanceConfig::default();
        let mut tracker = VisibilityTracker::new();

        tracker.update(&w, &balance);
        let first = tracker.explored(&a).unwrap().len();

        tracker.reveal(&a, [Coord::new(14, 14)]);
        tracker.update(&w, &balance);
        assert!(tracker.can_see(&a, Coord::new(14, 14)));

        w.agent_mut(&a).unwrap().position = Coord::new(8, 8);
        let discovered = tracker.update(&w, &balance);
        assert!(!tracker.can_see(&a, Coord::new(14, 14)));
        assert!(tracker.explored(&a).unwrap().contains(&Coord::new(14, 14)));
        assert!(tracker.explored(&a).unwrap().len() > first);
        assert!(discovered.get(&a).copied().unwrap_or(0) > 0);
    }
}
