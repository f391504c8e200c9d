//! The world: map, agents and objects of one game instance.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::mapgen::MapPreset;
use crate::world::{Agent, AgentId, Coord, Map, ObjectId, ObjectKind, WorldObject};

/// Salt separating the spawn stream from terrain and object streams.
const SPAWN_STREAM: u64 = 0x5350_4157_4e00_0000;

/// Random spawn probes before falling back to a scan.
const SPAWN_ATTEMPTS: u32 = 512;

/// Complete mutable state of one world.
#[derive(Debug, Clone)]
pub struct World {
    /// Generation seed.
    pub seed: u64,
    /// Generation preset.
    pub preset: MapPreset,
    /// Tile grid.
    pub map: Map,
    /// Agents keyed (and therefore ordered) by id.
    pub agents: BTreeMap<AgentId, Agent>,
    /// Objects keyed by id.
    pub objects: BTreeMap<ObjectId, WorldObject>,
    /// Next id to hand out.
    next_object_id: u64,
}

impl World {
    /// Create a world with no agents or objects.
    #[must_use]
    pub fn new(seed: u64, preset: MapPreset, map: Map) -> Self {
        Self {
            seed,
            preset,
            map,
            agents: BTreeMap::new(),
            objects: BTreeMap::new(),
            next_object_id: 1,
        }
    }

    /// Side length of the map.
    #[must_use]
    pub const fn size(&self) -> u16 {
        self.map.size()
    }

    /// The id the next created object will get.
    #[must_use]
    pub const fn peek_object_id(&self) -> ObjectId {
        ObjectId(self.next_object_id)
    }

    /// Create an object and return its id.
    pub fn add_object(&mut self, position: Coord, kind: ObjectKind) -> ObjectId {
        self.insert_object(|id| WorldObject::new(id, position, kind))
    }

    /// Create an object from a builder that receives the fresh id.
    pub fn insert_object(&mut self, build: impl FnOnce(ObjectId) -> WorldObject) -> ObjectId {
        let id = ObjectId(self.next_object_id);
        self.next_object_id += 1;
        self.objects.insert(id, build(id));
        id
    }

    /// Remove an object.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<WorldObject> {
        self.objects.remove(&id)
    }

    /// Objects on one tile, in id order.
    pub fn objects_at(&self, coord: Coord) -> impl Iterator<Item = &WorldObject> {
        self.objects.values().filter(move |o| o.position == coord)
    }

    /// The structure on a tile, if any.
    #[must_use]
    pub fn structure_at(&self, coord: Coord) -> Option<&WorldObject> {
        self.objects_at(coord).find(|o| o.is_structure())
    }

    /// Look up an agent.
    #[must_use]
    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Look up an agent mutably.
    pub fn agent_mut(&mut self, id: &AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    /// Living agents in id order.
    pub fn live_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values().filter(|a| a.alive)
    }

    /// The living agent standing on a tile.
    #[must_use]
    pub fn agent_at(&self, coord: Coord) -> Option<&Agent> {
        self.live_agents().find(|a| a.position == coord)
    }

    /// Whether `agent` may stand on `coord` (terrain and walls; ignores other agents).
    #[must_use]
    pub fn is_walkable_for(&self, coord: Coord, agent: &AgentId) -> bool {
        self.map.is_passable(coord) && !self.objects_at(coord).any(|o| o.blocks(agent))
    }

    /// Whether a tile is passable, unoccupied and free of structures.
    #[must_use]
    pub fn is_open(&self, coord: Coord) -> bool {
        self.map.is_passable(coord)
            && self.agent_at(coord).is_none()
            && self.structure_at(coord).is_none()
    }

    /// Pick a deterministic open tile for the `index`-th spawn.
    ///
    /// Probes random tiles from a seed-derived stream, then falls back to a
    /// scan outward from the centre. Returns `None` only on a full map.
    #[must_use]
    pub fn find_spawn(&self, index: u64) -> Option<Coord> {
        let size = self.size();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ SPAWN_STREAM ^ index);
        for _ in 0..SPAWN_ATTEMPTS {
            let coord = Coord::new(rng.gen_range(0..size), rng.gen_range(0..size));
            if self.is_open(coord) {
                return Some(coord);
            }
        }
        let center = Coord::new(size / 2, size / 2);
        let mut candidates: Vec<Coord> = self
            .map
            .iter()
            .map(|(coord, _)| coord)
            .filter(|&coord| self.is_open(coord))
            .collect();
        candidates.sort_by_key(|c| (c.distance_sq(center), *c));
        candidates.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BalanceConfig;
    use crate::world::{Biome, Cell, Controller, StructureKind, Terrain};

    fn world(size: u16) -> World {
        let map = Map::filled(size, Cell::new(Terrain::Plains, Biome::Grassland)).unwrap();
        World::new(7, MapPreset::Default, map)
    }

    fn add_agent(world: &mut World, id: &str, at: Coord) {
        let agent = Agent::new(
            AgentId::new(id),
            id,
            Controller::Adversary {
                profile: "test".to_string(),
            },
            "",
            at,
            &BalanceConfig::default(),
        );
        world.agents.insert(agent.id.clone(), agent);
    }

    #[test]
    fn test_object_ids_are_sequential() {
        let mut world = world(8);
        let kind = ObjectKind::Structure {
            kind: StructureKind::Wall,
            hp: 1,
            owner: None,
        };
        let a = world.add_object(Coord::new(1, 1), kind.clone());
        let b = world.add_object(Coord::new(2, 2), kind);
        assert_eq!(a, ObjectId(1));
        assert_eq!(b, ObjectId(2));
        world.remove_object(a);
        assert_eq!(world.peek_object_id(), ObjectId(3));
    }

    #[test]
    fn test_walls_block_non_owners() {
        let mut world = world(8);
        world.add_object(
            Coord::new(3, 3),
            ObjectKind::Structure {
                kind: StructureKind::Wall,
                hp: 10,
                owner: Some(AgentId::new("a")),
            },
        );
        assert!(world.is_walkable_for(Coord::new(3, 3), &AgentId::new("a")));
        assert!(!world.is_walkable_for(Coord::new(3, 3), &AgentId::new("b")));
        assert!(!world.is_open(Coord::new(3, 3)));
    }

    #[test]
    fn test_find_spawn_is_deterministic_and_open() {
        let mut world = world(16);
        add_agent(&mut world, "a", Coord::new(0, 0));
        let first = world.find_spawn(1).unwrap();
        assert_eq!(world.find_spawn(1), Some(first));
        assert!(world.is_open(first));
    }

    #[test]
    fn test_find_spawn_full_map() {
        let mut world = world(2);
        for (i, coord) in [(0, 0), (1, 0), (0, 1), (1, 1)].iter().enumerate() {
            add_agent(&mut world, &format!("a{i}"), Coord::new(coord.0, coord.1));
        }
        assert_eq!(world.find_spawn(0), None);
    }

    #[test]
    fn test_agent_at_ignores_dead() {
        let mut world = world(4);
        add_agent(&mut world, "a", Coord::new(1, 1));
        assert!(world.agent_at(Coord::new(1, 1)).is_some());
        world.agent_mut(&AgentId::new("a")).unwrap().kill(3);
        assert!(world.agent_at(Coord::new(1, 1)).is_none());
    }
}
