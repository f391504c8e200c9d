//! Deterministic world generation.
//!
//! Terrain comes from three independently seeded noise fields (elevation,
//! moisture, heat) classified through the preset's palette. Objects are then
//! scattered from a separate `ChaCha8` stream, so changing placement density
//! never changes the terrain of a seed.

// Object counts are derived from tile counts and probabilities.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

mod noise;
mod preset;

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

pub use noise::ValueNoise;
pub use preset::{MapPreset, MapSize};

use crate::world::{
    Biome, Cell, Coord, InteractiveKind, ItemKind, ItemStack, Map, ObjectId, ObjectKind,
    ResourceKind, StructureKind, World, WorldObject,
};

const ELEVATION_STREAM: u64 = 0x454c_4556;
const MOISTURE_STREAM: u64 = 0x4d4f_4953;
const HEAT_STREAM: u64 = 0x4845_4154;
const OBJECT_STREAM: u64 = 0x4f42_4a45_4354_5300;

/// Interactive landmarks per passable tile.
const INTERACTIVE_DENSITY: f64 = 0.000_4;
/// Neutral traps per passable tile at difficulty 1.0.
const TRAP_DENSITY: f64 = 0.000_6;

const OBELISK_MESSAGES: [&str; 6] = [
    "The old borders were drawn in ash.",
    "Whoever holds the centre sees the edges.",
    "Portals remember both their ends.",
    "Walls outlast the hands that raised them.",
    "Crystal sings where the cold is deepest.",
    "Nothing here was ever truly unclaimed.",
];

/// Tunable generation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenOptions {
    /// Probability that an eligible tile gets a resource node.
    pub resource_density: f64,
    /// Scale for neutral hazards.
    pub difficulty_multiplier: f64,
    /// Hit points of generated neutral traps.
    pub trap_hp: u32,
}

impl GenOptions {
    /// The preset's own parameters.
    #[must_use]
    pub const fn for_preset(preset: MapPreset) -> Self {
        Self {
            resource_density: preset.resource_density(),
            difficulty_multiplier: preset.difficulty_multiplier(),
            trap_hp: 5,
        }
    }
}

/// Generate a world with the preset's default parameters.
#[must_use]
pub fn generate(seed: u64, size: MapSize, preset: MapPreset) -> World {
    generate_with(seed, size, preset, GenOptions::for_preset(preset))
}

/// Generate a world with explicit parameters.
///
/// Identical arguments always produce an identical tile grid and identical
/// object placement.
#[must_use]
pub fn generate_with(seed: u64, size: MapSize, preset: MapPreset, options: GenOptions) -> World {
    let map = generate_terrain(seed, size.side(), preset);
    let mut world = World::new(seed, preset, map);
    place_objects(&mut world, options);
    debug!(
        seed,
        size = size.side(),
        preset = preset.name(),
        objects = world.objects.len(),
        "world generated"
    );
    world
}

/// Build the tile grid.
#[must_use]
pub fn generate_terrain(seed: u64, side: u16, preset: MapPreset) -> Map {
    let elevation = ValueNoise::new(seed ^ ELEVATION_STREAM, 5, 1.0 / 48.0);
    let moisture = ValueNoise::new(seed ^ MOISTURE_STREAM, 4, 1.0 / 96.0);
    let heat = ValueNoise::new(seed ^ HEAT_STREAM, 3, 1.0 / 128.0);

    Map::from_fn(side, |coord| {
        let (x, y) = (f64::from(coord.x), f64::from(coord.y));
        let biome = preset.biome(
            elevation.sample(x, y),
            moisture.sample(x, y),
            heat.sample(x, y),
        );
        Cell::new(biome.land_terrain(), biome)
    })
}

/// Radius of the object-free zone around the map centre.
#[must_use]
pub fn spawn_safe_radius(side: u16) -> u32 {
    (u32::from(side) / 16).max(4)
}

/// Resource a tile of this biome yields, if any.
fn resource_for(biome: Biome, rng: &mut ChaCha8Rng) -> Option<ResourceKind> {
    let resource = match biome {
        Biome::Forest | Biome::Jungle => ResourceKind::Wood,
        Biome::Swamp => {
            if rng.gen_bool(0.5) {
                ResourceKind::Wood
            } else {
                ResourceKind::Food
            }
        }
        Biome::Grassland | Biome::Savanna | Biome::Beach => ResourceKind::Food,
        Biome::Desert | Biome::Tundra => {
            if rng.gen_bool(0.3) {
                ResourceKind::Ore
            } else {
                ResourceKind::Stone
            }
        }
        Biome::Badlands => ResourceKind::Ore,
        Biome::Crystal | Biome::Ice => ResourceKind::Crystal,
        Biome::Ocean | Biome::Mountain | Biome::Volcanic => return None,
    };
    Some(resource)
}

fn cache_item(rng: &mut ChaCha8Rng) -> ItemStack {
    match rng.gen_range(0..6) {
        0 => ItemStack::new(ItemKind::Weapon { bonus: rng.gen_range(1..=2) }, 1),
        1 => ItemStack::new(ItemKind::Armor { reduction: 1 }, 1),
        2 => ItemStack::new(ItemKind::Trinket { regen: 1 }, 1),
        3 => ItemStack::new(ItemKind::Potion { heal: 5 }, 2),
        _ => {
            let resource = ResourceKind::ALL[rng.gen_range(0..ResourceKind::ALL.len())];
            ItemStack::new(ItemKind::material(resource), rng.gen_range(3..=6))
        }
    }
}

fn place_objects(world: &mut World, options: GenOptions) {
    let mut rng = ChaCha8Rng::seed_from_u64(world.seed ^ OBJECT_STREAM);
    let side = world.size();
    let center = Coord::new(side / 2, side / 2);
    let safe_sq = spawn_safe_radius(side).pow(2);

    let mut free: Vec<Coord> = world
        .map
        .iter()
        .filter(|(coord, cell)| cell.terrain.is_passable() && coord.distance_sq(center) > safe_sq)
        .map(|(coord, _)| coord)
        .collect();
    let passable = free.len() as f64;
    let mut used = BTreeSet::new();

    // Resource nodes, one pass in row-major order.
    let density = options.resource_density.clamp(0.0, 1.0);
    for &coord in &free {
        if !rng.gen_bool(density) {
            continue;
        }
        let Some(cell) = world.map.cell(coord) else {
            continue;
        };
        if let Some(resource) = resource_for(cell.biome, &mut rng) {
            let remaining = rng.gen_range(3..=12);
            world.add_object(coord, ObjectKind::Resource { resource, remaining });
            used.insert(coord);
        }
    }

    free.retain(|c| !used.contains(c));
    free.shuffle(&mut rng);
    let mut free = free.into_iter();

    let interactives = ((passable * INTERACTIVE_DENSITY).round() as usize).max(4);
    let mut placed = 0;
    while placed < interactives {
        let kind = match placed % 4 {
            0 => InteractiveKind::Shrine,
            1 => InteractiveKind::Cache,
            2 => InteractiveKind::Obelisk,
            _ => InteractiveKind::Portal,
        };
        if kind == InteractiveKind::Portal {
            let (Some(a), Some(b)) = (free.next(), free.next()) else {
                break;
            };
            place_portal_pair(world, a, b);
        } else {
            let Some(coord) = free.next() else {
                break;
            };
            let (message, item) = match kind {
                InteractiveKind::Cache => (None, Some(cache_item(&mut rng))),
                InteractiveKind::Obelisk => {
                    let text = OBELISK_MESSAGES[rng.gen_range(0..OBELISK_MESSAGES.len())];
                    (Some(text.to_string()), None)
                }
                _ => (None, None),
            };
            world.add_object(
                coord,
                ObjectKind::Interactive {
                    kind,
                    activated: false,
                    message,
                    link: None,
                    item,
                },
            );
        }
        placed += 1;
    }

    let difficulty = options.difficulty_multiplier.max(0.0);
    let traps = (passable * TRAP_DENSITY * difficulty).round() as usize;
    for coord in free.take(traps) {
        world.add_object(
            coord,
            ObjectKind::Structure {
                kind: StructureKind::Trap,
                hp: options.trap_hp.max(1),
                owner: None,
            },
        );
    }
}

fn place_portal_pair(world: &mut World, a: Coord, b: Coord) {
    let first = world.peek_object_id();
    let second = ObjectId(first.0 + 1);
    for (coord, link) in [(a, second), (b, first)] {
        world.insert_object(|id| {
            WorldObject::new(
                id,
                coord,
                ObjectKind::Interactive {
                    kind: InteractiveKind::Portal,
                    activated: false,
                    message: None,
                    link: Some(link),
                    item: None,
                },
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate(42, MapSize::Small, MapPreset::Default);
        let b = generate(42, MapSize::Small, MapPreset::Default);
        assert_eq!(a.map.cells(), b.map.cells());
        assert_eq!(a.objects, b.objects);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate(1, MapSize::Small, MapPreset::Default);
        let b = generate(2, MapSize::Small, MapPreset::Default);
        assert_ne!(a.map.cells(), b.map.cells());
    }

    #[test]
    fn test_terrain_follows_biome() {
        let world = generate(9, MapSize::Small, MapPreset::Archipelago);
        for (_, cell) in world.map.iter() {
            assert_eq!(cell.terrain, cell.biome.land_terrain());
        }
    }

    #[test]
    fn test_density_does_not_change_terrain() {
        let sparse = GenOptions {
            resource_density: 0.0,
            ..GenOptions::for_preset(MapPreset::Default)
        };
        let a = generate_with(5, MapSize::Small, MapPreset::Default, sparse);
        let b = generate(5, MapSize::Small, MapPreset::Default);
        assert_eq!(a.map.cells(), b.map.cells());
        assert!(
            !a.objects
                .values()
                .any(|o| matches!(o.kind, ObjectKind::Resource { .. }))
        );
    }

    #[test]
    fn test_safe_zone_is_clear() {
        let world = generate(11, MapSize::Small, MapPreset::VerdantWilds);
        let center = Coord::new(64, 64);
        let safe_sq = spawn_safe_radius(128).pow(2);
        for object in world.objects.values() {
            assert!(object.position.distance_sq(center) > safe_sq);
        }
    }

    #[test]
    fn test_objects_on_passable_distinct_tiles() {
        let world = generate(3, MapSize::Small, MapPreset::Default);
        let mut seen = BTreeSet::new();
        for object in world.objects.values() {
            assert!(world.map.is_passable(object.position));
            assert!(seen.insert(object.position), "two objects on {}", object.position);
        }
    }

    #[test]
    fn test_portals_are_linked_pairs() {
        let world = generate(8, MapSize::Small, MapPreset::Default);
        let mut portals = 0;
        for object in world.objects.values() {
            if let ObjectKind::Interactive {
                kind: InteractiveKind::Portal,
                link,
                ..
            } = &object.kind
            {
                portals += 1;
                let target = world.objects.get(&link.unwrap()).unwrap();
                match &target.kind {
                    ObjectKind::Interactive { link: back, .. } => assert_eq!(*back, Some(object.id)),
                    other => panic!("portal linked to {other:?}"),
                }
            }
        }
        assert!(portals >= 2);
    }

    #[test]
    fn test_difficulty_scales_traps() {
        let count_traps = |difficulty: f64| {
            let options = GenOptions {
                difficulty_multiplier: difficulty,
                ..GenOptions::for_preset(MapPreset::Default)
            };
            generate_with(4, MapSize::Small, MapPreset::Default, options)
                .objects
                .values()
                .filter(|o| o.is_structure())
                .count()
        };
        assert_eq!(count_traps(0.0), 0);
        assert!(count_traps(3.0) > count_traps(1.0));
    }
}
