//! Map command implementation.

// Percentages over tile counts.
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;

use super::CliError;
use fogline::mapgen::{self, MapPreset, MapSize, spawn_safe_radius};
use fogline::world::{Biome, Coord, ObjectKind, World};

/// Execute the map command.
///
/// # Errors
///
/// Returns an error if the preview width is zero.
pub(crate) fn execute(seed: u64, preset: &str, size: Option<&str>, preview: Option<u16>) -> Result<(), CliError> {
    let preset = MapPreset::parse_or_default(preset);
    let size = size.map_or_else(|| preset.recommended_size(), MapSize::parse_or_default);
    if preview == Some(0) {
        return Err(CliError::new("preview width must be at least 1"));
    }

    let world = mapgen::generate(seed, size, preset);
    print!("{}", summarize(&world, size));
    if let Some(width) = preview {
        println!();
        print!("{}", render_preview(&world, width));
    }
    Ok(())
}

fn object_category(kind: &ObjectKind) -> String {
    match kind {
        ObjectKind::Structure { kind, .. } => format!("{kind:?}").to_lowercase(),
        ObjectKind::Resource { resource, .. } => format!("{} node", resource.name()),
        ObjectKind::Interactive { kind, .. } => format!("{kind:?}").to_lowercase(),
        ObjectKind::DroppedItem { .. } => "dropped item".to_string(),
    }
}

fn summarize(world: &World, size: MapSize) -> String {
    let side = world.size();
    let total = usize::from(side) * usize::from(side);
    let mut biomes = [0usize; Biome::COUNT];
    for (_, cell) in world.map.iter() {
        biomes[cell.biome as usize] += 1;
    }
    let mut objects: BTreeMap<String, usize> = BTreeMap::new();
    for object in world.objects.values() {
        *objects.entry(object_category(&object.kind)).or_default() += 1;
    }

    let mut output = String::new();
    output.push_str(&format!("Map (seed: {}, preset: {}, size: {size})\n", world.seed, world.preset));
    output.push_str(&format!(
        "  Passable: {} of {total} tiles ({:.1}%)\n",
        world.map.passable_count(),
        world.map.passable_count() as f64 * 100.0 / total as f64
    ));
    output.push_str(&format!("  Spawn safe radius: {}\n\n", spawn_safe_radius(side)));

    output.push_str("  Biomes:\n");
    for biome in Biome::ALL {
        let count = biomes[biome as usize];
        if count > 0 {
            output.push_str(&format!(
                "    {} {:<10} {:>9} ({:.1}%)\n",
                biome.glyph(),
                format!("{biome:?}").to_lowercase(),
                count,
                count as f64 * 100.0 / total as f64
            ));
        }
    }

    output.push_str("\n  Objects:\n");
    for (category, count) in &objects {
        output.push_str(&format!("    {category:<16} {count:>7}\n"));
    }
    output
}

/// Downsample the map to `width` columns, one biome glyph per sampled tile.
fn render_preview(world: &World, width: u16) -> String {
    let side = world.size();
    let width = width.min(side).max(1);
    let step = side.div_ceil(width);
    let mut output = String::new();
    for y in (0..side).step_by(usize::from(step)) {
        for x in (0..side).step_by(usize::from(step)) {
            let glyph = world.map.cell(Coord::new(x, y)).map_or(' ', |c| c.biome.glyph());
            output.push(glyph);
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_dimensions() {
        let world = mapgen::generate(3, MapSize::Small, MapPreset::Default);
        let preview = render_preview(&world, 32);
        let lines: Vec<&str> = preview.lines().collect();
        assert_eq!(lines.len(), 32);
        assert!(lines.iter().all(|l| l.chars().count() == 32));
    }

    #[test]
    fn test_summary_mentions_preset() {
        let world = mapgen::generate(3, MapSize::Small, MapPreset::FrozenWastes);
        let summary = summarize(&world, MapSize::Small);
        assert!(summary.contains("Biomes:"));
        assert!(summary.contains(&world.preset.to_string()));
    }
}
