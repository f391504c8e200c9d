//! Generation presets and map sizes.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::world::Biome;

/// Supported square map sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapSize {
    /// 128 x 128.
    Small,
    /// 256 x 256.
    Medium,
    /// 512 x 512.
    Large,
    /// 1024 x 1024.
    Huge,
    /// 2048 x 2048.
    Colossal,
    /// 4096 x 4096.
    Titan,
}

impl MapSize {
    /// All sizes, smallest first.
    pub const ALL: [MapSize; 6] = [
        MapSize::Small,
        MapSize::Medium,
        MapSize::Large,
        MapSize::Huge,
        MapSize::Colossal,
        MapSize::Titan,
    ];

    /// Side length in tiles.
    #[must_use]
    pub const fn side(self) -> u16 {
        match self {
            MapSize::Small => 128,
            MapSize::Medium => 256,
            MapSize::Large => 512,
            MapSize::Huge => 1024,
            MapSize::Colossal => 2048,
            MapSize::Titan => 4096,
        }
    }

    /// Lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            MapSize::Small => "small",
            MapSize::Medium => "medium",
            MapSize::Large => "large",
            MapSize::Huge => "huge",
            MapSize::Colossal => "colossal",
            MapSize::Titan => "titan",
        }
    }

    /// Parse a size name or side length.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|size| size.name() == text || size.side().to_string() == text)
    }

    /// Parse a size, falling back to [`MapSize::Medium`] with a warning.
    #[must_use]
    pub fn parse_or_default(text: &str) -> Self {
        Self::parse(text).unwrap_or_else(|| {
            warn!(requested = text, fallback = "medium", "unknown map size");
            MapSize::Medium
        })
    }
}

impl fmt::Display for MapSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}x{})", self.name(), self.side(), self.side())
    }
}

/// World generation themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapPreset {
    /// Temperate mix of every biome.
    #[default]
    Default,
    /// Hot and dry: volcanic ranges and badlands.
    InfernalRealms,
    /// Cold: ice sheets, tundra and crystal fields.
    FrozenWastes,
    /// Wet: forest, jungle and swamp.
    VerdantWilds,
    /// High sea level: scattered islands.
    Archipelago,
}

impl MapPreset {
    /// All presets.
    pub const ALL: [MapPreset; 5] = [
        MapPreset::Default,
        MapPreset::InfernalRealms,
        MapPreset::FrozenWastes,
        MapPreset::VerdantWilds,
        MapPreset::Archipelago,
    ];

    /// Snake-case name used in configs and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            MapPreset::Default => "default",
            MapPreset::InfernalRealms => "infernal_realms",
            MapPreset::FrozenWastes => "frozen_wastes",
            MapPreset::VerdantWilds => "verdant_wilds",
            MapPreset::Archipelago => "archipelago",
        }
    }

    /// Parse a preset name (`-` and `_` are interchangeable).
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|preset| preset.name() == text)
    }

    /// Parse a preset, falling back to [`MapPreset::Default`] with a warning.
    #[must_use]
    pub fn parse_or_default(text: &str) -> Self {
        Self::parse(text).unwrap_or_else(|| {
            warn!(requested = text, fallback = "default", "unknown map preset");
            MapPreset::Default
        })
    }

    /// Size used when none is requested.
    #[must_use]
    pub const fn recommended_size(self) -> MapSize {
        match self {
            MapPreset::Default | MapPreset::VerdantWilds => MapSize::Medium,
            MapPreset::InfernalRealms | MapPreset::FrozenWastes | MapPreset::Archipelago => {
                MapSize::Large
            }
        }
    }

    /// Probability that an eligible tile gets a resource node.
    #[must_use]
    pub const fn resource_density(self) -> f64 {
        match self {
            MapPreset::Default | MapPreset::Archipelago => 0.02,
            MapPreset::InfernalRealms => 0.015,
            MapPreset::FrozenWastes => 0.012,
            MapPreset::VerdantWilds => 0.03,
        }
    }

    /// Scale applied to neutral hazards.
    #[must_use]
    pub const fn difficulty_multiplier(self) -> f64 {
        match self {
            MapPreset::Default | MapPreset::Archipelago => 1.0,
            MapPreset::InfernalRealms => 1.5,
            MapPreset::FrozenWastes => 1.25,
            MapPreset::VerdantWilds => 0.75,
        }
    }

    /// Elevation below which tiles are ocean.
    #[must_use]
    pub const fn water_level(self) -> f64 {
        match self {
            MapPreset::Archipelago => 0.52,
            MapPreset::InfernalRealms => 0.28,
            MapPreset::Default | MapPreset::FrozenWastes | MapPreset::VerdantWilds => 0.36,
        }
    }

    /// Elevation above which tiles are impassable high ground.
    #[must_use]
    pub const fn mountain_level(self) -> f64 {
        match self {
            MapPreset::Archipelago => 0.74,
            MapPreset::InfernalRealms => 0.64,
            MapPreset::Default | MapPreset::FrozenWastes | MapPreset::VerdantWilds => 0.68,
        }
    }

    /// Shift applied to the heat field before classification.
    const fn heat_bias(self) -> f64 {
        match self {
            MapPreset::InfernalRealms => 0.35,
            MapPreset::FrozenWastes => -0.35,
            _ => 0.0,
        }
    }

    /// Shift applied to the moisture field before classification.
    const fn moisture_bias(self) -> f64 {
        match self {
            MapPreset::VerdantWilds => 0.3,
            MapPreset::InfernalRealms => -0.2,
            _ => 0.0,
        }
    }

    /// Classify a tile from its three noise samples.
    #[must_use]
    pub fn biome(self, elevation: f64, moisture: f64, heat: f64) -> Biome {
        let water = self.water_level();
        let mountain = self.mountain_level();
        let heat = (heat + self.heat_bias()).clamp(0.0, 1.0);
        let moisture = (moisture + self.moisture_bias()).clamp(0.0, 1.0);

        if elevation < water {
            return Biome::Ocean;
        }
        if elevation >= mountain {
            return if heat > 0.75 {
                Biome::Volcanic
            } else {
                Biome::Mountain
            };
        }
        if elevation < water + 0.025 {
            return if heat < 0.2 { Biome::Ice } else { Biome::Beach };
        }

        match self {
            MapPreset::InfernalRealms if heat > 0.92 => Biome::Volcanic,
            MapPreset::FrozenWastes if heat < 0.3 => cold_biome(moisture, true),
            _ if heat < 0.3 => cold_biome(moisture, false),
            _ if heat < 0.62 => temperate_biome(moisture),
            _ => hot_biome(moisture),
        }
    }
}

impl fmt::Display for MapPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn cold_biome(moisture: f64, crystal_rich: bool) -> Biome {
    let crystal_band = if crystal_rich { 0.35..0.6 } else { 0.46..0.52 };
    if crystal_band.contains(&moisture) {
        Biome::Crystal
    } else if moisture >= 0.6 {
        Biome::Ice
    } else {
        Biome::Tundra
    }
}

fn temperate_biome(moisture: f64) -> Biome {
    if moisture < 0.38 {
        Biome::Grassland
    } else if moisture < 0.66 {
        Biome::Forest
    } else {
        Biome::Swamp
    }
}

fn hot_biome(moisture: f64) -> Biome {
    if moisture < 0.15 {
        Biome::Badlands
    } else if moisture < 0.35 {
        Biome::Desert
    } else if moisture < 0.58 {
        Biome::Savanna
    } else {
        Biome::Jungle
    }
}
