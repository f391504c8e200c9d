//! Material costs for building and crafting.

use serde::{Deserialize, Serialize};

use crate::world::{ItemKind, ItemStack, ResourceKind, StructureKind};

/// Materials consumed by PLACE.
#[must_use]
pub const fn structure_materials(kind: StructureKind) -> &'static [(ResourceKind, u32)] {
    match kind {
        StructureKind::Wall => &[(ResourceKind::Stone, 3)],
        StructureKind::Beacon => &[(ResourceKind::Crystal, 2), (ResourceKind::Wood, 2)],
        StructureKind::Trap => &[(ResourceKind::Wood, 2), (ResourceKind::Ore, 1)],
    }
}

/// Things CRAFT can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CraftRecipe {
    /// +2 damage weapon.
    Sword,
    /// 1 damage reduction.
    Armor,
    /// +1 energy per tick.
    Trinket,
    /// Heals 5 hp.
    Potion,
}

impl CraftRecipe {
    /// All recipes.
    pub const ALL: [CraftRecipe; 4] = [
        CraftRecipe::Sword,
        CraftRecipe::Armor,
        CraftRecipe::Trinket,
        CraftRecipe::Potion,
    ];

    /// Lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CraftRecipe::Sword => "sword",
            CraftRecipe::Armor => "armor",
            CraftRecipe::Trinket => "trinket",
            CraftRecipe::Potion => "potion",
        }
    }

    /// Parse a recipe name. `weapon` is accepted for the sword.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "sword" | "weapon" => Some(CraftRecipe::Sword),
            "armor" | "armour" => Some(CraftRecipe::Armor),
            "trinket" => Some(CraftRecipe::Trinket),
            "potion" => Some(CraftRecipe::Potion),
            _ => None,
        }
    }

    /// Materials consumed.
    #[must_use]
    pub const fn materials(self) -> &'static [(ResourceKind, u32)] {
        match self {
            CraftRecipe::Sword => &[(ResourceKind::Ore, 2), (ResourceKind::Wood, 1)],
            CraftRecipe::Armor => &[(ResourceKind::Ore, 3)],
            CraftRecipe::Trinket => &[(ResourceKind::Crystal, 2)],
            CraftRecipe::Potion => &[(ResourceKind::Food, 2)],
        }
    }

    /// Item produced.
    #[must_use]
    pub const fn output(self) -> ItemStack {
        let kind = match self {
            CraftRecipe::Sword => ItemKind::Weapon { bonus: 2 },
            CraftRecipe::Armor => ItemKind::Armor { reduction: 1 },
            CraftRecipe::Trinket => ItemKind::Trinket { regen: 1 },
            CraftRecipe::Potion => ItemKind::Potion { heal: 5 },
        };
        ItemStack::new(kind, 1)
    }
}

/// Render a material list as `2 ore, 1 wood`.
#[must_use]
pub fn describe_materials(materials: &[(ResourceKind, u32)]) -> String {
    materials
        .iter()
        .map(|(resource, qty)| format!("{qty} {}", resource.name()))
        .collect::<Vec<_>>()
        .join(", ")
}
