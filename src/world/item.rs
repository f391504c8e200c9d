//! Items, resources and bounded inventories.

use serde::{Deserialize, Serialize};

/// Raw material kinds produced by resource nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Harvested from forests.
    Wood,
    /// Harvested from rocky ground.
    Stone,
    /// Harvested from mineral veins.
    Ore,
    /// Harvested from crystal fields.
    Crystal,
    /// Harvested from fertile ground.
    Food,
}

impl ResourceKind {
    /// All resource kinds.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Wood,
        ResourceKind::Stone,
        ResourceKind::Ore,
        ResourceKind::Crystal,
        ResourceKind::Food,
    ];

    /// Lower-case name used in intents and messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ResourceKind::Wood => "wood",
            ResourceKind::Stone => "stone",
            ResourceKind::Ore => "ore",
            ResourceKind::Crystal => "crystal",
            ResourceKind::Food => "food",
        }
    }
}

/// Equipment slot an item occupies when equipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipSlot {
    /// Adds damage.
    Weapon,
    /// Reduces damage taken.
    Armor,
    /// Adds energy regeneration.
    Trinket,
}

/// What an item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    /// Stackable crafting material.
    Material {
        /// Which resource.
        resource: ResourceKind,
    },
    /// Equippable damage bonus.
    Weapon {
        /// Added damage per hit.
        bonus: u32,
    },
    /// Equippable damage reduction.
    Armor {
        /// Damage removed from each incoming hit.
        reduction: u32,
    },
    /// Equippable energy regeneration bonus.
    Trinket {
        /// Extra energy per tick.
        regen: u32,
    },
    /// Single-use healing.
    Potion {
        /// Hit points restored.
        heal: u32,
    },
}

impl ItemKind {
    /// Material item for a resource.
    #[must_use]
    pub const fn material(resource: ResourceKind) -> Self {
        ItemKind::Material { resource }
    }

    /// Slot this item equips into, if any.
    #[must_use]
    pub const fn equip_slot(self) -> Option<EquipSlot> {
        match self {
            ItemKind::Weapon { .. } => Some(EquipSlot::Weapon),
            ItemKind::Armor { .. } => Some(EquipSlot::Armor),
            ItemKind::Trinket { .. } => Some(EquipSlot::Trinket),
            ItemKind::Material { .. } | ItemKind::Potion { .. } => None,
        }
    }

    /// Whether several of this item share one slot.
    #[must_use]
    pub const fn is_stackable(self) -> bool {
        matches!(self, ItemKind::Material { .. } | ItemKind::Potion { .. })
    }

    /// Short human-readable name.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            ItemKind::Material { resource } => resource.name().to_string(),
            ItemKind::Weapon { bonus } => format!("weapon (+{bonus} damage)"),
            ItemKind::Armor { reduction } => format!("armor (-{reduction} damage taken)"),
            ItemKind::Trinket { regen } => format!("trinket (+{regen} energy/tick)"),
            ItemKind::Potion { heal } => format!("potion (+{heal} hp)"),
        }
    }
}

/// A quantity of one item kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item kind.
    pub kind: ItemKind,
    /// How many (always >= 1 in a live inventory).
    pub quantity: u32,
}

impl ItemStack {
    /// Create a stack.
    #[must_use]
    pub const fn new(kind: ItemKind, quantity: u32) -> Self {
        Self { kind, quantity }
    }
}

/// Capacity limits for an inventory, derived from balance and the storage upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryLimits {
    /// Maximum number of occupied slots.
    pub slots: usize,
    /// Maximum quantity in one stack.
    pub stack: u32,
}

/// Slot-bounded inventory plus equipped gear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Carried stacks.
    pub slots: Vec<ItemStack>,
    /// Equipped weapon.
    pub weapon: Option<ItemKind>,
    /// Equipped armor.
    pub armor: Option<ItemKind>,
    /// Equipped trinket.
    pub trinket: Option<ItemKind>,
}

impl Inventory {
    /// Total quantity of a material across all slots.
    #[must_use]
    pub fn count(&self, resource: ResourceKind) -> u32 {
        let kind = ItemKind::material(resource);
        self.slots
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.quantity)
            .sum()
    }

    /// Whether every `(resource, quantity)` requirement is carried.
    #[must_use]
    pub fn has_materials(&self, requirements: &[(ResourceKind, u32)]) -> bool {
        requirements
            .iter()
            .all(|(resource, qty)| self.count(*resource) >= *qty)
    }

    /// How many of `stack` fit without exceeding the limits.
    #[must_use]
    pub fn room_for(&self, stack: ItemStack, limits: InventoryLimits) -> u32 {
        if stack.kind.is_stackable() {
            let free_in_stacks: u32 = self
                .slots
                .iter()
                .filter(|s| s.kind == stack.kind)
                .map(|s| limits.stack.saturating_sub(s.quantity))
                .sum();
            let free_slots = limits.slots.saturating_sub(self.slots.len());
            let free_slots = u32::try_from(free_slots).unwrap_or(u32::MAX);
            free_in_stacks.saturating_add(free_slots.saturating_mul(limits.stack))
        } else {
            let free_slots = limits.slots.saturating_sub(self.slots.len());
            u32::try_from(free_slots).unwrap_or(u32::MAX)
        }
    }

    /// Add as much of `stack` as fits and return the quantity that did not.
    pub fn add(&mut self, stack: ItemStack, limits: InventoryLimits) -> u32 {
        let mut remaining = stack.quantity;
        if stack.kind.is_stackable() {
            for slot in self.slots.iter_mut().filter(|s| s.kind == stack.kind) {
                let moved = remaining.min(limits.stack.saturating_sub(slot.quantity));
                slot.quantity += moved;
                remaining -= moved;
            }
            while remaining > 0 && self.slots.len() < limits.slots {
                let moved = remaining.min(limits.stack.max(1));
                self.slots.push(ItemStack::new(stack.kind, moved));
                remaining -= moved;
            }
        } else {
            while remaining > 0 && self.slots.len() < limits.slots {
                self.slots.push(ItemStack::new(stack.kind, 1));
                remaining -= 1;
            }
        }
        remaining
    }

    /// Remove materials; returns `false` and changes nothing if any are missing.
    pub fn remove_materials(&mut self, requirements: &[(ResourceKind, u32)]) -> bool {
        if !self.has_materials(requirements) {
            return false;
        }
        for (resource, qty) in requirements {
            let kind = ItemKind::material(*resource);
            let mut owed = *qty;
            for slot in self.slots.iter_mut().rev().filter(|s| s.kind == kind) {
                let taken = owed.min(slot.quantity);
                slot.quantity -= taken;
                owed -= taken;
                if owed == 0 {
                    break;
                }
            }
        }
        self.slots.retain(|s| s.quantity > 0);
        true
    }

    /// Remove up to `quantity` items from a slot.
    pub fn take(&mut self, slot: usize, quantity: u32) -> Option<ItemStack> {
        let stack = self.slots.get_mut(slot)?;
        let taken = quantity.min(stack.quantity);
        if taken == 0 {
            return None;
        }
        stack.quantity -= taken;
        let kind = stack.kind;
        if stack.quantity == 0 {
            self.slots.remove(slot);
        }
        Some(ItemStack::new(kind, taken))
    }

    /// Currently equipped item for a slot.
    #[must_use]
    pub const fn equipped(&self, slot: EquipSlot) -> Option<ItemKind> {
        match slot {
            EquipSlot::Weapon => self.weapon,
            EquipSlot::Armor => self.armor,
            EquipSlot::Trinket => self.trinket,
        }
    }

    /// Put an item into its equipment slot and return what it replaced.
    pub fn equip(&mut self, item: ItemKind) -> Option<ItemKind> {
        match item.equip_slot()? {
            EquipSlot::Weapon => self.weapon.replace(item),
            EquipSlot::Armor => self.armor.replace(item),
            EquipSlot::Trinket => self.trinket.replace(item),
        }
    }

    /// Damage bonus from the equipped weapon.
    #[must_use]
    pub const fn weapon_bonus(&self) -> u32 {
        match self.weapon {
            Some(ItemKind::Weapon { bonus }) => bonus,
            _ => 0,
        }
    }

    /// Damage reduction from equipped armor.
    #[must_use]
    pub const fn armor_reduction(&self) -> u32 {
        match self.armor {
            Some(ItemKind::Armor { reduction }) => reduction,
            _ => 0,
        }
    }

    /// Energy regeneration from the equipped trinket.
    #[must_use]
    pub const fn trinket_regen(&self) -> u32 {
        match self.trinket {
            Some(ItemKind::Trinket { regen }) => regen,
            _ => 0,
        }
    }

    /// Empty the inventory, including equipped gear.
    pub fn drain(&mut self) -> Vec<ItemStack> {
        let mut out: Vec<ItemStack> = self.slots.drain(..).collect();
        for item in [self.weapon.take(), self.armor.take(), self.trinket.take()]
            .into_iter()
            .flatten()
        {
            out.push(ItemStack::new(item, 1));
        }
        out
    }
}
