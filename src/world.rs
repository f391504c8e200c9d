//! World and entity model.
//!
//! Everything the simulation mutates lives here:
//! - Tile grid with immutable terrain/biome and exclusive ownership
//! - Agents with upgrades, inventory and recall memory
//! - World objects (structures, resource nodes, interactives, dropped items)
//! - Invariant checks run after every committed tick

mod agent;
pub mod invariants;
mod item;
mod map;
mod object;
mod state;

pub use agent::{Agent, AgentId, Controller, UpgradeTrack, Upgrades};
pub use item::{EquipSlot, Inventory, InventoryLimits, ItemKind, ItemStack, ResourceKind};
pub use map::{Biome, Cell, Coord, Direction, Map, Terrain, Tile};
pub use object::{InteractiveKind, ObjectId, ObjectKind, StructureKind, WorldObject};
pub use state::World;
