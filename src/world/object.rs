//! World objects: structures, resource nodes, interactives and dropped items.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::world::{AgentId, Coord, ItemStack, ResourceKind};

/// Unique identifier for a world object, allocated sequentially per world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Buildable structure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    /// Blocks movement for everyone but its owner.
    Wall,
    /// Extends its owner's vision from a fixed point.
    Beacon,
    /// Damages hostile agents that step on it.
    Trap,
}

impl StructureKind {
    /// Parse a structure name.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "wall" => Some(StructureKind::Wall),
            "beacon" => Some(StructureKind::Beacon),
            "trap" => Some(StructureKind::Trap),
            _ => None,
        }
    }
}

/// Interactive landmark kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractiveKind {
    /// Single-use full heal.
    Shrine,
    /// Single-use item cache.
    Cache,
    /// Teleports to its linked portal.
    Portal,
    /// Reveals its surroundings and a message.
    Obelisk,
}

/// What a world object is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    /// A built structure.
    Structure {
        /// Structure kind.
        kind: StructureKind,
        /// Remaining hit points.
        hp: u32,
        /// Builder, or `None` for neutral generated structures.
        owner: Option<AgentId>,
    },
    /// A harvestable node.
    Resource {
        /// Resource produced.
        resource: ResourceKind,
        /// Units left before exhaustion.
        remaining: u32,
    },
    /// An interactive landmark.
    Interactive {
        /// Landmark kind.
        kind: InteractiveKind,
        /// Whether it has been used.
        activated: bool,
        /// Text shown on interaction.
        message: Option<String>,
        /// Destination portal.
        link: Option<ObjectId>,
        /// Reward held by a cache.
        item: Option<ItemStack>,
    },
    /// Items lying on the ground.
    DroppedItem {
        /// The items.
        stack: ItemStack,
    },
}

/// An object placed on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldObject {
    /// Identifier.
    pub id: ObjectId,
    /// Position.
    pub position: Coord,
    /// What it is.
    pub kind: ObjectKind,
    /// Tick at which the object is removed, if it expires.
    pub despawn_at: Option<u64>,
}

impl WorldObject {
    /// Create an object without an expiry.
    #[must_use]
    pub const fn new(id: ObjectId, position: Coord, kind: ObjectKind) -> Self {
        Self {
            id,
            position,
            kind,
            despawn_at: None,
        }
    }

    /// Set an expiry tick.
    #[must_use]
    pub const fn expiring_at(mut self, tick: u64) -> Self {
        self.despawn_at = Some(tick);
        self
    }

    /// Structure kind and owner, if this is a structure.
    #[must_use]
    pub fn as_structure(&self) -> Option<(StructureKind, Option<&AgentId>)> {
        match &self.kind {
            ObjectKind::Structure { kind, owner, .. } => Some((*kind, owner.as_ref())),
            _ => None,
        }
    }

    /// Whether this is a beacon owned by `agent`.
    #[must_use]
    pub fn is_beacon_of(&self, agent: &AgentId) -> bool {
        matches!(self.as_structure(), Some((StructureKind::Beacon, Some(owner))) if owner == agent)
    }

    /// Whether this object stops `agent` from entering its tile.
    #[must_use]
    pub fn blocks(&self, agent: &AgentId) -> bool {
        match self.as_structure() {
            Some((StructureKind::Wall, owner)) => owner != Some(agent),
            _ => false,
        }
    }

    /// Whether this is a trap that hurts `agent`.
    #[must_use]
    pub fn is_hostile_trap(&self, agent: &AgentId) -> bool {
        matches!(self.as_structure(), Some((StructureKind::Trap, owner)) if owner != Some(agent))
    }

    /// Whether a structure already occupies this object's tile.
    #[must_use]
    pub const fn is_structure(&self) -> bool {
        matches!(self.kind, ObjectKind::Structure { .. })
    }

    /// Short label for results and logs.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.kind {
            ObjectKind::Structure { kind, .. } => format!("{kind:?} {}", self.id).to_lowercase(),
            ObjectKind::Resource { resource, .. } => format!("{} node {}", resource.name(), self.id),
            ObjectKind::Interactive { kind, .. } => format!("{kind:?} {}", self.id).to_lowercase(),
            ObjectKind::DroppedItem { stack } => {
                format!("{} x{} {}", stack.kind.describe(), stack.quantity, self.id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure(kind: StructureKind, owner: Option<&str>) -> WorldObject {
        WorldObject::new(
            ObjectId(1),
            Coord::new(1, 1),
            ObjectKind::Structure {
                kind,
                hp: 5,
                owner: owner.map(AgentId::new),
            },
        )
    }

    #[test]
    fn test_wall_blocks_strangers_only() {
        let wall = structure(StructureKind::Wall, Some("a"));
        assert!(!wall.blocks(&AgentId::new("a")));
        assert!(wall.blocks(&AgentId::new("b")));
    }

    #[test]
    fn test_neutral_trap_is_hostile_to_everyone() {
        let trap = structure(StructureKind::Trap, None);
        assert!(trap.is_hostile_trap(&AgentId::new("a")));
        let owned = structure(StructureKind::Trap, Some("a"));
        assert!(!owned.is_hostile_trap(&AgentId::new("a")));
        assert!(owned.is_hostile_trap(&AgentId::new("b")));
    }

    #[test]
    fn test_beacon_ownership() {
        let beacon = structure(StructureKind::Beacon, Some("a"));
        assert!(beacon.is_beacon_of(&AgentId::new("a")));
        assert!(!beacon.is_beacon_of(&AgentId::new("b")));
    }

    #[test]
    fn test_label() {
        let node = WorldObject::new(
            ObjectId(7),
            Coord::new(0, 0),
            ObjectKind::Resource {
                resource: ResourceKind::Ore,
                remaining: 3,
            },
        );
        assert_eq!(node.label(), "ore node #7");
        assert_eq!(structure(StructureKind::Wall, None).label(), "wall #1");
    }
}
