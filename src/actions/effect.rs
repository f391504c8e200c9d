//! Effects: what a validated action would do, as plain data.
//!
//! Handlers only describe effects. The resolver decides which ones commit
//! and the engine applies them.

use serde::{Deserialize, Serialize};

use crate::actions::{ActionKind, CraftRecipe};
use crate::world::{AgentId, Coord, ObjectId, StructureKind, UpgradeTrack};

/// A proposed state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// No change.
    Wait,
    /// Move the agent; `portal` is set when teleporting.
    MoveAgent {
        /// Start tile.
        from: Coord,
        /// Destination tile.
        to: Coord,
        /// Portal used, if any.
        portal: Option<ObjectId>,
    },
    /// Take ownership of a tile.
    ClaimTile {
        /// Tile.
        tile: Coord,
        /// Whether someone else owned it before the tick.
        capture: bool,
    },
    /// Hit another agent.
    Attack {
        /// Victim.
        target: AgentId,
    },
    /// Hit a structure.
    DamageStructure {
        /// Structure object.
        object: ObjectId,
    },
    /// Take a dropped item.
    Pickup {
        /// Dropped item object.
        object: ObjectId,
    },
    /// Drop items from a slot onto the agent's tile.
    Drop {
        /// Inventory slot.
        slot: usize,
        /// How many.
        quantity: u32,
        /// Tile they land on.
        at: Coord,
    },
    /// Use the item in a slot.
    Use {
        /// Inventory slot.
        slot: usize,
    },
    /// Build a structure.
    Place {
        /// What.
        structure: StructureKind,
        /// Where.
        at: Coord,
    },
    /// Craft an item.
    Craft {
        /// Recipe.
        recipe: CraftRecipe,
    },
    /// Gather from a node.
    Harvest {
        /// Resource node.
        object: ObjectId,
    },
    /// Reveal a circle for one tick.
    Reveal {
        /// Centre.
        center: Coord,
        /// Radius.
        radius: u32,
    },
    /// Activate a shrine, cache or obelisk.
    Interact {
        /// Landmark.
        object: ObjectId,
    },
    /// Raise an upgrade track.
    Upgrade {
        /// Track.
        track: UpgradeTrack,
    },
    /// Deliver a chat message.
    Chat {
        /// Body.
        text: String,
        /// Recipient, or everyone.
        to: Option<AgentId>,
    },
}

/// A handler's proposal before attribution to an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    /// What would happen.
    pub effect: Effect,
    /// Energy charged if it commits.
    pub energy_cost: u32,
}

impl Proposal {
    /// Create a proposal.
    #[must_use]
    pub const fn new(effect: Effect, energy_cost: u32) -> Self {
        Self { effect, energy_cost }
    }

    /// A free proposal.
    #[must_use]
    pub const fn free(effect: Effect) -> Self {
        Self::new(effect, 0)
    }
}

/// A validated effect attributed to its agent, ready for conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedEffect {
    /// Acting agent.
    pub agent: AgentId,
    /// Action kind that produced it.
    pub kind: ActionKind,
    /// Energy charged if it commits.
    pub energy_cost: u32,
    /// The effect.
    pub effect: Effect,
}

impl ProposedEffect {
    /// Attribute a proposal to an agent.
    #[must_use]
    pub fn new(agent: AgentId, kind: ActionKind, proposal: Proposal) -> Self {
        Self {
            agent,
            kind,
            energy_cost: proposal.energy_cost,
            effect: proposal.effect,
        }
    }
}
