//! Actions, effects and the handler registry.
//!
//! An agent's decision text is parsed into an [`Action`]. The registered
//! [`ActionHandler`] for its kind validates it against a read-only
//! [`WorldView`] and proposes an [`Effect`]. Nothing here mutates the world.

mod action;
mod effect;
pub mod handlers;
pub mod recipes;
mod registry;

pub use action::{
    Action, ActionKind, ActionRequest, ActionResult, FightTarget, MAX_INTENT_LEN, parse_intent, parse_intent_within,
};
pub use effect::{Effect, Proposal, ProposedEffect};
pub use recipes::CraftRecipe;
pub use registry::{ActionHandler, HandlerRegistry, WorldView};
