//! Built-in action handlers.

mod building;
mod combat;
mod items;
mod misc;
mod movement;
mod territory;

pub use building::{CraftHandler, PlaceHandler, UpgradeHandler};
pub use combat::FightHandler;
pub use items::{DropHandler, HarvestHandler, PickupHandler, UseHandler};
pub use misc::{InteractHandler, MessageHandler, ScanHandler, WaitHandler};
pub use movement::MoveHandler;
pub use territory::ClaimHandler;

use crate::actions::{Action, ActionHandler, ActionKind, WorldView};
use crate::world::{Agent, ObjectId, WorldObject};

/// One handler per action kind.
pub(crate) fn builtin() -> Vec<Box<dyn ActionHandler>> {
    vec![
        Box::new(MoveHandler),
        Box::new(ClaimHandler),
        Box::new(MessageHandler),
        Box::new(WaitHandler),
        Box::new(FightHandler),
        Box::new(PickupHandler),
        Box::new(DropHandler),
        Box::new(UseHandler),
        Box::new(PlaceHandler),
        Box::new(CraftHandler),
        Box::new(HarvestHandler),
        Box::new(ScanHandler),
        Box::new(InteractHandler),
        Box::new(UpgradeHandler),
    ]
}

fn mismatch(expected: ActionKind, action: &Action) -> String {
    format!("{expected} handler cannot run {}", action.kind())
}

/// Find an object on the agent's tile or a neighbouring one.
///
/// With an explicit id the object must be in reach and match; without one
/// the nearest match wins, lowest id first.
fn object_in_reach<'a>(
    view: &WorldView<'a>,
    agent: &Agent,
    id: Option<ObjectId>,
    what: &str,
    matches: impl Fn(&WorldObject) -> bool,
) -> Result<&'a WorldObject, String> {
    let world = view.world;
    match id {
        Some(id) => {
            let object = world
                .objects
                .get(&id)
                .ok_or_else(|| format!("no object {id}"))?;
            if !matches(object) {
                return Err(format!("{} is not a {what}", object.label()));
            }
            if !object.position.touches(agent.position) {
                return Err(format!("{} is out of reach", object.label()));
            }
            Ok(object)
        }
        None => world
            .objects
            .values()
            .filter(|o| o.position.touches(agent.position) && matches(o))
            .min_by_key(|o| (o.position.distance_sq(agent.position), o.id))
            .ok_or_else(|| format!("no {what} in reach")),
    }
}
