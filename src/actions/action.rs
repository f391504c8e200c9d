//! Typed actions and intent parsing.
//!
//! Decision sources return free text. The first JSON object in that text is
//! the intent; it may be wrapped in prose or a fenced code block.
//!
//! ```json
//! {"action": "move", "direction": "north", "distance": 1}
//! {"action": "CLAIM", "x": 10, "y": 12}
//! {"action": "fight", "target": "agent-7"}
//! {"action": "place", "structure": "wall", "direction": "east"}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value, json};

use crate::actions::CraftRecipe;
use crate::error::IntentError;
use crate::world::{AgentId, Coord, Direction, ObjectId, StructureKind, UpgradeTrack};

/// The fourteen action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Walk up to `speed` tiles in a direction.
    Move,
    /// Claim or capture a tile.
    Claim,
    /// Send a chat message.
    Message,
    /// Do nothing.
    Wait,
    /// Attack an adjacent agent or structure.
    Fight,
    /// Pick up a dropped item.
    Pickup,
    /// Drop items from an inventory slot.
    Drop,
    /// Drink a potion or equip gear.
    Use,
    /// Build a structure.
    Place,
    /// Turn materials into an item.
    Craft,
    /// Gather from a resource node.
    Harvest,
    /// Reveal a wide area for one tick.
    Scan,
    /// Activate a landmark.
    Interact,
    /// Raise an upgrade track.
    Upgrade,
}

impl ActionKind {
    /// All kinds in declaration order.
    pub const ALL: [ActionKind; 14] = [
        ActionKind::Move,
        ActionKind::Claim,
        ActionKind::Message,
        ActionKind::Wait,
        ActionKind::Fight,
        ActionKind::Pickup,
        ActionKind::Drop,
        ActionKind::Use,
        ActionKind::Place,
        ActionKind::Craft,
        ActionKind::Harvest,
        ActionKind::Scan,
        ActionKind::Interact,
        ActionKind::Upgrade,
    ];

    /// Upper-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ActionKind::Move => "MOVE",
            ActionKind::Claim => "CLAIM",
            ActionKind::Message => "MESSAGE",
            ActionKind::Wait => "WAIT",
            ActionKind::Fight => "FIGHT",
            ActionKind::Pickup => "PICKUP",
            ActionKind::Drop => "DROP",
            ActionKind::Use => "USE",
            ActionKind::Place => "PLACE",
            ActionKind::Craft => "CRAFT",
            ActionKind::Harvest => "HARVEST",
            ActionKind::Scan => "SCAN",
            ActionKind::Interact => "INTERACT",
            ActionKind::Upgrade => "UPGRADE",
        }
    }

    /// Parse a kind name, ignoring case.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(text))
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a FIGHT is aimed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FightTarget {
    /// Another agent.
    Agent(AgentId),
    /// A structure.
    Object(ObjectId),
}

/// An action with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Walk in a straight line.
    Move {
        /// Heading.
        direction: Direction,
        /// Tiles to walk.
        distance: u16,
    },
    /// Claim a tile; `None` claims the agent's own tile.
    Claim {
        /// Target tile.
        target: Option<Coord>,
    },
    /// Chat, broadcast or directed.
    Message {
        /// Message body.
        text: String,
        /// Recipient, or everyone.
        to: Option<AgentId>,
    },
    /// Do nothing.
    Wait,
    /// Attack.
    Fight {
        /// Victim.
        target: FightTarget,
    },
    /// Pick up a dropped item; `None` takes the first one underfoot.
    Pickup {
        /// Dropped item object.
        object: Option<ObjectId>,
    },
    /// Drop items; `None` quantity drops the whole stack.
    Drop {
        /// Inventory slot.
        slot: usize,
        /// How many.
        quantity: Option<u32>,
    },
    /// Use the item in a slot.
    Use {
        /// Inventory slot.
        slot: usize,
    },
    /// Build on the own tile or an adjacent one.
    Place {
        /// What to build.
        structure: StructureKind,
        /// Neighbour to build on, or underfoot.
        direction: Option<Direction>,
    },
    /// Craft an item.
    Craft {
        /// Recipe.
        recipe: CraftRecipe,
    },
    /// Gather from a node; `None` picks the nearest node in reach.
    Harvest {
        /// Resource node.
        object: Option<ObjectId>,
    },
    /// Reveal a wide area for one tick.
    Scan,
    /// Activate a landmark; `None` picks the nearest one in reach.
    Interact {
        /// Landmark.
        object: Option<ObjectId>,
    },
    /// Buy the next level of a track.
    Upgrade {
        /// Track to raise.
        track: UpgradeTrack,
    },
}

impl Action {
    /// Kind of this action.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Action::Move { .. } => ActionKind::Move,
            Action::Claim { .. } => ActionKind::Claim,
            Action::Message { .. } => ActionKind::Message,
            Action::Wait => ActionKind::Wait,
            Action::Fight { .. } => ActionKind::Fight,
            Action::Pickup { .. } => ActionKind::Pickup,
            Action::Drop { .. } => ActionKind::Drop,
            Action::Use { .. } => ActionKind::Use,
            Action::Place { .. } => ActionKind::Place,
            Action::Craft { .. } => ActionKind::Craft,
            Action::Harvest { .. } => ActionKind::Harvest,
            Action::Scan => ActionKind::Scan,
            Action::Interact { .. } => ActionKind::Interact,
            Action::Upgrade { .. } => ActionKind::Upgrade,
        }
    }

    /// Render as intent text that [`parse_intent`] reads back.
    #[must_use]
    pub fn to_intent(&self) -> String {
        let mut fields = JsonMap::new();
        fields.insert("action".to_string(), json!(self.kind().name()));
        match self {
            Action::Move { direction, distance } => {
                fields.insert("direction".to_string(), serde_value(direction));
                fields.insert("distance".to_string(), json!(distance));
            }
            Action::Claim { target } => {
                if let Some(c) = target {
                    fields.insert("x".to_string(), json!(c.x));
                    fields.insert("y".to_string(), json!(c.y));
                }
            }
            Action::Message { text, to } => {
                fields.insert("text".to_string(), json!(text));
                if let Some(to) = to {
                    fields.insert("to".to_string(), json!(to.as_str()));
                }
            }
            Action::Wait | Action::Scan => {}
            Action::Fight { target } => match target {
                FightTarget::Agent(id) => {
                    fields.insert("target".to_string(), json!(id.as_str()));
                }
                FightTarget::Object(id) => {
                    fields.insert("object".to_string(), json!(id.0));
                }
            },
            Action::Pickup { object } | Action::Harvest { object } | Action::Interact { object } => {
                if let Some(id) = object {
                    fields.insert("object".to_string(), json!(id.0));
                }
            }
            Action::Drop { slot, quantity } => {
                fields.insert("slot".to_string(), json!(slot));
                if let Some(q) = quantity {
                    fields.insert("quantity".to_string(), json!(q));
                }
            }
            Action::Use { slot } => {
                fields.insert("slot".to_string(), json!(slot));
            }
            Action::Place { structure, direction } => {
                fields.insert("structure".to_string(), serde_value(structure));
                if let Some(d) = direction {
                    fields.insert("direction".to_string(), serde_value(d));
                }
            }
            Action::Craft { recipe } => {
                fields.insert("recipe".to_string(), json!(recipe.name()));
            }
            Action::Upgrade { track } => {
                fields.insert("track".to_string(), serde_value(track));
            }
        }
        Value::Object(fields).to_string()
    }
}

/// An action submitted by one agent for one tick. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Acting agent.
    pub agent: AgentId,
    /// The action.
    pub action: Action,
    /// Tick the request was received for.
    pub tick: u64,
}

impl ActionRequest {
    /// Create a request.
    #[must_use]
    pub const fn new(agent: AgentId, action: Action, tick: u64) -> Self {
        Self { agent, action, tick }
    }

    /// A WAIT for `agent`.
    #[must_use]
    pub const fn wait(agent: AgentId, tick: u64) -> Self {
        Self::new(agent, Action::Wait, tick)
    }
}

/// Outcome of one agent's action for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Acting agent.
    pub agent: AgentId,
    /// Kind attempted.
    pub kind: ActionKind,
    /// Whether it took effect.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

impl ActionResult {
    /// A successful result.
    #[must_use]
    pub fn ok(agent: &AgentId, kind: ActionKind, message: impl Into<String>) -> Self {
        Self {
            agent: agent.clone(),
            kind,
            success: true,
            message: message.into(),
        }
    }

    /// A failed result.
    #[must_use]
    pub fn failed(agent: &AgentId, kind: ActionKind, message: impl Into<String>) -> Self {
        Self {
            agent: agent.clone(),
            kind,
            success: false,
            message: message.into(),
        }
    }
}

fn serde_value(value: &impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Longest decision output [`parse_intent`] looks at, in bytes.
pub const MAX_INTENT_LEN: usize = 4096;

/// Parse decision output into an action.
///
/// Accepts a JSON object anywhere in the text. The action name may sit under
/// `action` or `type`, parameters either at top level or under `params`.
/// Text longer than [`MAX_INTENT_LEN`] bytes is rejected unread.
///
/// # Errors
///
/// Returns an [`IntentError`] when the text is too long, holds no JSON
/// object, or names an unknown action or a malformed parameter.
pub fn parse_intent(text: &str) -> Result<Action, IntentError> {
    parse_intent_within(text, MAX_INTENT_LEN)
}

/// [`parse_intent`] with a caller-chosen length limit.
///
/// # Errors
///
/// Returns [`IntentError::TooLong`] when `text` exceeds `max_len` bytes,
/// otherwise the same errors as [`parse_intent`].
pub fn parse_intent_within(text: &str, max_len: usize) -> Result<Action, IntentError> {
    if text.len() > max_len {
        return Err(IntentError::TooLong {
            len: text.len(),
            max: max_len,
        });
    }
    let object = extract_json(text)?;
    let name = object
        .get("action")
        .or_else(|| object.get("type"))
        .and_then(Value::as_str)
        .ok_or(IntentError::MissingAction)?;
    let kind = ActionKind::parse(name).ok_or_else(|| IntentError::UnknownAction(name.to_string()))?;
    let params = Params::new(&object);

    let action = match kind {
        ActionKind::Move => Action::Move {
            direction: params.direction("direction")?,
            distance: params.opt_u16("distance")?.unwrap_or(1),
        },
        ActionKind::Claim => Action::Claim {
            target: params.coord()?,
        },
        ActionKind::Message => Action::Message {
            text: params
                .str("text")
                .or_else(|| params.str("message"))
                .ok_or_else(|| missing("text"))?
                .to_string(),
            to: params.str("to").map(AgentId::new),
        },
        ActionKind::Wait => Action::Wait,
        ActionKind::Fight => Action::Fight {
            target: params.fight_target()?,
        },
        ActionKind::Pickup => Action::Pickup {
            object: params.opt_object("object")?,
        },
        ActionKind::Drop => Action::Drop {
            slot: params.opt_usize("slot")?.ok_or_else(|| missing("slot"))?,
            quantity: params.opt_u32("quantity")?,
        },
        ActionKind::Use => Action::Use {
            slot: params.opt_usize("slot")?.ok_or_else(|| missing("slot"))?,
        },
        ActionKind::Place => {
            let name = params.str("structure").ok_or_else(|| missing("structure"))?;
            Action::Place {
                structure: StructureKind::parse(name)
                    .ok_or_else(|| invalid("structure", format!("unknown structure {name:?}")))?,
                direction: params.opt_direction("direction")?,
            }
        }
        ActionKind::Craft => {
            let name = params
                .str("recipe")
                .or_else(|| params.str("item"))
                .ok_or_else(|| missing("recipe"))?;
            Action::Craft {
                recipe: CraftRecipe::parse(name)
                    .ok_or_else(|| invalid("recipe", format!("unknown recipe {name:?}")))?,
            }
        }
        ActionKind::Harvest => Action::Harvest {
            object: params.opt_object("object")?,
        },
        ActionKind::Scan => Action::Scan,
        ActionKind::Interact => Action::Interact {
            object: params.opt_object("object")?,
        },
        ActionKind::Upgrade => {
            let name = params.str("track").ok_or_else(|| missing("track"))?;
            Action::Upgrade {
                track: UpgradeTrack::parse(name)
                    .ok_or_else(|| invalid("track", format!("unknown track {name:?}")))?,
            }
        }
    };
    Ok(action)
}

fn missing(name: &'static str) -> IntentError {
    IntentError::InvalidParam {
        name,
        reason: "missing".to_string(),
    }
}

fn invalid(name: &'static str, reason: String) -> IntentError {
    IntentError::InvalidParam { name, reason }
}

/// Find and parse the first JSON object in `text`.
fn extract_json(text: &str) -> Result<JsonMap<String, Value>, IntentError> {
    let mut last_error = None;
    for (start, end) in brace_pairs(text) {
        match serde_json::from_str::<Value>(&text[start..=end]) {
            Ok(Value::Object(object)) => return Ok(object),
            Ok(_) => {}
            Err(e) => last_error = Some(e.to_string()),
        }
    }
    Err(last_error.map_or(IntentError::NoJson, IntentError::Malformed))
}

/// Byte offsets of every balanced `{ ... }` pair outside strings, ordered by
/// opening brace. One forward scan; unclosed braces yield nothing.
fn brace_pairs(text: &str) -> Vec<(usize, usize)> {
    let mut open = Vec::new();
    let mut pairs = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            // Quotes only matter inside a candidate object.
            '"' if !open.is_empty() => in_string = true,
            '{' => open.push(i),
            '}' => {
                if let Some(start) = open.pop() {
                    pairs.push((start, i));
                }
            }
            _ => {}
        }
    }
    pairs.sort_unstable();
    pairs
}

/// Parameter lookup over the top level and an optional `params` object.
struct Params<'a> {
    top: &'a JsonMap<String, Value>,
    nested: Option<&'a JsonMap<String, Value>>,
}

impl<'a> Params<'a> {
    fn new(top: &'a JsonMap<String, Value>) -> Self {
        Self {
            top,
            nested: top.get("params").and_then(Value::as_object),
        }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.top
            .get(name)
            .or_else(|| self.nested.and_then(|p| p.get(name)))
            .filter(|v| !v.is_null())
    }

    fn str(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(Value::as_str)
    }

    fn opt_u64(&self, name: &'static str) -> Result<Option<u64>, IntentError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| invalid(name, format!("expected a non-negative integer, got {n}"))),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| invalid(name, format!("expected an integer, got {s:?}"))),
            Some(other) => Err(invalid(name, format!("expected an integer, got {other}"))),
        }
    }

    fn opt_u32(&self, name: &'static str) -> Result<Option<u32>, IntentError> {
        self.opt_u64(name)?
            .map(|v| u32::try_from(v).map_err(|_| invalid(name, format!("{v} is too large"))))
            .transpose()
    }

    fn opt_u16(&self, name: &'static str) -> Result<Option<u16>, IntentError> {
        self.opt_u64(name)?
            .map(|v| u16::try_from(v).map_err(|_| invalid(name, format!("{v} is too large"))))
            .transpose()
    }

    fn opt_usize(&self, name: &'static str) -> Result<Option<usize>, IntentError> {
        self.opt_u64(name)?
            .map(|v| usize::try_from(v).map_err(|_| invalid(name, format!("{v} is too large"))))
            .transpose()
    }

    fn opt_object(&self, name: &'static str) -> Result<Option<ObjectId>, IntentError> {
        Ok(self.opt_u64(name)?.map(ObjectId))
    }

    fn opt_direction(&self, name: &'static str) -> Result<Option<Direction>, IntentError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => {
                let text = value
                    .as_str()
                    .ok_or_else(|| invalid(name, format!("expected a direction, got {value}")))?;
                Direction::parse(text)
                    .map(Some)
                    .ok_or_else(|| invalid(name, format!("unknown direction {text:?}")))
            }
        }
    }

    fn direction(&self, name: &'static str) -> Result<Direction, IntentError> {
        self.opt_direction(name)?.ok_or_else(|| missing(name))
    }

    /// A coordinate as `x`/`y` fields, `target: [x, y]` or `target: {x, y}`.
    fn coord(&self) -> Result<Option<Coord>, IntentError> {
        if let (Some(x), Some(y)) = (self.opt_u16("x")?, self.opt_u16("y")?) {
            return Ok(Some(Coord::new(x, y)));
        }
        let Some(target) = self.get("target") else {
            return Ok(None);
        };
        let pair = match target {
            Value::Array(items) if items.len() == 2 => (items[0].as_u64(), items[1].as_u64()),
            Value::Object(fields) => (
                fields.get("x").and_then(Value::as_u64),
                fields.get("y").and_then(Value::as_u64),
            ),
            _ => (None, None),
        };
        match pair {
            (Some(x), Some(y)) => match (u16::try_from(x), u16::try_from(y)) {
                (Ok(x), Ok(y)) => Ok(Some(Coord::new(x, y))),
                _ => Err(invalid("target", format!("({x}, {y}) is out of range"))),
            },
            _ => Err(invalid("target", format!("expected [x, y], got {target}"))),
        }
    }

    /// An agent id string or an object id number.
    fn fight_target(&self) -> Result<FightTarget, IntentError> {
        if let Some(id) = self.opt_object("object")? {
            return Ok(FightTarget::Object(id));
        }
        match self.get("target") {
            Some(Value::String(id)) => Ok(FightTarget::Agent(AgentId::new(id.trim()))),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(|id| FightTarget::Object(ObjectId(id)))
                .ok_or_else(|| invalid("target", format!("bad object id {n}"))),
            Some(other) => Err(invalid("target", format!("expected an id, got {other}"))),
            None => Err(missing("target")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move() {
        let action = parse_intent(r#"{"action": "move", "direction": "north"}"#).unwrap();
        assert_eq!(
            action,
            Action::Move {
                direction: Direction::North,
                distance: 1
            }
        );
    }

    #[test]
    fn test_parse_wrapped_in_prose_and_fence() {
        let text = "I will head east.\n```json\n{\"action\": \"MOVE\", \"direction\": \"E\", \"distance\": 2}\n```\nDone.";
        assert_eq!(
            parse_intent(text).unwrap(),
            Action::Move {
                direction: Direction::East,
                distance: 2
            }
        );
    }

    #[test]
    fn test_parse_case_insensitive_and_params() {
        let text = r#"{"type": "Upgrade", "params": {"track": "Vision"}}"#;
        assert_eq!(
            parse_intent(text).unwrap(),
            Action::Upgrade {
                track: UpgradeTrack::Vision
            }
        );
    }

    #[test]
    fn test_parse_claim_forms() {
        let a = parse_intent(r#"{"action":"claim","x":3,"y":4}"#).unwrap();
        let b = parse_intent(r#"{"action":"claim","target":[3,4]}"#).unwrap();
        let c = parse_intent(r#"{"action":"claim"}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a,
            Action::Claim {
                target: Some(Coord::new(3, 4))
            }
        );
        assert_eq!(c, Action::Claim { target: None });
    }

    #[test]
    fn test_parse_fight_targets() {
        let agent = parse_intent(r#"{"action":"fight","target":"b"}"#).unwrap();
        assert_eq!(
            agent,
            Action::Fight {
                target: FightTarget::Agent(AgentId::new("b"))
            }
        );
        let object = parse_intent(r#"{"action":"fight","target":12}"#).unwrap();
        assert_eq!(
            object,
            Action::Fight {
                target: FightTarget::Object(ObjectId(12))
            }
        );
    }

    #[test]
    fn test_braces_inside_strings() {
        let text = r#"{"action":"message","text":"meet at {north}"}"#;
        assert_eq!(
            parse_intent(text).unwrap(),
            Action::Message {
                text: "meet at {north}".to_string(),
                to: None
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_intent("just vibes"), Err(IntentError::NoJson));
        assert_eq!(parse_intent(r#"{"direction":"n"}"#), Err(IntentError::MissingAction));
        assert_eq!(
            parse_intent(r#"{"action":"teleport"}"#),
            Err(IntentError::UnknownAction("teleport".to_string()))
        );
        assert!(matches!(
            parse_intent(r#"{"action":"move","direction":"up-left"}"#),
            Err(IntentError::InvalidParam { name: "direction", .. })
        ));
        assert!(matches!(
            parse_intent(r#"{"action":"drop","slot":-1}"#),
            Err(IntentError::InvalidParam { name: "slot", .. })
        ));
        assert!(matches!(parse_intent("{not json}"), Err(IntentError::Malformed(_))));
    }

    #[test]
    fn test_oversized_output_rejected() {
        let text = format!("{{\"action\":\"wait\"}}{}", " ".repeat(MAX_INTENT_LEN));
        assert_eq!(
            parse_intent(&text),
            Err(IntentError::TooLong {
                len: MAX_INTENT_LEN + 17,
                max: MAX_INTENT_LEN
            })
        );
        assert_eq!(parse_intent_within(&text, text.len()).unwrap(), Action::Wait);
    }

    #[test]
    fn test_unclosed_braces_scan_once() {
        let text = "{".repeat(200_000);
        assert_eq!(parse_intent_within(&text, usize::MAX), Err(IntentError::NoJson));
        let text = format!("{}{}", "{".repeat(100_000), "}".repeat(100_000));
        assert!(matches!(parse_intent_within(&text, usize::MAX), Err(IntentError::Malformed(_))));
    }

    #[test]
    fn test_stray_braces_before_intent() {
        let text = r#"{ thinking... {"action":"scan"}"#;
        assert_eq!(parse_intent(text).unwrap(), Action::Scan);
        let text = r#"{ plan: {"action":"wait"} }"#;
        assert_eq!(parse_intent(text).unwrap(), Action::Wait);
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::parse(&kind.name().to_lowercase()), Some(kind));
        }
    }

    #[test]
    fn test_to_intent_reads_back() {
        let actions = [
            Action::Move {
                direction: Direction::West,
                distance: 2,
            },
            Action::Claim {
                target: Some(Coord::new(4, 9)),
            },
            Action::Fight {
                target: FightTarget::Object(ObjectId(12)),
            },
            Action::Place {
                structure: StructureKind::Beacon,
                direction: None,
            },
            Action::Upgrade {
                track: UpgradeTrack::Vision,
            },
        ];
        for action in actions {
            assert_eq!(parse_intent(&action.to_intent()).unwrap(), action);
        }
    }
}
