//! MESSAGE, WAIT, SCAN and INTERACT.

use crate::actions::handlers::{mismatch, object_in_reach};
use crate::actions::{Action, ActionHandler, ActionKind, Effect, Proposal, WorldView};
use crate::world::{Agent, InteractiveKind, ObjectKind};

/// Sends a chat message to everyone or to one agent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageHandler;

impl ActionHandler for MessageHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Message
    }

    fn propose(&self, action: &Action, view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        let Action::Message { text, to } = action else {
            return Err(mismatch(ActionKind::Message, action));
        };
        let text = text.trim();
        if text.is_empty() {
            return Err("message is empty".to_string());
        }
        let limit = view.balance.costs.max_message_len;
        let len = text.chars().count();
        if len > limit {
            return Err(format!("message is {len} characters, limit is {limit}"));
        }
        if let Some(to) = to {
            if *to == agent.id {
                return Err("cannot message yourself".to_string());
            }
            if view.world.agent(to).is_none() {
                return Err(format!("unknown recipient {to}"));
            }
        }
        Ok(Proposal::new(
            Effect::Chat {
                text: text.to_string(),
                to: to.clone(),
            },
            view.balance.costs.message_energy,
        ))
    }
}

/// Does nothing. Always valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitHandler;

impl ActionHandler for WaitHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Wait
    }

    fn propose(&self, action: &Action, _view: &WorldView<'_>, _agent: &Agent) -> Result<Proposal, String> {
        match action {
            Action::Wait => Ok(Proposal::free(Effect::Wait)),
            other => Err(mismatch(ActionKind::Wait, other)),
        }
    }
}

/// Reveals a wide circle around the agent for one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanHandler;

impl ActionHandler for ScanHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Scan
    }

    fn propose(&self, action: &Action, view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        if *action != Action::Scan {
            return Err(mismatch(ActionKind::Scan, action));
        }
        let costs = &view.balance.costs;
        let radius = agent.vision_radius(view.balance.agent.vision_radius) * costs.scan_radius_multiplier.max(1);
        Ok(Proposal::new(
            Effect::Reveal {
                center: agent.position,
                radius,
            },
            costs.scan_energy,
        ))
    }
}

/// Activates a shrine, cache, obelisk or portal in reach.
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractHandler;

impl ActionHandler for InteractHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Interact
    }

    fn propose(&self, action: &Action, view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        let Action::Interact { object } = *action else {
            return Err(mismatch(ActionKind::Interact, action));
        };
        let target = object_in_reach(view, agent, object, "landmark", |o| {
            matches!(o.kind, ObjectKind::Interactive { .. })
        })?;
        let ObjectKind::Interactive {
            kind,
            activated,
            link,
            item,
            ..
        } = &target.kind
        else {
            return Err(format!("{} is not a landmark", target.label()));
        };
        let cost = view.balance.costs.interact_energy;

        let effect = match kind {
            InteractiveKind::Shrine | InteractiveKind::Cache if *activated => {
                return Err(format!("{} has already been used", target.label()));
            }
            InteractiveKind::Shrine if agent.hp >= agent.max_hp => {
                return Err("already at full health".to_string());
            }
            InteractiveKind::Cache => {
                if let Some(stack) = item {
                    let limits = agent.inventory_limits(view.balance);
                    if agent.inventory.room_for(*stack, limits) == 0 {
                        return Err("inventory is full".to_string());
                    }
                }
                Effect::Interact { object: target.id }
            }
            InteractiveKind::Portal => {
                let exit = link
                    .and_then(|id| view.world.objects.get(&id))
                    .ok_or_else(|| format!("{} leads nowhere", target.label()))?;
                if !view.world.is_walkable_for(exit.position, &agent.id) {
                    return Err(format!("exit {} is blocked", exit.position));
                }
                Effect::MoveAgent {
                    from: agent.position,
                    to: exit.position,
                    portal: Some(target.id),
                }
            }
            InteractiveKind::Shrine | InteractiveKind::Obelisk => Effect::Interact { object: target.id },
        };
        Ok(Proposal::new(effect, cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::handlers::test_support::{add_agent, world};
    use crate::config::BalanceConfig;
    use crate::world::{AgentId, Coord, ObjectId};

    fn portal(link: Option<ObjectId>) -> ObjectKind {
        ObjectKind::Interactive {
            kind: InteractiveKind::Portal,
            activated: false,
            message: None,
            link,
            item: None,
        }
    }

    #[test]
    fn test_message_limits() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        add_agent(&mut w, "b", Coord::new(9, 9));
        let mut balance = BalanceConfig::default();
        balance.costs.max_message_len = 5;
        let view = WorldView::new(&w, &balance, 1);
        let agent = w.agent(&a).unwrap();
        let send = |text: &str, to: Option<&str>| {
            MessageHandler.propose(
                &Action::Message {
                    text: text.to_string(),
                    to: to.map(AgentId::new),
                },
                &view,
                agent,
            )
        };
        assert!(send("hi", Some("b")).is_ok());
        assert!(send("   ", None).unwrap_err().contains("empty"));
        assert!(send("too long", None).unwrap_err().contains("limit"));
        assert!(send("hi", Some("nobody")).unwrap_err().contains("unknown"));
    }

    #[test]
    fn test_scan_radius() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        let balance = BalanceConfig::default();
        let view = WorldView::new(&w, &balance, 1);
        let proposal = ScanHandler.propose(&Action::Scan, &view, w.agent(&a).unwrap()).unwrap();
        assert_eq!(
            proposal.effect,
            Effect::Reveal {
                center: Coord::new(4, 4),
                radius: balance.agent.vision_radius * balance.costs.scan_radius_multiplier
            }
        );
        assert_eq!(proposal.energy_cost, balance.costs.scan_energy);
    }

    #[test]
    fn test_portal_becomes_move() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        let entry = w.peek_object_id();
        let exit = ObjectId(entry.0 + 1);
        w.add_object(Coord::new(4, 5), portal(Some(exit)));
        w.add_object(Coord::new(12, 12), portal(Some(entry)));
        let balance = BalanceConfig::default();
        let view = WorldView::new(&w, &balance, 1);
        let proposal = InteractHandler
            .propose(&Action::Interact { object: None }, &view, w.agent(&a).unwrap())
            .unwrap();
        assert_eq!(
            proposal.effect,
            Effect::MoveAgent {
                from: Coord::new(4, 4),
                to: Coord::new(12, 12),
                portal: Some(entry)
            }
        );
    }

    #[test]
    fn test_used_cache_rejected() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        w.add_object(
            Coord::new(4, 4),
            ObjectKind::Interactive {
                kind: InteractiveKind::Cache,
                activated: true,
                message: None,
                link: None,
                item: None,
            },
        );
        let balance = BalanceConfig::default();
        let view = WorldView::new(&w, &balance, 1);
        let err = InteractHandler
            .propose(&Action::Interact { object: None }, &view, w.agent(&a).unwrap())
            .unwrap_err();
        assert!(err.contains("already been used"));
    }
}
