//! FIGHT.

use crate::actions::handlers::mismatch;
use crate::actions::{Action, ActionHandler, ActionKind, Effect, FightTarget, Proposal, WorldView};
use crate::world::Agent;

/// Attacks an adjacent agent or structure.
///
/// Damage is not computed here: the resolver sums every hit on a target from
/// the pre-tick snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct FightHandler;

impl ActionHandler for FightHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Fight
    }

    fn propose(&self, action: &Action, view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        let Action::Fight { target } = action else {
            return Err(mismatch(ActionKind::Fight, action));
        };
        let cost = view.balance.costs.fight_energy;
        let effect = match target {
            FightTarget::Agent(id) => {
                if *id == agent.id {
                    return Err("cannot attack yourself".to_string());
                }
                let victim = view
                    .world
                    .agent(id)
                    .filter(|v| v.alive)
                    .ok_or_else(|| format!("no living agent {id}"))?;
                if !victim.position.touches(agent.position) {
                    return Err(format!("{id} is not adjacent"));
                }
                Effect::Attack { target: id.clone() }
            }
            FightTarget::Object(id) => {
                let object = view
                    .world
                    .objects
                    .get(id)
                    .ok_or_else(|| format!("no object {id}"))?;
                let Some((_, owner)) = object.as_structure() else {
                    return Err(format!("{} is not a structure", object.label()));
                };
                if owner == Some(&agent.id) {
                    return Err(format!("{} is your own", object.label()));
                }
                if !object.position.touches(agent.position) {
                    return Err(format!("{} is not adjacent", object.label()));
                }
                Effect::DamageStructure { object: *id }
            }
        };
        Ok(Proposal::new(effect, cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::handlers::test_support::{add_agent, world};
    use crate::config::BalanceConfig;
    use crate::world::{AgentId, Coord, ObjectKind, StructureKind};

    #[test]
    fn test_fight_adjacent_agent() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        add_agent(&mut w, "b", Coord::new(5, 5));
        add_agent(&mut w, "c", Coord::new(8, 8));
        let balance = BalanceConfig::default();
        let view = WorldView::new(&w, &balance, 1);
        let agent = w.agent(&a).unwrap();
        let fight = |id: &str| {
            FightHandler.propose(
                &Action::Fight {
                    target: FightTarget::Agent(AgentId::new(id)),
                },
                &view,
                agent,
            )
        };

        let ok = fight("b").unwrap();
        assert_eq!(ok.effect, Effect::Attack { target: AgentId::new("b") });
        assert_eq!(ok.energy_cost, balance.costs.fight_energy);
        assert!(fight("c").unwrap_err().contains("not adjacent"));
        assert!(fight("a").unwrap_err().contains("yourself"));
        assert!(fight("zed").is_err());
    }

    #[test]
    fn test_fight_structures() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        let wall = w.add_object(
            Coord::new(4, 5),
            ObjectKind::Structure {
                kind: StructureKind::Wall,
                hp: 5,
                owner: Some(AgentId::new("b")),
            },
        );
        let own = w.add_object(
            Coord::new(3, 4),
            ObjectKind::Structure {
                kind: StructureKind::Beacon,
                hp: 5,
                owner: Some(a.clone()),
            },
        );
        let balance = BalanceConfig::default();
        let view = WorldView::new(&w, &balance, 1);
        let agent = w.agent(&a).unwrap();
        let hit = |id| {
            FightHandler.propose(
                &Action::Fight {
                    target: FightTarget::Object(id),
                },
                &view,
                agent,
            )
        };
        assert_eq!(hit(wall).unwrap().effect, Effect::DamageStructure { object: wall });
        assert!(hit(own).unwrap_err().contains("your own"));
    }
}
