//! CLAIM.

use crate::actions::handlers::mismatch;
use crate::actions::{Action, ActionHandler, ActionKind, Effect, Proposal, WorldView};
use crate::world::Agent;

/// Claims an unowned tile or captures someone else's.
///
/// Targets default to the agent's own tile and must lie within the claim
/// radius. Re-claiming an owned tile is allowed and free.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimHandler;

impl ActionHandler for ClaimHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Claim
    }

    fn propose(&self, action: &Action, view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String> {
        let Action::Claim { target } = action else {
            return Err(mismatch(ActionKind::Claim, action));
        };
        let tile = target.unwrap_or(agent.position);
        let map = &view.world.map;
        if !map.in_bounds(tile) {
            return Err(format!("{tile} is out of bounds"));
        }
        if !map.is_passable(tile) {
            return Err(format!("{tile} is impassable and cannot be claimed"));
        }
        let radius = view.balance.agent.claim_radius;
        if tile.chebyshev(agent.position) > radius {
            return Err(format!("{tile} is beyond claim radius {radius}"));
        }

        let costs = &view.balance.costs;
        let proposal = match map.owner(tile) {
            Some(owner) if *owner == agent.id => {
                Proposal::free(Effect::ClaimTile { tile, capture: false })
            }
            Some(_) => Proposal::new(Effect::ClaimTile { tile, capture: true }, costs.capture_energy),
            None => Proposal::new(Effect::ClaimTile { tile, capture: false }, costs.claim_energy),
        };
        Ok(proposal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::handlers::test_support::{add_agent, world};
    use crate::config::BalanceConfig;
    use crate::world::{AgentId, Coord};

    #[test]
    fn test_claim_costs() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(4, 4));
        w.map.set_owner(Coord::new(5, 4), AgentId::new("b"));
        w.map.set_owner(Coord::new(3, 4), a.clone());
        let balance = BalanceConfig::default();
        let view = WorldView::new(&w, &balance, 1);
        let agent = w.agent(&a).unwrap();
        let claim = |target| ClaimHandler.propose(&Action::Claim { target }, &view, agent);

        assert_eq!(claim(None).unwrap().energy_cost, balance.costs.claim_energy);
        let capture = claim(Some(Coord::new(5, 4))).unwrap();
        assert_eq!(capture.energy_cost, balance.costs.capture_energy);
        assert!(matches!(capture.effect, Effect::ClaimTile { capture: true, .. }));
        assert_eq!(claim(Some(Coord::new(3, 4))).unwrap().energy_cost, 0);
    }

    #[test]
    fn test_claim_rejections() {
        let mut w = world();
        let a = add_agent(&mut w, "a", Coord::new(1, 1));
        let balance = BalanceConfig::default();
        let view = WorldView::new(&w, &balance, 1);
        let agent = w.agent(&a).unwrap();
        let claim = |target| ClaimHandler.propose(&Action::Claim { target: Some(target) }, &view, agent);

        assert!(claim(Coord::new(0, 0)).unwrap_err().contains("impassable"));
        assert!(claim(Coord::new(3, 1)).unwrap_err().contains("radius"));
        assert!(claim(Coord::new(99, 1)).unwrap_err().contains("out of bounds"));
    }
}
