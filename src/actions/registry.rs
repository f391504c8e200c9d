//! Handler trait and the kind -> handler dispatch table.

use std::collections::BTreeMap;
use std::fmt;

use crate::actions::handlers;
use crate::actions::{Action, ActionKind, ActionRequest, Proposal, ProposedEffect};
use crate::config::BalanceConfig;
use crate::world::{Agent, World};

/// Read-only view handed to handlers.
#[derive(Debug, Clone, Copy)]
pub struct WorldView<'a> {
    /// Pre-tick world.
    pub world: &'a World,
    /// Balance table.
    pub balance: &'a BalanceConfig,
    /// Tick being resolved.
    pub tick: u64,
}

impl<'a> WorldView<'a> {
    /// Create a view.
    #[must_use]
    pub const fn new(world: &'a World, balance: &'a BalanceConfig, tick: u64) -> Self {
        Self {
            world,
            balance,
            tick,
        }
    }
}

/// Validation and effect proposal for one action kind.
///
/// Implementations must be pure: they only read the view and the agent, so
/// the engine may call them for every agent in parallel.
pub trait ActionHandler: Send + Sync {
    /// Kind this handler serves.
    fn kind(&self) -> ActionKind;

    /// Describe what `action` would do, or explain why it is not allowed.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when `agent` cannot perform `action`.
    fn propose(&self, action: &Action, view: &WorldView<'_>, agent: &Agent) -> Result<Proposal, String>;

    /// Check `action` without building an effect.
    ///
    /// # Errors
    ///
    /// Same reasons as [`ActionHandler::propose`].
    fn validate(&self, action: &Action, view: &WorldView<'_>, agent: &Agent) -> Result<(), String> {
        self.propose(action, view, agent).map(|_| ())
    }
}

/// Dispatch table from action kind to handler.
pub struct HandlerRegistry {
    handlers: BTreeMap<ActionKind, Box<dyn ActionHandler>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl HandlerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// A registry with all built-in handlers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for handler in handlers::builtin() {
            registry.register(handler);
        }
        registry
    }

    /// Install a handler, returning the one it replaces.
    pub fn register(&mut self, handler: Box<dyn ActionHandler>) -> Option<Box<dyn ActionHandler>> {
        self.handlers.insert(handler.kind(), handler)
    }

    /// Handler for a kind.
    #[must_use]
    pub fn get(&self, kind: ActionKind) -> Option<&dyn ActionHandler> {
        self.handlers.get(&kind).map(|h| &**h)
    }

    /// Validate a request and build its effect.
    ///
    /// # Errors
    ///
    /// Returns the reason the action cannot run: no handler, an unknown or dead
    /// agent, a handler rejection, or too little energy.
    pub fn evaluate(&self, request: &ActionRequest, view: &WorldView<'_>) -> Result<ProposedEffect, String> {
        let kind = request.action.kind();
        let handler = self
            .get(kind)
            .ok_or_else(|| format!("no handler registered for {kind}"))?;
        let agent = view
            .world
            .agent(&request.agent)
            .ok_or_else(|| format!("unknown agent {}", request.agent))?;
        if !agent.alive {
            return Err("agent is dead".to_string());
        }
        handler.validate(&request.action, view, agent)?;
        let proposal = handler.propose(&request.action, view, agent)?;
        if proposal.energy_cost > agent.energy {
            return Err(format!(
                "not enough energy: need {}, have {}",
                proposal.energy_cost, agent.energy
            ));
        }
        Ok(ProposedEffect::new(request.agent.clone(), kind, proposal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Effect;
    use crate::mapgen::MapPreset;
    use crate::world::{AgentId, Biome, Cell, Controller, Coord, Map, Terrain};

    struct Refuser;

    impl ActionHandler for Refuser {
        fn kind(&self) -> ActionKind {
            ActionKind::Wait
        }

        fn propose(&self, _: &Action, _: &WorldView<'_>, _: &Agent) -> Result<Proposal, String> {
            Err("waiting is forbidden".to_string())
        }
    }

    fn world() -> World {
        let map = Map::filled(8, Cell::new(Terrain::Plains, Biome::Grassland)).unwrap();
        let mut world = World::new(0, MapPreset::Default, map);
        let agent = Agent::new(
            AgentId::new("a"),
            "a",
            Controller::Adversary {
                profile: "test".to_string(),
            },
            "",
            Coord::new(1, 1),
            &BalanceConfig::default(),
        );
        world.agents.insert(agent.id.clone(), agent);
        world
    }

    #[test]
    fn test_defaults_cover_every_kind() {
        let registry = HandlerRegistry::with_defaults();
        for kind in ActionKind::ALL {
            assert_eq!(registry.get(kind).map(ActionHandler::kind), Some(kind));
        }
    }

    #[test]
    fn test_override_replaces_handler() {
        let world = world();
        let balance = BalanceConfig::default();
        let view = WorldView::new(&world, &balance, 1);
        let request = ActionRequest::wait(AgentId::new("a"), 1);

        let mut registry = HandlerRegistry::with_defaults();
        let effect = registry.evaluate(&request, &view).unwrap();
        assert_eq!(effect.effect, Effect::Wait);

        assert!(registry.register(Box::new(Refuser)).is_some());
        assert_eq!(
            registry.evaluate(&request, &view),
            Err("waiting is forbidden".to_string())
        );
    }

    #[test]
    fn test_dead_and_unknown_agents_rejected() {
        let mut world = world();
        let balance = BalanceConfig::default();
        let registry = HandlerRegistry::with_defaults();
        let ghost = ActionRequest::wait(AgentId::new("ghost"), 1);
        assert!(registry.evaluate(&ghost, &WorldView::new(&world, &balance, 1)).is_err());

        world.agent_mut(&AgentId::new("a")).unwrap().kill(3);
        let dead = ActionRequest::wait(AgentId::new("a"), 1);
        assert_eq!(
            registry.evaluate(&dead, &WorldView::new(&world, &balance, 1)),
            Err("agent is dead".to_string())
        );
    }
}
