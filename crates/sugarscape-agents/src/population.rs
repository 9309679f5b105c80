//! The population registry, sole owner of every agent.
//!
//! Agents are stored densely and addressed by sequential [`AgentId`]s, so a
//! lookup is an index and two agents can be borrowed mutably at once for the
//! bilateral protocols. Dead agents are never removed: they remain as
//! inert historical references for other agents' ledgers.

use sugarscape_types::{AgentEndowment, AgentId, Position};
use sugarscape_world::Grid;
use tracing::debug;

use crate::agent::Agent;
use crate::config::SocietyParams;
use crate::error::AgentError;

/// Every agent that has ever lived, indexed by ID.
#[derive(Debug, Clone, Default)]
pub struct Population {
    agents: Vec<Agent>,
}

impl Population {
    /// Create an empty population.
    pub const fn new() -> Self {
        Self { agents: Vec::new() }
    }

    /// The ID the next spawned agent will receive.
    pub fn next_id(&self) -> Option<AgentId> {
        AgentId::from_index(self.agents.len())
    }

    /// Create an agent, place it on an empty cell, and register it.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::CellOccupied`] if `position` already holds an
    /// agent, [`AgentError::InvalidConfig`] for a malformed endowment, and
    /// [`AgentError::World`] for an off-grid position.
    pub fn spawn(
        &mut self,
        grid: &mut Grid,
        endowment: AgentEndowment,
        position: Position,
        tick: u64,
        params: &SocietyParams,
    ) -> Result<AgentId, AgentError> {
        if grid.cell(position)?.is_occupied() {
            return Err(AgentError::CellOccupied(position));
        }
        let id = self.next_id().ok_or_else(|| AgentError::InvalidConfig {
            reason: "population exhausted the agent ID space".to_owned(),
        })?;
        let mut agent = Agent::new(id, endowment, tick, params)?;
        grid.place(id, position)?;
        agent.position = Some(position);
        self.agents.push(agent);
        debug!(agent = %id, %position, tick, "agent spawned");
        Ok(id)
    }

    /// Borrow an agent.
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index()?)
    }

    /// Mutably borrow an agent.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.index()?)
    }

    /// Borrow an agent that must exist.
    pub fn require(&self, id: AgentId) -> Result<&Agent, AgentError> {
        self.get(id).ok_or(AgentError::AgentNotFound(id))
    }

    /// Mutably borrow an agent that must exist.
    pub fn require_mut(&mut self, id: AgentId) -> Result<&mut Agent, AgentError> {
        self.get_mut(id).ok_or(AgentError::AgentNotFound(id))
    }

    /// Mutably borrow two distinct agents at once, in argument order.
    pub fn pair_mut(
        &mut self,
        first: AgentId,
        second: AgentId,
    ) -> Result<(&mut Agent, &mut Agent), AgentError> {
        let a = first.index().ok_or(AgentError::AgentNotFound(first))?;
        let b = second.index().ok_or(AgentError::AgentNotFound(second))?;
        if a == b {
            return Err(AgentError::SelfInteraction(first));
        }
        let (low, high, swapped) = if a < b { (a, b, false) } else { (b, a, true) };
        let (head, tail) = self
            .agents
            .split_at_mut_checked(high)
            .ok_or(AgentError::AgentNotFound(if swapped { first } else { second }))?;
        let low_agent = head
            .get_mut(low)
            .ok_or(AgentError::AgentNotFound(if swapped { second } else { first }))?;
        let high_agent = tail
            .first_mut()
            .ok_or(AgentError::AgentNotFound(if swapped { first } else { second }))?;
        if swapped {
            Ok((high_agent, low_agent))
        } else {
            Ok((low_agent, high_agent))
        }
    }

    /// Whether the agent exists and is alive.
    pub fn is_alive(&self, id: AgentId) -> bool {
        self.get(id).is_some_and(|a| a.alive)
    }

    /// Every agent ever registered, living or dead.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Living agents only.
    pub fn living(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.alive)
    }

    /// IDs of living agents in ID order.
    pub fn living_ids(&self) -> Vec<AgentId> {
        self.living().map(|a| a.id).collect()
    }

    /// Number of living agents.
    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    /// Number of agents ever registered.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agent was ever registered.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
