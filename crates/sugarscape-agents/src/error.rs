//! Error types for the sugarscape-agents crate.
//!
//! Protocols never fail on degenerate arithmetic or starvation; those are
//! defined domain rules. The variants here cover malformed configuration
//! and broken references between agents, grid, and population.

use sugarscape_types::{AgentId, Position};
use sugarscape_world::WorldError;

/// Errors that can occur during agent construction and per-tick protocols.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// An endowment or society parameter violates an invariant.
    #[error("invalid agent configuration: {reason}")]
    InvalidConfig {
        /// Description of the violated invariant.
        reason: String,
    },

    /// Agent with the given ID is not registered in the population.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// A two-agent protocol was asked to pair an agent with itself.
    #[error("agent {0} cannot interact with itself")]
    SelfInteraction(AgentId),

    /// The target cell already holds an agent.
    #[error("cell {0} is already occupied")]
    CellOccupied(Position),

    /// Reproduction failed a precondition check.
    #[error("reproduction failed: {reason}")]
    ReproductionFailed {
        /// Description of why reproduction was rejected.
        reason: String,
    },

    /// A grid operation failed.
    #[error(transparent)]
    World(#[from] WorldError),
}
