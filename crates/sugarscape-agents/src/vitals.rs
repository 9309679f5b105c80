//! Resource collection, metabolism, and aging applied to agents each tick.
//!
//! - Collecting takes everything on the agent's cell and folds it into the
//!   mean income averages
//! - Metabolism burns sugar and spice, pollutes the cell, and starves the
//!   agent when either metabolized stock falls below one unit
//! - Aging increments age at the end of the tick and kills agents that
//!   reach a finite maximum age

use sugarscape_types::AgentId;
use sugarscape_world::Harvest;
use tracing::trace;

use crate::agent::Agent;
use crate::death::{DeathCause, kill};
use crate::error::AgentError;
use crate::numeric::round2;
use crate::society::Society;

/// Harvest the agent's cell and update its mean income.
pub fn collect_resources(society: &mut Society, id: AgentId) -> Result<Harvest, AgentError> {
    let position = society.position_of(id)?;
    let harvest = society.grid.harvest(position)?;
    let alpha = society.params.income_alpha;
    let agent = society.population.require_mut(id)?;
    agent.sugar += harvest.sugar;
    agent.spice += harvest.spice;
    agent.sugar_mean_income =
        round2(alpha * harvest.sugar + (1.0 - alpha) * agent.sugar_mean_income);
    agent.spice_mean_income =
        round2(alpha * harvest.spice + (1.0 - alpha) * agent.spice_mean_income);
    trace!(agent = %id, sugar = harvest.sugar, spice = harvest.spice, "collected");
    Ok(harvest)
}

/// Whether a metabolized stock has fallen below one unit.
pub fn is_starving(agent: &Agent) -> bool {
    (agent.sugar < 1.0 && agent.sugar_metabolism > 0.0)
        || (agent.spice < 1.0 && agent.spice_metabolism > 0.0)
}

/// Burn one tick of metabolism. Returns the cause if the agent starved.
pub fn metabolize(
    society: &mut Society,
    id: AgentId,
) -> Result<Option<DeathCause>, AgentError> {
    let agent = society.population.require_mut(id)?;
    if !agent.alive {
        return Ok(None);
    }
    agent.sugar -= agent.sugar_metabolism;
    agent.spice -= agent.spice_metabolism;
    let (sugar_burned, spice_burned) = (agent.sugar_metabolism, agent.spice_metabolism);
    let starving = is_starving(agent);
    if let Some(position) = agent.position {
        society
            .grid
            .record_consumption(position, sugar_burned, spice_burned)?;
    }
    if starving {
        kill(society, id, DeathCause::Starvation)?;
        return Ok(Some(DeathCause::Starvation));
    }
    Ok(None)
}

/// Age the agent by one tick. Returns the cause if it died of old age.
pub fn age_agent(society: &mut Society, id: AgentId) -> Result<Option<DeathCause>, AgentError> {
    let agent = society.population.require_mut(id)?;
    if !agent.alive {
        return Ok(None);
    }
    agent.age = agent.age.saturating_add(1);
    if let Some(max_age) = agent.endowment.max_age
        && agent.age >= max_age
    {
        kill(society, id, DeathCause::OldAge)?;
        return Ok(Some(DeathCause::OldAge));
    }
    Ok(None)
}
