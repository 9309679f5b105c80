//! The per-tick protocol sequence for one agent.
//!
//! A living agent that has not yet acted this tick runs, in order: move,
//! neighbor update, collection, metabolism, tagging, trade, reproduction,
//! lending, disease, and aging. Starvation ends the sequence at once.

use rand::Rng;
use sugarscape_types::{AgentId, LoanId, Position};
use tracing::trace;

use crate::credit::run_lending;
use crate::culture::{hamming_distance, spread_tags};
use crate::death::DeathCause;
use crate::decision::move_to_best_cell;
use crate::error::AgentError;
use crate::immune::run_disease;
use crate::reproduction::reproduce;
use crate::social::Friend;
use crate::society::Society;
use crate::trade::trade_with_neighbors;
use crate::vitals::{age_agent, collect_resources, metabolize};

/// What happened during one agent's turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentTurn {
    /// Whether the agent ran its protocols at all this tick.
    pub acted: bool,
    /// The new cell, if the agent moved.
    pub moved_to: Option<Position>,
    /// Neighbors whose tags were nudged.
    pub tagged: u32,
    /// Executed trade iterations over all partners.
    pub trades: u32,
    /// Children born with the agent as initiator.
    pub children: Vec<AgentId>,
    /// Loans the agent originated as lender.
    pub loans: Vec<LoanId>,
    /// Why the agent died during its turn, if it did.
    pub died: Option<DeathCause>,
}

/// Refresh the agent's neighbor lists, peer records, and friendships.
pub fn update_neighbors(society: &mut Society, id: AgentId) -> Result<(), AgentError> {
    let von_neumann = society.neighbors_of(id)?;
    let moore = society.moore_neighbors_of(id)?;
    let tick = society.tick;

    let mut seen = Vec::with_capacity(von_neumann.len());
    for neighbor in &von_neumann {
        let peer = society.population.require(*neighbor)?;
        seen.push((*neighbor, peer.mrs, peer.tags.clone()));
    }

    let agent = society.population.require_mut(id)?;
    let max_friends = agent.endowment.max_friends;
    for (neighbor, mrs, tags) in seen {
        if agent.ledger.knows(neighbor) {
            agent.ledger.record_visit(neighbor, tick);
            agent.ledger.record_mrs(neighbor, tick, mrs);
        } else {
            agent.ledger.meet(neighbor, tick);
        }
        let distance = match (agent.tags.as_deref(), tags.as_deref()) {
            (Some(own), Some(theirs)) => hamming_distance(own, theirs),
            _ => 0,
        };
        agent.ledger.update_friend(
            Friend {
                agent: neighbor,
                hamming_distance: distance,
            },
            max_friends,
        );
    }
    agent.ledger.set_neighbors(von_neumann, moore);
    Ok(())
}

/// Run the agent's full protocol sequence for the current tick.
///
/// Dead agents, agents without a cell, and agents that already acted this
/// tick are skipped with `acted == false`.
pub fn run_agent_tick(
    society: &mut Society,
    id: AgentId,
    rng: &mut impl Rng,
) -> Result<AgentTurn, AgentError> {
    let tick = society.tick;
    let agent = society.population.require_mut(id)?;
    if !agent.alive || agent.position.is_none() || agent.last_moved == Some(tick) {
        return Ok(AgentTurn::default());
    }
    agent.last_moved = Some(tick);

    let mut turn = AgentTurn {
        acted: true,
        ..AgentTurn::default()
    };
    turn.moved_to = move_to_best_cell(society, id, rng)?;
    update_neighbors(society, id)?;
    collect_resources(society, id)?;
    if let Some(cause) = metabolize(society, id)? {
        turn.died = Some(cause);
        return Ok(turn);
    }

    turn.tagged = spread_tags(society, id, rng)?;
    turn.trades = trade_with_neighbors(society, id, rng)?
        .iter()
        .fold(0_u32, |sum, (_, n)| sum.saturating_add(n.transactions));
    turn.children = reproduce(society, id, rng)?;
    turn.loans = run_lending(society, id, rng)?;
    run_disease(society, id, rng)?;
    turn.died = age_agent(society, id)?;

    trace!(agent = %id, tick, trades = turn.trades, "turn complete");
    Ok(turn)
}
