//! Movement decisions: which reachable cell an agent moves to.
//!
//! Every candidate lies on one of the four cardinal rays within the agent's
//! movement range. Vision may reach further than movement; it only informs
//! the neighborhood and the retaliation estimate. Each candidate is valued
//! by the welfare the agent would have after collecting the cell (and
//! looting its occupant, if any), discounted by the cell's pollution.
//!
//! The selfish policy takes the highest-valued candidate, nearest first on
//! ties. The ethics-weighted policy re-ranks the same candidates (see
//! [`crate::ethics`]). Selection has no side effects besides random draws;
//! [`move_to_best_cell`] performs the move and any combat.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::seq::SliceRandom;
use sugarscape_types::{AgentId, Position};
use tracing::trace;

use crate::agent::Agent;
use crate::combat::attack;
use crate::culture::Tribe;
use crate::error::AgentError;
use crate::ethics::choose_ethical_cell;
use crate::numeric::approx_eq;
use crate::society::Society;
use crate::utility::welfare;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A reachable cell that passed the combat filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// The cell.
    pub position: Position,
    /// Cardinal distance from the mover.
    pub distance: u32,
    /// Pollution-discounted welfare of moving there.
    pub wealth: f64,
    /// The occupant the mover would have to defeat.
    pub prey: Option<AgentId>,
}

impl Candidate {
    /// More valuable, or equally valuable and closer.
    pub fn beats(&self, other: &Self) -> bool {
        if approx_eq(self.wealth, other.wealth) {
            self.distance < other.distance
        } else {
            self.wealth > other.wealth
        }
    }
}

/// Everything the mover learned while surveying its surroundings.
#[derive(Debug, Clone, Default)]
pub struct Survey {
    /// Valid candidates in evaluation order.
    pub candidates: Vec<Candidate>,
    /// The selfish choice, if any candidate was valid.
    pub best: Option<Candidate>,
    /// Living agents in vision, followed by the mover itself.
    pub neighborhood: Vec<AgentId>,
}

// ---------------------------------------------------------------------------
// Survey
// ---------------------------------------------------------------------------

/// Strongest visible member of each tribe, keyed by tribe (or its absence).
fn retaliators(society: &Society, seen: &[AgentId]) -> BTreeMap<Option<Tribe>, f64> {
    let mut strongest: BTreeMap<Option<Tribe>, f64> = BTreeMap::new();
    for other in seen.iter().filter_map(|id| society.population.get(*id)) {
        let entry = strongest.entry(other.tribe).or_insert(other.wealth());
        *entry = entry.max(other.wealth());
    }
    strongest
}

/// Living agents on the cardinal rays within the agent's vision, deduplicated.
fn agents_in_vision(society: &Society, agent: &Agent, origin: Position) -> Vec<AgentId> {
    let mut seen = BTreeSet::new();
    society
        .grid
        .cardinal_rays(origin, agent.vision)
        .into_iter()
        .filter_map(|(p, _)| society.grid.occupant(p))
        .filter(|id| *id != agent.id && society.population.is_alive(*id))
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Value every reachable cell and pick the selfish best.
///
/// Candidates are visited in random order. A cell is skipped when it is
/// occupied and the agent is not aggressive, when its occupant shares the
/// agent's tribe or is wealthier, or when the occupant's strongest visible
/// tribe-mate could out-wealth the agent even after the gain.
pub fn survey(
    society: &Society,
    id: AgentId,
    rng: &mut impl Rng,
) -> Result<Survey, AgentError> {
    let agent = society.population.require(id)?;
    let origin = society.position_of(id)?;
    let seen = agents_in_vision(society, agent, origin);
    let strongest = retaliators(society, &seen);
    let max_loot = society.params.max_combat_loot;

    let mut reachable = society.grid.cardinal_rays(origin, agent.movement);
    reachable.shuffle(rng);

    let mut candidates = Vec::new();
    let mut best: Option<Candidate> = None;
    for (position, distance) in reachable {
        let cell = society.grid.cell(position)?;
        let occupant = cell.occupant();
        if occupant.is_some() && agent.aggression_factor <= 0.0 {
            continue;
        }
        let prey = occupant.and_then(|p| society.population.get(p)).filter(|p| p.alive);
        if let Some(prey) = prey
            && (prey.tribe == agent.tribe || prey.wealth() > agent.wealth())
        {
            continue;
        }
        let (loot_sugar, loot_spice) = prey.map_or((0.0, 0.0), |p| {
            (
                agent.aggression_factor * max_loot.min(p.sugar).max(0.0),
                agent.aggression_factor * max_loot.min(p.spice).max(0.0),
            )
        });
        let value = welfare(agent, cell.sugar + loot_sugar, cell.spice + loot_spice);
        let wealth = value / (1.0 + cell.pollution);
        if let Some(prey) = prey {
            let deterrent = strongest.get(&prey.tribe).copied().unwrap_or(0.0);
            if deterrent > agent.wealth() + wealth {
                continue;
            }
        }
        let candidate = Candidate {
            position,
            distance,
            wealth,
            prey: prey.map(|p| p.id),
        };
        if best.is_none_or(|b| candidate.beats(&b)) {
            best = Some(candidate);
        }
        candidates.push(candidate);
    }

    let mut neighborhood = seen;
    neighborhood.push(id);
    Ok(Survey {
        candidates,
        best,
        neighborhood,
    })
}

/// Pick the destination under the agent's decision policy.
///
/// Returns `None` when no reachable cell is valid and the agent stays put.
pub fn choose_destination(
    society: &Society,
    id: AgentId,
    rng: &mut impl Rng,
) -> Result<Option<Candidate>, AgentError> {
    let survey = survey(society, id, rng)?;
    let policy = *society.population.require(id)?.decision_policy();
    if policy.is_ethical() {
        return choose_ethical_cell(society, id, &policy, &survey);
    }
    Ok(survey.best)
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Move `id` onto `destination`, keeping cell and agent references in step.
///
/// Any agent still recorded on the destination is evicted and loses its
/// position.
pub fn relocate(
    society: &mut Society,
    id: AgentId,
    destination: Position,
) -> Result<(), AgentError> {
    let origin = society.position_of(id)?;
    if origin == destination {
        return Ok(());
    }
    society.grid.vacate(id, origin);
    if let Some(evicted) = society.grid.place(id, destination)? {
        society.population.require_mut(evicted)?.position = None;
    }
    society.population.require_mut(id)?.position = Some(destination);
    trace!(agent = %id, from = %origin, to = %destination, "moved");
    Ok(())
}

/// Choose a destination and go there, fighting its occupant if necessary.
///
/// Returns the new position, or `None` if the agent stayed.
pub fn move_to_best_cell(
    society: &mut Society,
    id: AgentId,
    rng: &mut impl Rng,
) -> Result<Option<Position>, AgentError> {
    let Some(choice) = choose_destination(society, id, rng)? else {
        return Ok(None);
    };
    let aggressive = society.population.require(id)?.aggression_factor > 0.0;
    if let Some(prey) = society.grid.occupant(choice.position)
        && prey != id
    {
        if !aggressive {
            return Ok(None);
        }
        attack(society, id, prey)?;
    }
    relocate(society, id, choice.position)?;
    Ok(Some(choice.position))
}
