//! Ethics-weighted cell selection.
//!
//! An act-utilitarian aggregate over the mover's neighborhood: for each
//! agent, `weight * certainty * proximity * (intensity + duration + extent)`,
//! where the weight is that agent's own ethics weight.
//!
//! - certainty: 1 if the agent could reach the cell this tick, else 0
//! - proximity: inverse of the ticks needed to travel there
//! - intensity: urgency, `1 / (1 + days_to_death)`
//! - duration: ticks the cell would feed the agent, over the cell's capacity
//! - extent: neighborhood size relative to what the agent can see
//!
//! For agents other than the mover, intensity and duration are opportunity
//! costs and enter negatively.

use sugarscape_types::{AgentId, DecisionPolicy, EthicalFramework, Position};

use crate::agent::Agent;
use crate::decision::{Candidate, Survey};
use crate::error::AgentError;
use crate::society::Society;

fn ratio(part: usize, whole: u32) -> f64 {
    let part = u32::try_from(part).map_or(f64::MAX, f64::from);
    part / f64::from(whole)
}

fn contribution(
    society: &Society,
    agent: &Agent,
    is_mover: bool,
    cell: Position,
    neighborhood_size: usize,
) -> Result<f64, AgentError> {
    let site = society.grid.cell(cell)?;
    let metabolism = agent.sugar_metabolism + agent.spice_metabolism;
    let cell_duration = if metabolism > 0.0 {
        site.site_wealth() / metabolism
    } else {
        0.0
    };
    let max_site = site.max_site_wealth();
    let mut duration = if max_site > 0.0 {
        cell_duration / max_site
    } else {
        0.0
    };

    let distance = agent
        .position
        .and_then(|p| society.grid.cardinal_distance(p, cell));
    let certainty = match distance {
        Some(d) if d <= agent.movement => 1.0,
        _ => 0.0,
    };
    let ticks = match (distance, agent.movement) {
        (Some(d), m) if m > 0 => d.div_ceil(m).max(1),
        _ => 1,
    };
    let proximity = 1.0 / f64::from(ticks);

    let mut intensity = 1.0 / (1.0 + agent.days_to_death());
    let extent = if agent.vision > 0 {
        ratio(neighborhood_size, agent.vision.saturating_mul(4))
    } else {
        1.0
    };
    if !is_mover {
        intensity = -intensity;
        duration = -duration;
    }
    let weight = agent.decision_policy().ethics_weight();
    Ok(weight * certainty * proximity * (intensity + duration + extent))
}

/// Aggregate ethical value of `cell` for the mover under `framework`.
pub fn ethical_value(
    society: &Society,
    mover: AgentId,
    neighborhood: &[AgentId],
    cell: Position,
    framework: EthicalFramework,
) -> Result<f64, AgentError> {
    let mut total = 0.0;
    for id in neighborhood {
        let is_mover = *id == mover;
        let counted = match framework {
            EthicalFramework::Bentham => true,
            EthicalFramework::Egoistic => is_mover,
            EthicalFramework::Altruistic => !is_mover,
        };
        if !counted {
            continue;
        }
        let agent = society.population.require(*id)?;
        total += contribution(society, agent, is_mover, cell, neighborhood.len())?;
    }
    Ok(total)
}

/// Re-rank the surveyed candidates by ethical value.
///
/// Candidates are sorted by aggregate, descending, with welfare and then
/// distance breaking ties. The first with a strictly positive aggregate wins,
/// otherwise the selfish best is kept. With `top_ranked` the head of the
/// ranking wins whatever its sign.
pub fn choose_ethical_cell(
    society: &Society,
    mover: AgentId,
    policy: &DecisionPolicy,
    survey: &Survey,
) -> Result<Option<Candidate>, AgentError> {
    let DecisionPolicy::EthicsWeighted {
        framework,
        top_ranked,
        ..
    } = *policy
    else {
        return Ok(survey.best);
    };

    let mut scored = Vec::with_capacity(survey.candidates.len());
    for candidate in &survey.candidates {
        let score = ethical_value(
            society,
            mover,
            &survey.neighborhood,
            candidate.position,
            framework,
        )?;
        scored.push((*candidate, score));
    }
    scored.sort_by(|(a, a_score), (b, b_score)| {
        b_score
            .total_cmp(a_score)
            .then_with(|| b.wealth.total_cmp(&a.wealth))
            .then_with(|| a.distance.cmp(&b.distance))
    });

    let chosen = if top_ranked {
        scored.first()
    } else {
        scored.iter().find(|(_, score)| *score > 0.0)
    };
    Ok(chosen.map(|(c, _)| *c).or(survey.best))
}
