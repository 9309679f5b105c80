//! Death conditions and estate distribution.
//!
//! An agent dies of starvation, old age, or combat. Death is immediate: the
//! agent surrenders its cell, its remaining sugar and spice go to the
//! beneficiaries its inheritance policy names, and it becomes an inert
//! record that other agents' ledgers may still reference.

use serde::{Deserialize, Serialize};
use sugarscape_types::{AgentId, InheritancePolicy, Sex};
use tracing::{debug, info};

use crate::error::AgentError;
use crate::numeric::round2;
use crate::society::Society;

/// The cause of an agent's death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// Sugar or spice fell below one unit while still metabolized.
    Starvation,
    /// Age reached the agent's maximum age.
    OldAge,
    /// Killed by an attacker moving onto its cell.
    Combat,
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Starvation => write!(f, "starvation"),
            Self::OldAge => write!(f, "old age"),
            Self::Combat => write!(f, "combat"),
        }
    }
}

/// How a deceased agent's estate was divided.
#[derive(Debug, Clone, PartialEq)]
pub struct Estate {
    /// Agents who received a share.
    pub beneficiaries: Vec<AgentId>,
    /// Sugar given to each beneficiary.
    pub sugar_share: f64,
    /// Spice given to each beneficiary.
    pub spice_share: f64,
}

/// Kill an agent: mark it dead, vacate its cell, and distribute its estate.
///
/// Killing an agent that is already dead is a no-op returning `None`.
pub fn kill(
    society: &mut Society,
    id: AgentId,
    cause: DeathCause,
) -> Result<Option<Estate>, AgentError> {
    let agent = society.population.require_mut(id)?;
    if !agent.alive {
        return Ok(None);
    }
    agent.alive = false;
    agent.cause_of_death = Some(cause);
    let position = agent.position.take();
    let age = agent.age;
    if let Some(position) = position {
        society.grid.vacate(id, position);
    }
    society.events.record_death(cause);
    info!(agent = %id, %cause, age, tick = society.tick, "agent died");

    distribute_estate(society, id).map(Some)
}

/// Living agents who inherit from `id` under its inheritance policy.
pub fn beneficiaries(society: &Society, id: AgentId) -> Result<Vec<AgentId>, AgentError> {
    let deceased = society.population.require(id)?;
    let population = &society.population;
    let living_children = || {
        deceased
            .ledger
            .children()
            .iter()
            .copied()
            .filter(|c| population.is_alive(*c))
    };
    let of_sex = |sex: Sex| -> Vec<AgentId> {
        living_children()
            .filter(|c| population.get(*c).is_some_and(|a| a.sex() == sex))
            .collect()
    };
    Ok(match deceased.inheritance_policy() {
        InheritancePolicy::None => Vec::new(),
        InheritancePolicy::Children => living_children().collect(),
        InheritancePolicy::Sons => of_sex(Sex::Male),
        InheritancePolicy::Daughters => of_sex(Sex::Female),
        InheritancePolicy::Friends => deceased
            .ledger
            .friends()
            .iter()
            .map(|f| f.agent)
            .filter(|f| population.is_alive(*f))
            .collect(),
    })
}

/// Split the agent's stocks evenly, to the cent, among its beneficiaries.
///
/// The agent's own stocks are zeroed whether or not anyone inherits.
pub fn distribute_estate(society: &mut Society, id: AgentId) -> Result<Estate, AgentError> {
    let heirs = beneficiaries(society, id)?;
    let deceased = society.population.require_mut(id)?;
    let (sugar, spice) = (deceased.sugar, deceased.spice);
    deceased.sugar = 0.0;
    deceased.spice = 0.0;

    let count = u32::try_from(heirs.len()).unwrap_or(u32::MAX);
    if count == 0 {
        return Ok(Estate {
            beneficiaries: heirs,
            sugar_share: 0.0,
            spice_share: 0.0,
        });
    }
    let sugar_share = round2(sugar / f64::from(count));
    let spice_share = round2(spice / f64::from(count));
    for heir in &heirs {
        let heir = society.population.require_mut(*heir)?;
        heir.sugar += sugar_share;
        heir.spice += spice_share;
    }
    debug!(agent = %id, heirs = count, sugar_share, spice_share, "estate distributed");
    Ok(Estate {
        beneficiaries: heirs,
        sugar_share,
        spice_share,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sugarscape_types::Position;

    use super::*;
    use crate::agent::fixtures::endowment;
    use crate::society::fixtures::{place, society};

    fn family(policy: InheritancePolicy) -> (Society, AgentId, AgentId, AgentId) {
        let mut soc = society(5, 5);
        let mut parent = endowment(0.0, 0.0);
        parent.inheritance_policy = policy;
        let p = place(&mut soc, parent, 0, 0);
        let mut son = endowment(1.0, 1.0);
        son.sex = Sex::Male;
        let s = place(&mut soc, son, 2, 2);
        let d = place(&mut soc, endowment(1.0, 1.0), 4, 4);
        let tick = soc.tick;
        let parent = soc.population.get_mut(p).unwrap();
        parent.ledger.add_child(s, tick);
        parent.ledger.add_child(d, tick);
        parent.sugar = 10.0;
        parent.spice = 7.0;
        (soc, p, s, d)
    }

    #[test]
    fn kill_vacates_cell_and_counts() {
        let (mut soc, p, _, _) = family(InheritancePolicy::None);
        let estate = kill(&mut soc, p, DeathCause::OldAge).unwrap().unwrap();
        assert!(estate.beneficiaries.is_empty());
        let dead = soc.population.get(p).unwrap();
        assert!(!dead.alive);
        assert!(dead.position.is_none());
        assert!(dead.sugar.abs() < f64::EPSILON);
        assert_eq!(soc.grid.occupant(Position::new(0, 0)), None);
        assert_eq!(soc.events.old_age_deaths, 1);
        assert!(kill(&mut soc, p, DeathCause::OldAge).unwrap().is_none());
        assert_eq!(soc.events.deaths(), 1);
    }

    #[test]
    fn children_split_estate() {
        let (mut soc, p, s, d) = family(InheritancePolicy::Children);
        let estate = kill(&mut soc, p, DeathCause::Starvation).unwrap().unwrap();
        assert_eq!(estate.beneficiaries, vec![s, d]);
        assert!((estate.sugar_share - 5.0).abs() < f64::EPSILON);
        assert!((estate.spice_share - 3.5).abs() < f64::EPSILON);
        let son = soc.population.get(s).unwrap();
        assert!((son.sugar - 6.0).abs() < f64::EPSILON);
        assert!((son.spice - 4.5).abs() < f64::EPSILON);
        let parent = soc.population.get(p).unwrap();
        assert!(parent.sugar.abs() < f64::EPSILON && parent.spice.abs() < f64::EPSILON);
    }

    #[test]
    fn sons_only_and_dead_children_skipped() {
        let (mut soc, p, s, d) = family(InheritancePolicy::Sons);
        kill(&mut soc, d, DeathCause::Combat).unwrap();
        let estate = kill(&mut soc, p, DeathCause::Combat).unwrap().unwrap();
        assert_eq!(estate.beneficiaries, vec![s]);
        assert!((estate.sugar_share - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn uneven_split_rounds_to_cents() {
        let (mut soc, p, s, d) = family(InheritancePolicy::Children);
        let extra = place(&mut soc, endowment(0.0, 0.0), 3, 0);
        let tick = soc.tick;
        soc.population.get_mut(p).unwrap().ledger.add_child(extra, tick);
        let estate = kill(&mut soc, p, DeathCause::Starvation).unwrap().unwrap();
        assert_eq!(estate.beneficiaries, vec![s, d, extra]);
        assert!((estate.sugar_share - 3.33).abs() < 1e-9);
        let handed_out = estate.sugar_share * 3.0;
        assert!((handed_out - 10.0).abs() <= 0.01 * 3.0);
    }
}
