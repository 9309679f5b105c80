//! Combat between a mover and the occupant of its destination.

use sugarscape_types::AgentId;
use tracing::info;

use crate::death::{DeathCause, kill};
use crate::error::AgentError;
use crate::society::Society;

/// Loot taken from a defeated agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatOutcome {
    /// Sugar transferred to the attacker.
    pub sugar_loot: f64,
    /// Spice transferred to the attacker.
    pub spice_loot: f64,
}

/// Loot up to the society's maximum from `prey`, then kill it.
///
/// The prey's remaining stocks pass through its own inheritance policy.
/// The attacker does not move; see [`crate::decision::relocate`].
pub fn attack(
    society: &mut Society,
    attacker: AgentId,
    prey: AgentId,
) -> Result<CombatOutcome, AgentError> {
    let max_loot = society.params.max_combat_loot;
    let (hunter, victim) = society.population.pair_mut(attacker, prey)?;
    let sugar_loot = max_loot.min(victim.sugar).max(0.0);
    let spice_loot = max_loot.min(victim.spice).max(0.0);
    victim.sugar -= sugar_loot;
    victim.spice -= spice_loot;
    hunter.sugar += sugar_loot;
    hunter.spice += spice_loot;
    info!(
        attacker = %attacker,
        prey = %prey,
        sugar_loot,
        spice_loot,
        "combat"
    );
    kill(society, prey, DeathCause::Combat)?;
    Ok(CombatOutcome {
        sugar_loot,
        spice_loot,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sugarscape_types::InheritancePolicy;

    use super::*;
    use crate::agent::fixtures::endowment;
    use crate::society::fixtures::{place, society};

    #[test]
    fn loot_capped_and_remainder_inherited() {
        let mut soc = society(5, 5);
        soc.params.max_combat_loot = 3.0;
        let attacker = place(&mut soc, endowment(1.0, 1.0), 0, 0);
        let mut victim = endowment(10.0, 2.0);
        victim.inheritance_policy = InheritancePolicy::Children;
        let prey = place(&mut soc, victim, 0, 1);
        let child = place(&mut soc, endowment(0.0, 0.0), 4, 4);
        let tick = soc.tick;
        soc.population.get_mut(prey).unwrap().ledger.add_child(child, tick);

        let outcome = attack(&mut soc, attacker, prey).unwrap();
        assert!((outcome.sugar_loot - 3.0).abs() < f64::EPSILON);
        assert!((outcome.spice_loot - 2.0).abs() < f64::EPSILON);
        let heir = soc.population.get(child).unwrap();
        assert!((heir.sugar - 7.0).abs() < f64::EPSILON);
        assert!(heir.spice.abs() < f64::EPSILON);
        assert_eq!(soc.population.get(prey).unwrap().cause_of_death, Some(DeathCause::Combat));
    }
}
