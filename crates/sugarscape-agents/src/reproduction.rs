//! Mating, child endowments, and births.
//!
//! A fertile agent tries every adjacent agent in random order. Each
//! compatible mate yields one child on a random empty cell next to either
//! parent, for as long as the initiator stays fertile after paying for the
//! previous child.

use rand::Rng;
use rand::seq::SliceRandom;
use sugarscape_types::{AgentEndowment, AgentId, Position, Sex};
use tracing::{info, warn};

use crate::agent::Agent;
use crate::error::AgentError;
use crate::numeric::round2;
use crate::society::Society;
use crate::vitals::collect_resources;

/// Opposite sexes, both alive and both fertile.
pub fn is_compatible(agent: &Agent, mate: &Agent) -> bool {
    agent.alive
        && mate.alive
        && agent.sex() != mate.sex()
        && agent.is_fertile()
        && mate.is_fertile()
}

fn pick<T>(rng: &mut impl Rng, a: T, b: T) -> T {
    if rng.random_bool(0.5) { a } else { b }
}

/// Keep the bits both parents agree on; draw the rest at random.
fn cross_bits(
    name: &str,
    a: Option<&[bool]>,
    b: Option<&[bool]>,
    rng: &mut impl Rng,
) -> Result<Option<Vec<bool>>, AgentError> {
    match (a, b) {
        (None, None) => Ok(None),
        (Some(a), Some(b)) if a.len() == b.len() => Ok(Some(
            a.iter()
                .zip(b)
                .map(|(x, y)| if x == y { *x } else { rng.random_bool(0.5) })
                .collect(),
        )),
        _ => Err(AgentError::ReproductionFailed {
            reason: format!("parents carry incompatible {name} vectors"),
        }),
    }
}

/// Assemble a child's endowment from two parents.
///
/// Every heritable trait is drawn from one parent or the other with equal
/// odds; the fertility window travels as a unit so it never inverts. The
/// child starts with half of each parent's starting stocks. Tags mix the
/// parents' current tags, the immune vector their innate ones. The
/// inheritance policy always comes from `initiator`.
///
/// # Errors
///
/// Returns [`AgentError::ReproductionFailed`] if the parents' tag or immune
/// vectors differ in length or presence.
pub fn child_endowment(
    initiator: &Agent,
    mate: &Agent,
    rng: &mut impl Rng,
) -> Result<AgentEndowment, AgentError> {
    let a = &initiator.endowment;
    let b = &mate.endowment;
    let tags = cross_bits("tag", initiator.tags.as_deref(), mate.tags.as_deref(), rng)?;
    let immune_system = cross_bits(
        "immune",
        a.immune_system.as_deref(),
        b.immune_system.as_deref(),
        rng,
    )?;
    let (fertility_age, infertility_age) = pick(
        rng,
        (a.fertility_age, a.infertility_age),
        (b.fertility_age, b.infertility_age),
    );
    Ok(AgentEndowment {
        sugar_metabolism: pick(rng, a.sugar_metabolism, b.sugar_metabolism),
        spice_metabolism: pick(rng, a.spice_metabolism, b.spice_metabolism),
        movement: pick(rng, a.movement, b.movement),
        vision: pick(rng, a.vision, b.vision),
        sugar: round2(a.sugar / 2.0 + b.sugar / 2.0),
        spice: round2(a.spice / 2.0 + b.spice / 2.0),
        max_age: pick(rng, a.max_age, b.max_age),
        sex: pick(rng, a.sex, b.sex),
        fertility_age,
        infertility_age,
        tags,
        immune_system,
        aggression_factor: pick(rng, a.aggression_factor, b.aggression_factor),
        trade_factor: pick(rng, a.trade_factor, b.trade_factor),
        lookahead_factor: pick(rng, a.lookahead_factor, b.lookahead_factor),
        lending_factor: pick(rng, a.lending_factor, b.lending_factor),
        fertility_factor: pick(rng, a.fertility_factor, b.fertility_factor),
        base_interest_rate: pick(rng, a.base_interest_rate, b.base_interest_rate),
        loan_duration: pick(rng, a.loan_duration, b.loan_duration),
        max_friends: pick(rng, a.max_friends, b.max_friends),
        decision_policy: pick(rng, a.decision_policy, b.decision_policy),
        inheritance_policy: a.inheritance_policy,
    })
}

/// Sugar and spice a parent pays for one child.
pub fn reproduction_cost(parent: &Agent) -> (f64, f64) {
    let divisor = 2.0 * parent.fertility_factor;
    (
        round2(parent.starting_sugar() / divisor),
        round2(parent.starting_spice() / divisor),
    )
}

fn birth_cell(
    society: &Society,
    id: AgentId,
    mate: AgentId,
    rng: &mut impl Rng,
) -> Result<Option<Position>, AgentError> {
    let mut cells = society.grid.empty_neighbors(society.position_of(id)?);
    cells.extend(society.grid.empty_neighbors(society.position_of(mate)?));
    cells.shuffle(rng);
    Ok(cells.first().copied())
}

/// Try to have a child with each adjacent agent, in random order.
///
/// Returns the IDs of the children born. Newborns collect their birth
/// cell's resources at once and are marked as having acted this tick.
pub fn reproduce(
    society: &mut Society,
    id: AgentId,
    rng: &mut impl Rng,
) -> Result<Vec<AgentId>, AgentError> {
    let agent = society.population.require(id)?;
    if !agent.alive || !agent.is_fertile() {
        return Ok(Vec::new());
    }
    let mut mates = society.neighbors_of(id)?;
    mates.shuffle(rng);

    let tick = society.tick;
    let mut born = Vec::new();
    for mate_id in mates {
        let agent = society.population.require(id)?;
        let mate = society.population.require(mate_id)?;
        if !is_compatible(agent, mate) {
            continue;
        }
        let Some(cell) = birth_cell(society, id, mate_id, rng)? else {
            continue;
        };
        let endowment = match child_endowment(agent, mate, rng) {
            Ok(endowment) => endowment,
            Err(AgentError::ReproductionFailed { reason }) => {
                warn!(agent = %id, mate = %mate_id, %reason, "reproduction refused");
                continue;
            }
            Err(e) => return Err(e),
        };
        let (father, mother) = if agent.sex() == Sex::Male {
            (id, mate_id)
        } else {
            (mate_id, id)
        };

        let child = society.population.spawn(
            &mut society.grid,
            endowment,
            cell,
            tick,
            &society.params,
        )?;
        let newborn = society.population.require_mut(child)?;
        newborn.ledger.set_parents(father, mother, tick);
        newborn.last_moved = Some(tick);

        let (parent, partner) = society.population.pair_mut(id, mate_id)?;
        parent.ledger.add_child(child, tick);
        partner.ledger.add_child(child, tick);
        partner.ledger.record_visit(id, tick);
        partner.ledger.record_reproduction(id, tick);
        parent.ledger.record_reproduction(mate_id, tick);
        for payer in [parent, partner] {
            let (sugar, spice) = reproduction_cost(payer);
            payer.sugar -= sugar;
            payer.spice -= spice;
        }

        collect_resources(society, child)?;
        society.events.births = society.events.births.saturating_add(1);
        info!(%child, %father, %mother, %cell, tick, "child born");
        born.push(child);
    }
    Ok(born)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use sugarscape_types::InheritancePolicy;

    use super::*;
    use crate::agent::fixtures::endowment;
    use crate::config::SocietyParams;
    use crate::society::fixtures::{place, society};

    fn parent(sex: Sex, sugar: f64, tags: Option<Vec<bool>>) -> AgentEndowment {
        let mut e = endowment(sugar, 10.0);
        e.sex = sex;
        e.tags = tags;
        e
    }

    fn tag_params() -> SocietyParams {
        SocietyParams {
            tag_length: 4,
            ..SocietyParams::default()
        }
    }

    #[test]
    fn same_sex_is_incompatible() {
        let params = SocietyParams::default();
        let a = Agent::new(AgentId(0), parent(Sex::Female, 10.0, None), 0, &params).unwrap();
        let b = Agent::new(AgentId(1), parent(Sex::Female, 10.0, None), 0, &params).unwrap();
        let c = Agent::new(AgentId(2), parent(Sex::Male, 10.0, None), 0, &params).unwrap();
        assert!(!is_compatible(&a, &b));
        assert!(is_compatible(&a, &c));
    }

    #[test]
    fn poor_mate_is_incompatible() {
        let params = SocietyParams::default();
        let a = Agent::new(AgentId(0), parent(Sex::Female, 10.0, None), 0, &params).unwrap();
        let mut c = Agent::new(AgentId(1), parent(Sex::Male, 10.0, None), 0, &params).unwrap();
        c.sugar = 9.0;
        assert!(!is_compatible(&a, &c));
    }

    #[test]
    fn child_inherits_averaged_stock_and_agreeing_tags() {
        let params = tag_params();
        let a = Agent::new(
            AgentId(0),
            parent(Sex::Female, 7.0, Some(vec![true, false, true, false])),
            0,
            &params,
        )
        .unwrap();
        let b = Agent::new(
            AgentId(1),
            parent(Sex::Male, 10.0, Some(vec![true, false, false, true])),
            0,
            &params,
        )
        .unwrap();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let child = child_endowment(&a, &b, &mut rng).unwrap();
            assert!((child.sugar - 8.5).abs() < 1e-9);
            let tags = child.tags.unwrap();
            assert!(tags.first().copied().unwrap());
            assert!(!tags.get(1).copied().unwrap());
            assert_eq!(tags.len(), 4);
            assert!(child.fertility_age <= child.infertility_age);
        }
    }

    #[test]
    fn inheritance_policy_follows_initiator() {
        let params = SocietyParams::default();
        let mut ea = parent(Sex::Female, 10.0, None);
        ea.inheritance_policy = InheritancePolicy::Daughters;
        let a = Agent::new(AgentId(0), ea, 0, &params).unwrap();
        let b = Agent::new(AgentId(1), parent(Sex::Male, 10.0, None), 0, &params).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let child = child_endowment(&a, &b, &mut rng).unwrap();
        assert_eq!(child.inheritance_policy, InheritancePolicy::Daughters);
    }

    #[test]
    fn mismatched_vectors_refuse() {
        let params = tag_params();
        let a = Agent::new(
            AgentId(0),
            parent(Sex::Female, 10.0, Some(vec![true; 4])),
            0,
            &params,
        )
        .unwrap();
        let b = Agent::new(AgentId(1), parent(Sex::Male, 10.0, None), 0, &params).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            child_endowment(&a, &b, &mut rng),
            Err(AgentError::ReproductionFailed { .. })
        ));
    }

    #[test]
    fn birth_charges_both_parents_and_links_family() {
        let mut soc = society(5, 5);
        let mother = place(&mut soc, parent(Sex::Female, 10.0, None), 2, 2);
        let father = place(&mut soc, parent(Sex::Male, 10.0, None), 2, 3);
        let mut rng = StdRng::seed_from_u64(9);

        let born = reproduce(&mut soc, mother, &mut rng).unwrap();
        assert_eq!(born.len(), 1);
        let child_id = *born.first().unwrap();
        let child = soc.population.get(child_id).unwrap();
        assert_eq!(child.ledger.mother(), Some(mother));
        assert_eq!(child.ledger.father(), Some(father));
        assert_eq!(child.last_moved, Some(0));
        assert!((child.starting_sugar() - 10.0).abs() < 1e-9);

        for p in [mother, father] {
            let p = soc.population.get(p).unwrap();
            assert_eq!(p.ledger.children(), &[child_id]);
            assert!((p.sugar - 5.0).abs() < 1e-9);
            assert!((p.spice - 5.0).abs() < 1e-9);
        }
        let m = soc.population.get(mother).unwrap();
        assert_eq!(m.ledger.peer(father).map(|r| r.reproduced), Some(1));
        assert_eq!(soc.events.births, 1);

        // Both parents are spent; a second attempt yields nothing.
        assert!(reproduce(&mut soc, mother, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn no_birth_without_room() {
        let mut soc = society(1, 2);
        let mother = place(&mut soc, parent(Sex::Female, 10.0, None), 0, 0);
        place(&mut soc, parent(Sex::Male, 10.0, None), 0, 1);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(reproduce(&mut soc, mother, &mut rng).unwrap().is_empty());
        assert_eq!(soc.population.len(), 2);
    }
}
