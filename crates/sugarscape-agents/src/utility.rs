//! Welfare and marginal rate of substitution.
//!
//! Both are pure functions of an agent's stocks and physiology. Zero
//! metabolism is a defined case throughout: the need for that resource is
//! taken as 1, so no computation here divides by zero.

use crate::agent::Agent;
use crate::numeric::round2;

/// Stock divided by metabolism, or 1 when the resource is not metabolized.
pub fn resource_need(stock: f64, metabolism: f64) -> f64 {
    if metabolism > 0.0 {
        stock / metabolism
    } else {
        1.0
    }
}

/// Unscaled, unrounded MRS the agent would have holding `sugar` and `spice`.
///
/// An exhausted resource dominates the ratio: no spice yields the spice
/// metabolism, no sugar yields the inverse of the sugar metabolism.
pub fn projected_mrs(agent: &Agent, sugar: f64, spice: f64) -> f64 {
    let spice_need = resource_need(spice, agent.spice_metabolism);
    let sugar_need = resource_need(sugar, agent.sugar_metabolism);
    if spice_need <= 0.0 {
        agent.spice_metabolism
    } else if sugar_need <= 0.0 {
        1.0 / agent.sugar_metabolism
    } else {
        spice_need / sugar_need
    }
}

/// The agent's current MRS: trade factor times the need ratio, to the cent.
pub fn marginal_rate_of_substitution(agent: &Agent) -> f64 {
    round2(agent.endowment.trade_factor * projected_mrs(agent, agent.sugar, agent.spice))
}

/// Recompute and store the agent's MRS.
pub fn refresh_mrs(agent: &mut Agent) -> f64 {
    agent.mrs = marginal_rate_of_substitution(agent);
    agent.mrs
}

/// Cobb-Douglas welfare of the agent's holdings plus the given rewards.
///
/// Holdings are discounted by `lookahead_factor` ticks of metabolism and
/// floored at zero. Exponents are the metabolism proportions, or, for a
/// tagged agent, metabolisms reweighted by the fraction of zero and one bits
/// in its tags.
pub fn welfare(agent: &Agent, sugar_reward: f64, spice_reward: f64) -> f64 {
    let lookahead = agent.endowment.lookahead_factor;
    let sugar = (agent.sugar + sugar_reward - agent.sugar_metabolism * lookahead).max(0.0);
    let spice = (agent.spice + spice_reward - agent.spice_metabolism * lookahead).max(0.0);
    let (sugar_exp, spice_exp) = welfare_exponents(agent);
    sugar.powf(sugar_exp) * spice.powf(spice_exp)
}

fn welfare_exponents(agent: &Agent) -> (f64, f64) {
    let sugar_met = agent.sugar_metabolism;
    let spice_met = agent.spice_metabolism;
    if let Some(tags) = agent.tags.as_deref().filter(|t| !t.is_empty()) {
        let len = tags.len();
        let zeroes = agent.tag_zeroes();
        let fraction_zeroes = ratio(zeroes, len);
        let fraction_ones = 1.0 - fraction_zeroes;
        let mut preference = sugar_met * fraction_zeroes + spice_met * fraction_ones;
        if preference <= 0.0 {
            preference = 1.0;
        }
        return (
            sugar_met / preference * fraction_zeroes,
            spice_met / preference * fraction_ones,
        );
    }
    let total = sugar_met + spice_met;
    if total > 0.0 {
        (sugar_met / total, spice_met / total)
    } else {
        (0.0, 0.0)
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    let part = u32::try_from(part).map_or(f64::MAX, f64::from);
    let whole = u32::try_from(whole).map_or(f64::MAX, f64::from);
    if whole > 0.0 { part / whole } else { 0.0 }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sugarscape_types::AgentId;

    use super::*;
    use crate::agent::fixtures::endowment;
    use crate::config::SocietyParams;
    use crate::numeric::approx_eq;

    fn agent(sugar: f64, spice: f64) -> Agent {
        Agent::new(AgentId(0), endowment(sugar, spice), 0, &SocietyParams::default()).unwrap()
    }

    #[test]
    fn mrs_is_need_ratio_rounded() {
        let a = agent(10.0, 20.0);
        assert!(approx_eq(marginal_rate_of_substitution(&a), 2.0));
        let b = agent(14.0, 16.0);
        assert!(approx_eq(marginal_rate_of_substitution(&b), 1.14));
    }

    #[test]
    fn zero_sugar_metabolism_uses_unit_need() {
        let mut a = agent(10.0, 6.0);
        a.sugar_metabolism = 0.0;
        a.spice_metabolism = 2.0;
        assert!(approx_eq(marginal_rate_of_substitution(&a), 3.0));
        let w = welfare(&a, 0.0, 0.0);
        assert!(w.is_finite());
        assert!(approx_eq(w, 6.0));
    }

    #[test]
    fn exhausted_resource_dominates_projection() {
        let a = agent(10.0, 10.0);
        assert!(approx_eq(projected_mrs(&a, 10.0, 0.0), 1.0));
        assert!(approx_eq(projected_mrs(&a, 0.0, 10.0), 1.0));
        assert!(approx_eq(projected_mrs(&a, 5.0, 10.0), 2.0));
    }

    #[test]
    fn welfare_is_cobb_douglas_of_holdings() {
        let a = agent(4.0, 16.0);
        // Equal metabolisms: sqrt(4 * 16).
        assert!(approx_eq(welfare(&a, 0.0, 0.0), 8.0));
        assert!(welfare(&a, 2.0, 0.0) > welfare(&a, 0.0, 0.0));
    }

    #[test]
    fn lookahead_floors_holdings_at_zero() {
        let mut a = agent(1.0, 50.0);
        a.endowment.lookahead_factor = 5.0;
        assert!(approx_eq(welfare(&a, 0.0, 0.0), 0.0));
    }

    #[test]
    fn tags_reweight_exponents() {
        let mut a = agent(4.0, 16.0);
        // All ones: only spice counts.
        a.tags = Some(vec![true; 4]);
        assert!(approx_eq(welfare(&a, 0.0, 0.0), 16.0));
        // All zeroes: only sugar counts.
        a.tags = Some(vec![false; 4]);
        assert!(approx_eq(welfare(&a, 0.0, 0.0), 4.0));
    }
}
