//! Bilateral barter of sugar for spice.
//!
//! Each tick a trading agent refreshes its marginal rate of substitution
//! (MRS) and negotiates with every adjacent agent whose MRS differs, in
//! random order. A negotiation is a loop:
//!
//! 1. Stop if both MRS are on the same side of 1, or equal.
//! 2. The higher-MRS party sells spice, the other sells sugar.
//! 3. The price is the geometric mean of the two MRS, to the cent. Below 1
//!    it is the sugar price per spice unit, otherwise the spice price per
//!    sugar unit.
//! 4. Stop if either party would fall below its own metabolism.
//! 5. Execute only if the trade moves each party's MRS toward 1 or keeps its
//!    welfare, and the new MRS values do not cross. Otherwise stop.
//!
//! The spice seller gives up at least one unit per iteration and the
//! lethality check bounds its spice from below, so every negotiation ends.

use rand::Rng;
use rand::seq::SliceRandom;
use sugarscape_types::AgentId;
use tracing::debug;

use crate::agent::Agent;
use crate::error::AgentError;
use crate::numeric::{approx_eq, round2};
use crate::society::Society;
use crate::utility::{projected_mrs, refresh_mrs, welfare};

/// Result of one negotiation between two agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiation {
    /// Executed trade iterations.
    pub transactions: u32,
    /// Whether the parties got as far as pricing a trade.
    pub priced: bool,
}

/// Unit prices for one trade iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Price {
    /// Sugar paid by the sugar seller.
    pub sugar: f64,
    /// Spice paid by the spice seller.
    pub spice: f64,
}

/// Price implied by the spice seller's and sugar seller's MRS.
pub fn price(spice_seller_mrs: f64, sugar_seller_mrs: f64) -> Price {
    let mean = round2((spice_seller_mrs * sugar_seller_mrs).sqrt());
    if mean < 1.0 {
        Price {
            sugar: mean,
            spice: 1.0,
        }
    } else {
        Price {
            sugar: 1.0,
            spice: mean,
        }
    }
}

/// Whether two MRS values leave room for trade.
pub fn complementary(a: f64, b: f64) -> bool {
    if approx_eq(a, b) {
        return false;
    }
    (a >= 1.0) != (b >= 1.0)
}

fn improves(agent: &Agent, new_mrs: f64, sugar_delta: f64, spice_delta: f64) -> bool {
    let closer = (1.0 - agent.mrs).abs() > (1.0 - new_mrs).abs();
    closer || welfare(agent, sugar_delta, spice_delta) >= welfare(agent, 0.0, 0.0)
}

/// Attempt one trade iteration. Returns whether it executed.
fn trade_once(spice_seller: &mut Agent, sugar_seller: &mut Agent) -> bool {
    let price = price(spice_seller.mrs, sugar_seller.mrs);
    if spice_seller.spice - price.spice < spice_seller.spice_metabolism
        || sugar_seller.sugar - price.sugar < sugar_seller.sugar_metabolism
    {
        return false;
    }
    let spice_seller_new = projected_mrs(
        spice_seller,
        spice_seller.sugar + price.sugar,
        spice_seller.spice - price.spice,
    );
    let sugar_seller_new = projected_mrs(
        sugar_seller,
        sugar_seller.sugar - price.sugar,
        sugar_seller.spice + price.spice,
    );
    let acceptable = improves(spice_seller, spice_seller_new, price.sugar, -price.spice)
        && improves(sugar_seller, sugar_seller_new, -price.sugar, price.spice)
        && spice_seller_new >= sugar_seller_new;
    if !acceptable {
        return false;
    }

    spice_seller.sugar += price.sugar;
    spice_seller.spice -= price.spice;
    sugar_seller.sugar -= price.sugar;
    sugar_seller.spice += price.spice;
    refresh_mrs(spice_seller);
    refresh_mrs(sugar_seller);
    debug!(
        spice_seller = %spice_seller.id,
        sugar_seller = %sugar_seller.id,
        spice = price.spice,
        sugar = price.sugar,
        "trade executed"
    );
    true
}

/// Trade repeatedly between `a` and `b` until a termination condition fires.
pub fn negotiate(a: &mut Agent, b: &mut Agent) -> Negotiation {
    let mut outcome = Negotiation {
        transactions: 0,
        priced: false,
    };
    while complementary(a.mrs, b.mrs) {
        outcome.priced = true;
        let executed = if b.mrs > a.mrs {
            trade_once(b, a)
        } else {
            trade_once(a, b)
        };
        if !executed {
            break;
        }
        outcome.transactions = outcome.transactions.saturating_add(1);
    }
    outcome
}

/// Negotiate with every adjacent agent whose MRS differs, in random order.
///
/// Agents with a zero trade factor do not initiate trades. Trade counts are
/// recorded in both ledgers once a negotiation reached pricing.
pub fn trade_with_neighbors(
    society: &mut Society,
    id: AgentId,
    rng: &mut impl Rng,
) -> Result<Vec<(AgentId, Negotiation)>, AgentError> {
    let agent = society.population.require_mut(id)?;
    if agent.endowment.trade_factor <= 0.0 {
        return Ok(Vec::new());
    }
    let own_mrs = refresh_mrs(agent);

    let mut partners: Vec<AgentId> = society
        .neighbors_of(id)?
        .into_iter()
        .filter(|n| {
            society
                .population
                .get(*n)
                .is_some_and(|p| !approx_eq(p.mrs, own_mrs))
        })
        .collect();
    partners.shuffle(rng);

    let tick = society.tick;
    let mut results = Vec::with_capacity(partners.len());
    for partner in partners {
        let (agent, other) = society.population.pair_mut(id, partner)?;
        let outcome = negotiate(agent, other);
        if outcome.priced {
            agent.ledger.record_trades(partner, tick, outcome.transactions);
            other.ledger.record_trades(id, tick, outcome.transactions);
        }
        society.events.trades = society.events.trades.saturating_add(outcome.transactions);
        results.push((partner, outcome));
    }
    Ok(results)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::agent::fixtures::endowment;
    use crate::config::SocietyParams;
    use crate::society::fixtures::{place, society};

    fn trader(id: u64, sugar: f64, spice: f64) -> Agent {
        let mut agent =
            Agent::new(AgentId(id), endowment(sugar, spice), 0, &SocietyParams::default())
                .unwrap();
        refresh_mrs(&mut agent);
        agent
    }

    #[test]
    fn price_orientation() {
        let low = price(0.8, 0.5);
        assert!(approx_eq(low.spice, 1.0));
        assert!(approx_eq(low.sugar, 0.63));
        let high = price(4.0, 0.5);
        assert!(approx_eq(high.sugar, 1.0));
        assert!(approx_eq(high.spice, 1.41));
    }

    #[test]
    fn same_side_mrs_do_not_trade() {
        assert!(!complementary(1.5, 2.0));
        assert!(!complementary(0.2, 0.9));
        assert!(!complementary(1.0, 1.0));
        assert!(complementary(2.0, 0.5));
    }

    #[test]
    fn opposite_needs_converge() {
        let mut a = trader(0, 10.0, 20.0);
        let mut b = trader(1, 20.0, 10.0);
        assert!(approx_eq(a.mrs, 2.0));
        assert!(approx_eq(b.mrs, 0.5));
        let outcome = negotiate(&mut a, &mut b);
        assert_eq!(outcome.transactions, 5);
        assert!((a.mrs - 1.0).abs() < (2.0 - 1.0_f64).abs());
        assert!((b.mrs - 1.0).abs() < (0.5 - 1.0_f64).abs());
        assert!(approx_eq(a.sugar + b.sugar, 30.0));
        assert!(approx_eq(a.spice + b.spice, 30.0));
    }

    #[test]
    fn lethal_trade_refused() {
        // The spice seller holds exactly its metabolism plus less than one unit.
        let mut a = trader(0, 1.0, 1.5);
        let mut b = trader(1, 20.0, 1.0);
        let outcome = negotiate(&mut a, &mut b);
        assert_eq!(outcome.transactions, 0);
        assert!(outcome.priced);
        assert!(a.spice >= a.spice_metabolism);
    }

    #[test]
    fn trades_never_breach_metabolism() {
        for (sa, pa, sb, pb) in [(3.0, 40.0, 40.0, 3.0), (2.0, 9.0, 7.0, 2.0), (5.0, 5.5, 1.5, 8.0)] {
            let mut a = trader(0, sa, pa);
            let mut b = trader(1, sb, pb);
            negotiate(&mut a, &mut b);
            for agent in [&a, &b] {
                assert!(agent.sugar >= agent.sugar_metabolism);
                assert!(agent.spice >= agent.spice_metabolism);
            }
        }
    }

    #[test]
    fn neighbors_record_trades_symmetrically() {
        let mut soc = society(5, 5);
        let a = place(&mut soc, endowment(10.0, 20.0), 2, 2);
        let b = place(&mut soc, endowment(20.0, 10.0), 2, 3);
        refresh_mrs(soc.population.get_mut(b).unwrap());
        let mut rng = StdRng::seed_from_u64(2);
        let results = trade_with_neighbors(&mut soc, a, &mut rng).unwrap();
        assert_eq!(results.len(), 1);
        let traded_a = soc.population.get(a).unwrap().ledger.peer(b).map(|p| p.traded);
        let traded_b = soc.population.get(b).unwrap().ledger.peer(a).map(|p| p.traded);
        assert_eq!(traded_a, Some(5));
        assert_eq!(traded_a, traded_b);
        assert_eq!(soc.events.trades, 5);
    }

    #[test]
    fn zero_trade_factor_never_initiates() {
        let mut soc = society(5, 5);
        let mut e = endowment(10.0, 20.0);
        e.trade_factor = 0.0;
        let a = place(&mut soc, e, 2, 2);
        place(&mut soc, endowment(20.0, 10.0), 2, 3);
        let mut rng = StdRng::seed_from_u64(2);
        assert!(trade_with_neighbors(&mut soc, a, &mut rng).unwrap().is_empty());
    }
}
