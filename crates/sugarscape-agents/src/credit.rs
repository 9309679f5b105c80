//! Lending and loan servicing.
//!
//! Agents past fertility age with surplus resources lend to adjacent agents
//! who are of fertile age but lack the stocks to reproduce. Loans carry
//! immutable terms and are filed on both sides: as an obligation in the
//! debtor's ledger and as a claim in the creditor's.
//!
//! # Servicing
//!
//! Servicing runs before any new lending and is driven from the debtor's
//! side only. The creditor-side pass merely drops claims on dead debtors;
//! settlement of a due obligation (repayment, roll-over, write-off, or
//! transfer to the creditor's children) removes both copies at once, so no
//! loan is ever settled twice.

use rand::Rng;
use rand::seq::SliceRandom;
use sugarscape_types::{AgentId, InheritancePolicy, Loan, LoanId};
use tracing::{debug, info};

use crate::agent::Agent;
use crate::error::AgentError;
use crate::numeric::round2;
use crate::society::Society;

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

/// Interest the agent charges: lending factor times base rate, capped at 100%.
pub fn interest_rate(agent: &Agent) -> f64 {
    (agent.endowment.lending_factor * agent.endowment.base_interest_rate).min(1.0)
}

/// Whether the agent may lend at all this tick.
///
/// It must have a positive lending factor and be of fertile age or older. A
/// lender that is itself fertile must hold more than its starting stocks.
pub fn can_lend(agent: &Agent) -> bool {
    if agent.endowment.lending_factor <= 0.0 || agent.age < agent.endowment.fertility_age {
        return false;
    }
    !(agent.is_fertile()
        && (agent.sugar <= agent.starting_sugar() || agent.spice <= agent.starting_spice()))
}

/// Whether the agent is a candidate borrower: of fertile age, but not fertile.
pub fn needs_credit(agent: &Agent) -> bool {
    agent.alive && agent.in_fertility_window() && !agent.is_fertile()
}

/// Whether the borrower's mean income covers metabolism, existing debt
/// service, and the new loan's per-tick service, for both resources.
pub fn is_creditworthy(
    borrower: &Agent,
    sugar_amount: f64,
    spice_amount: f64,
    duration: u32,
) -> bool {
    if duration == 0 {
        return false;
    }
    let ticks = f64::from(duration);
    let sugar_margin = borrower.sugar_mean_income
        - borrower.sugar_metabolism
        - borrower.ledger.sugar_debt_service()
        - sugar_amount / ticks;
    let spice_margin = borrower.spice_mean_income
        - borrower.spice_metabolism
        - borrower.ledger.spice_debt_service()
        - spice_amount / ticks;
    sugar_margin >= 0.0 && spice_margin >= 0.0
}

/// Terms proposed for a new loan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanTerms {
    /// Sugar advanced now.
    pub sugar_principal: f64,
    /// Spice advanced now.
    pub spice_principal: f64,
    /// Sugar due at maturity.
    pub sugar_repayment: f64,
    /// Spice due at maturity.
    pub spice_repayment: f64,
    /// Ticks until maturity.
    pub duration: u32,
}

/// File a loan on both ledgers and advance the principal.
pub fn originate_loan(
    society: &mut Society,
    creditor: AgentId,
    debtor: AgentId,
    terms: LoanTerms,
) -> Result<LoanId, AgentError> {
    let tick = society.tick;
    let loan = Loan {
        id: LoanId::new(),
        creditor,
        debtor,
        sugar_principal: terms.sugar_principal,
        spice_principal: terms.spice_principal,
        sugar_repayment: terms.sugar_repayment,
        spice_repayment: terms.spice_repayment,
        duration: terms.duration,
        origin_tick: tick,
    };
    let id = loan.id;
    let (lender, borrower) = society.population.pair_mut(creditor, debtor)?;
    lender.sugar -= terms.sugar_principal;
    lender.spice -= terms.spice_principal;
    borrower.sugar += terms.sugar_principal;
    borrower.spice += terms.spice_principal;
    lender.ledger.record_loan(debtor, tick);
    borrower.ledger.record_loan(creditor, tick);
    lender.ledger.file_claim(loan.clone());
    borrower.ledger.file_obligation(loan);
    society.events.loans = society.events.loans.saturating_add(1);
    debug!(
        loan = %id,
        %creditor,
        %debtor,
        sugar = terms.sugar_repayment,
        spice = terms.spice_repayment,
        duration = terms.duration,
        "loan originated"
    );
    Ok(id)
}

// ---------------------------------------------------------------------------
// Servicing
// ---------------------------------------------------------------------------

/// How a due loan was settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Settlement {
    /// The creditor is dead without a children policy; the debt is void.
    Forgiven,
    /// The creditor is dead; the balance was re-issued to its living children.
    Inherited {
        /// Number of children now holding a share of the claim.
        heirs: usize,
    },
    /// The debtor paid in full.
    Repaid,
    /// The debtor paid what it could; the rest was re-issued with interest.
    Rolled {
        /// Sugar paid now.
        sugar_paid: f64,
        /// Spice paid now.
        spice_paid: f64,
    },
}

fn close_loan(society: &mut Society, loan: &Loan) -> Result<(), AgentError> {
    society
        .population
        .require_mut(loan.debtor)?
        .ledger
        .remove_obligation(loan.id);
    society
        .population
        .require_mut(loan.creditor)?
        .ledger
        .remove_claim(loan.id);
    Ok(())
}

fn settle(society: &mut Society, loan: &Loan) -> Result<Settlement, AgentError> {
    let creditor = society.population.require(loan.creditor)?;
    let creditor_alive = creditor.alive;
    let creditor_policy = creditor.inheritance_policy();
    let creditor_rate = interest_rate(creditor);
    let creditor_duration = creditor.endowment.loan_duration;
    let heirs: Vec<AgentId> = creditor
        .ledger
        .children()
        .iter()
        .copied()
        .filter(|c| society.population.is_alive(*c) && *c != loan.debtor)
        .collect();

    close_loan(society, loan)?;

    if !creditor_alive {
        if creditor_policy != InheritancePolicy::Children || heirs.is_empty() {
            debug!(loan = %loan.id, debtor = %loan.debtor, "loan forgiven");
            return Ok(Settlement::Forgiven);
        }
        let count = u32::try_from(heirs.len()).unwrap_or(u32::MAX);
        let terms = LoanTerms {
            sugar_principal: 0.0,
            spice_principal: 0.0,
            sugar_repayment: loan.sugar_repayment / f64::from(count),
            spice_repayment: loan.spice_repayment / f64::from(count),
            duration: 1,
        };
        for heir in &heirs {
            originate_loan(society, *heir, loan.debtor, terms)?;
        }
        return Ok(Settlement::Inherited { heirs: heirs.len() });
    }

    let (debtor, creditor) = society.population.pair_mut(loan.debtor, loan.creditor)?;
    if debtor.sugar - loan.sugar_repayment > 0.0 && debtor.spice - loan.spice_repayment > 0.0 {
        debtor.sugar -= loan.sugar_repayment;
        debtor.spice -= loan.spice_repayment;
        creditor.sugar += loan.sugar_repayment;
        creditor.spice += loan.spice_repayment;
        info!(loan = %loan.id, debtor = %loan.debtor, creditor = %loan.creditor, "loan repaid");
        return Ok(Settlement::Repaid);
    }

    let sugar_paid = (debtor.sugar / 2.0).clamp(0.0, loan.sugar_repayment.max(0.0));
    let spice_paid = (debtor.spice / 2.0).clamp(0.0, loan.spice_repayment.max(0.0));
    debtor.sugar -= sugar_paid;
    debtor.spice -= spice_paid;
    creditor.sugar += sugar_paid;
    creditor.spice += spice_paid;
    let terms = LoanTerms {
        sugar_principal: 0.0,
        spice_principal: 0.0,
        sugar_repayment: (loan.sugar_repayment - sugar_paid) * (1.0 + creditor_rate),
        spice_repayment: (loan.spice_repayment - spice_paid) * (1.0 + creditor_rate),
        duration: creditor_duration.max(1),
    };
    originate_loan(society, loan.creditor, loan.debtor, terms)?;
    info!(
        loan = %loan.id,
        debtor = %loan.debtor,
        sugar_paid,
        spice_paid,
        "loan rolled over"
    );
    Ok(Settlement::Rolled {
        sugar_paid,
        spice_paid,
    })
}

/// Service the agent's loan books for the current tick.
///
/// Claims on dead debtors are dropped, then every due obligation is settled.
pub fn service_loans(
    society: &mut Society,
    id: AgentId,
) -> Result<Vec<(LoanId, Settlement)>, AgentError> {
    let alive: Vec<bool> = society.population.iter().map(|a| a.alive).collect();
    let agent = society.population.require_mut(id)?;
    agent.ledger.prune_claims(|debtor| {
        debtor
            .index()
            .and_then(|i| alive.get(i))
            .copied()
            .unwrap_or(false)
    });

    let tick = society.tick;
    let due: Vec<Loan> = agent
        .ledger
        .obligations()
        .iter()
        .filter(|loan| loan.is_due(tick))
        .cloned()
        .collect();
    let mut settled = Vec::with_capacity(due.len());
    for loan in due {
        let settlement = settle(society, &loan)?;
        settled.push((loan.id, settlement));
    }
    Ok(settled)
}

// ---------------------------------------------------------------------------
// Lending
// ---------------------------------------------------------------------------

fn propose(lender: &Agent, borrower: &Agent, rate: f64) -> Option<LoanTerms> {
    let (max_sugar, max_spice) = if lender.is_fertile() {
        (
            (lender.sugar - lender.starting_sugar()).max(0.0),
            (lender.spice - lender.starting_spice()).max(0.0),
        )
    } else {
        (lender.sugar / 2.0, lender.spice / 2.0)
    };
    let sugar_need = (borrower.starting_sugar() - borrower.sugar).max(0.0);
    let spice_need = (borrower.starting_spice() - borrower.spice).max(0.0);
    let sugar_principal = round2(max_sugar.min(sugar_need));
    let spice_principal = round2(max_spice.min(spice_need));
    let sugar_repayment = round2(sugar_principal * (1.0 + rate));
    let spice_repayment = round2(spice_principal * (1.0 + rate));

    let no_need = sugar_need <= 0.0 && spice_need <= 0.0;
    let nothing_lent = sugar_repayment <= 0.0 && spice_repayment <= 0.0;
    if no_need || nothing_lent {
        return None;
    }
    if lender.sugar - sugar_principal <= lender.sugar_metabolism
        || lender.spice - spice_principal <= lender.spice_metabolism
    {
        return None;
    }
    Some(LoanTerms {
        sugar_principal,
        spice_principal,
        sugar_repayment,
        spice_repayment,
        duration: lender.endowment.loan_duration,
    })
}

fn has_surplus(lender: &Agent) -> bool {
    if lender.is_fertile() {
        lender.sugar > lender.starting_sugar() || lender.spice > lender.starting_spice()
    } else {
        lender.sugar > 0.0 || lender.spice > 0.0
    }
}

/// Service loans, then offer credit to adjacent borrowers in random order.
///
/// Returns the loans originated. Lending stops once the lender has nothing
/// left to lend.
pub fn run_lending(
    society: &mut Society,
    id: AgentId,
    rng: &mut impl Rng,
) -> Result<Vec<LoanId>, AgentError> {
    service_loans(society, id)?;
    let lender = society.population.require(id)?;
    if !lender.alive || !can_lend(lender) {
        return Ok(Vec::new());
    }
    let rate = interest_rate(lender);

    let mut borrowers: Vec<AgentId> = society
        .neighbors_of(id)?
        .into_iter()
        .filter(|b| society.population.get(*b).is_some_and(needs_credit))
        .collect();
    borrowers.shuffle(rng);

    let mut originated = Vec::new();
    for borrower_id in borrowers {
        let lender = society.population.require(id)?;
        if !has_surplus(lender) {
            break;
        }
        let borrower = society.population.require(borrower_id)?;
        let Some(terms) = propose(lender, borrower, rate) else {
            continue;
        };
        if !is_creditworthy(
            borrower,
            terms.sugar_repayment,
            terms.spice_repayment,
            terms.duration,
        ) {
            continue;
        }
        originated.push(originate_loan(society, id, borrower_id, terms)?);
    }
    Ok(originated)
}
