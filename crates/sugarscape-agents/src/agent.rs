//! The agent entity.
//!
//! An [`Agent`] pairs the immutable [`AgentEndowment`] it was born with and
//! the mutable state the protocols evolve: stocks, disease-adjusted
//! physiology, genetic vectors, income averages, and the social ledger.
//! Construction validates the endowment so malformed configuration fails
//! before the agent ever acts.

use sugarscape_types::{
    AgentEndowment, AgentId, DecisionPolicy, InheritancePolicy, Position, Sex,
};

use crate::config::SocietyParams;
use crate::culture::{Tribe, find_tribe};
use crate::death::DeathCause;
use crate::error::AgentError;
use crate::immune::Infection;
use crate::social::SocialLedger;

/// Days-to-death reported for a resource the agent does not metabolize.
pub const UNBOUNDED_DAYS: f64 = f64::MAX;

/// A single member of the society.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Unique identity.
    pub id: AgentId,
    /// Tick the agent entered the society.
    pub born_at_tick: u64,
    /// Ticks lived.
    pub age: u32,
    /// Cleared exactly once, on death.
    pub alive: bool,
    /// Why the agent died, once it has.
    pub cause_of_death: Option<DeathCause>,
    /// The occupied cell; `None` once dead.
    pub position: Option<Position>,
    /// Last tick the agent ran its protocol sequence.
    pub last_moved: Option<u64>,
    /// The configuration the agent was born with.
    pub endowment: AgentEndowment,

    /// Current sugar stock.
    pub sugar: f64,
    /// Current spice stock.
    pub spice: f64,

    /// Sugar consumed per tick, after disease penalties.
    pub sugar_metabolism: f64,
    /// Spice consumed per tick, after disease penalties.
    pub spice_metabolism: f64,
    /// Vision range, after disease penalties.
    pub vision: u32,
    /// Movement range, after disease penalties.
    pub movement: u32,
    /// Fertility factor, after disease penalties.
    pub fertility_factor: f64,
    /// Aggression factor, after disease penalties.
    pub aggression_factor: f64,

    /// Current cultural tags, rewritten by neighbors' tagging.
    pub tags: Option<Vec<bool>>,
    /// Current immune vector, rewritten as infections are fought off.
    pub immune_system: Option<Vec<bool>>,
    /// Tribe derived from the current tags.
    pub tribe: Option<Tribe>,

    /// Marginal rate of substitution of spice for sugar.
    pub mrs: f64,
    /// Exponential moving average of sugar collected per tick.
    pub sugar_mean_income: f64,
    /// Exponential moving average of spice collected per tick.
    pub spice_mean_income: f64,

    /// Active infections.
    pub infections: Vec<Infection>,
    /// Relationships, friends, and loan books.
    pub ledger: SocialLedger,
}

impl Agent {
    /// Create an agent from its endowment.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] if the endowment violates an
    /// invariant (negative or non-finite quantities, an inverted fertility
    /// window, or vectors whose length differs from the society's).
    pub fn new(
        id: AgentId,
        endowment: AgentEndowment,
        born_at_tick: u64,
        params: &SocietyParams,
    ) -> Result<Self, AgentError> {
        validate_endowment(&endowment, params)?;
        let tribe = endowment
            .tags
            .as_deref()
            .and_then(|tags| find_tribe(tags, params.max_tribes));
        Ok(Self {
            id,
            born_at_tick,
            age: 0,
            alive: true,
            cause_of_death: None,
            position: None,
            last_moved: None,
            sugar: endowment.sugar,
            spice: endowment.spice,
            sugar_metabolism: endowment.sugar_metabolism,
            spice_metabolism: endowment.spice_metabolism,
            vision: endowment.vision,
            movement: endowment.movement,
            fertility_factor: endowment.fertility_factor,
            aggression_factor: endowment.aggression_factor,
            tags: endowment.tags.clone(),
            immune_system: endowment.immune_system.clone(),
            tribe,
            mrs: 1.0,
            sugar_mean_income: 1.0,
            spice_mean_income: 1.0,
            infections: Vec::new(),
            ledger: SocialLedger::new(),
            endowment,
        })
    }

    /// Sugar plus spice.
    pub fn wealth(&self) -> f64 {
        self.sugar + self.spice
    }

    /// Starting sugar, the reference level for fertility and lending.
    pub const fn starting_sugar(&self) -> f64 {
        self.endowment.sugar
    }

    /// Starting spice, the reference level for fertility and lending.
    pub const fn starting_spice(&self) -> f64 {
        self.endowment.spice
    }

    /// Biological sex.
    pub const fn sex(&self) -> Sex {
        self.endowment.sex
    }

    /// Movement decision model.
    pub const fn decision_policy(&self) -> &DecisionPolicy {
        &self.endowment.decision_policy
    }

    /// Estate distribution on death.
    pub const fn inheritance_policy(&self) -> InheritancePolicy {
        self.endowment.inheritance_policy
    }

    /// Whether the agent's age lies in `[fertility_age, infertility_age)`.
    pub const fn in_fertility_window(&self) -> bool {
        self.age >= self.endowment.fertility_age && self.age < self.endowment.infertility_age
    }

    /// Fertile: of age, holding at least the starting stocks, and with a
    /// positive fertility factor.
    pub fn is_fertile(&self) -> bool {
        self.sugar >= self.starting_sugar()
            && self.spice >= self.starting_spice()
            && self.in_fertility_window()
            && self.fertility_factor > 0.0
    }

    /// Ticks until the scarcer resource runs out at current metabolism.
    pub fn days_to_death(&self) -> f64 {
        let days = |stock: f64, metabolism: f64| {
            if metabolism > 0.0 {
                stock / metabolism
            } else {
                UNBOUNDED_DAYS
            }
        };
        days(self.sugar, self.sugar_metabolism).min(days(self.spice, self.spice_metabolism))
    }

    /// Number of zero bits in the current tag vector.
    pub fn tag_zeroes(&self) -> usize {
        self.tags
            .as_deref()
            .map_or(0, |tags| tags.iter().filter(|bit| !**bit).count())
    }
}

fn validate_endowment(e: &AgentEndowment, params: &SocietyParams) -> Result<(), AgentError> {
    let quantities = [
        ("sugar_metabolism", e.sugar_metabolism),
        ("spice_metabolism", e.spice_metabolism),
        ("sugar", e.sugar),
        ("spice", e.spice),
        ("aggression_factor", e.aggression_factor),
        ("trade_factor", e.trade_factor),
        ("lookahead_factor", e.lookahead_factor),
        ("lending_factor", e.lending_factor),
        ("fertility_factor", e.fertility_factor),
        ("base_interest_rate", e.base_interest_rate),
    ];
    for (field, value) in quantities {
        if !(value.is_finite() && value >= 0.0) {
            return Err(AgentError::InvalidConfig {
                reason: format!("{field} must be finite and non-negative, got {value}"),
            });
        }
    }
    if e.infertility_age < e.fertility_age {
        return Err(AgentError::InvalidConfig {
            reason: format!(
                "infertility age {} precedes fertility age {}",
                e.infertility_age, e.fertility_age
            ),
        });
    }
    let weight = e.decision_policy.ethics_weight();
    if !(weight.is_finite() && weight >= 0.0) {
        return Err(AgentError::InvalidConfig {
            reason: format!("ethics weight must be finite and non-negative, got {weight}"),
        });
    }
    check_length("tag", e.tags.as_deref(), params.tag_length)?;
    check_length("immune system", e.immune_system.as_deref(), params.immune_length)
}

fn check_length(name: &str, bits: Option<&[bool]>, expected: usize) -> Result<(), AgentError> {
    match bits {
        Some(bits) if bits.len() != expected => Err(AgentError::InvalidConfig {
            reason: format!(
                "{name} vector has length {}, society requires {expected}",
                bits.len()
            ),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Hand-built endowments shared by the unit tests of this crate.

    use sugarscape_types::{AgentEndowment, DecisionPolicy, InheritancePolicy, Sex};

    /// A plain endowment: metabolism 1/1, vision and movement 1, no vectors.
    pub fn endowment(sugar: f64, spice: f64) -> AgentEndowment {
        AgentEndowment {
            sugar_metabolism: 1.0,
            spice_metabolism: 1.0,
            movement: 1,
            vision: 1,
            sugar,
            spice,
            max_age: None,
            sex: Sex::Female,
            fertility_age: 0,
            infertility_age: 100,
            tags: None,
            immune_system: None,
            aggression_factor: 0.0,
            trade_factor: 1.0,
            lookahead_factor: 0.0,
            lending_factor: 0.0,
            fertility_factor: 1.0,
            base_interest_rate: 0.0,
            loan_duration: 0,
            max_friends: 5,
            decision_policy: DecisionPolicy::Selfish,
            inheritance_policy: InheritancePolicy::None,
        }
    }
}
