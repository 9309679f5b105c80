//! Core records shared between the grid, the agent engine, and the runner.

use serde::{Deserialize, Serialize};

use crate::enums::{DecisionPolicy, InheritancePolicy, Sex};
use crate::ids::{AgentId, DiseaseId, LoanId};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A cell coordinate on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column, increasing eastward.
    pub x: u32,
    /// Row, increasing southward.
    pub y: u32,
}

impl Position {
    /// Create a new position.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Agent endowment
// ---------------------------------------------------------------------------

/// The full configuration an agent is created with.
///
/// Seed agents receive an endowment drawn by the runner; children receive
/// one assembled from their parents. Every field is fixed at birth except
/// where disease penalties temporarily adjust the physiology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEndowment {
    /// Sugar consumed per tick.
    pub sugar_metabolism: f64,
    /// Spice consumed per tick.
    pub spice_metabolism: f64,
    /// Maximum cells travelled along a cardinal ray in one move.
    pub movement: u32,
    /// Cells visible along each cardinal ray.
    pub vision: u32,
    /// Starting sugar stock, also the reference level for fertility and lending.
    pub sugar: f64,
    /// Starting spice stock, also the reference level for fertility and lending.
    pub spice: f64,
    /// Age at which the agent dies; `None` means it never dies of old age.
    pub max_age: Option<u32>,
    /// Biological sex.
    pub sex: Sex,
    /// First age at which the agent may reproduce.
    pub fertility_age: u32,
    /// Age at which fertility ends (exclusive).
    pub infertility_age: u32,
    /// Cultural tag bits; `None` disables culture for this agent.
    pub tags: Option<Vec<bool>>,
    /// Immune system bits; `None` disables disease for this agent.
    pub immune_system: Option<Vec<bool>>,
    /// Scales the perceived value of combat loot; zero means never attack.
    pub aggression_factor: f64,
    /// Scales the marginal rate of substitution; zero means never trade.
    pub trade_factor: f64,
    /// Number of ticks of metabolism discounted when valuing holdings.
    pub lookahead_factor: f64,
    /// Scales the interest rate charged; zero means never lend.
    pub lending_factor: f64,
    /// Divides the reproduction cost; zero means infertile.
    pub fertility_factor: f64,
    /// Interest rate before scaling by the lending factor.
    pub base_interest_rate: f64,
    /// Ticks until a loan made by this agent falls due.
    pub loan_duration: u32,
    /// Size of the bounded friend list.
    pub max_friends: u32,
    /// Movement decision model.
    #[serde(default)]
    pub decision_policy: DecisionPolicy,
    /// Estate distribution on death.
    #[serde(default)]
    pub inheritance_policy: InheritancePolicy,
}

// ---------------------------------------------------------------------------
// Disease
// ---------------------------------------------------------------------------

/// Additive adjustments to an agent's physiology.
///
/// Used both for the penalties a disease carries and for the deltas that
/// were actually applied to a host after clamping at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TraitPenalties {
    /// Added to sugar metabolism.
    #[serde(default)]
    pub sugar_metabolism: f64,
    /// Added to spice metabolism.
    #[serde(default)]
    pub spice_metabolism: f64,
    /// Added to vision.
    #[serde(default)]
    pub vision: i32,
    /// Added to movement.
    #[serde(default)]
    pub movement: i32,
    /// Added to the fertility factor.
    #[serde(default)]
    pub fertility_factor: f64,
    /// Added to the aggression factor.
    #[serde(default)]
    pub aggression_factor: f64,
}

/// A contagious disease: a binary pattern plus the penalties it inflicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    /// Identity of this disease instance.
    pub id: DiseaseId,
    /// Pattern matched against the host's immune system.
    pub tags: Vec<bool>,
    /// Trait penalties while infected.
    pub penalties: TraitPenalties,
}

// ---------------------------------------------------------------------------
// Loan
// ---------------------------------------------------------------------------

/// Terms of a loan between two agents. Immutable once originated.
///
/// The same record is filed on both sides: as a claim in the creditor's
/// ledger and as an obligation in the debtor's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    /// Identity shared by both ledger copies.
    pub id: LoanId,
    /// The lender.
    pub creditor: AgentId,
    /// The borrower.
    pub debtor: AgentId,
    /// Sugar advanced at origination (zero for re-issued balances).
    pub sugar_principal: f64,
    /// Spice advanced at origination (zero for re-issued balances).
    pub spice_principal: f64,
    /// Sugar owed at the due date, interest included.
    pub sugar_repayment: f64,
    /// Spice owed at the due date, interest included.
    pub spice_repayment: f64,
    /// Ticks between origination and the due date.
    pub duration: u32,
    /// Tick of origination.
    pub origin_tick: u64,
}

impl Loan {
    /// Whether the loan has reached its due date at `tick`.
    ///
    /// Also true for any later tick, so a loan that was not serviced on its
    /// due date is caught up on the next pass.
    pub fn is_due(&self, tick: u64) -> bool {
        tick.saturating_sub(self.origin_tick) >= u64::from(self.duration)
    }

    /// Sugar the debtor must set aside each tick to service this loan.
    pub fn sugar_service_per_tick(&self) -> f64 {
        if self.duration == 0 {
            return self.sugar_repayment;
        }
        self.sugar_repayment / f64::from(self.duration)
    }

    /// Spice the debtor must set aside each tick to service this loan.
    pub fn spice_service_per_tick(&self) -> f64 {
        if self.duration == 0 {
            return self.spice_repayment;
        }
        self.spice_repayment / f64::from(self.duration)
    }
}
