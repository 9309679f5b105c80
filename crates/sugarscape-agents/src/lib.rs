//! Agent state and per-tick behavioral protocols for the Sugarscape society.
//!
//! This crate is the logic layer for agents: everything an agent decides and
//! does on its turn, operating on a [`Society`] (grid plus population) without
//! touching I/O. It sits between `sugarscape-types`/`sugarscape-world` and the
//! runner in `sugarscape-core`, which schedules turns across the population.
//!
//! # Modules
//!
//! - [`agent`] -- The agent entity and its derived quantities ([`Agent`])
//! - [`combat`] -- Looting and killing the occupant of a destination cell
//! - [`config`] -- Society-wide constants ([`SocietyParams`])
//! - [`credit`] -- Lending, creditworthiness, and loan servicing
//! - [`culture`] -- Tag transmission and tribe membership ([`Tribe`])
//! - [`death`] -- Death causes and estate distribution ([`DeathCause`])
//! - [`decision`] -- Cell valuation and the selfish movement policy
//! - [`error`] -- Error types for all agent operations ([`AgentError`])
//! - [`ethics`] -- The ethics-weighted movement policy
//! - [`immune`] -- Contagion, immune matching, and recovery
//! - [`lifecycle`] -- The per-tick protocol sequence ([`run_agent_tick`])
//! - [`numeric`] -- Cent rounding and float tolerance
//! - [`population`] -- Registry and factory for agents ([`Population`])
//! - [`reproduction`] -- Mating, child endowments, and births
//! - [`social`] -- Per-agent relationship and loan ledger ([`SocialLedger`])
//! - [`society`] -- The shared protocol context ([`Society`], [`TickEvents`])
//! - [`trade`] -- Bilateral sugar-for-spice bargaining
//! - [`utility`] -- Need, marginal rate of substitution, and welfare
//! - [`vitals`] -- Collection, metabolism, and aging

pub mod agent;
pub mod combat;
pub mod config;
pub mod credit;
pub mod culture;
pub mod death;
pub mod decision;
pub mod error;
pub mod ethics;
pub mod immune;
pub mod lifecycle;
pub mod numeric;
pub mod population;
pub mod reproduction;
pub mod social;
pub mod society;
pub mod trade;
pub mod utility;
pub mod vitals;

// Re-export primary types at crate root for convenience.
pub use agent::Agent;
pub use config::SocietyParams;
pub use credit::{LoanTerms, Settlement, run_lending, service_loans};
pub use culture::{Tribe, find_tribe, hamming_distance};
pub use death::{DeathCause, Estate};
pub use error::AgentError;
pub use immune::{Contagion, Infection, catch_disease};
pub use lifecycle::{AgentTurn, run_agent_tick};
pub use population::Population;
pub use social::{Friend, PeerRecord, SocialLedger};
pub use society::{Society, TickEvents};
pub use trade::Negotiation;
