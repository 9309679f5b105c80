//! Shared type definitions for the Sugarscape agent society.
//!
//! This crate is the single source of truth for the data records exchanged
//! between the grid, the agent engine, and the simulation runner.
//!
//! # Modules
//!
//! - [`ids`] -- Typed identifiers for agents, loans, and diseases
//! - [`enums`] -- Enumeration types (sex, inheritance, decision models, directions)
//! - [`structs`] -- Core records (endowments, diseases, loans, positions)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Compass, DecisionPolicy, Direction, EthicalFramework, InheritancePolicy, Sex};
pub use ids::{AgentId, DiseaseId, LoanId};
pub use structs::{AgentEndowment, Disease, Loan, Position, TraitPenalties};
