//! Configuration, seeding, and the tick scheduler for the Sugarscape simulation.
//!
//! This crate drives the agent engine in `sugarscape-agents`: it loads a
//! run's YAML configuration, builds the landscape, seeds the initial
//! population and diseases, and advances the global tick, running each
//! living agent's turn in random order.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `sugarscape.yaml` into
//!   strongly-typed structs.
//! - [`runner`] -- The [`Simulation`] tick loop, per-tick summaries, and
//!   the Gini coefficient.
//! - [`seeding`] -- Random endowments, initial placement, and seed infections.
//!
//! [`Simulation`]: runner::Simulation

pub mod config;
pub mod runner;
pub mod seeding;

pub use config::{ConfigError, SimulationConfig};
pub use runner::{EndReason, RunnerError, Simulation, SimulationResult, TickSummary};
