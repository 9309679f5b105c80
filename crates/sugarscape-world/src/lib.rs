//! Resource grid, cell occupancy, and pollution for the Sugarscape agent society.
//!
//! This crate models the physical world the agents inhabit: a toroidal grid
//! of cells, each holding sugar and spice up to a capacity, a pollution
//! level, and at most one occupant.
//!
//! # Modules
//!
//! - [`cell`] -- A single site: resources, capacity, pollution, occupant.
//! - [`error`] -- Error types for grid operations.
//! - [`grid`] -- The toroidal [`Grid`]: directional lookup, exclusive
//!   occupancy, harvesting, regrowth, and pollution bookkeeping.
//! - [`starting_grid`] -- Default landscape with two sugar and two spice peaks.

pub mod cell;
pub mod error;
pub mod grid;
pub mod starting_grid;

// Re-export primary types at crate root.
pub use cell::Cell;
pub use error::WorldError;
pub use grid::{Grid, Harvest, ResourceRules};
pub use starting_grid::{LandscapeConfig, create_starting_grid};
