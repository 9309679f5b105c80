//! Default landscape generation.
//!
//! The classic Sugarscape terrain: two sugar mountains on one diagonal and
//! two spice mountains on the other. Capacity falls off linearly with
//! Euclidean distance from the nearest peak and is floored to whole units.

use serde::{Deserialize, Serialize};
use sugarscape_types::Position;
use tracing::info;

use crate::error::WorldError;
use crate::grid::{Grid, ResourceRules};

/// Parameters for [`create_starting_grid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandscapeConfig {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Sugar capacity at a sugar peak.
    pub max_sugar: f64,
    /// Spice capacity at a spice peak.
    pub max_spice: f64,
    /// Distance from a peak at which capacity reaches zero.
    pub peak_radius: f64,
    /// Regrowth and pollution rates.
    pub rules: ResourceRules,
}

impl Default for LandscapeConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
            max_sugar: 4.0,
            max_spice: 4.0,
            peak_radius: 20.0,
            rules: ResourceRules::default(),
        }
    }
}

/// Build a grid with two sugar peaks and two spice peaks, every cell full.
///
/// # Errors
///
/// Returns [`WorldError::EmptyGrid`] for zero dimensions and
/// [`WorldError::InvalidResource`] for negative or non-finite capacities or
/// a non-positive radius.
pub fn create_starting_grid(config: &LandscapeConfig) -> Result<Grid, WorldError> {
    if !(config.peak_radius.is_finite() && config.peak_radius > 0.0) {
        return Err(WorldError::InvalidResource {
            field: "peak_radius",
            value: config.peak_radius,
        });
    }
    let mut grid = Grid::new(config.width, config.height, config.rules)?;

    let w = f64::from(config.width);
    let h = f64::from(config.height);
    let sugar_peaks = [(w / 4.0, h / 4.0), (w * 3.0 / 4.0, h * 3.0 / 4.0)];
    let spice_peaks = [(w * 3.0 / 4.0, h / 4.0), (w / 4.0, h * 3.0 / 4.0)];

    let positions: Vec<Position> = grid.positions().collect();
    for pos in positions {
        let sugar = peak_capacity(pos, &sugar_peaks, config.max_sugar, config.peak_radius);
        let spice = peak_capacity(pos, &spice_peaks, config.max_spice, config.peak_radius);
        grid.set_capacity(pos, sugar, spice)?;
    }

    let totals = grid.total_resources();
    info!(
        width = config.width,
        height = config.height,
        sugar = totals.sugar,
        spice = totals.spice,
        "starting grid created"
    );
    Ok(grid)
}

fn peak_capacity(pos: Position, peaks: &[(f64, f64)], max: f64, radius: f64) -> f64 {
    let x = f64::from(pos.x);
    let y = f64::from(pos.y);
    let nearest = peaks
        .iter()
        .map(|(px, py)| (x - px).hypot(y - py))
        .fold(f64::INFINITY, f64::min);
    (max * (1.0 - nearest / radius)).clamp(0.0, max).floor()
}
