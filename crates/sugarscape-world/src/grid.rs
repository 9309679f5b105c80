//! The toroidal resource grid.
//!
//! The [`Grid`] is the spatial collaborator of the agent engine. It answers
//! directional lookups (with wraparound at the edges), enforces at most one
//! occupant per cell, hands out harvests, and keeps pollution and regrowth
//! bookkeeping. It never holds agents, only their identifiers.

use serde::{Deserialize, Serialize};
use sugarscape_types::{AgentId, Compass, Direction, Position};
use tracing::trace;

use crate::cell::Cell;
use crate::error::WorldError;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Regrowth and pollution rates applied by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRules {
    /// Sugar added to every cell per tick, capped at capacity.
    pub sugar_regrowth: f64,
    /// Spice added to every cell per tick, capped at capacity.
    pub spice_regrowth: f64,
    /// Pollution added per unit of sugar harvested.
    pub sugar_production_pollution: f64,
    /// Pollution added per unit of spice harvested.
    pub spice_production_pollution: f64,
    /// Pollution added per unit of sugar metabolized on the cell.
    pub sugar_consumption_pollution: f64,
    /// Pollution added per unit of spice metabolized on the cell.
    pub spice_consumption_pollution: f64,
}

impl Default for ResourceRules {
    fn default() -> Self {
        Self {
            sugar_regrowth: 1.0,
            spice_regrowth: 1.0,
            sugar_production_pollution: 0.0,
            spice_production_pollution: 0.0,
            sugar_consumption_pollution: 0.0,
            spice_consumption_pollution: 0.0,
        }
    }
}

/// Resources taken from a cell by its occupant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Harvest {
    /// Sugar collected.
    pub sugar: f64,
    /// Spice collected.
    pub spice: f64,
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// A `width` x `height` torus of [`Cell`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    rules: ResourceRules,
}

impl Grid {
    /// Create a grid of empty, zero-capacity cells.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyGrid`] if either dimension is zero.
    pub fn new(width: u32, height: u32, rules: ResourceRules) -> Result<Self, WorldError> {
        let area = usize::try_from(u64::from(width).saturating_mul(u64::from(height))).ok();
        let Some(area) = area.filter(|a| *a > 0) else {
            return Err(WorldError::EmptyGrid { width, height });
        };
        Ok(Self {
            width,
            height,
            cells: vec![Cell::default(); area],
            rules,
        })
    }

    /// Number of columns.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The regrowth and pollution rates in effect.
    pub const fn rules(&self) -> &ResourceRules {
        &self.rules
    }

    /// Whether `pos` lies on the grid.
    pub const fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        let flat = u64::from(pos.y)
            .checked_mul(u64::from(self.width))?
            .checked_add(u64::from(pos.x))?;
        usize::try_from(flat).ok()
    }

    /// Every position on the grid in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Position::new(x, y)))
    }

    /// Borrow the cell at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `pos` is not on the grid.
    pub fn cell(&self, pos: Position) -> Result<&Cell, WorldError> {
        self.index(pos)
            .and_then(|i| self.cells.get(i))
            .ok_or(WorldError::OutOfBounds(pos))
    }

    /// Mutably borrow the cell at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `pos` is not on the grid.
    pub fn cell_mut(&mut self, pos: Position) -> Result<&mut Cell, WorldError> {
        let index = self.index(pos);
        index
            .and_then(|i| self.cells.get_mut(i))
            .ok_or(WorldError::OutOfBounds(pos))
    }

    /// Set a cell's capacity and fill it.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidResource`] for negative or non-finite
    /// capacities and [`WorldError::OutOfBounds`] for an off-grid position.
    pub fn set_capacity(
        &mut self,
        pos: Position,
        max_sugar: f64,
        max_spice: f64,
    ) -> Result<(), WorldError> {
        validate_amount("max_sugar", max_sugar)?;
        validate_amount("max_spice", max_spice)?;
        let cell = self.cell_mut(pos)?;
        cell.max_sugar = max_sugar;
        cell.max_spice = max_spice;
        cell.sugar = max_sugar;
        cell.spice = max_spice;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Topology
    // -------------------------------------------------------------------

    /// The adjacent position one step in `direction`, wrapping at the edges.
    pub fn neighbor(&self, pos: Position, direction: Direction) -> Position {
        let wrap_down = |v: u32, len: u32| v.checked_sub(1).unwrap_or_else(|| len.saturating_sub(1));
        let wrap_up = |v: u32, len: u32| {
            let next = v.saturating_add(1);
            if next >= len { 0 } else { next }
        };
        match direction {
            Direction::North => Position::new(pos.x, wrap_down(pos.y, self.height)),
            Direction::South => Position::new(pos.x, wrap_up(pos.y, self.height)),
            Direction::East => Position::new(wrap_up(pos.x, self.width), pos.y),
            Direction::West => Position::new(wrap_down(pos.x, self.width), pos.y),
        }
    }

    /// The position reached by composing cardinal steps toward `heading`.
    pub fn toward(&self, pos: Position, heading: Compass) -> Position {
        let (first, second) = heading.steps();
        let stepped = self.neighbor(pos, first);
        second.map_or(stepped, |d| self.neighbor(stepped, d))
    }

    /// The four von Neumann neighbors in [`Direction::ALL`] order.
    pub fn von_neumann(&self, pos: Position) -> [Position; 4] {
        Direction::ALL.map(|d| self.neighbor(pos, d))
    }

    /// The eight Moore neighbors in [`Compass::ALL`] order.
    pub fn moore(&self, pos: Position) -> [Position; 8] {
        Compass::ALL.map(|c| self.toward(pos, c))
    }

    /// Cells along the four cardinal rays out to `range`, with their distance.
    ///
    /// The origin itself is never included, even when a ray wraps back to it.
    pub fn cardinal_rays(&self, origin: Position, range: u32) -> Vec<(Position, u32)> {
        let mut found = Vec::new();
        for direction in Direction::ALL {
            let mut current = origin;
            for distance in 1..=range {
                current = self.neighbor(current, direction);
                if current != origin {
                    found.push((current, distance));
                }
            }
        }
        found
    }

    /// Shortest wrapped distance between two positions on a shared row or column.
    ///
    /// Returns `None` when the positions share neither, since only cardinal
    /// moves are allowed.
    pub fn cardinal_distance(&self, a: Position, b: Position) -> Option<u32> {
        match (a.x == b.x, a.y == b.y) {
            (true, true) => Some(0),
            (true, false) => Some(axis_distance(a.y, b.y, self.height)),
            (false, true) => Some(axis_distance(a.x, b.x, self.width)),
            (false, false) => None,
        }
    }

    // -------------------------------------------------------------------
    // Occupancy
    // -------------------------------------------------------------------

    /// The agent occupying `pos`, if any.
    pub fn occupant(&self, pos: Position) -> Option<AgentId> {
        self.cell(pos).ok().and_then(Cell::occupant)
    }

    /// Install `agent` as the occupant of `pos`, evicting any prior occupant.
    ///
    /// Returns the evicted agent. The caller must clear the evicted agent's
    /// own position so both sides of the reference agree.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] for an off-grid position.
    pub fn place(&mut self, agent: AgentId, pos: Position) -> Result<Option<AgentId>, WorldError> {
        let previous = self.cell_mut(pos)?.set_occupant(Some(agent));
        trace!(%agent, %pos, "occupant placed");
        Ok(previous.filter(|p| *p != agent))
    }

    /// Clear `pos` if `agent` is its occupant. Returns whether it was cleared.
    pub fn vacate(&mut self, agent: AgentId, pos: Position) -> bool {
        match self.cell_mut(pos) {
            Ok(cell) if cell.occupant() == Some(agent) => {
                cell.set_occupant(None);
                true
            }
            _ => false,
        }
    }

    /// Empty von Neumann neighbors of `pos`.
    pub fn empty_neighbors(&self, pos: Position) -> Vec<Position> {
        self.von_neumann(pos)
            .into_iter()
            .filter(|p| self.occupant(*p).is_none())
            .collect()
    }

    // -------------------------------------------------------------------
    // Resources and pollution
    // -------------------------------------------------------------------

    /// Take everything on the cell, reset it to zero, and record production pollution.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] for an off-grid position.
    pub fn harvest(&mut self, pos: Position) -> Result<Harvest, WorldError> {
        let rules = self.rules;
        let cell = self.cell_mut(pos)?;
        let taken = Harvest {
            sugar: cell.sugar,
            spice: cell.spice,
        };
        cell.sugar = 0.0;
        cell.spice = 0.0;
        cell.pollution += rules.sugar_production_pollution * taken.sugar
            + rules.spice_production_pollution * taken.spice;
        Ok(taken)
    }

    /// Record consumption pollution for resources metabolized on `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] for an off-grid position.
    pub fn record_consumption(
        &mut self,
        pos: Position,
        sugar: f64,
        spice: f64,
    ) -> Result<(), WorldError> {
        let rules = self.rules;
        let cell = self.cell_mut(pos)?;
        cell.pollution += rules.sugar_consumption_pollution * sugar
            + rules.spice_consumption_pollution * spice;
        Ok(())
    }

    /// Apply one tick of regrowth to every cell, capped at capacity.
    pub fn regrow(&mut self) {
        let rules = self.rules;
        for cell in &mut self.cells {
            cell.sugar = (cell.sugar + rules.sugar_regrowth).min(cell.max_sugar);
            cell.spice = (cell.spice + rules.spice_regrowth).min(cell.max_spice);
        }
    }

    /// Total sugar and spice lying on the grid.
    pub fn total_resources(&self) -> Harvest {
        self.cells.iter().fold(Harvest::default(), |acc, c| Harvest {
            sugar: acc.sugar + c.sugar,
            spice: acc.spice + c.spice,
        })
    }
}

fn axis_distance(a: u32, b: u32, len: u32) -> u32 {
    let forward = if b >= a {
        b.saturating_sub(a)
    } else {
        len.saturating_sub(a.saturating_sub(b))
    };
    forward.min(len.saturating_sub(forward))
}

fn validate_amount(field: &'static str, value: f64) -> Result<(), WorldError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(WorldError::InvalidResource { field, value })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn grid(width: u32, height: u32) -> Grid {
        Grid::new(width, height, ResourceRules::default()).unwrap()
    }

    #[test]
    fn empty_grid_rejected() {
        assert!(matches!(
            Grid::new(0, 5, ResourceRules::default()),
            Err(WorldError::EmptyGrid { .. })
        ));
    }

    #[test]
    fn neighbors_wrap_around_edges() {
        let g = grid(5, 4);
        let corner = Position::new(0, 0);
        assert_eq!(g.neighbor(corner, Direction::North), Position::new(0, 3));
        assert_eq!(g.neighbor(corner, Direction::West), Position::new(4, 0));
        assert_eq!(g.neighbor(Position::new(4, 3), Direction::East), Position::new(0, 3));
        assert_eq!(g.neighbor(Position::new(4, 3), Direction::South), Position::new(4, 0));
    }

    #[test]
    fn moore_composes_diagonals() {
        let g = grid(5, 5);
        let moore = g.moore(Position::new(2, 2));
        assert_eq!(moore[1], Position::new(3, 1));
        assert_eq!(moore[5], Position::new(1, 3));
        assert_eq!(moore.len(), 8);
    }

    #[test]
    fn rays_cover_range_and_skip_origin() {
        let g = grid(3, 3);
        let rays = g.cardinal_rays(Position::new(1, 1), 3);
        // A range of 3 on a 3-wide torus wraps back onto the origin once per ray.
        assert_eq!(rays.len(), 8);
        assert!(rays.iter().all(|(p, _)| *p != Position::new(1, 1)));
    }

    #[test]
    fn cardinal_distance_wraps() {
        let g = grid(10, 10);
        assert_eq!(g.cardinal_distance(Position::new(0, 0), Position::new(0, 9)), Some(1));
        assert_eq!(g.cardinal_distance(Position::new(2, 5), Position::new(6, 5)), Some(4));
        assert_eq!(g.cardinal_distance(Position::new(2, 5), Position::new(6, 6)), None);
    }

    #[test]
    fn place_evicts_prior_occupant() {
        let mut g = grid(3, 3);
        let pos = Position::new(1, 1);
        assert!(matches!(g.place(AgentId(1), pos), Ok(None)));
        assert!(matches!(g.place(AgentId(2), pos), Ok(Some(AgentId(1)))));
        assert_eq!(g.occupant(pos), Some(AgentId(2)));
        assert!(!g.vacate(AgentId(1), pos));
        assert!(g.vacate(AgentId(2), pos));
        assert_eq!(g.occupant(pos), None);
    }

    #[test]
    fn harvest_resets_and_pollutes() {
        let rules = ResourceRules {
            sugar_production_pollution: 0.5,
            ..ResourceRules::default()
        };
        let mut g = Grid::new(2, 2, rules).unwrap();
        let pos = Position::new(0, 0);
        assert!(g.set_capacity(pos, 4.0, 2.0).is_ok());
        let taken = g.harvest(pos).unwrap();
        assert!((taken.sugar - 4.0).abs() < f64::EPSILON);
        assert!((taken.spice - 2.0).abs() < f64::EPSILON);
        let cell = g.cell(pos).unwrap();
        assert!(cell.sugar.abs() < f64::EPSILON);
        assert!((cell.pollution - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn regrowth_capped_at_capacity() {
        let mut g = grid(1, 1);
        let pos = Position::new(0, 0);
        assert!(g.set_capacity(pos, 1.5, 3.0).is_ok());
        assert!(g.harvest(pos).is_ok());
        g.regrow();
        g.regrow();
        let cell = g.cell(pos).unwrap();
        assert!((cell.sugar - 1.5).abs() < f64::EPSILON);
        assert!((cell.spice - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_capacity_rejected() {
        let mut g = grid(1, 1);
        assert!(matches!(
            g.set_capacity(Position::new(0, 0), -1.0, 0.0),
            Err(WorldError::InvalidResource { .. })
        ));
    }
}
