//! Error types for the `sugarscape-world` crate.

use sugarscape_types::Position;

/// Errors that can occur during grid operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The grid must have at least one row and one column.
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    EmptyGrid {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A position lies outside the grid.
    #[error("position {0} is outside the grid")]
    OutOfBounds(Position),

    /// A capacity or rate was negative or not finite.
    #[error("invalid resource value for {field}: {value}")]
    InvalidResource {
        /// Which field was rejected.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}
