//! Error type shared by the propagation engine and the landscape.
//!
//! Invalid *neighbors* inside the burn loops are never errors, they are
//! skipped. Errors are reserved for caller-supplied input that breaks a
//! contract and for internal invariant failures.

use std::fmt;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, FireSpreadError>;

/// Errors produced by fire spread operations
#[derive(Debug, Clone, PartialEq)]
pub enum FireSpreadError {
    /// A caller-supplied coordinate lies outside the grid
    InvalidCoordinate {
        /// Row of the rejected coordinate
        y: usize,
        /// Column of the rejected coordinate
        x: usize,
        /// Grid height (rows)
        height: usize,
        /// Grid width (columns)
        width: usize,
    },
    /// The active fire list is full.
    ///
    /// Each pixel can enter the list at most once, so this indicates a logic
    /// error rather than a recoverable condition.
    CapacityExhausted {
        /// Fixed capacity of the list
        capacity: usize,
    },
    /// A burn step or cursor advance was requested with no pending fires
    EmptyActiveList,
    /// Not enough flammable cells were found around a placement point
    InsufficientFlammableArea {
        /// Number of cells requested
        requested: usize,
        /// Number of flammable cells available
        found: usize,
    },
    /// Two grids that must be index-aligned have different shapes
    ShapeMismatch {
        /// Expected `(height, width)`
        expected: (usize, usize),
        /// Actual `(height, width)`
        found: (usize, usize),
    },
    /// Landscape configuration failed validation
    InvalidConfig(String),
}

impl fmt::Display for FireSpreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FireSpreadError::InvalidCoordinate {
                y,
                x,
                height,
                width,
            } => write!(
                f,
                "Coordinate ({y}, {x}) is outside the {height}x{width} grid"
            ),
            FireSpreadError::CapacityExhausted { capacity } => {
                write!(f, "Active fire list exhausted its capacity of {capacity}")
            }
            FireSpreadError::EmptyActiveList => write!(f, "Active fire list is empty"),
            FireSpreadError::InsufficientFlammableArea { requested, found } => write!(
                f,
                "Requested {requested} flammable cells but only {found} are available"
            ),
            FireSpreadError::ShapeMismatch { expected, found } => write!(
                f,
                "Grid shape mismatch: expected {}x{}, found {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
            FireSpreadError::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for FireSpreadError {}
