//! Error types for the battle simulation.
//!
//! Errors only surface when a battle is being assembled: malformed
//! battlefield geometry, a roster entry with no stat-table entry, or a
//! stat table that fails to parse. Once a battle is running nothing
//! raises - pathfinding failures fall back to direct stepping, invalid
//! targets idle until the next tick, and out-of-bounds coordinates are
//! clamped.

use thiserror::Error;

use crate::stats::{BuildingKind, UnitClass};

/// Result type alias using [`BattleError`].
pub type Result<T> = std::result::Result<T, BattleError>;

/// Top-level error type for battle setup.
#[derive(Debug, Error)]
pub enum BattleError {
    /// The battlefield descriptor cannot support pathfinding.
    #[error("invalid battlefield geometry: {0}")]
    InvalidGeometry(String),

    /// No stat-table entry for a unit class at the requested level.
    #[error("no stats for unit {class:?} at level {level}")]
    MissingUnitStats {
        /// Unit class that was looked up.
        class: UnitClass,
        /// Level that was looked up.
        level: u32,
    },

    /// No stat-table entry for a building kind at the requested level.
    #[error("no stats for building {kind:?} at level {level}")]
    MissingBuildingStats {
        /// Building kind that was looked up.
        kind: BuildingKind,
        /// Level that was looked up.
        level: u32,
    },

    /// A building was placed outside the battlefield grid.
    #[error("building cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    CellOutOfBounds {
        /// Requested row.
        row: u32,
        /// Requested column.
        col: u32,
        /// Grid row count.
        rows: u32,
        /// Grid column count.
        cols: u32,
    },

    /// A stat table failed to deserialize.
    #[error("failed to parse stat table: {0}")]
    StatParse(String),
}
