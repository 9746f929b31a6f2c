//! Tile grid, isometric projection, and obstacle maps.
//!
//! The battlefield is a fixed `rows x cols` grid of tiles. Buildings sit
//! on grid cells; units move in continuous world space. The projection
//! between the two is the standard isometric diamond mapping
//! (`x = anchor.x + (col - row) * tile_w / 2`,
//! `y = anchor.y - (col + row) * tile_h / 2`) and its algebraic inverse.
//!
//! Obstacle maps are rebuilt from live building state every time a unit
//! needs a route, so they are plain boolean grids with no entity
//! bookkeeping of their own.

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};
use crate::math::Vec2;

/// An integer (row, column) cell on the battlefield grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    /// Row index.
    pub row: u32,
    /// Column index.
    pub col: u32,
}

impl GridPos {
    /// Create a new grid position.
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Manhattan distance to another cell.
    #[must_use]
    pub fn manhattan_distance(self, other: Self) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Chebyshev (king-move) distance to another cell.
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }
}

/// Battlefield geometry supplied by the host when a battle starts.
///
/// `tile_w`/`tile_h` and `anchor` come from the rendered background
/// image; `cell_size_px` is the screen-space footprint of one tile and
/// feeds defensive-structure range calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Battlefield {
    /// Grid height in cells.
    pub rows: u32,
    /// Grid width in cells.
    pub cols: u32,
    /// Tile width in world units.
    pub tile_w: f32,
    /// Tile height in world units.
    pub tile_h: f32,
    /// World position of cell (0, 0).
    pub anchor: Vec2,
    /// Screen-space size of one cell in pixels.
    pub cell_size_px: f32,
}

/// Validated battlefield grid with the isometric projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleGrid {
    field: Battlefield,
}

impl BattleGrid {
    /// Validate a battlefield descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::InvalidGeometry`] for a zero-sized grid or
    /// degenerate tile dimensions. This is the one fatal precondition of
    /// the whole core; everything downstream degrades gracefully.
    pub fn new(field: Battlefield) -> Result<Self> {
        if field.rows == 0 || field.cols == 0 {
            return Err(BattleError::InvalidGeometry(format!(
                "grid is {}x{} cells",
                field.rows, field.cols
            )));
        }
        if !(field.tile_w > 0.0) || !(field.tile_h > 0.0) {
            return Err(BattleError::InvalidGeometry(format!(
                "tile dimensions {}x{} are not positive",
                field.tile_w, field.tile_h
            )));
        }
        if !(field.cell_size_px > 0.0) {
            return Err(BattleError::InvalidGeometry(format!(
                "cell size {} px is not positive",
                field.cell_size_px
            )));
        }
        Ok(Self { field })
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.field.rows
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.field.cols
    }

    /// Screen-space size of one cell in pixels.
    #[must_use]
    pub const fn cell_size_px(&self) -> f32 {
        self.field.cell_size_px
    }

    /// Check if a cell is within grid bounds.
    #[must_use]
    pub const fn in_bounds(&self, cell: GridPos) -> bool {
        cell.row < self.field.rows && cell.col < self.field.cols
    }

    /// Project a grid cell to its world position.
    #[must_use]
    pub fn grid_to_world(&self, cell: GridPos) -> Vec2 {
        let r = cell.row as f32;
        let c = cell.col as f32;
        Vec2::new(
            self.field.anchor.x + (c - r) * self.field.tile_w / 2.0,
            self.field.anchor.y - (c + r) * self.field.tile_h / 2.0,
        )
    }

    /// Project a world position back to the nearest grid cell.
    ///
    /// The result is clamped into `[0, rows) x [0, cols)`; out-of-bounds
    /// positions map to the closest edge cell rather than failing.
    #[must_use]
    pub fn world_to_grid(&self, pos: Vec2) -> GridPos {
        let dx = (pos.x - self.field.anchor.x) / (self.field.tile_w / 2.0);
        let dy = (self.field.anchor.y - pos.y) / (self.field.tile_h / 2.0);
        let row = ((dy - dx) / 2.0).round();
        let col = ((dy + dx) / 2.0).round();
        GridPos::new(
            clamp_index(row, self.field.rows),
            clamp_index(col, self.field.cols),
        )
    }
}

/// Clamp a projected float index into `[0, len)`.
fn clamp_index(value: f32, len: u32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        0
    } else if value >= (len - 1) as f32 {
        len - 1
    } else {
        value as u32
    }
}

/// Boolean grid marking impassable cells.
///
/// Two variants are built per routing pass: a "hard" map where walls
/// block, and a "soft" map where walls never block. Comparing routes on
/// the two detects when a wall is the cause of a long detour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleMap {
    rows: u32,
    cols: u32,
    blocked: Vec<bool>,
}

impl ObstacleMap {
    /// Create a map with all cells passable.
    #[must_use]
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            blocked: vec![false; (rows as usize) * (cols as usize)],
        }
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Check if a cell is within bounds.
    #[must_use]
    pub const fn in_bounds(&self, cell: GridPos) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    #[inline]
    fn index(&self, cell: GridPos) -> usize {
        (cell.row as usize) * (self.cols as usize) + (cell.col as usize)
    }

    /// Check if a cell is impassable. Out-of-bounds cells count as blocked.
    #[must_use]
    pub fn is_blocked(&self, cell: GridPos) -> bool {
        if self.in_bounds(cell) {
            self.blocked[self.index(cell)]
        } else {
            true
        }
    }

    /// Mark a single cell blocked or passable. Out of bounds is a no-op.
    pub fn set_blocked(&mut self, cell: GridPos, blocked: bool) {
        if self.in_bounds(cell) {
            let index = self.index(cell);
            self.blocked[index] = blocked;
        }
    }

    /// Block the square of cells within Chebyshev distance `radius` of
    /// `center`. Cells falling off the grid edge are skipped.
    pub fn block_square(&mut self, center: GridPos, radius: u32) {
        let r0 = center.row.saturating_sub(radius);
        let c0 = center.col.saturating_sub(radius);
        for row in r0..=center.row.saturating_add(radius) {
            for col in c0..=center.col.saturating_add(radius) {
                self.set_blocked(GridPos::new(row, col), true);
            }
        }
    }
}
