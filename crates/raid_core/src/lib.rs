//! # Raid Core
//!
//! Simulation core for raid battles: an attacking army of units against
//! a static village of buildings on an isometric tile grid.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO (hosts pass stat tables in as RON strings or built tables)
//! - No clock (hosts call [`battle::Battle::update`] with their own `dt`)
//!
//! This separation enables:
//! - Headless balance testing over full battles
//! - Driving the same battle from different frontends
//! - Fast, deterministic-enough unit tests with a hand-rolled tick loop
//!
//! ## Crate Structure
//!
//! - [`battle`] - Battle orchestrator and per-tick unit logic
//! - [`combat`] - Attacks, damage modifiers, and counter-fire
//! - [`grid`] - Tile grid, isometric projection, obstacle maps
//! - [`pathfinding`] - Grid A* and continuous steering
//! - [`stats`] - Data-driven unit/building stat lookup
//! - [`units`] - Runtime unit and building records
//! - [`math`] - Minimal 2D vector math

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod battle;
pub mod combat;
pub mod error;
pub mod grid;
pub mod math;
pub mod pathfinding;
pub mod stats;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::battle::{Battle, TickEvents};
    pub use crate::combat::{AreaDestroyEvent, DamageEvent, TargetRef};
    pub use crate::error::{BattleError, Result};
    pub use crate::grid::{BattleGrid, Battlefield, GridPos, ObstacleMap};
    pub use crate::math::Vec2;
    pub use crate::stats::{
        BuildingKind, BuildingStats, DefenseStats, StatTable, StatsProvider, UnitClass, UnitStats,
    };
    pub use crate::units::{Building, Health, Unit};
}
