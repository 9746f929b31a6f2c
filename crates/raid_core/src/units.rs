//! Runtime combatant records.
//!
//! Units and buildings live in dense vectors owned by the battle and
//! refer to each other by index, never by pointer. Both share the same
//! two-phase death lifecycle: health reaching zero makes an entity
//! invisible to targeting and obstacle maps immediately, but the record
//! stays in its list for a short countdown so the renderer can play a
//! death effect before it vanishes.

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;
use crate::math::Vec2;
use crate::stats::{BuildingKind, BuildingStats, UnitClass, UnitStats};

/// Health points for damageable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if health has reached zero.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning the amount actually dealt. Floors at 0.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }

    /// Health as a percentage (0-100), for health-bar rendering.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            0
        } else {
            (self.current * 100) / self.max
        }
    }
}

/// A deployed combat unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// Unit class tag.
    pub class: UnitClass,
    /// Level the stat block was resolved at.
    pub level: u32,
    /// Current world position.
    pub pos: Vec2,
    /// Health points.
    pub health: Health,
    /// Resolved stat block.
    pub stats: UnitStats,
    /// Seconds until the next attack is allowed.
    pub cooldown: f32,
    /// Index of the current target in the battle's building list.
    pub target: Option<usize>,
    /// Cached route, as grid cells. Element 0 is the cell the route was
    /// computed from.
    pub path: Vec<GridPos>,
    /// Index of the next waypoint in `path`.
    pub path_cursor: usize,
    /// Seconds until the route is recomputed.
    pub repath_timer: f32,
    /// Whether the death animation window is running.
    pub dying: bool,
    /// Seconds left in the death animation window.
    pub death_countdown: f32,
}

impl Unit {
    /// Create a freshly deployed unit at a world position.
    #[must_use]
    pub fn new(class: UnitClass, level: u32, stats: UnitStats, pos: Vec2) -> Self {
        Self {
            class,
            level,
            pos,
            health: Health::new(stats.max_health),
            stats,
            cooldown: 0.0,
            target: None,
            path: Vec::new(),
            path_cursor: 0,
            repath_timer: 0.0,
            dying: false,
            death_countdown: 0.0,
        }
    }

    /// Whether the unit still participates in the battle.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }

    /// Drop the cached route and force a recompute on the next tick.
    pub fn clear_path(&mut self) {
        self.path.clear();
        self.path_cursor = 0;
        self.repath_timer = 0.0;
    }

    /// Drop both the route and the cached target.
    pub fn clear_target(&mut self) {
        self.target = None;
        self.clear_path();
    }
}

/// A building on the defended village layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    /// Building kind tag.
    pub kind: BuildingKind,
    /// Level the stat block was resolved at.
    pub level: u32,
    /// Anchor cell on the grid. Buildings never move.
    pub cell: GridPos,
    /// World position of the anchor cell, fixed at load time.
    pub pos: Vec2,
    /// Health points.
    pub health: Health,
    /// Resolved stat block.
    pub stats: BuildingStats,
    /// Seconds until the next counter-fire shot is allowed.
    pub counter_cooldown: f32,
    /// Whether the death animation window is running.
    pub dying: bool,
    /// Seconds left in the death animation window.
    pub death_countdown: f32,
}

impl Building {
    /// Create a building record. `current_health` restores partially
    /// damaged buildings from the village layout; `None` means full.
    #[must_use]
    pub fn new(
        kind: BuildingKind,
        level: u32,
        cell: GridPos,
        pos: Vec2,
        stats: BuildingStats,
        current_health: Option<u32>,
    ) -> Self {
        let mut health = Health::new(stats.max_health);
        if let Some(current) = current_health {
            health.current = current.min(health.max);
        }
        Self {
            kind,
            level,
            cell,
            pos,
            health,
            stats,
            counter_cooldown: 0.0,
            dying: false,
            death_countdown: 0.0,
        }
    }

    /// Whether the building still blocks cells and can be targeted.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }
}
