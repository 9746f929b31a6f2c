//! Data-driven unit and building identity.
//!
//! Each combatant is a `(kind, stats)` pair: a small enum tag that
//! behavior branches on explicitly, plus a stat block looked up from a
//! [`StatsProvider`] keyed by `(kind, level)`. The core performs no file
//! IO - hosts either build a [`StatTable`] in code or hand the core a
//! RON string to parse.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};

/// Combat unit classification.
///
/// The class decides targeting policy and damage modifiers; everything
/// numeric lives in [`UnitStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitClass {
    /// Melee bruiser. Ignores walls when picking targets.
    Raider,
    /// Ranged attacker. Ignores walls when picking targets.
    Archer,
    /// Heavy tank. Hunts defensive structures exclusively while any
    /// remain standing, and deals double damage to them.
    Juggernaut,
    /// Demolition specialist. Only ever targets walls; its single attack
    /// levels a 3x3 block of them and destroys the sapper itself.
    Sapper,
    /// Melee generalist that will happily chew through walls directly.
    Marauder,
}

impl UnitClass {
    /// Whether this class performs the one-shot area wall demolition.
    #[must_use]
    pub const fn is_breacher(self) -> bool {
        matches!(self, Self::Sapper)
    }

    /// Whether this class prioritizes defensive structures.
    #[must_use]
    pub const fn is_tank(self) -> bool {
        matches!(self, Self::Juggernaut)
    }

    /// Whether this class may select walls as ordinary targets.
    #[must_use]
    pub const fn targets_walls(self) -> bool {
        matches!(self, Self::Sapper | Self::Marauder)
    }
}

/// Building classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Village center.
    TownHall,
    /// Resource producer.
    GoldMine,
    /// Resource storage.
    Storage,
    /// Short-range defensive structure.
    Cannon,
    /// Long-range defensive structure.
    ArcherTower,
    /// Single-cell barrier. Halves incoming damage.
    Wall,
}

impl BuildingKind {
    /// Whether this building fires back at attacking units.
    #[must_use]
    pub const fn is_defense(self) -> bool {
        matches!(self, Self::Cannon | Self::ArcherTower)
    }

    /// Whether this building is a wall segment.
    #[must_use]
    pub const fn is_wall(self) -> bool {
        matches!(self, Self::Wall)
    }

    /// Footprint radius in cells around the anchor cell: walls occupy a
    /// single cell, everything else a 3x3 block.
    #[must_use]
    pub const fn footprint_radius(self) -> u32 {
        if self.is_wall() {
            0
        } else {
            1
        }
    }
}

/// Stat block for one unit class at one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum health points.
    pub max_health: u32,
    /// Damage per hit before modifiers.
    pub damage: u32,
    /// Seconds between attacks.
    pub attack_interval: f32,
    /// Attack range in world units.
    pub attack_range: f32,
    /// Movement speed in world units per second.
    pub move_speed: f32,
}

/// Counter-fire parameters for defensive structures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefenseStats {
    /// Damage dealt per shot.
    pub damage_per_hit: f32,
    /// Shots per second.
    pub attacks_per_second: f32,
    /// Range measured in grid cells.
    pub range_cells: u32,
}

/// Stat block for one building kind at one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingStats {
    /// Maximum health points.
    pub max_health: u32,
    /// Counter-fire parameters; `None` for non-defensive buildings.
    #[serde(default)]
    pub defense: Option<DefenseStats>,
}

/// Lookup collaborator that resolves `(kind, level)` to a stat block.
///
/// Injected by the host when rosters are loaded; the core never reaches
/// for a global.
pub trait StatsProvider {
    /// Stats for a unit class at a level, if defined.
    fn unit_stats(&self, class: UnitClass, level: u32) -> Option<UnitStats>;

    /// Stats for a building kind at a level, if defined.
    fn building_stats(&self, kind: BuildingKind, level: u32) -> Option<BuildingStats>;
}

/// In-memory stat table, deserializable from RON.
///
/// # Example RON
///
/// ```ron
/// StatTable(
///     units: {
///         (Raider, 1): UnitStats(
///             max_health: 100,
///             damage: 20,
///             attack_interval: 1.0,
///             attack_range: 12.0,
///             move_speed: 40.0,
///         ),
///     },
///     buildings: {
///         (Cannon, 1): BuildingStats(
///             max_health: 420,
///             defense: Some(DefenseStats(
///                 damage_per_hit: 9.0,
///                 attacks_per_second: 1.0,
///                 range_cells: 9,
///             )),
///         ),
///     },
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatTable {
    /// Unit stat blocks keyed by (class, level).
    #[serde(default)]
    units: HashMap<(UnitClass, u32), UnitStats>,
    /// Building stat blocks keyed by (kind, level).
    #[serde(default)]
    buildings: HashMap<(BuildingKind, u32), BuildingStats>,
}

impl StatTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table from a RON string.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::StatParse`] when the string is not valid RON.
    pub fn from_ron(source: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| BattleError::StatParse(e.to_string()))
    }

    /// Register a unit stat block.
    pub fn insert_unit(&mut self, class: UnitClass, level: u32, stats: UnitStats) {
        self.units.insert((class, level), stats);
    }

    /// Register a building stat block.
    pub fn insert_building(&mut self, kind: BuildingKind, level: u32, stats: BuildingStats) {
        self.buildings.insert((kind, level), stats);
    }
}

impl StatsProvider for StatTable {
    fn unit_stats(&self, class: UnitClass, level: u32) -> Option<UnitStats> {
        self.units.get(&(class, level)).copied()
    }

    fn building_stats(&self, kind: BuildingKind, level: u32) -> Option<BuildingStats> {
        self.buildings.get(&(kind, level)).copied()
    }
}
