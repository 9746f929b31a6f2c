//! Test fixtures and helpers.
//!
//! Pre-built battlefields and stat tables for consistent testing. The
//! numbers are chosen to be easy to reason about in assertions, not to
//! be balanced.

use raid_core::prelude::*;

/// The battlefield geometry used across the test suites: a 44x44 grid
/// with 64x32 isometric tiles, matching the standard village background.
#[must_use]
pub fn standard_field() -> Battlefield {
    Battlefield {
        rows: 44,
        cols: 44,
        tile_w: 64.0,
        tile_h: 32.0,
        anchor: Vec2::new(1408.0, 1408.0),
        cell_size_px: 16.0,
    }
}

/// A smaller 20x20 battlefield for tests that walk every cell.
#[must_use]
pub fn small_field() -> Battlefield {
    Battlefield {
        rows: 20,
        cols: 20,
        tile_w: 64.0,
        tile_h: 32.0,
        anchor: Vec2::new(640.0, 640.0),
        cell_size_px: 16.0,
    }
}

/// Level-1 stat blocks for the full unit roster and building set.
#[must_use]
pub fn standard_stats() -> StatTable {
    let mut table = StatTable::new();

    table.insert_unit(
        UnitClass::Raider,
        1,
        UnitStats {
            max_health: 100,
            damage: 20,
            attack_interval: 1.0,
            attack_range: 12.0,
            move_speed: 64.0,
        },
    );
    table.insert_unit(
        UnitClass::Archer,
        1,
        UnitStats {
            max_health: 60,
            damage: 12,
            attack_interval: 0.8,
            attack_range: 56.0,
            move_speed: 72.0,
        },
    );
    table.insert_unit(
        UnitClass::Juggernaut,
        1,
        UnitStats {
            max_health: 400,
            damage: 15,
            attack_interval: 1.2,
            attack_range: 12.0,
            move_speed: 40.0,
        },
    );
    table.insert_unit(
        UnitClass::Sapper,
        1,
        UnitStats {
            max_health: 80,
            damage: 0,
            attack_interval: 1.0,
            attack_range: 12.0,
            move_speed: 80.0,
        },
    );
    table.insert_unit(
        UnitClass::Marauder,
        1,
        UnitStats {
            max_health: 150,
            damage: 25,
            attack_interval: 1.0,
            attack_range: 12.0,
            move_speed: 56.0,
        },
    );

    table.insert_building(
        BuildingKind::TownHall,
        1,
        BuildingStats {
            max_health: 800,
            defense: None,
        },
    );
    table.insert_building(
        BuildingKind::GoldMine,
        1,
        BuildingStats {
            max_health: 250,
            defense: None,
        },
    );
    table.insert_building(
        BuildingKind::Storage,
        1,
        BuildingStats {
            max_health: 300,
            defense: None,
        },
    );
    table.insert_building(
        BuildingKind::Cannon,
        1,
        BuildingStats {
            max_health: 350,
            defense: Some(DefenseStats {
                damage_per_hit: 10.0,
                attacks_per_second: 1.0,
                range_cells: 9,
            }),
        },
    );
    table.insert_building(
        BuildingKind::ArcherTower,
        1,
        BuildingStats {
            max_health: 280,
            defense: Some(DefenseStats {
                damage_per_hit: 6.0,
                attacks_per_second: 1.5,
                range_cells: 12,
            }),
        },
    );
    table.insert_building(
        BuildingKind::Wall,
        1,
        BuildingStats {
            max_health: 200,
            defense: None,
        },
    );

    table
}

/// An empty battle on [`small_field`], ready for buildings and units.
///
/// # Panics
///
/// Panics if the fixture geometry is rejected, which would be a bug in
/// the fixture itself.
#[must_use]
pub fn small_battle() -> Battle {
    Battle::new(small_field()).expect("fixture geometry is valid")
}

/// An empty battle on [`standard_field`].
///
/// # Panics
///
/// Panics if the fixture geometry is rejected, which would be a bug in
/// the fixture itself.
#[must_use]
pub fn standard_battle() -> Battle {
    Battle::new(standard_field()).expect("fixture geometry is valid")
}

/// Place a horizontal run of wall segments, returning their indices.
///
/// # Panics
///
/// Panics when a wall lands off the grid or the stat table has no
/// level-1 wall entry.
pub fn wall_row(
    battle: &mut Battle,
    stats: &StatTable,
    row: u32,
    cols: std::ops::RangeInclusive<u32>,
) -> Vec<usize> {
    cols.map(|col| {
        battle
            .add_building(stats, BuildingKind::Wall, 1, GridPos::new(row, col), None)
            .expect("wall placement is valid")
    })
    .collect()
}

/// Place a vertical run of wall segments, returning their indices.
///
/// # Panics
///
/// Panics when a wall lands off the grid or the stat table has no
/// level-1 wall entry.
pub fn wall_col(
    battle: &mut Battle,
    stats: &StatTable,
    col: u32,
    rows: std::ops::RangeInclusive<u32>,
) -> Vec<usize> {
    rows.map(|row| {
        battle
            .add_building(stats, BuildingKind::Wall, 1, GridPos::new(row, col), None)
            .expect("wall placement is valid")
    })
    .collect()
}
