//! Attack resolution for one attacker/target pair at a time.
//!
//! These functions are near-stateless: they read and mutate the records
//! handed to them and append observational events for the renderer
//! (floating damage text, hit pulses), but own no state of their own.
//! The battle orchestrator decides who attacks whom and when.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::stats::UnitClass;
use crate::units::{Building, Unit};

/// Minimum damage any landed hit deals.
pub const MIN_DAMAGE: u32 = 1;

/// Floor for a defensive structure's effective range, in world units.
pub const MIN_DEFENSE_RANGE: f32 = 20.0;

/// Floor for the per-cell pixel size used in defense range conversion.
pub const MIN_CELL_PIXELS: f32 = 8.0;

/// Reference to a combatant in the battle's dense lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRef {
    /// Index into the unit list.
    Unit(usize),
    /// Index into the building list.
    Building(usize),
}

/// A landed hit, for floating damage text and hit-pulse effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Who dealt the damage.
    pub attacker: TargetRef,
    /// Who took it.
    pub target: TargetRef,
    /// Damage applied after modifiers.
    pub amount: u32,
}

/// A completed area wall demolition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaDestroyEvent {
    /// Index of the breacher unit that detonated.
    pub attacker: usize,
    /// Building indices of the walls leveled by the blast.
    pub walls: Vec<usize>,
}

/// Euclidean range check between two world positions.
#[must_use]
pub fn in_range(a: Vec2, b: Vec2, range: f32) -> bool {
    a.distance_squared(b) <= range * range
}

/// Damage a unit class deals to a building kind.
///
/// Tanks deal double damage to defensive structures; walls halve all
/// incoming damage. Either way a landed hit deals at least [`MIN_DAMAGE`].
#[must_use]
pub fn modified_damage(attacker: UnitClass, base: u32, target: &Building) -> u32 {
    let mut damage = base;
    if attacker.is_tank() && target.kind.is_defense() {
        damage *= 2;
    }
    if target.kind.is_wall() {
        damage /= 2;
    }
    damage.max(MIN_DAMAGE)
}

/// Resolve one ordinary attack against a building.
///
/// No-op (returns `false`) if the attacker is dead, the target is
/// already at zero health, the attacker's cooldown has not elapsed, or
/// the target is out of range. On success the modified damage is
/// applied, the attacker's cooldown resets to its attack interval, and a
/// damage event is emitted.
pub fn attack_building(
    attacker_index: usize,
    attacker: &mut Unit,
    target_index: usize,
    target: &mut Building,
    events: &mut Vec<DamageEvent>,
) -> bool {
    if !attacker.is_alive() || target.health.is_dead() {
        return false;
    }
    if attacker.cooldown > 0.0 {
        return false;
    }
    if !in_range(attacker.pos, target.pos, attacker.stats.attack_range) {
        return false;
    }

    let damage = modified_damage(attacker.class, attacker.stats.damage, target);
    target.health.apply_damage(damage);
    attacker.cooldown = attacker.stats.attack_interval;

    events.push(DamageEvent {
        attacker: TargetRef::Unit(attacker_index),
        target: TargetRef::Building(target_index),
        amount: damage,
    });
    true
}

/// Resolve a breacher's all-or-nothing wall demolition.
///
/// Usable only by the breacher class against wall-kind targets, under
/// the same preconditions as [`attack_building`]. On success every wall
/// whose cell lies within the 3x3 block centered on the target wall is
/// reduced to zero health regardless of its remaining hit points, the
/// attacker self-destructs, and an area-destroy event is emitted. This
/// is a one-shot terminal action per attacker.
pub fn area_destroy_attack(
    attacker_index: usize,
    attacker: &mut Unit,
    target_index: usize,
    buildings: &mut [Building],
    events: &mut Vec<AreaDestroyEvent>,
) -> bool {
    if !attacker.class.is_breacher() {
        return false;
    }
    let Some(target) = buildings.get(target_index) else {
        return false;
    };
    if !target.kind.is_wall() {
        return false;
    }
    if !attacker.is_alive() || target.health.is_dead() {
        return false;
    }
    if attacker.cooldown > 0.0 {
        return false;
    }
    if !in_range(attacker.pos, target.pos, attacker.stats.attack_range) {
        return false;
    }

    let blast_center = target.cell;
    let mut walls = Vec::new();
    for (index, building) in buildings.iter_mut().enumerate() {
        if building.kind.is_wall() && building.cell.chebyshev_distance(blast_center) <= 1 {
            building.health.current = 0;
            walls.push(index);
        }
    }

    // Self-destruct.
    attacker.health.current = 0;
    attacker.cooldown = attacker.stats.attack_interval;

    events.push(AreaDestroyEvent {
        attacker: attacker_index,
        walls,
    });
    true
}

/// Resolve one tick of counter-fire for a defensive structure.
///
/// Non-defensive kinds never fire. The cooldown is decremented by `dt`
/// and the shot only releases once it has fully lapsed; if no live unit
/// is inside the effective range the cooldown stays decremented rather
/// than resetting. Target selection is nearest-unit-wins with ties going
/// to the first unit scanned - defenders have no priority policy.
pub fn defense_counter_fire(
    dt: f32,
    defender_index: usize,
    defender: &mut Building,
    units: &mut [Unit],
    cell_size_px: f32,
    events: &mut Vec<DamageEvent>,
) -> bool {
    let Some(defense) = defender.stats.defense else {
        return false;
    };
    if !defender.kind.is_defense() {
        return false;
    }

    defender.counter_cooldown -= dt;
    if defender.counter_cooldown >= 0.0 {
        return false;
    }

    let range = (defense.range_cells as f32 * cell_size_px.max(MIN_CELL_PIXELS))
        .max(MIN_DEFENSE_RANGE);
    let interval = 1.0 / defense.attacks_per_second;

    let mut nearest: Option<(usize, f32)> = None;
    for (index, unit) in units.iter().enumerate() {
        if !unit.is_alive() {
            continue;
        }
        let dist_sq = defender.pos.distance_squared(unit.pos);
        if dist_sq > range * range {
            continue;
        }
        if nearest.map_or(true, |(_, best)| dist_sq < best) {
            nearest = Some((index, dist_sq));
        }
    }

    let Some((target_index, _)) = nearest else {
        return false;
    };

    let damage = defense.damage_per_hit.max(1.0).ceil() as u32;
    units[target_index].health.apply_damage(damage);
    defender.counter_cooldown = interval;

    events.push(DamageEvent {
        attacker: TargetRef::Building(defender_index),
        target: TargetRef::Unit(target_index),
        amount: damage,
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridPos;
    use crate::stats::{BuildingKind, BuildingStats, DefenseStats, UnitStats};

    fn unit(class: UnitClass, damage: u32, range: f32, pos: Vec2) -> Unit {
        Unit::new(
            class,
            1,
            UnitStats {
                max_health: 100,
                damage,
                attack_interval: 1.0,
                attack_range: range,
                move_speed: 40.0,
            },
            pos,
        )
    }

    fn building(kind: BuildingKind, health: u32, pos: Vec2) -> Building {
        Building::new(
            kind,
            1,
            GridPos::new(0, 0),
            pos,
            BuildingStats {
                max_health: health,
                defense: None,
            },
            None,
        )
    }

    fn cannon(pos: Vec2, damage_per_hit: f32, attacks_per_second: f32, range_cells: u32) -> Building {
        Building::new(
            BuildingKind::Cannon,
            1,
            GridPos::new(0, 0),
            pos,
            BuildingStats {
                max_health: 420,
                defense: Some(DefenseStats {
                    damage_per_hit,
                    attacks_per_second,
                    range_cells,
                }),
            },
            None,
        )
    }

    #[test]
    fn test_in_range_boundary() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 4.0);
        assert!(in_range(a, b, 5.0));
        assert!(!in_range(a, b, 4.99));
    }

    #[test]
    fn test_tank_doubles_damage_vs_defense() {
        let cannon = building(BuildingKind::Cannon, 400, Vec2::ZERO);
        assert_eq!(modified_damage(UnitClass::Juggernaut, 15, &cannon), 30);
        // Non-tank classes get no bonus.
        assert_eq!(modified_damage(UnitClass::Raider, 15, &cannon), 15);
        // Tanks get no bonus vs non-defensive buildings.
        let mine = building(BuildingKind::GoldMine, 400, Vec2::ZERO);
        assert_eq!(modified_damage(UnitClass::Juggernaut, 15, &mine), 15);
    }

    #[test]
    fn test_wall_halves_damage_floor_one() {
        let wall = building(BuildingKind::Wall, 300, Vec2::ZERO);
        assert_eq!(modified_damage(UnitClass::Raider, 20, &wall), 10);
        assert_eq!(modified_damage(UnitClass::Marauder, 1, &wall), 1);
        assert_eq!(modified_damage(UnitClass::Raider, 0, &wall), 1);
    }

    #[test]
    fn test_attack_building_applies_damage_and_resets_cooldown() {
        let mut attacker = unit(UnitClass::Raider, 20, 12.0, Vec2::new(5.0, 0.0));
        let mut target = building(BuildingKind::Storage, 100, Vec2::ZERO);
        let mut events = Vec::new();

        assert!(attack_building(0, &mut attacker, 0, &mut target, &mut events));
        assert_eq!(target.health.current, 80);
        assert_eq!(attacker.cooldown, 1.0);
        assert_eq!(
            events,
            vec![DamageEvent {
                attacker: TargetRef::Unit(0),
                target: TargetRef::Building(0),
                amount: 20,
            }]
        );
    }

    #[test]
    fn test_attack_building_cooldown_gates_second_hit() {
        let mut attacker = unit(UnitClass::Raider, 20, 12.0, Vec2::new(5.0, 0.0));
        let mut target = building(BuildingKind::Storage, 100, Vec2::ZERO);
        let mut events = Vec::new();

        assert!(attack_building(0, &mut attacker, 0, &mut target, &mut events));
        // Cooldown has not elapsed: strict no-op.
        assert!(!attack_building(0, &mut attacker, 0, &mut target, &mut events));
        assert_eq!(target.health.current, 80);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_attack_building_preconditions() {
        let mut events = Vec::new();

        // Out of range.
        let mut far = unit(UnitClass::Raider, 20, 12.0, Vec2::new(100.0, 0.0));
        let mut target = building(BuildingKind::Storage, 100, Vec2::ZERO);
        assert!(!attack_building(0, &mut far, 0, &mut target, &mut events));

        // Dead attacker.
        let mut dead = unit(UnitClass::Raider, 20, 12.0, Vec2::new(5.0, 0.0));
        dead.health.current = 0;
        assert!(!attack_building(0, &mut dead, 0, &mut target, &mut events));

        // Dead target.
        let mut attacker = unit(UnitClass::Raider, 20, 12.0, Vec2::new(5.0, 0.0));
        target.health.current = 0;
        assert!(!attack_building(0, &mut attacker, 0, &mut target, &mut events));

        assert!(events.is_empty());
    }

    #[test]
    fn test_area_destroy_levels_wall_block_and_attacker() {
        // A 3x3 block of walls around (5, 5), plus one wall outside the
        // blast and a non-wall building inside it.
        let mut buildings = Vec::new();
        for row in 4..=6 {
            for col in 4..=6 {
                let mut wall = building(BuildingKind::Wall, 300, Vec2::ZERO);
                wall.cell = GridPos::new(row, col);
                buildings.push(wall);
            }
        }
        let mut outside = building(BuildingKind::Wall, 300, Vec2::ZERO);
        outside.cell = GridPos::new(5, 8);
        buildings.push(outside);
        let mut cannon = building(BuildingKind::Cannon, 400, Vec2::ZERO);
        cannon.cell = GridPos::new(5, 6);
        buildings.push(cannon);

        let mut attacker = unit(UnitClass::Sapper, 0, 12.0, Vec2::new(5.0, 0.0));
        let mut events = Vec::new();
        // Center wall of the block is index 4.
        assert!(area_destroy_attack(0, &mut attacker, 4, &mut buildings, &mut events));

        for wall in &buildings[..9] {
            assert!(wall.health.is_dead());
        }
        assert_eq!(buildings[9].health.current, 300, "wall outside blast survives");
        assert_eq!(buildings[10].health.current, 400, "non-wall building survives");
        assert!(attacker.health.is_dead(), "breacher self-destructs");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].walls.len(), 9);
    }

    #[test]
    fn test_area_destroy_rejects_non_breacher_and_non_wall() {
        let mut buildings = vec![building(BuildingKind::Wall, 300, Vec2::ZERO)];
        let mut events = Vec::new();

        let mut raider = unit(UnitClass::Raider, 20, 12.0, Vec2::new(5.0, 0.0));
        assert!(!area_destroy_attack(0, &mut raider, 0, &mut buildings, &mut events));

        let mut buildings = vec![building(BuildingKind::Storage, 300, Vec2::ZERO)];
        let mut sapper = unit(UnitClass::Sapper, 0, 12.0, Vec2::new(5.0, 0.0));
        assert!(!area_destroy_attack(0, &mut sapper, 0, &mut buildings, &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn test_counter_fire_picks_nearest_unit() {
        let mut defender = cannon(Vec2::ZERO, 10.0, 1.0, 9);
        let mut units = vec![
            unit(UnitClass::Raider, 20, 12.0, Vec2::new(80.0, 0.0)),
            unit(UnitClass::Raider, 20, 12.0, Vec2::new(30.0, 0.0)),
            unit(UnitClass::Raider, 20, 12.0, Vec2::new(50.0, 0.0)),
        ];
        let mut events = Vec::new();

        assert!(defense_counter_fire(1.0, 0, &mut defender, &mut units, 16.0, &mut events));
        assert_eq!(units[1].health.current, 90);
        assert_eq!(units[0].health.current, 100);
        assert_eq!(units[2].health.current, 100);
    }

    #[test]
    fn test_counter_fire_ignores_out_of_range_and_dead() {
        // range_cells 2 at 16 px/cell = 32 world units of reach.
        let mut defender = cannon(Vec2::ZERO, 10.0, 1.0, 2);
        let mut units = vec![
            unit(UnitClass::Raider, 20, 12.0, Vec2::new(200.0, 0.0)),
            unit(UnitClass::Raider, 20, 12.0, Vec2::new(10.0, 0.0)),
        ];
        units[1].health.current = 0;
        let mut events = Vec::new();

        assert!(!defense_counter_fire(1.0, 0, &mut defender, &mut units, 16.0, &mut events));
        // Cooldown stays decremented when no shot is fired.
        assert!(defender.counter_cooldown < 0.0);
    }

    #[test]
    fn test_counter_fire_range_floors() {
        // Tiny cell size and range still give at least MIN_DEFENSE_RANGE reach.
        let mut defender = cannon(Vec2::ZERO, 10.0, 1.0, 1);
        let mut units = vec![unit(UnitClass::Raider, 20, 12.0, Vec2::new(19.0, 0.0))];
        let mut events = Vec::new();

        assert!(defense_counter_fire(1.0, 0, &mut defender, &mut units, 1.0, &mut events));
        assert_eq!(units[0].health.current, 90);
    }

    #[test]
    fn test_counter_fire_cadence() {
        // attacks_per_second = 1 with dt = 1 lands two hits across three
        // ticks: fire, reload, fire.
        let mut defender = cannon(Vec2::ZERO, 10.0, 1.0, 9);
        let mut units = vec![unit(UnitClass::Raider, 20, 12.0, Vec2::new(30.0, 0.0))];
        units[0].health = crate::units::Health::new(25);
        let mut events = Vec::new();

        defense_counter_fire(1.0, 0, &mut defender, &mut units, 16.0, &mut events);
        defense_counter_fire(1.0, 0, &mut defender, &mut units, 16.0, &mut events);
        defense_counter_fire(1.0, 0, &mut defender, &mut units, 16.0, &mut events);
        assert_eq!(units[0].health.current, 5);
    }

    #[test]
    fn test_non_defense_never_fires() {
        let mut mine = building(BuildingKind::GoldMine, 300, Vec2::ZERO);
        let mut units = vec![unit(UnitClass::Raider, 20, 12.0, Vec2::new(5.0, 0.0))];
        let mut events = Vec::new();
        assert!(!defense_counter_fire(1.0, 0, &mut mine, &mut units, 16.0, &mut events));
    }
}
