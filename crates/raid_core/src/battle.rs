//! The battle orchestrator.
//!
//! [`Battle`] owns the unit and building lists and is the only stateful
//! component of the core. The host calls [`Battle::update`] once per
//! frame with an already time-scaled `dt`; everything inside a tick runs
//! to completion, single-threaded, with no internal parallelism. Each
//! tick walks the live units in list order (target selection, routing,
//! attacks), lets defensive structures counter-fire, then runs the
//! death/removal cleanup pass.
//!
//! Units and buildings refer to each other by index into the dense
//! lists. The cleanup pass remaps cached target indices whenever a
//! building is removed, so an index never silently drifts onto a
//! different building.

use tracing::{debug, trace};

use crate::combat::{
    area_destroy_attack, attack_building, defense_counter_fire, AreaDestroyEvent, DamageEvent,
    in_range,
};
use crate::error::{BattleError, Result};
use crate::grid::{BattleGrid, Battlefield, GridPos, ObstacleMap};
use crate::math::Vec2;
use crate::pathfinding::{find_path, step_towards};
use crate::stats::{BuildingKind, StatsProvider, UnitClass};
use crate::units::{Building, Unit};

/// Seconds between route recomputations, bounding how often the search
/// reruns per unit.
pub const REPATH_INTERVAL: f32 = 0.35;

/// World-unit radius at which a path waypoint counts as reached.
pub const WAYPOINT_RADIUS: f32 = 6.0;

/// A wall is judged to be blocking the optimal route when the
/// walls-block path is this many cells longer than the walls-pass path.
/// Empirical tuning value; kept configurable rather than re-derived.
pub const WALL_DETOUR_THRESHOLD: usize = 4;

/// Death animation window for units, in seconds.
pub const UNIT_DEATH_DELAY: f32 = 0.30;

/// Death animation window for buildings, in seconds.
pub const BUILDING_DEATH_DELAY: f32 = 0.35;

/// Units with attack range at or below this many tiles are melee-class
/// and need a cell adjacent to the target's footprint.
pub const MELEE_RANGE_TILES: f32 = 0.9;

/// Fraction of attack range at which direct stepping stops short of the
/// target.
pub const APPROACH_STOP_FACTOR: f32 = 0.85;

/// Node-expansion budget per A* search.
pub const MAX_PATH_ITERATIONS: usize = 4096;

/// Slack for the death-countdown expiry check. Repeated `dt`
/// subtraction leaves the countdown a hair above zero at common tick
/// rates (0.30 - 3 x 0.1 is ~1.5e-8 in f32).
const COUNTDOWN_EPSILON: f32 = 1e-4;

/// Whether walls block when building an obstacle map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WallRule {
    /// Walls block their cell (the "hard" map used for real routing).
    Block,
    /// Walls never block (the "soft" map used only to detect that a
    /// wall is the cause of a detour).
    Pass,
}

/// Events generated during one simulation tick, for the renderer.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Hits landed this tick (floating damage text, hit pulses).
    pub damage: Vec<DamageEvent>,
    /// Breacher detonations this tick.
    pub area_destroys: Vec<AreaDestroyEvent>,
    /// Unit list indices removed at the end of this tick (pre-removal
    /// indices).
    pub unit_removals: Vec<usize>,
    /// Building list indices removed at the end of this tick
    /// (pre-removal indices).
    pub building_removals: Vec<usize>,
}

/// A running battle over one village layout.
#[derive(Debug, Clone)]
pub struct Battle {
    grid: BattleGrid,
    units: Vec<Unit>,
    buildings: Vec<Building>,
    tick: u64,
}

impl Battle {
    /// Start a battle on the given battlefield.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::InvalidGeometry`] for a zero-sized grid or
    /// degenerate tile dimensions.
    pub fn new(field: Battlefield) -> Result<Self> {
        let grid = BattleGrid::new(field)?;
        debug!(
            rows = grid.rows(),
            cols = grid.cols(),
            "battle created"
        );
        Ok(Self {
            grid,
            units: Vec::new(),
            buildings: Vec::new(),
            tick: 0,
        })
    }

    /// The validated battlefield grid.
    #[must_use]
    pub fn grid(&self) -> &BattleGrid {
        &self.grid
    }

    /// Live unit list (includes entities in their death window).
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Live building list (includes entities in their death window).
    #[must_use]
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// Number of completed ticks.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Whether the battle has run its course: the attacking army is
    /// wiped out, or no non-wall building is left standing.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        let army_alive = self.units.iter().any(Unit::is_alive);
        let targets_left = self
            .buildings
            .iter()
            .any(|b| b.is_alive() && !b.kind.is_wall());
        !army_alive || !targets_left
    }

    /// Place a building from the village layout.
    ///
    /// `current_health` restores partially damaged buildings; `None`
    /// means full health. Returns the building's index.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::CellOutOfBounds`] for a cell off the grid,
    /// or [`BattleError::MissingBuildingStats`] when the stats lookup
    /// has no entry for `(kind, level)`.
    pub fn add_building(
        &mut self,
        stats: &dyn StatsProvider,
        kind: BuildingKind,
        level: u32,
        cell: GridPos,
        current_health: Option<u32>,
    ) -> Result<usize> {
        if !self.grid.in_bounds(cell) {
            return Err(BattleError::CellOutOfBounds {
                row: cell.row,
                col: cell.col,
                rows: self.grid.rows(),
                cols: self.grid.cols(),
            });
        }
        let block = stats
            .building_stats(kind, level)
            .ok_or(BattleError::MissingBuildingStats { kind, level })?;
        let pos = self.grid.grid_to_world(cell);
        self.buildings
            .push(Building::new(kind, level, cell, pos, block, current_health));
        Ok(self.buildings.len() - 1)
    }

    /// Deploy a unit at a world position. Returns the unit's index.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::MissingUnitStats`] when the stats lookup
    /// has no entry for `(class, level)`.
    pub fn deploy_unit(
        &mut self,
        stats: &dyn StatsProvider,
        class: UnitClass,
        level: u32,
        pos: Vec2,
    ) -> Result<usize> {
        let block = stats
            .unit_stats(class, level)
            .ok_or(BattleError::MissingUnitStats { class, level })?;
        self.units.push(Unit::new(class, level, block, pos));
        Ok(self.units.len() - 1)
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// `dt` is owned by the host clock and arrives already time-scaled;
    /// the core knows nothing about speed-up features or frame pacing.
    pub fn update(&mut self, dt: f32) -> TickEvents {
        let mut events = TickEvents::default();

        for i in 0..self.units.len() {
            self.update_unit(i, dt, &mut events);
        }

        let cell_size = self.grid.cell_size_px();
        for d in 0..self.buildings.len() {
            let defender = &mut self.buildings[d];
            if defender.health.is_dead() || !defender.kind.is_defense() {
                continue;
            }
            defense_counter_fire(dt, d, defender, &mut self.units, cell_size, &mut events.damage);
        }

        self.cleanup(dt, &mut events);
        self.tick += 1;
        events
    }

    /// Run one unit's slice of the tick.
    fn update_unit(&mut self, i: usize, dt: f32, events: &mut TickEvents) {
        if self.units[i].health.is_dead() {
            return;
        }

        // 1. Attack cooldown.
        {
            let unit = &mut self.units[i];
            unit.cooldown = (unit.cooldown - dt).max(0.0);
        }

        // 2. Target validation.
        if let Some(t) = self.units[i].target {
            if t >= self.buildings.len() || !self.buildings[t].is_alive() {
                self.units[i].clear_target();
            }
        }

        // 3. Target selection.
        if self.units[i].target.is_none() {
            let Some(t) = self.select_target(i) else {
                // Nothing eligible: idle this tick.
                return;
            };
            trace!(unit = i, building = t, "target selected");
            self.units[i].target = Some(t);
        }
        let target_idx = self.units[i].target.unwrap_or(0);

        // 4. Breacher special case: the demolition attempt comes before
        // any ordinary attack, and ends the unit's tick if it lands.
        if self.units[i].class.is_breacher() {
            let landed = area_destroy_attack(
                i,
                &mut self.units[i],
                target_idx,
                &mut self.buildings,
                &mut events.area_destroys,
            );
            if landed {
                trace!(unit = i, "breacher detonated");
                self.units[i].clear_target();
                return;
            }
        }

        // 5. Ordinary attack.
        let landed = attack_building(
            i,
            &mut self.units[i],
            target_idx,
            &mut self.buildings[target_idx],
            &mut events.damage,
        );
        if landed && self.buildings[target_idx].health.is_dead() {
            trace!(unit = i, building = target_idx, "target destroyed");
            self.units[i].clear_path();
        }

        // 6. Routing.
        self.units[i].repath_timer -= dt;
        if self.units[i].repath_timer <= 0.0 {
            self.recompute_path(i);
            self.units[i].repath_timer = REPATH_INTERVAL;
        }

        // 7. Movement.
        self.advance_unit(i, dt);
    }

    /// Pick the nearest eligible building for a unit, or `None`.
    fn select_target(&self, i: usize) -> Option<usize> {
        let unit = &self.units[i];
        let defenses_standing = self
            .buildings
            .iter()
            .any(|b| b.is_alive() && b.kind.is_defense());

        let mut best: Option<(usize, f32)> = None;
        for (idx, building) in self.buildings.iter().enumerate() {
            if !building.is_alive() {
                continue;
            }
            let eligible = if unit.class.is_breacher() {
                building.kind.is_wall()
            } else if unit.class.is_tank() {
                if defenses_standing {
                    building.kind.is_defense()
                } else {
                    !building.kind.is_wall()
                }
            } else if unit.class.targets_walls() {
                true
            } else {
                !building.kind.is_wall()
            };
            if !eligible {
                continue;
            }
            let dist_sq = unit.pos.distance_squared(building.pos);
            if best.map_or(true, |(_, d)| dist_sq < d) {
                best = Some((idx, dist_sq));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Rebuild the obstacle map from live building state: non-wall
    /// buildings block the 3x3 block around their anchor cell, walls
    /// block a single cell (or nothing under [`WallRule::Pass`]).
    /// `unblock` clears the mover's own cell so it cannot deadlock
    /// against its own footprint.
    fn build_obstacle_map(&self, walls: WallRule, unblock: Option<GridPos>) -> ObstacleMap {
        let mut map = ObstacleMap::new(self.grid.rows(), self.grid.cols());
        for building in &self.buildings {
            if !building.is_alive() {
                continue;
            }
            if building.kind.is_wall() {
                if walls == WallRule::Block {
                    map.set_blocked(building.cell, true);
                }
            } else {
                map.block_square(building.cell, building.kind.footprint_radius());
            }
        }
        if let Some(cell) = unblock {
            map.set_blocked(cell, false);
        }
        map
    }

    /// Whether a unit fights at melee reach.
    fn is_melee(&self, unit: &Unit) -> bool {
        unit.stats.attack_range <= MELEE_RANGE_TILES * self.grid.cell_size_px()
    }

    /// Find the cell a unit should route to in order to attack a target.
    ///
    /// Melee units need a passable cell on the ring immediately around
    /// the target's footprint; ranged units take any passable cell
    /// within attack range, preferring the closest to the unit with ties
    /// broken toward lower Manhattan offset from the target's center.
    fn approach_cell(
        &self,
        map: &ObstacleMap,
        target: &Building,
        unit_pos: Vec2,
        melee: bool,
        attack_range: f32,
    ) -> Option<GridPos> {
        let center = target.cell;
        let mut best: Option<(GridPos, f32, u32)> = None;

        let mut consider = |cell: GridPos, this: &Self| {
            if !map.in_bounds(cell) || map.is_blocked(cell) {
                return;
            }
            let dist = this.grid.grid_to_world(cell).distance(unit_pos);
            let offset = cell.manhattan_distance(center);
            let better = match best {
                None => true,
                Some((_, d, o)) => dist < d || (dist == d && offset < o),
            };
            if better {
                best = Some((cell, dist, offset));
            }
        };

        if melee {
            let ring = target.kind.footprint_radius() + 1;
            let r0 = center.row.saturating_sub(ring);
            let c0 = center.col.saturating_sub(ring);
            for row in r0..=center.row.saturating_add(ring) {
                for col in c0..=center.col.saturating_add(ring) {
                    let cell = GridPos::new(row, col);
                    if cell.chebyshev_distance(center) == ring {
                        consider(cell, self);
                    }
                }
            }
        } else {
            for row in 0..self.grid.rows() {
                for col in 0..self.grid.cols() {
                    let cell = GridPos::new(row, col);
                    if in_range(self.grid.grid_to_world(cell), target.pos, attack_range) {
                        consider(cell, self);
                    }
                }
            }
        }

        best.map(|(cell, _, _)| cell)
    }

    /// Approach cell plus A* route to it, in one step. Empty when the
    /// target has no reachable approach.
    fn path_to_building(
        &self,
        map: &ObstacleMap,
        target_idx: usize,
        unit_cell: GridPos,
        unit_pos: Vec2,
        melee: bool,
        attack_range: f32,
    ) -> Vec<GridPos> {
        let target = &self.buildings[target_idx];
        let Some(goal) = self.approach_cell(map, target, unit_pos, melee, attack_range) else {
            return Vec::new();
        };
        find_path(unit_cell, goal, map, true, MAX_PATH_ITERATIONS)
    }

    /// First live wall whose cell lies on a route.
    fn first_wall_on(&self, path: &[GridPos]) -> Option<usize> {
        for cell in path {
            for (idx, building) in self.buildings.iter().enumerate() {
                if building.is_alive() && building.kind.is_wall() && building.cell == *cell {
                    return Some(idx);
                }
            }
        }
        None
    }

    /// Recompute a unit's cached route, applying the wall-breach
    /// heuristic and the nearest-reachable-wall fallback.
    fn recompute_path(&mut self, i: usize) {
        let Some(mut target_idx) = self.units[i].target else {
            return;
        };

        let unit_pos = self.units[i].pos;
        let unit_cell = self.grid.world_to_grid(unit_pos);
        let melee = self.is_melee(&self.units[i]);
        let class = self.units[i].class;
        let attack_range = self.units[i].stats.attack_range;

        let hard = self.build_obstacle_map(WallRule::Block, Some(unit_cell));
        let mut path =
            self.path_to_building(&hard, target_idx, unit_cell, unit_pos, melee, attack_range);

        // Wall-breach heuristic: when a melee unit's real route is much
        // longer than the route that pretends walls are passable, a wall
        // is the likely cause. Redirect onto the first wall along the
        // walls-pass route and break through it first.
        if melee && !class.is_breacher() && !self.buildings[target_idx].kind.is_wall() {
            let soft = self.build_obstacle_map(WallRule::Pass, Some(unit_cell));
            let soft_path =
                self.path_to_building(&soft, target_idx, unit_cell, unit_pos, melee, attack_range);
            let detoured =
                !soft_path.is_empty() && path.len() > soft_path.len() + WALL_DETOUR_THRESHOLD;
            if (path.is_empty() && !soft_path.is_empty()) || detoured {
                if let Some(wall_idx) = self.first_wall_on(&soft_path) {
                    trace!(unit = i, wall = wall_idx, "wall blocks route, retargeting");
                    self.units[i].target = Some(wall_idx);
                    target_idx = wall_idx;
                    path = self.path_to_building(
                        &hard,
                        wall_idx,
                        unit_cell,
                        unit_pos,
                        melee,
                        attack_range,
                    );
                }
            }
        }

        // Fallback: a non-wall target that is still unreachable means
        // the unit is boxed in. Adopt the nearest reachable wall as an
        // interim target.
        if path.is_empty() && !self.buildings[target_idx].kind.is_wall() {
            let mut best: Option<(usize, Vec<GridPos>)> = None;
            for (idx, building) in self.buildings.iter().enumerate() {
                if !building.is_alive() || !building.kind.is_wall() {
                    continue;
                }
                let candidate =
                    self.path_to_building(&hard, idx, unit_cell, unit_pos, melee, attack_range);
                if candidate.is_empty() {
                    continue;
                }
                if best
                    .as_ref()
                    .map_or(true, |(_, p)| candidate.len() < p.len())
                {
                    best = Some((idx, candidate));
                }
            }
            if let Some((idx, fallback)) = best {
                trace!(unit = i, wall = idx, "boxed in, falling back to wall");
                self.units[i].target = Some(idx);
                path = fallback;
            }
        }

        let unit = &mut self.units[i];
        // Element 0 is the cell the route was computed from, not a
        // waypoint; walking back to its center would stall the unit at
        // every repath.
        unit.path_cursor = path.len().min(1);
        unit.path = path;
    }

    /// Advance a unit along its cached route, or step directly at the
    /// target when no route exists.
    fn advance_unit(&mut self, i: usize, dt: f32) {
        let target_pos = self.units[i]
            .target
            .and_then(|t| self.buildings.get(t))
            .map(|b| b.pos);

        let grid = self.grid;
        let unit = &mut self.units[i];
        let step = unit.stats.move_speed * dt;

        if unit.path_cursor < unit.path.len() {
            let waypoint = grid.grid_to_world(unit.path[unit.path_cursor]);
            unit.pos = step_towards(unit.pos, waypoint, step, 0.0);
            if unit.pos.distance(waypoint) <= WAYPOINT_RADIUS {
                unit.path_cursor += 1;
            }
        } else if let Some(target_pos) = target_pos {
            let stop = APPROACH_STOP_FACTOR * unit.stats.attack_range;
            unit.pos = step_towards(unit.pos, target_pos, step, stop);
        }
    }

    /// Death bookkeeping. Entities at zero health are marked dying and
    /// given a countdown so the renderer can play a death effect; once
    /// it elapses they leave their list. Targeting and obstacle maps
    /// never see dying entities, so the delay is purely cosmetic.
    fn cleanup(&mut self, dt: f32, events: &mut TickEvents) {
        for (idx, unit) in self.units.iter_mut().enumerate() {
            if unit.dying {
                unit.death_countdown -= dt;
            } else if unit.health.is_dead() {
                trace!(unit = idx, "unit down");
                unit.dying = true;
                unit.death_countdown = UNIT_DEATH_DELAY;
            }
        }
        for (idx, building) in self.buildings.iter_mut().enumerate() {
            if building.dying {
                building.death_countdown -= dt;
            } else if building.health.is_dead() {
                trace!(building = idx, "building down");
                building.dying = true;
                building.death_countdown = BUILDING_DEATH_DELAY;
            }
        }

        let mut index = 0;
        self.units.retain(|unit| {
            let keep = !(unit.dying && unit.death_countdown <= COUNTDOWN_EPSILON);
            if !keep {
                events.unit_removals.push(index);
            }
            index += 1;
            keep
        });

        // Buildings shift indices on removal, so build an old-to-new
        // remap and fix every cached target.
        let mut remap: Vec<Option<usize>> = Vec::with_capacity(self.buildings.len());
        let mut next = 0usize;
        for (idx, building) in self.buildings.iter().enumerate() {
            if building.dying && building.death_countdown <= COUNTDOWN_EPSILON {
                events.building_removals.push(idx);
                remap.push(None);
            } else {
                remap.push(Some(next));
                next += 1;
            }
        }
        if !events.building_removals.is_empty() {
            self.buildings
                .retain(|b| !(b.dying && b.death_countdown <= COUNTDOWN_EPSILON));
            for unit in &mut self.units {
                if let Some(t) = unit.target {
                    match remap.get(t).copied().flatten() {
                        Some(new_idx) => unit.target = Some(new_idx),
                        None => unit.clear_target(),
                    }
                }
            }
        }
    }
}
