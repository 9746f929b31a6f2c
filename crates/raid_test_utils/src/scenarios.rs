//! Headless raid runner.
//!
//! Drives a [`Battle`] tick loop to completion and aggregates the event
//! stream, so scenario tests can assert on outcomes instead of
//! hand-rolling the loop each time.

use raid_core::prelude::*;
use tracing::debug;

/// Fixed timestep used by the headless runner, in seconds.
pub const RUN_DT: f32 = 0.05;

/// Outcome of a headless raid run.
#[derive(Debug, Clone, Default)]
pub struct RaidOutcome {
    /// Whether the battle reached a terminal state before the tick cap.
    pub finished: bool,
    /// Ticks elapsed.
    pub ticks: u64,
    /// Units removed over the whole run.
    pub units_lost: u32,
    /// Buildings removed over the whole run.
    pub buildings_destroyed: u32,
    /// Damage events observed over the whole run.
    pub hits: u32,
    /// Breacher detonations observed over the whole run.
    pub detonations: u32,
}

/// Run a battle until it finishes or `max_ticks` elapse, at [`RUN_DT`]
/// per tick.
pub fn run_raid(battle: &mut Battle, max_ticks: u64) -> RaidOutcome {
    let mut outcome = RaidOutcome::default();
    for _ in 0..max_ticks {
        let events = battle.update(RUN_DT);
        outcome.ticks += 1;
        outcome.units_lost += u32::try_from(events.unit_removals.len()).unwrap_or(u32::MAX);
        outcome.buildings_destroyed +=
            u32::try_from(events.building_removals.len()).unwrap_or(u32::MAX);
        outcome.hits += u32::try_from(events.damage.len()).unwrap_or(u32::MAX);
        outcome.detonations += u32::try_from(events.area_destroys.len()).unwrap_or(u32::MAX);
        if battle.is_finished() {
            outcome.finished = true;
            break;
        }
    }
    debug!(
        ticks = outcome.ticks,
        finished = outcome.finished,
        "raid run complete"
    );
    outcome
}

/// Count live buildings of one kind.
#[must_use]
pub fn live_buildings(battle: &Battle, kind: BuildingKind) -> usize {
    battle
        .buildings()
        .iter()
        .filter(|b| b.is_alive() && b.kind == kind)
        .count()
}

/// Count live units of one class.
#[must_use]
pub fn live_units(battle: &Battle, class: UnitClass) -> usize {
    battle
        .units()
        .iter()
        .filter(|u| u.is_alive() && u.class == class)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_empty_battle_finishes_immediately() {
        let mut battle = fixtures::small_battle();
        let outcome = run_raid(&mut battle, 100);
        assert!(outcome.finished);
        assert_eq!(outcome.ticks, 1);
        assert_eq!(outcome.hits, 0);
    }

    #[test]
    fn test_lone_raider_flattens_undefended_mine() {
        let mut battle = fixtures::small_battle();
        let stats = fixtures::standard_stats();
        battle
            .add_building(&stats, BuildingKind::GoldMine, 1, GridPos::new(10, 10), None)
            .unwrap();
        let start = battle.grid().grid_to_world(GridPos::new(10, 2));
        battle
            .deploy_unit(&stats, UnitClass::Raider, 1, start)
            .unwrap();

        let outcome = run_raid(&mut battle, 2_000);
        assert!(outcome.finished, "raider should level the mine in time");
        assert_eq!(live_buildings(&battle, BuildingKind::GoldMine), 0);
        assert_eq!(live_units(&battle, UnitClass::Raider), 1);
    }
}
