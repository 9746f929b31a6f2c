//! Obstacle-aware shortest-path search and direct movement stepping.
//!
//! [`find_path`] is a standard A* over the boolean [`ObstacleMap`],
//! bounded by an iteration budget so pathological maps always terminate.
//! A failed search is not an error: callers fall back to
//! [`step_towards`], which walks straight at the destination and stops
//! at a configurable distance.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::grid::{GridPos, ObstacleMap};
use crate::math::Vec2;

/// 4-directional neighbor offsets.
const CARDINAL_DIRECTIONS: [(i64, i64); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// 8-directional neighbor offsets.
const ALL_DIRECTIONS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Step cost for diagonal moves.
const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;

/// A node in the A* open set.
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    cell: GridPos,
    /// f = g + h.
    f_score: f32,
    /// Insertion sequence number. Equal f-scores resolve oldest-first,
    /// which only matters for determinism of the path shape.
    seq: u64,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq && self.f_score.total_cmp(&other.f_score) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for min-heap behavior.
        match other.f_score.total_cmp(&self.f_score) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            ord => ord,
        }
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Manhattan-distance heuristic.
#[inline]
fn manhattan_heuristic(a: GridPos, b: GridPos) -> f32 {
    a.manhattan_distance(b) as f32
}

/// Find a path from `start` to `goal` using A*.
///
/// Returns the ordered list of cells including `start` as element 0, or
/// an empty vector when no path exists. The search fails (empty result)
/// if either endpoint is out of bounds or blocked - callers must clear
/// the mover's own cell from the map first, since a unit standing inside
/// what is now counted as its own occupied footprint must not deadlock
/// against itself. Exploration stops after `max_iterations` node
/// expansions.
#[must_use]
pub fn find_path(
    start: GridPos,
    goal: GridPos,
    map: &ObstacleMap,
    allow_diagonal: bool,
    max_iterations: usize,
) -> Vec<GridPos> {
    if !map.in_bounds(start) || !map.in_bounds(goal) {
        return Vec::new();
    }
    if map.is_blocked(start) || map.is_blocked(goal) {
        return Vec::new();
    }
    if start == goal {
        return vec![start];
    }

    let directions: &[(i64, i64)] = if allow_diagonal {
        &ALL_DIRECTIONS
    } else {
        &CARDINAL_DIRECTIONS
    };

    let mut open_set: BinaryHeap<OpenNode> = BinaryHeap::new();
    let mut came_from: HashMap<GridPos, GridPos> = HashMap::new();
    let mut g_score: HashMap<GridPos, f32> = HashMap::new();
    let mut seq: u64 = 0;

    g_score.insert(start, 0.0);
    open_set.push(OpenNode {
        cell: start,
        f_score: manhattan_heuristic(start, goal),
        seq,
    });

    let mut expansions = 0usize;

    while let Some(current) = open_set.pop() {
        if current.cell == goal {
            return reconstruct_path(&came_from, goal);
        }

        expansions += 1;
        if expansions > max_iterations {
            return Vec::new();
        }

        let current_g = g_score.get(&current.cell).copied().unwrap_or(f32::MAX);

        for &(dr, dc) in directions {
            let nr = i64::from(current.cell.row) + dr;
            let nc = i64::from(current.cell.col) + dc;
            if nr < 0 || nc < 0 {
                continue;
            }

            let neighbor = GridPos::new(nr as u32, nc as u32);
            if !map.in_bounds(neighbor) || map.is_blocked(neighbor) {
                continue;
            }

            let step_cost = if dr != 0 && dc != 0 {
                DIAGONAL_COST
            } else {
                1.0
            };

            let tentative_g = current_g + step_cost;
            let neighbor_g = g_score.get(&neighbor).copied().unwrap_or(f32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.cell);
                g_score.insert(neighbor, tentative_g);
                seq += 1;
                open_set.push(OpenNode {
                    cell: neighbor,
                    f_score: tentative_g + manhattan_heuristic(neighbor, goal),
                    seq,
                });
            }
        }
    }

    Vec::new()
}

/// Walk the came-from chain back from the goal.
fn reconstruct_path(came_from: &HashMap<GridPos, GridPos>, goal: GridPos) -> Vec<GridPos> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Move `current` toward `destination` by at most `max_step`, never
/// ending closer than `stop_distance`. Returns `current` unchanged when
/// already within `stop_distance`.
#[must_use]
pub fn step_towards(current: Vec2, destination: Vec2, max_step: f32, stop_distance: f32) -> Vec2 {
    let dist = current.distance(destination);
    if dist <= stop_distance || dist == 0.0 {
        return current;
    }
    let travel = (dist - stop_distance).min(max_step);
    if travel <= 0.0 {
        return current;
    }
    current + (destination - current) * (travel / dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    const BUDGET: usize = 10_000;

    fn pos(row: u32, col: u32) -> GridPos {
        GridPos::new(row, col)
    }

    /// BFS oracle for 4-directional shortest path length (in cells).
    fn bfs_path_len(start: GridPos, goal: GridPos, map: &ObstacleMap) -> Option<usize> {
        if map.is_blocked(start) || map.is_blocked(goal) {
            return None;
        }
        let mut dist: HashMap<GridPos, usize> = HashMap::new();
        let mut queue = VecDeque::new();
        dist.insert(start, 1);
        queue.push_back(start);
        while let Some(cell) = queue.pop_front() {
            let d = dist[&cell];
            if cell == goal {
                return Some(d);
            }
            for &(dr, dc) in &CARDINAL_DIRECTIONS {
                let nr = i64::from(cell.row) + dr;
                let nc = i64::from(cell.col) + dc;
                if nr < 0 || nc < 0 {
                    continue;
                }
                let next = GridPos::new(nr as u32, nc as u32);
                if map.in_bounds(next) && !map.is_blocked(next) && !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    #[test]
    fn test_straight_path_starts_at_start() {
        let map = ObstacleMap::new(10, 10);
        let path = find_path(pos(0, 0), pos(0, 5), &map, false, BUDGET);
        assert_eq!(path.first(), Some(&pos(0, 0)));
        assert_eq!(path.last(), Some(&pos(0, 5)));
        assert_eq!(path.len(), 6);
    }

    #[test]
    fn test_path_routes_around_obstacle() {
        let mut map = ObstacleMap::new(10, 10);
        for row in 2..8 {
            map.set_blocked(pos(row, 5), true);
        }
        let path = find_path(pos(5, 2), pos(5, 8), &map, false, BUDGET);
        assert!(!path.is_empty());
        for cell in &path {
            assert!(!map.is_blocked(*cell));
        }
        // Longer than the unobstructed Manhattan distance.
        assert!(path.len() > 7);
    }

    #[test]
    fn test_no_path_through_full_barrier() {
        let mut map = ObstacleMap::new(10, 10);
        for row in 0..10 {
            map.set_blocked(pos(row, 5), true);
        }
        assert!(find_path(pos(5, 2), pos(5, 8), &map, false, BUDGET).is_empty());
        assert!(find_path(pos(5, 2), pos(5, 8), &map, true, BUDGET).is_empty());
    }

    #[test]
    fn test_blocked_endpoints_fail() {
        let mut map = ObstacleMap::new(10, 10);
        map.set_blocked(pos(0, 0), true);
        map.set_blocked(pos(9, 9), true);
        assert!(find_path(pos(0, 0), pos(5, 5), &map, false, BUDGET).is_empty());
        assert!(find_path(pos(5, 5), pos(9, 9), &map, false, BUDGET).is_empty());
    }

    #[test]
    fn test_out_of_bounds_endpoints_fail() {
        let map = ObstacleMap::new(10, 10);
        assert!(find_path(pos(10, 0), pos(5, 5), &map, false, BUDGET).is_empty());
        assert!(find_path(pos(0, 0), pos(0, 10), &map, false, BUDGET).is_empty());
    }

    #[test]
    fn test_start_equals_goal() {
        let map = ObstacleMap::new(10, 10);
        assert_eq!(
            find_path(pos(3, 3), pos(3, 3), &map, false, BUDGET),
            vec![pos(3, 3)]
        );
    }

    #[test]
    fn test_iteration_budget_exhaustion() {
        let map = ObstacleMap::new(40, 40);
        // Two expansions cannot reach the far corner.
        assert!(find_path(pos(0, 0), pos(39, 39), &map, false, 2).is_empty());
        assert!(!find_path(pos(0, 0), pos(39, 39), &map, false, BUDGET).is_empty());
    }

    #[test]
    fn test_diagonal_path_is_shorter() {
        let map = ObstacleMap::new(10, 10);
        let cardinal = find_path(pos(0, 0), pos(5, 5), &map, false, BUDGET);
        let diagonal = find_path(pos(0, 0), pos(5, 5), &map, true, BUDGET);
        assert_eq!(cardinal.len(), 11);
        assert_eq!(diagonal.len(), 6);
    }

    #[test]
    fn test_determinism() {
        let mut map = ObstacleMap::new(20, 20);
        for row in 5..15 {
            map.set_blocked(pos(row, 10), true);
        }
        let first = find_path(pos(10, 5), pos(10, 15), &map, true, BUDGET);
        for _ in 0..5 {
            assert_eq!(find_path(pos(10, 5), pos(10, 15), &map, true, BUDGET), first);
        }
    }

    #[test]
    fn test_step_towards_stops_at_distance() {
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(10.0, 0.0);

        // Plenty of step budget, but must halt at the stop distance.
        let stepped = step_towards(from, to, 100.0, 4.0);
        assert!((stepped.distance(to) - 4.0).abs() < 1e-4);

        // Already inside the stop distance: unchanged.
        let close = Vec2::new(7.0, 0.0);
        assert_eq!(step_towards(close, to, 100.0, 4.0), close);

        // Step-limited.
        let partial = step_towards(from, to, 2.5, 0.0);
        assert!((partial.x - 2.5).abs() < 1e-4);
    }

    proptest! {
        /// Every returned path is a chain of adjacent, passable cells
        /// from start to goal.
        #[test]
        fn prop_path_validity(
            obstacles in prop::collection::vec((0u32..12, 0u32..12), 0..40),
            (sr, sc) in (0u32..12, 0u32..12),
            (gr, gc) in (0u32..12, 0u32..12),
            diagonal in any::<bool>(),
        ) {
            let mut map = ObstacleMap::new(12, 12);
            for (row, col) in obstacles {
                map.set_blocked(pos(row, col), true);
            }
            let start = pos(sr, sc);
            let goal = pos(gr, gc);
            map.set_blocked(start, false);
            map.set_blocked(goal, false);

            let path = find_path(start, goal, &map, diagonal, BUDGET);
            if !path.is_empty() {
                prop_assert_eq!(path[0], start);
                prop_assert_eq!(*path.last().unwrap(), goal);
                for window in path.windows(2) {
                    let cheb = window[0].chebyshev_distance(window[1]);
                    if diagonal {
                        prop_assert_eq!(cheb, 1);
                    } else {
                        prop_assert_eq!(window[0].manhattan_distance(window[1]), 1);
                    }
                }
                for cell in &path {
                    prop_assert!(!map.is_blocked(*cell));
                }
            }
        }

        /// 4-directional paths are optimal: length matches a BFS oracle.
        #[test]
        fn prop_cardinal_path_optimality(
            obstacles in prop::collection::vec((0u32..10, 0u32..10), 0..30),
            (sr, sc) in (0u32..10, 0u32..10),
            (gr, gc) in (0u32..10, 0u32..10),
        ) {
            let mut map = ObstacleMap::new(10, 10);
            for (row, col) in obstacles {
                map.set_blocked(pos(row, col), true);
            }
            let start = pos(sr, sc);
            let goal = pos(gr, gc);
            map.set_blocked(start, false);
            map.set_blocked(goal, false);

            let path = find_path(start, goal, &map, false, BUDGET);
            match bfs_path_len(start, goal, &map) {
                Some(len) => prop_assert_eq!(path.len(), len),
                None => prop_assert!(path.is_empty()),
            }
        }
    }
}
