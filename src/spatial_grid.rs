/*
 * Spatial Grid Module
 *
 * This module defines the SpatialGrid struct for efficient neighbor lookups.
 * It hashes the plane into square cells of `cell_size`, so a neighbor query
 * only has to look at the 3x3 block of cells around a point instead of the
 * whole flock.
 *
 * The grid is rebuilt from scratch every frame with a three-pass bucket build:
 * - count the boids that fall in each cell key
 * - give every occupied key a contiguous range in one flat index array
 * - scatter the boid indices into their ranges
 *
 * Nothing from a previous frame is ever read back.
 */

use std::collections::HashMap;
use std::ops::Range;

use nannou::prelude::*;
use serde::{Deserialize, Serialize};

const PRIME_X: i32 = 73_856_093;
const PRIME_Y: i32 = 19_349_663;

/// How integer cell coordinates are folded into a single map key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellHashing {
    /// `cx * 73856093 XOR cy * 19349663` on wrapping 32-bit integers.
    /// Distinct cells may collide onto one key and share a bucket.
    #[default]
    XorPrimes,
    /// Both 32-bit coordinates packed into one 64-bit key. Never collides.
    Packed,
}

#[derive(Clone, Copy, Debug, Default)]
struct Bucket {
    start: usize,
    count: usize,
    filled: usize,
}

pub struct SpatialGrid {
    cell_size: f32,
    hashing: CellHashing,
    cells: HashMap<i64, Bucket>,
    indices: Vec<usize>,
    // Per-boid keys from the counting pass, reused by the scatter pass
    keys: Vec<i64>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32, hashing: CellHashing) -> Self {
        Self::with_capacity(cell_size, hashing, 0)
    }

    pub fn with_capacity(cell_size: f32, hashing: CellHashing, boids: usize) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");
        Self {
            cell_size,
            hashing,
            cells: HashMap::with_capacity(boids),
            indices: Vec::with_capacity(boids),
            keys: Vec::with_capacity(boids),
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn hashing(&self) -> CellHashing {
        self.hashing
    }

    // World coordinates to integer cell coordinates
    #[inline]
    fn cell_coords(&self, x: f32, y: f32) -> (i32, i32) {
        ((x / self.cell_size).floor() as i32, (y / self.cell_size).floor() as i32)
    }

    #[inline]
    fn key_for_coords(&self, cx: i32, cy: i32) -> i64 {
        match self.hashing {
            CellHashing::XorPrimes => {
                (cx.wrapping_mul(PRIME_X) ^ cy.wrapping_mul(PRIME_Y)) as i64
            }
            CellHashing::Packed => (((cx as u32 as u64) << 32) | cy as u32 as u64) as i64,
        }
    }

    /// Key of the cell containing `(x, y)`.
    #[inline]
    pub fn cell_key(&self, x: f32, y: f32) -> i64 {
        let (cx, cy) = self.cell_coords(x, y);
        self.key_for_coords(cx, cy)
    }

    /// Rebuilds the whole grid from the current boid positions. The i-th
    /// position belongs to boid index i.
    pub fn rebuild<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Point2>,
    {
        self.cells.clear();
        self.keys.clear();

        // 1) Count boids per cell key
        for position in positions {
            let key = self.cell_key(position.x, position.y);
            self.keys.push(key);
            self.cells.entry(key).or_default().count += 1;
        }

        // 2) Hand out contiguous ranges, in whatever order the map iterates
        let mut running = 0;
        for bucket in self.cells.values_mut() {
            bucket.start = running;
            bucket.filled = 0;
            running += bucket.count;
        }

        // 3) Scatter boid indices into their ranges
        self.indices.clear();
        self.indices.resize(running, 0);
        for (i, key) in self.keys.iter().enumerate() {
            if let Some(bucket) = self.cells.get_mut(key) {
                self.indices[bucket.start + bucket.filled] = i;
                bucket.filled += 1;
            }
        }
    }

    /// Range into [`SpatialGrid::indices`] owned by `key`, if the cell is occupied.
    pub fn cell_range(&self, key: i64) -> Option<Range<usize>> {
        self.cells
            .get(&key)
            .map(|bucket| bucket.start..bucket.start + bucket.count)
    }

    /// Boid indices stored under `key`.
    pub fn cell_members(&self, key: i64) -> &[usize] {
        match self.cell_range(key) {
            Some(range) => &self.indices[range],
            None => &[],
        }
    }

    /// The flat index array, grouped by cell.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of distinct occupied cell keys.
    pub fn cells_used(&self) -> usize {
        self.cells.len()
    }

    /// Population of the most crowded cell.
    pub fn largest_cell(&self) -> usize {
        self.cells.values().map(|bucket| bucket.count).max().unwrap_or(0)
    }

    // Keys of the 3x3 block around (x, y), colliding keys listed once
    fn block_keys(&self, x: f32, y: f32) -> ([i64; 9], usize) {
        let (cx, cy) = self.cell_coords(x, y);
        let mut keys = [0i64; 9];
        let mut len = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let key = self.key_for_coords(cx.wrapping_add(dx), cy.wrapping_add(dy));
                if !keys[..len].contains(&key) {
                    keys[len] = key;
                    len += 1;
                }
            }
        }
        (keys, len)
    }

    /// Lazily yields every boid index stored in the 3x3 block of cells around
    /// `(x, y)`. No distance filtering happens here.
    pub fn neighbors(&self, x: f32, y: f32) -> Neighbors<'_> {
        let (keys, key_count) = self.block_keys(x, y);
        Neighbors {
            grid: self,
            keys,
            key_count,
            next_key: 0,
            current: 0..0,
        }
    }

    /// Calls `visit` once per boid index in the 3x3 block around `(x, y)`,
    /// in flat-array order within each cell.
    #[inline]
    pub fn for_each_neighbor<F>(&self, x: f32, y: f32, visit: F)
    where
        F: FnMut(usize),
    {
        self.neighbors(x, y).for_each(visit);
    }
}

/// Iterator over the candidate neighbors of one query point.
pub struct Neighbors<'a> {
    grid: &'a SpatialGrid,
    keys: [i64; 9],
    key_count: usize,
    next_key: usize,
    current: Range<usize>,
}

impl<'a> Iterator for Neighbors<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if let Some(slot) = self.current.next() {
                return Some(self.grid.indices[slot]);
            }
            if self.next_key >= self.key_count {
                return None;
            }
            let key = self.keys[self.next_key];
            self.next_key += 1;
            if let Some(range) = self.grid.cell_range(key) {
                self.current = range;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn scattered(n: usize, extent: f32, seed: u64) -> Vec<Point2> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| pt2(rng.gen_range(-extent..extent), rng.gen_range(-extent..extent)))
            .collect()
    }

    fn assert_partition(grid: &SpatialGrid, n: usize) {
        let mut seen = vec![0usize; n];
        for &i in grid.indices() {
            seen[i] += 1;
        }
        assert!(seen.iter().all(|&c| c == 1), "indices are not a partition");
    }

    #[test]
    fn rebuild_partitions_every_index() {
        for hashing in [CellHashing::XorPrimes, CellHashing::Packed] {
            let positions = scattered(2_000, 400.0, 7);
            let mut grid = SpatialGrid::new(25.0, hashing);
            grid.rebuild(positions.iter().copied());

            assert_eq!(grid.len(), positions.len());
            assert_partition(&grid, positions.len());

            // Every boid sits in the range of its own key
            for (i, p) in positions.iter().enumerate() {
                let key = grid.cell_key(p.x, p.y);
                assert!(grid.cell_members(key).contains(&i));
            }
        }
    }

    #[test]
    fn points_in_one_cell_share_a_key() {
        let grid = SpatialGrid::new(10.0, CellHashing::XorPrimes);
        assert_eq!(grid.cell_key(2.0, 2.0), grid.cell_key(7.0, 7.0));
        assert_ne!(grid.cell_key(2.0, 2.0), grid.cell_key(12.0, 2.0));
    }

    #[test]
    fn query_includes_same_cell_neighbor() {
        let mut grid = SpatialGrid::new(10.0, CellHashing::XorPrimes);
        grid.rebuild([pt2(2.0, 2.0), pt2(7.0, 7.0)]);

        let found: Vec<usize> = grid.neighbors(2.0, 2.0).collect();
        assert!(found.contains(&0));
        assert!(found.contains(&1));
    }

    #[test]
    fn neighborhood_is_a_superset_of_the_true_radius() {
        let cell = 20.0;
        let positions = scattered(1_500, 300.0, 11);
        let queries = scattered(200, 320.0, 12);

        for hashing in [CellHashing::XorPrimes, CellHashing::Packed] {
            let mut grid = SpatialGrid::new(cell, hashing);
            grid.rebuild(positions.iter().copied());

            for q in &queries {
                let mut visited = vec![false; positions.len()];
                grid.for_each_neighbor(q.x, q.y, |i| visited[i] = true);

                for (i, p) in positions.iter().enumerate() {
                    if p.distance(*q) <= cell {
                        assert!(visited[i], "boid {i} at {p:?} missed for query {q:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn each_candidate_is_visited_once() {
        let positions = scattered(800, 100.0, 3);
        let mut grid = SpatialGrid::new(15.0, CellHashing::XorPrimes);
        grid.rebuild(positions.iter().copied());

        let mut hits = vec![0u32; positions.len()];
        grid.for_each_neighbor(0.0, 0.0, |i| hits[i] += 1);
        assert!(hits.iter().all(|&h| h <= 1));
    }

    #[test]
    fn rebuild_twice_gives_identical_membership() {
        let positions = scattered(1_000, 250.0, 5);
        let mut grid = SpatialGrid::new(30.0, CellHashing::XorPrimes);

        grid.rebuild(positions.iter().copied());
        let first: Vec<Vec<usize>> = positions
            .iter()
            .map(|p| grid.cell_members(grid.cell_key(p.x, p.y)).to_vec())
            .collect();

        grid.rebuild(positions.iter().copied());
        let second: Vec<Vec<usize>> = positions
            .iter()
            .map(|p| grid.cell_members(grid.cell_key(p.x, p.y)).to_vec())
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn rebuild_forgets_previous_frame() {
        let mut grid = SpatialGrid::new(10.0, CellHashing::XorPrimes);
        grid.rebuild(scattered(500, 200.0, 9));
        grid.rebuild([pt2(1.0, 1.0), pt2(500.0, 500.0)]);

        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cells_used(), 2);
        assert_partition(&grid, 2);
        let near_origin: Vec<usize> = grid.neighbors(0.0, 0.0).collect();
        assert_eq!(near_origin, vec![0]);
    }

    #[test]
    fn negative_coordinates_floor_correctly() {
        let grid = SpatialGrid::new(10.0, CellHashing::Packed);
        assert_ne!(grid.cell_key(-0.5, 0.0), grid.cell_key(0.5, 0.0));
        assert_eq!(grid.cell_key(-0.5, 0.0), grid.cell_key(-9.5, 0.0));
    }

    #[test]
    fn packed_keys_never_collide_in_a_block() {
        let grid = SpatialGrid::new(1.0, CellHashing::Packed);
        let mut keys = Vec::new();
        for cy in -50..50 {
            for cx in -50..50 {
                keys.push(grid.cell_key(cx as f32 + 0.5, cy as f32 + 0.5));
            }
        }
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn empty_grid_yields_nothing() {
        let mut grid = SpatialGrid::new(10.0, CellHashing::XorPrimes);
        grid.rebuild(std::iter::empty::<Point2>());
        assert!(grid.is_empty());
        assert_eq!(grid.largest_cell(), 0);
        assert_eq!(grid.neighbors(3.0, 3.0).count(), 0);
    }
}
