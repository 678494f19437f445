//! Uniform-cell spatial hash grid over node positions.

use rustc_hash::FxHashMap;

use crate::model::Vec3;

/// Hashes positions into cubic cells of `cell_size` and answers "bodies within radius
/// r of p" queries by enumerating the covering cell range and post-filtering by true
/// distance.
///
/// Only occupied cells are stored, so memory is O(n) no matter how far apart the
/// bodies sit. Near O(1) per query for roughly uniform density; degrades toward O(n)
/// when every body lands in one cell.
#[derive(Debug)]
pub struct SpatialHashGrid {
    origin: Vec3,
    cell_size: f64,
    cells: FxHashMap<[i64; 3], Vec<usize>>,
    positions: Vec<Vec3>,
}

impl SpatialHashGrid {
    pub fn build(positions: &[Vec3], cell_size: f64) -> Option<Self> {
        if positions.is_empty() {
            return None;
        }
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return None;
        }
        if !positions
            .iter()
            .all(|p| p.iter().all(|v| v.is_finite()))
        {
            return None;
        }

        let mut origin = positions[0];
        for p in positions {
            origin = origin.inf(p);
        }

        let mut grid = Self {
            origin,
            cell_size,
            cells: FxHashMap::default(),
            positions: positions.to_vec(),
        };
        for (idx, p) in positions.iter().enumerate() {
            let c = grid.cell_coord(*p);
            grid.cells.entry(c).or_default().push(idx);
        }
        Some(grid)
    }

    // Float-to-int casts saturate, so extreme coordinates collapse into the boundary
    // cell instead of overflowing; the exact-distance post-filter keeps queries correct.
    fn cell_coord(&self, p: Vec3) -> [i64; 3] {
        let mut out = [0i64; 3];
        for axis in 0..3 {
            out[axis] = ((p[axis] - self.origin[axis]) / self.cell_size).floor() as i64;
        }
        out
    }

    /// Visits every body within `radius` of `p` (inclusive, by true Euclidean distance).
    /// The query point's own body is visited too when it lies within the radius;
    /// callers skip it by distance.
    pub fn for_each_within(&self, p: Vec3, radius: f64, mut f: impl FnMut(usize, Vec3)) {
        if !radius.is_finite() || radius < 0.0 {
            return;
        }
        let lo = self.cell_coord(p - Vec3::repeat(radius));
        let hi = self.cell_coord(p + Vec3::repeat(radius));
        let radius_sq = radius * radius;

        for cx in lo[0]..=hi[0] {
            for cy in lo[1]..=hi[1] {
                for cz in lo[2]..=hi[2] {
                    let Some(bodies) = self.cells.get(&[cx, cy, cz]) else {
                        continue;
                    };
                    for &idx in bodies {
                        let q = self.positions[idx];
                        if (q - p).norm_squared() <= radius_sq {
                            f(idx, q);
                        }
                    }
                }
            }
        }
    }

    /// Body indices within `radius` of `p`.
    pub fn nearby(&self, p: Vec3, radius: f64) -> Vec<usize> {
        let mut out = Vec::new();
        self.for_each_within(p, radius, |idx, _| out.push(idx));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::SpatialHashGrid;
    use crate::model::Vec3;

    #[test]
    fn nearby_post_filters_by_true_distance() {
        // Corner-of-cell case: same covering cell range, but outside the sphere.
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.9, 0.9, 0.9), // norm ~1.56, outside radius 1.0
            Vec3::new(0.5, 0.0, 0.0),
        ];
        let grid = SpatialHashGrid::build(&positions, 2.0).expect("grid");
        let mut hits = grid.nearby(Vec3::zeros(), 1.0);
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 2]);
    }

    #[test]
    fn build_returns_none_for_empty_or_degenerate_input() {
        assert!(SpatialHashGrid::build(&[], 1.0).is_none());
        assert!(SpatialHashGrid::build(&[Vec3::zeros()], 0.0).is_none());
        assert!(SpatialHashGrid::build(&[Vec3::zeros()], f64::NAN).is_none());
        assert!(
            SpatialHashGrid::build(&[Vec3::new(f64::INFINITY, 0.0, 0.0)], 1.0).is_none()
        );
    }

    #[test]
    fn widely_spread_positions_build_and_query_fine() {
        // Memory is keyed by occupied cells, so a huge bounding box costs nothing.
        let positions = vec![
            Vec3::zeros(),
            Vec3::new(1e18, 0.0, 0.0),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(-1e17, 1e17, -1e17),
        ];
        let grid = SpatialHashGrid::build(&positions, 1.0).expect("grid");
        let mut near_origin = grid.nearby(Vec3::zeros(), 1.0);
        near_origin.sort_unstable();
        assert_eq!(near_origin, vec![0, 2]);
        assert_eq!(grid.nearby(Vec3::new(1e18, 0.0, 0.0), 1.0), vec![1]);
    }

    #[test]
    fn extreme_but_finite_coordinates_do_not_panic() {
        let positions = vec![Vec3::zeros(), Vec3::new(f64::MAX, f64::MAX, f64::MAX)];
        let grid = SpatialHashGrid::build(&positions, 1.0).expect("grid");
        assert_eq!(grid.nearby(Vec3::zeros(), 2.0), vec![0]);
    }
}
