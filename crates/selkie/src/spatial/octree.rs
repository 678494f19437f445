//! Barnes-Hut octree for approximate n-body repulsion.

use crate::force::MIN_SEPARATION;
use crate::model::Vec3;

/// Bodies per leaf before it subdivides.
const LEAF_CAPACITY: usize = 1;
/// Hard recursion cap; coincident bodies would otherwise subdivide forever.
const MAX_DEPTH: usize = 32;

struct OctCell {
    center: Vec3,
    half: f64,
    mass: f64,
    com: Vec3,
    children: Option<[u32; 8]>,
    bodies: Vec<usize>,
}

/// Octree over a padded bounding cube of the input positions. Each body carries unit
/// mass; internal cells aggregate total mass and center of mass so that distant
/// clusters can be approximated by a single pseudo-body.
pub struct BarnesHutOctree {
    cells: Vec<OctCell>,
    positions: Vec<Vec3>,
}

impl BarnesHutOctree {
    pub fn build(positions: &[Vec3]) -> Option<Self> {
        if positions.is_empty() {
            return None;
        }
        let mut min = positions[0];
        let mut max = positions[0];
        for p in positions {
            min = min.inf(p);
            max = max.sup(p);
        }
        if !(min.iter().all(|v| v.is_finite()) && max.iter().all(|v| v.is_finite())) {
            return None;
        }

        let center = (min + max) * 0.5;
        let extent = (max - min).amax();
        let half = extent * 0.5 * 1.05 + 1e-6;

        let mut tree = Self {
            cells: vec![OctCell {
                center,
                half,
                mass: 0.0,
                com: Vec3::zeros(),
                children: None,
                bodies: Vec::new(),
            }],
            positions: positions.to_vec(),
        };
        for idx in 0..tree.positions.len() {
            tree.insert(idx);
        }
        tree.finish(0);
        Some(tree)
    }

    fn insert(&mut self, body: usize) {
        let p = self.positions[body];
        let mut cell = 0usize;
        let mut depth = 0usize;
        loop {
            if let Some(children) = self.cells[cell].children {
                cell = children[self.octant(cell, p)] as usize;
                depth += 1;
                continue;
            }
            if self.cells[cell].bodies.len() < LEAF_CAPACITY || depth >= MAX_DEPTH {
                self.cells[cell].bodies.push(body);
                return;
            }
            self.subdivide(cell);
            let resident = std::mem::take(&mut self.cells[cell].bodies);
            for r in resident {
                let q = self.positions[r];
                let octant = self.octant(cell, q);
                let child = match self.cells[cell].children {
                    Some(children) => children[octant] as usize,
                    None => cell,
                };
                self.cells[child].bodies.push(r);
            }
        }
    }

    fn octant(&self, cell: usize, p: Vec3) -> usize {
        let c = self.cells[cell].center;
        ((p.x >= c.x) as usize) | (((p.y >= c.y) as usize) << 1) | (((p.z >= c.z) as usize) << 2)
    }

    fn subdivide(&mut self, cell: usize) {
        let center = self.cells[cell].center;
        let child_half = self.cells[cell].half * 0.5;
        let mut children = [0u32; 8];
        for (octant, slot) in children.iter_mut().enumerate() {
            let offset = Vec3::new(
                if octant & 1 != 0 { child_half } else { -child_half },
                if octant & 2 != 0 { child_half } else { -child_half },
                if octant & 4 != 0 { child_half } else { -child_half },
            );
            *slot = self.cells.len() as u32;
            self.cells.push(OctCell {
                center: center + offset,
                half: child_half,
                mass: 0.0,
                com: Vec3::zeros(),
                children: None,
                bodies: Vec::new(),
            });
        }
        self.cells[cell].children = Some(children);
    }

    /// Bottom-up mass and center-of-mass aggregation.
    fn finish(&mut self, cell: usize) {
        if let Some(children) = self.cells[cell].children {
            let mut mass = 0.0;
            let mut weighted = Vec3::zeros();
            for child in children {
                self.finish(child as usize);
                let c = &self.cells[child as usize];
                mass += c.mass;
                weighted += c.com * c.mass;
            }
            let cell = &mut self.cells[cell];
            cell.mass = mass;
            cell.com = if mass > 0.0 { weighted / mass } else { cell.center };
        } else {
            let mut weighted = Vec3::zeros();
            for &b in &self.cells[cell].bodies {
                weighted += self.positions[b];
            }
            let cell_mut = &mut self.cells[cell];
            let mass = cell_mut.bodies.len() as f64;
            cell_mut.mass = mass;
            cell_mut.com = if mass > 0.0 { weighted / mass } else { cell_mut.center };
        }
    }

    /// Net repulsive force on a body at `p` with optimal distance `k`.
    ///
    /// A cell whose angular size `width / dist` is below `theta` is treated as one
    /// pseudo-body at its center of mass; `theta == 0.0` degenerates to exact
    /// pairwise summation. Bodies closer than the minimum separation are skipped,
    /// which also excludes the query body itself.
    pub fn repulsion(&self, p: Vec3, k: f64, theta: f64) -> Vec3 {
        let mut out = Vec3::zeros();
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let cell = &self.cells[idx];
            if cell.mass == 0.0 {
                continue;
            }
            if let Some(children) = cell.children {
                let delta = p - cell.com;
                let dist = delta.norm();
                if dist > MIN_SEPARATION && (cell.half * 2.0) / dist < theta {
                    out += delta / dist * (cell.mass * k * k / dist);
                } else {
                    stack.extend(children.iter().map(|&c| c as usize));
                }
            } else {
                for &b in &cell.bodies {
                    let delta = p - self.positions[b];
                    let dist = delta.norm();
                    if dist > MIN_SEPARATION {
                        out += delta / dist * (k * k / dist);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::BarnesHutOctree;
    use crate::model::Vec3;

    #[test]
    fn coincident_bodies_stop_subdividing() {
        let positions = vec![Vec3::new(1.0, 1.0, 1.0); 8];
        let tree = BarnesHutOctree::build(&positions).expect("tree");
        // The query body skips itself and its coincident siblings by distance.
        let force = tree.repulsion(positions[0], 1.0, 0.5);
        assert_eq!(force, Vec3::zeros());
    }

    #[test]
    fn single_distant_body_matches_pairwise_formula() {
        let positions = vec![Vec3::zeros(), Vec3::new(4.0, 0.0, 0.0)];
        let tree = BarnesHutOctree::build(&positions).expect("tree");
        let k = 2.0;
        let force = tree.repulsion(positions[0], k, 0.5);
        // Magnitude k^2 / d pointing away from the other body.
        assert!((force.x - -(k * k / 4.0)).abs() < 1e-12);
        assert!(force.y.abs() < 1e-12 && force.z.abs() < 1e-12);
    }
}
