//! Simulation parameters and the named presets exposed to callers.

/// Fruchterman-Reingold tuning knobs.
///
/// `optimal_distance` (`k`) is the equilibrium spacing both force terms are derived from:
/// repulsion is `k^2 / d`, attraction is `(d^2 / k) * attraction_strength`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParameters {
    pub optimal_distance: f64,
    /// Cap on per-iteration displacement at the start of a run.
    pub initial_temperature: f64,
    /// Floor on the displacement cap; guarantees late iterations move nodes negligibly.
    pub min_temperature: f64,
    /// Multiplicative temperature decay per iteration.
    pub cooling: f64,
    pub damping: f64,
    pub attraction_strength: f64,
    /// Fraction of the distance to the origin every free node is pulled back per iteration.
    pub centering_force: f64,
    pub use_bounds: bool,
    /// Half-extent of the clamp cube when `use_bounds` is set.
    pub bound_size: f64,
    pub max_iterations: u32,
    /// Minimum change in total energy between iterations below which the run is stable.
    pub convergence_threshold: f64,
}

impl Default for LayoutParameters {
    fn default() -> Self {
        Self {
            optimal_distance: 1.0,
            initial_temperature: 10.0,
            min_temperature: 0.1,
            cooling: 0.95,
            damping: 0.8,
            attraction_strength: 1.0,
            centering_force: 0.01,
            use_bounds: true,
            bound_size: 5.0,
            max_iterations: 500,
            convergence_threshold: 0.01,
        }
    }
}

impl LayoutParameters {
    /// Dense packing: shorter equilibrium spacing, stronger edge pull.
    pub fn tight() -> Self {
        Self {
            optimal_distance: 0.5,
            attraction_strength: 1.5,
            ..Default::default()
        }
    }

    /// Spread-out packing: longer equilibrium spacing, weaker edge pull.
    pub fn loose() -> Self {
        Self {
            optimal_distance: 2.0,
            attraction_strength: 0.7,
            ..Default::default()
        }
    }

    /// Aggressive annealing for interactive use; trades quality for iteration count.
    pub fn fast() -> Self {
        Self {
            initial_temperature: 5.0,
            cooling: 0.9,
            max_iterations: 200,
            ..Default::default()
        }
    }

    /// Gentle annealing; more iterations, smoother convergence.
    pub fn slow() -> Self {
        Self {
            cooling: 0.98,
            damping: 0.9,
            max_iterations: 800,
            ..Default::default()
        }
    }
}

/// Repulsion evaluation strategy. All three drive the same convergence loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Acceleration {
    /// Exact all-pairs repulsion, O(n^2) per iteration.
    BruteForce,
    /// Uniform spatial hash grid; repulsion restricted to neighbors within
    /// `influence_factor * optimal_distance`.
    Grid { influence_factor: f64 },
    /// Barnes-Hut octree with the given theta cutoff. `theta = 0` degenerates to exact
    /// brute force.
    Octree { theta: f64 },
}

impl Default for Acceleration {
    fn default() -> Self {
        Acceleration::BruteForce
    }
}

impl Acceleration {
    pub fn grid() -> Self {
        Acceleration::Grid {
            influence_factor: 3.0,
        }
    }

    pub fn octree() -> Self {
        Acceleration::Octree { theta: 0.5 }
    }
}
