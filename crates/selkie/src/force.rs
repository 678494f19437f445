//! Fruchterman-Reingold force simulation with simulated-annealing cooling.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::model::{LayoutGraph, Vec3};
use crate::params::{Acceleration, LayoutParameters};
use crate::spatial::{BarnesHutOctree, SpatialHashGrid};

/// Pairs closer than this contribute no force; below it direction is numerically
/// meaningless and the magnitude would blow up.
pub const MIN_SEPARATION: f64 = 1e-3;

/// Where a simulation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Converged,
    MaxIterationsReached,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Converged | Phase::MaxIterationsReached)
    }
}

struct SimNode {
    id: String,
    position: Vec3,
    displacement: Vec3,
    fixed: bool,
}

struct SimEdge {
    a: usize,
    b: usize,
}

/// A force simulation over a snapshot of a graph's positions.
///
/// The simulation owns its working copy; nothing is written back to a graph until
/// [`apply_to`](Self::apply_to) is called, so a caller can step, inspect, and discard
/// without disturbing the source.
pub struct ForceDirectedLayout {
    nodes: Vec<SimNode>,
    edges: Vec<SimEdge>,
    params: LayoutParameters,
    acceleration: Acceleration,
    phase: Phase,
    iteration: u32,
    temperature: f64,
    last_energy: Option<f64>,
}

impl ForceDirectedLayout {
    /// Snapshots `graph` into a simulation. Node order follows the graph's insertion
    /// order, which keeps runs deterministic for identical inputs.
    pub fn from_graph(
        graph: &LayoutGraph,
        params: LayoutParameters,
        acceleration: Acceleration,
    ) -> Self {
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        let mut nodes = Vec::with_capacity(graph.node_count());
        for (id, body) in graph.nodes() {
            index.insert(id.to_string(), nodes.len());
            nodes.push(SimNode {
                id: id.to_string(),
                position: body.position,
                displacement: Vec3::zeros(),
                fixed: body.fixed,
            });
        }

        let mut edges = Vec::with_capacity(graph.edge_count());
        for record in graph.edges() {
            // Endpoints are guaranteed present: set_edge materializes missing nodes.
            if let (Some(&a), Some(&b)) = (index.get(&record.from), index.get(&record.to)) {
                edges.push(SimEdge { a, b });
            }
        }

        let temperature = params.initial_temperature;
        Self {
            nodes,
            edges,
            params,
            acceleration,
            phase: Phase::Idle,
            iteration: 0,
            temperature,
            last_energy: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Advances the simulation by one iteration and returns the system energy of
    /// that iteration (sum of free-node displacement magnitudes, before integration).
    ///
    /// Calling `step` on a finished simulation is a no-op returning `0.0`.
    pub fn step(&mut self) -> f64 {
        if self.phase.is_terminal() {
            return 0.0;
        }
        if self.iteration >= self.params.max_iterations {
            self.phase = Phase::MaxIterationsReached;
            return 0.0;
        }
        if self.nodes.len() <= 1 {
            self.phase = Phase::Converged;
            return 0.0;
        }
        self.phase = Phase::Running;

        self.accumulate_repulsion();
        self.accumulate_attraction();

        let energy: f64 = self
            .nodes
            .iter()
            .filter(|n| !n.fixed)
            .map(|n| n.displacement.norm())
            .sum();

        self.integrate();
        self.iteration += 1;
        self.temperature = (self.temperature * self.params.cooling)
            .max(self.params.min_temperature)
            .min(self.temperature);

        trace!(
            iteration = self.iteration,
            energy,
            temperature = self.temperature,
            "layout step"
        );

        if let Some(last) = self.last_energy {
            if (energy - last).abs() < self.params.convergence_threshold {
                self.phase = Phase::Converged;
            }
        }
        self.last_energy = Some(energy);
        energy
    }

    /// Runs until the simulation reaches a terminal phase. Returns the number of
    /// iterations executed by this call.
    pub fn run_to_completion(&mut self) -> u32 {
        let start = self.iteration;
        while !self.phase.is_terminal() {
            self.step();
        }
        self.iteration - start
    }

    /// Returns the simulation to `Idle` with iteration and annealing state fresh,
    /// keeping current node positions as the new starting point.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.iteration = 0;
        self.temperature = self.params.initial_temperature;
        self.last_energy = None;
        for node in &mut self.nodes {
            node.displacement = Vec3::zeros();
        }
    }

    fn accumulate_repulsion(&mut self) {
        let k = self.params.optimal_distance;
        match self.acceleration {
            Acceleration::BruteForce => self.repulsion_brute(k),
            Acceleration::Grid { influence_factor } => {
                let positions: Vec<Vec3> = self.nodes.iter().map(|n| n.position).collect();
                match SpatialHashGrid::build(&positions, 2.0 * k) {
                    Some(grid) => {
                        let radius = influence_factor * k;
                        for node in &mut self.nodes {
                            let p = node.position;
                            let mut force = Vec3::zeros();
                            grid.for_each_within(p, radius, |_, q| {
                                let delta = p - q;
                                let dist = delta.norm();
                                if dist > MIN_SEPARATION {
                                    force += delta / dist * (k * k / dist);
                                }
                            });
                            node.displacement += force;
                        }
                    }
                    // Build refuses non-finite positions, which the integrator never
                    // produces; fall back to the exact loop if it ever happens.
                    None => self.repulsion_brute(k),
                }
            }
            Acceleration::Octree { theta } => {
                let positions: Vec<Vec3> = self.nodes.iter().map(|n| n.position).collect();
                match BarnesHutOctree::build(&positions) {
                    Some(tree) => {
                        for node in &mut self.nodes {
                            node.displacement += tree.repulsion(node.position, k, theta);
                        }
                    }
                    None => self.repulsion_brute(k),
                }
            }
        }
    }

    fn repulsion_brute(&mut self, k: f64) {
        for i in 0..self.nodes.len() {
            for j in (i + 1)..self.nodes.len() {
                let delta = self.nodes[i].position - self.nodes[j].position;
                let dist = delta.norm();
                if dist <= MIN_SEPARATION {
                    continue;
                }
                let force = delta / dist * (k * k / dist);
                self.nodes[i].displacement += force;
                self.nodes[j].displacement -= force;
            }
        }
    }

    fn accumulate_attraction(&mut self) {
        let k = self.params.optimal_distance;
        for edge in &self.edges {
            let delta = self.nodes[edge.a].position - self.nodes[edge.b].position;
            let dist = delta.norm();
            if dist <= MIN_SEPARATION {
                continue;
            }
            let force = delta / dist * (dist * dist / k) * self.params.attraction_strength;
            self.nodes[edge.a].displacement -= force;
            self.nodes[edge.b].displacement += force;
        }
    }

    fn integrate(&mut self) {
        let params = &self.params;
        for node in &mut self.nodes {
            if node.fixed {
                node.displacement = Vec3::zeros();
                continue;
            }
            let dist = node.displacement.norm();
            if dist > MIN_SEPARATION {
                let step = node.displacement / dist * dist.min(self.temperature);
                node.position += step * params.damping;
            }
            node.displacement = Vec3::zeros();

            // Proportional pull toward the origin, outside the temperature clamp.
            node.position -= node.position * params.centering_force;

            if params.use_bounds {
                let b = params.bound_size;
                node.position.x = node.position.x.clamp(-b, b);
                node.position.y = node.position.y.clamp(-b, b);
                node.position.z = node.position.z.clamp(-b, b);
            }
        }
    }

    /// Current positions keyed by node id, in graph insertion order.
    pub fn positions(&self) -> IndexMap<String, Vec3> {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.position))
            .collect()
    }

    /// Writes the simulation's positions back onto `graph`. Nodes that were removed
    /// from the graph since the snapshot are skipped.
    pub fn apply_to(&self, graph: &mut LayoutGraph) {
        for node in &self.nodes {
            if let Some(body) = graph.node_mut(&node.id) {
                body.position = node.position;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeBody;

    fn two_node_graph() -> LayoutGraph {
        let mut g = LayoutGraph::new();
        g.set_node("a", NodeBody::at(Vec3::new(-0.2, 0.0, 0.0)));
        g.set_node("b", NodeBody::at(Vec3::new(0.2, 0.0, 0.0)));
        g.set_edge("a-b", "a", "b", false, Default::default());
        g
    }

    #[test]
    fn finished_simulation_ignores_further_steps() {
        let g = two_node_graph();
        let mut sim =
            ForceDirectedLayout::from_graph(&g, LayoutParameters::default(), Acceleration::default());
        sim.run_to_completion();
        let phase = sim.phase();
        let frozen = sim.positions();
        assert_eq!(sim.step(), 0.0);
        assert_eq!(sim.phase(), phase);
        assert_eq!(sim.positions(), frozen);
    }

    #[test]
    fn zero_iteration_budget_terminates_immediately() {
        let g = two_node_graph();
        let params = LayoutParameters {
            max_iterations: 0,
            ..LayoutParameters::default()
        };
        let mut sim = ForceDirectedLayout::from_graph(&g, params, Acceleration::default());
        sim.step();
        assert_eq!(sim.phase(), Phase::MaxIterationsReached);
        assert_eq!(sim.iteration(), 0);
    }

    #[test]
    fn reset_restores_annealing_state_but_keeps_positions() {
        let g = two_node_graph();
        let mut sim =
            ForceDirectedLayout::from_graph(&g, LayoutParameters::default(), Acceleration::default());
        sim.run_to_completion();
        let settled = sim.positions();
        sim.reset();
        assert_eq!(sim.phase(), Phase::Idle);
        assert_eq!(sim.iteration(), 0);
        assert_eq!(sim.temperature(), LayoutParameters::default().initial_temperature);
        assert_eq!(sim.positions(), settled);
    }
}
