//! Node and edge labels the simulation attaches to the graph container.

use crate::error::{Error, Result};

/// 3D position / force vector.
pub type Vec3 = nalgebra::Vector3<f64>;

/// The graph shape the whole engine operates on.
pub type LayoutGraph = selkie_graphlib::Graph<NodeBody, EdgeBody>;

/// Physical state of a node. `size` is a rendering hint and never feeds into the physics.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBody {
    pub position: Vec3,
    /// Force accumulator, reset at the end of every iteration.
    pub displacement: Vec3,
    pub size: f64,
    /// Fixed nodes accumulate forces like any other but discard them at integration time.
    pub fixed: bool,
}

impl Default for NodeBody {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            displacement: Vec3::zeros(),
            size: 1.0,
            fixed: false,
        }
    }
}

impl NodeBody {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn fixed_at(position: Vec3) -> Self {
        Self {
            position,
            fixed: true,
            ..Default::default()
        }
    }
}

/// Visual weight of an edge. Physics attraction is controlled globally via
/// `LayoutParameters::attraction_strength`; this only scales rendering width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeStrength {
    Weak,
    #[default]
    Moderate,
    Strong,
}

impl EdgeStrength {
    pub fn width_factor(self) -> f64 {
        match self {
            EdgeStrength::Weak => 0.7,
            EdgeStrength::Moderate => 1.0,
            EdgeStrength::Strong => 1.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeBody {
    pub strength: EdgeStrength,
}

/// Checks that every edge endpoint resolves to a known node.
///
/// The container maintains this invariant itself; this exists as a cheap guard for snapshots
/// assembled by external collaborators before a run is started.
pub fn validate(graph: &LayoutGraph) -> Result<()> {
    for e in graph.edges() {
        if !graph.has_node(&e.from) || !graph.has_node(&e.to) {
            return Err(Error::MissingEndpoint {
                edge_id: e.id.clone(),
            });
        }
    }
    Ok(())
}
