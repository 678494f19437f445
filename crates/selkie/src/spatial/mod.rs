//! Spatial acceleration structures for the repulsion pass.
//!
//! Both structures are rebuilt from scratch every iteration over the current positions; their
//! lifetime is one iteration. The simulation loop selects among them (or neither) via
//! [`crate::params::Acceleration`], so the structures themselves stay query-only.

mod grid;
mod octree;

pub use grid::SpatialHashGrid;
pub use octree::BarnesHutOctree;
