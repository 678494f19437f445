//! 3D force-directed graph layout.
//!
//! A Fruchterman-Reingold spring embedder with simulated-annealing cooling, pluggable
//! repulsion acceleration (exact pairwise, spatial hash grid, or a Barnes-Hut octree),
//! deterministic seeded initial layouts, and an async, runtime-agnostic layout manager
//! with cancellation and progress reporting.
//!
//! ```
//! use selkie::{Acceleration, InitialLayout, LayoutManager, LayoutParameters, RunOptions};
//! use selkie::model::{LayoutGraph, NodeBody};
//!
//! let mut graph = LayoutGraph::new();
//! graph.set_node("a", NodeBody::default());
//! graph.set_node("b", NodeBody::default());
//! graph.set_edge("a-b", "a", "b", false, Default::default());
//!
//! let manager = LayoutManager::new(LayoutParameters::default());
//! let options = RunOptions {
//!     initial_layout: Some(InitialLayout::Spherical { radius: 1.0 }),
//!     acceleration: Acceleration::BruteForce,
//!     ..RunOptions::default()
//! };
//! let outcome = futures::executor::block_on(manager.run(&mut graph, options, |_| {}))?;
//! assert!(outcome.iterations > 0);
//! # Ok::<(), selkie::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod force;
pub mod initial;
pub mod manager;
pub mod model;
pub mod params;
pub mod spatial;

pub use error::{Error, Result};
pub use force::{ForceDirectedLayout, MIN_SEPARATION, Phase};
pub use initial::{InitialLayout, XorShift64Star};
pub use manager::{
    CancelHandle, LayoutManager, LayoutOutcome, LayoutStatistics, Progress, RunOptions,
    Termination,
};
pub use params::{Acceleration, LayoutParameters};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
