//! Drives a layout run end to end: validation, seeding, stepping with cooperative
//! yields, cancellation, and write-back.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use tracing::debug;

use crate::error::Result;
use crate::force::ForceDirectedLayout;
use crate::initial::InitialLayout;
use crate::model::{self, LayoutGraph};
use crate::params::{Acceleration, LayoutParameters};

/// Per-run knobs that are not physics parameters.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Seeding applied to the snapshot before the first step. `None` keeps the
    /// positions already on the graph.
    pub initial_layout: Option<InitialLayout>,
    pub acceleration: Acceleration,
    /// Yield to the executor every this many iterations.
    pub yield_every: u32,
    /// Invoke the progress callback every this many iterations.
    pub progress_every: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            initial_layout: None,
            acceleration: Acceleration::default(),
            yield_every: 10,
            progress_every: 10,
        }
    }
}

/// A progress sample delivered to the run callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub iteration: u32,
    pub energy: f64,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Converged,
    MaxIterationsReached,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOutcome {
    pub termination: Termination,
    pub iterations: u32,
    pub final_energy: f64,
}

impl LayoutOutcome {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

/// Cloneable handle for cancelling an in-flight run from another task or thread.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Summary figures for a laid-out graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub average_edge_length: f64,
    pub bounding_box_diagonal: f64,
}

/// Owns the layout parameters and runs simulations against caller graphs.
///
/// `run` is runtime-agnostic async: it never spawns and never blocks, it only awaits
/// a self-waking yield point, so it works under any executor, including
/// `futures::executor::block_on`.
pub struct LayoutManager {
    params: LayoutParameters,
    cancel: CancelHandle,
}

impl LayoutManager {
    pub fn new(params: LayoutParameters) -> Self {
        Self {
            params,
            cancel: CancelHandle::default(),
        }
    }

    pub fn params(&self) -> &LayoutParameters {
        &self.params
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Validates `graph` and builds a seeded simulation snapshot without running it.
    pub fn begin(&self, graph: &LayoutGraph, options: RunOptions) -> Result<ForceDirectedLayout> {
        model::validate(graph)?;
        let mut snapshot = graph.clone();
        if let Some(initial) = options.initial_layout {
            initial.apply(&mut snapshot);
        }
        Ok(ForceDirectedLayout::from_graph(
            &snapshot,
            self.params,
            options.acceleration,
        ))
    }

    /// Runs a full layout and writes the result back onto `graph`.
    ///
    /// Cancellation is checked at iteration boundaries; a cancelled run leaves
    /// `graph` untouched and reports `Termination::Cancelled`.
    pub async fn run(
        &self,
        graph: &mut LayoutGraph,
        options: RunOptions,
        mut progress: impl FnMut(Progress),
    ) -> Result<LayoutOutcome> {
        self.cancel.clear();
        let mut sim = self.begin(graph, options)?;
        debug!(
            nodes = sim.node_count(),
            max_iterations = self.params.max_iterations,
            "layout run started"
        );

        let mut energy = 0.0;
        loop {
            if self.cancel.is_cancelled() {
                debug!(iteration = sim.iteration(), "layout run cancelled");
                return Ok(LayoutOutcome {
                    termination: Termination::Cancelled,
                    iterations: sim.iteration(),
                    final_energy: energy,
                });
            }
            if sim.phase().is_terminal() {
                break;
            }

            let before = sim.iteration();
            let stepped = sim.step();
            if sim.iteration() == before {
                // The phase flipped to terminal without running an iteration
                // (exhausted budget or a trivially small graph).
                continue;
            }
            energy = stepped;
            let iteration = sim.iteration();
            if options.progress_every > 0 && iteration % options.progress_every == 0 {
                progress(Progress { iteration, energy });
            }
            if options.yield_every > 0 && iteration % options.yield_every == 0 {
                yield_now().await;
            }
        }

        sim.apply_to(graph);
        let outcome = LayoutOutcome {
            termination: match sim.phase() {
                crate::force::Phase::MaxIterationsReached => Termination::MaxIterationsReached,
                _ => Termination::Converged,
            },
            iterations: sim.iteration(),
            final_energy: energy,
        };
        debug!(
            iterations = outcome.iterations,
            final_energy = outcome.final_energy,
            converged = outcome.converged(),
            "layout run finished"
        );
        Ok(outcome)
    }

    /// Positions from a finished (or in-flight) simulation onto a graph.
    pub fn apply(&self, sim: &ForceDirectedLayout, graph: &mut LayoutGraph) {
        sim.apply_to(graph);
    }

    pub fn stats(&self, graph: &LayoutGraph) -> LayoutStatistics {
        let node_count = graph.node_count();
        let edge_count = graph.edge_count();

        let mut edge_total = 0.0;
        let mut measured = 0usize;
        graph.for_each_edge(|record, _| {
            if let (Some(a), Some(b)) = (graph.node(&record.from), graph.node(&record.to)) {
                edge_total += (a.position - b.position).norm();
                measured += 1;
            }
        });
        let average_edge_length = if measured > 0 {
            edge_total / measured as f64
        } else {
            0.0
        };

        let mut diagonal = 0.0;
        let mut nodes = graph.nodes();
        if let Some((_, first)) = nodes.next() {
            let mut min = first.position;
            let mut max = first.position;
            for (_, body) in nodes {
                min = min.inf(&body.position);
                max = max.sup(&body.position);
            }
            diagonal = (max - min).norm();
        }

        LayoutStatistics {
            node_count,
            edge_count,
            average_edge_length,
            bounding_box_diagonal: diagonal,
        }
    }
}

/// Completes on the second poll, waking itself on the first. Gives the executor a
/// chance to run other tasks between iteration batches.
fn yield_now() -> impl Future<Output = ()> {
    struct YieldNow {
        yielded: bool,
    }

    impl Future for YieldNow {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.yielded {
                Poll::Ready(())
            } else {
                self.yielded = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    YieldNow { yielded: false }
}
