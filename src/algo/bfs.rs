use crate::graph::CsrGraph;
use crate::model::LiveEdgeOracle;
use crate::utils::VisitSet;
use std::ops::ControlFlow;

/// Traversal direction of an [`InstanceBfs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow live arcs out of the current vertex.
    Forward,
    /// Follow live arcs into the current vertex, i.e. traverse the reverse
    /// graph; liveness is still tested in the arcs' forward orientation.
    Backward,
}

/// A breadth-first visit of one IC instance.
///
/// The frontier is a [`VisitSet`] scanned by index, so it acts as queue and
/// visited-set at once and is reused across runs without reallocation. The
/// callback is invoked once per visited vertex, in visit order, and steers
/// the traversal: `Continue(true)` expands the vertex, `Continue(false)`
/// prunes it (the vertex stays visited but its arcs are not followed), and
/// `Break` aborts the whole visit, propagating the payload to the caller.
pub struct InstanceBfs {
    frontier: VisitSet,
}

impl InstanceBfs {
    pub fn new(num_vertices: usize) -> Self {
        Self {
            frontier: VisitSet::new(num_vertices),
        }
    }

    /// The vertices visited by the last run, in visit order.
    pub fn visited(&self) -> &VisitSet {
        &self.frontier
    }

    /// Runs a visit from the given sources in instance `instance`.
    ///
    /// Sources and discovered vertices for which `excluded` returns true are
    /// not entered into the frontier at all; the exclusion set is typically
    /// the coverage bitmap of the instance.
    #[allow(clippy::too_many_arguments)]
    pub fn run<B>(
        &mut self,
        graph: &CsrGraph,
        oracle: &LiveEdgeOracle,
        num_instances: u16,
        sources: impl IntoIterator<Item = u32>,
        instance: u16,
        direction: Direction,
        excluded: impl Fn(u32) -> bool,
        mut visit: impl FnMut(u32) -> ControlFlow<B, bool>,
    ) -> ControlFlow<B, ()> {
        self.frontier.clear();
        for source in sources {
            if !excluded(source) {
                self.frontier.insert(source);
            }
        }

        let mut index = 0;
        while index < self.frontier.len() {
            let u = self.frontier.key(index);
            index += 1;

            let expand = visit(u)?;
            if !expand {
                continue;
            }

            match direction {
                Direction::Forward => {
                    for arc in graph.forward_arcs(u) {
                        let w = arc.other_vertex();
                        if oracle.alive(u, w, instance, num_instances)
                            && !self.frontier.contains(w)
                            && !excluded(w)
                        {
                            self.frontier.insert(w);
                        }
                    }
                }
                Direction::Backward => {
                    for arc in graph.backward_arcs(u) {
                        let w = arc.other_vertex();
                        if oracle.alive(w, u, instance, num_instances)
                            && !self.frontier.contains(w)
                            && !excluded(w)
                        {
                            self.frontier.insert(w);
                        }
                    }
                }
            }
        }

        ControlFlow::Continue(())
    }
}
