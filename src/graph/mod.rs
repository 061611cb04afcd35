//! The immutable graph substrate.
//!
//! A [`CsrGraph`] stores a directed graph in compressed sparse row form with
//! a single arc array shared by forward and backward traversal: every arc
//! packs a 30-bit endpoint id and two direction flags into a `u32`. At each
//! vertex the arcs are ordered so that forward arcs form a prefix and
//! backward arcs a suffix, which lets traversals stop at the first arc
//! missing their flag instead of scanning the whole row.

mod bin;
mod dimacs;
mod metis;

pub use bin::{read_binary, write_binary, GraphFileError};
pub use dimacs::load_dimacs;
pub use metis::load_metis;

use anyhow::{ensure, Context, Result};
use dsi_progress_logger::ProgressLog;
use std::path::Path;

const VERTEX_MASK: u32 = 0x3FFF_FFFF;
const FORWARD_FLAG: u32 = 0x4000_0000;
const BACKWARD_FLAG: u32 = 0x8000_0000;

/// The largest representable vertex id.
pub const MAX_VERTEX_ID: u32 = VERTEX_MASK;

/// A packed arc: a 30-bit endpoint id plus forward/backward flags.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Arc(u32);

impl Arc {
    fn new(other: u32, forward: bool, backward: bool) -> Self {
        debug_assert!(other <= VERTEX_MASK);
        let mut data = other & VERTEX_MASK;
        if forward {
            data |= FORWARD_FLAG;
        }
        if backward {
            data |= BACKWARD_FLAG;
        }
        Arc(data)
    }

    /// The vertex at the other end of this arc.
    #[inline(always)]
    pub fn other_vertex(self) -> u32 {
        self.0 & VERTEX_MASK
    }

    /// Whether this arc can be traversed in the forward direction.
    #[inline(always)]
    pub fn forward(self) -> bool {
        self.0 & FORWARD_FLAG != 0
    }

    /// Whether this arc can be traversed in the backward direction, that is,
    /// whether it represents an arc of the reverse graph.
    #[inline(always)]
    pub fn backward(self) -> bool {
        self.0 & BACKWARD_FLAG != 0
    }

    /// Ordering class establishing the forward-prefix/backward-suffix layout:
    /// forward-only arcs, then two-way arcs, then backward-only arcs.
    #[inline(always)]
    fn direction_class(self) -> u32 {
        match (self.forward(), self.backward()) {
            (true, false) => 0,
            (true, true) => 1,
            (false, true) => 2,
            (false, false) => 3,
        }
    }

    #[inline(always)]
    fn sort_key(self) -> u64 {
        ((self.direction_class() as u64) << 32) | self.other_vertex() as u64
    }
}

impl std::fmt::Debug for Arc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Arc({}{}{})",
            self.other_vertex(),
            if self.forward() { ", fwd" } else { "" },
            if self.backward() { ", bwd" } else { "" },
        )
    }
}

/// An immutable directed graph in CSR form, supporting forward and backward
/// traversal over the same arc array.
///
/// Vertex ids are dense in `[0, n)`. The `first_arc` array has a sentinel
/// entry pointing one past the last arc, and the arc array has a flagless
/// sentinel arc, so every vertex's row can be sliced without bounds checks
/// on the last vertex.
pub struct CsrGraph {
    first_arc: Box<[usize]>,
    arcs: Box<[Arc]>,
    directed: bool,
}

impl CsrGraph {
    /// Builds a graph from a list of `(from, to)` pairs.
    ///
    /// Both traversal directions are materialized: a directed input arc
    /// produces a forward arc at `from` and a backward arc at `to`, while an
    /// undirected edge (which must be given once, with `from < to`) produces
    /// a two-way arc at both endpoints. Vertex ids must be smaller than
    /// `num_vertices`; self-loops must have been dropped by the caller.
    pub fn from_arc_list(num_vertices: u32, arc_list: &[(u32, u32)], directed: bool) -> Self {
        let n = num_vertices as usize;
        assert!(
            num_vertices <= MAX_VERTEX_ID,
            "vertex ids need 30 bits: {} vertices requested",
            num_vertices
        );
        let num_arcs = arc_list.len() * 2;

        // Counting pass: each input pair contributes one arc entity at both
        // endpoints.
        let mut first_arc = vec![0usize; n + 2];
        for &(from, to) in arc_list {
            assert!(from < num_vertices, "vertex id {} out of range", from);
            assert!(to < num_vertices, "vertex id {} out of range", to);
            assert!(directed || from < to);
            first_arc[from as usize + 2] += 1;
            first_arc[to as usize + 2] += 1;
        }
        for u in 2..n + 2 {
            first_arc[u] += first_arc[u - 1];
        }

        // Placement pass; `first_arc[u + 1]` doubles as the next free slot of
        // vertex u and ends up as the row start of u + 1.
        let mut arcs = vec![Arc::default(); num_arcs + 1];
        for &(from, to) in arc_list {
            arcs[first_arc[from as usize + 1]] = Arc::new(to, true, !directed);
            first_arc[from as usize + 1] += 1;
            arcs[first_arc[to as usize + 1]] = Arc::new(from, !directed, true);
            first_arc[to as usize + 1] += 1;
        }
        first_arc.pop();
        debug_assert_eq!(first_arc[n], num_arcs);

        // Sentinel arc, pointing at the sentinel vertex with no flags.
        arcs[num_arcs] = Arc(num_vertices & VERTEX_MASK);

        let mut graph = CsrGraph {
            first_arc: first_arc.into_boxed_slice(),
            arcs: arcs.into_boxed_slice(),
            directed,
        };

        // Establish the direction-class layout within each row. Undirected
        // graphs only contain two-way arcs, so their insertion order already
        // satisfies it.
        if directed {
            for u in 0..n {
                let (start, end) = (graph.first_arc[u], graph.first_arc[u + 1]);
                graph.arcs[start..end].sort_unstable_by_key(|a| a.sort_key());
            }
        }

        graph
    }

    /// The number of vertices.
    #[inline(always)]
    pub fn num_vertices(&self) -> usize {
        self.first_arc.len() - 1
    }

    /// The number of arc entities stored, counting both traversal
    /// directions. An input arc of a directed graph accounts for two.
    #[inline(always)]
    pub fn num_arcs(&self) -> usize {
        self.arcs.len() - 1
    }

    #[inline(always)]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// All arcs of vertex `u`, forward prefix first.
    #[inline(always)]
    pub fn arcs(&self, u: u32) -> &[Arc] {
        &self.arcs[self.first_arc[u as usize]..self.first_arc[u as usize + 1]]
    }

    /// The arc at the given position of the flat arc array. Useful for
    /// sampling arcs uniformly.
    #[inline(always)]
    pub fn arc_by_id(&self, arc_id: usize) -> Arc {
        self.arcs[arc_id]
    }

    /// The forward arcs of `u`, i.e. the heads of arcs leaving `u`.
    #[inline(always)]
    pub fn forward_arcs(&self, u: u32) -> impl Iterator<Item = Arc> + '_ {
        self.arcs(u).iter().copied().take_while(|a| a.forward())
    }

    /// The backward arcs of `u`, i.e. the tails of arcs entering `u`.
    #[inline(always)]
    pub fn backward_arcs(&self, u: u32) -> impl Iterator<Item = Arc> + '_ {
        self.arcs(u)
            .iter()
            .rev()
            .copied()
            .take_while(|a| a.backward())
    }

    /// In-degree of every vertex: the number of forward arcs pointing at it.
    pub fn in_degrees(&self) -> Vec<u32> {
        let mut indeg = vec![0u32; self.num_vertices()];
        for u in 0..self.num_vertices() as u32 {
            for arc in self.forward_arcs(u) {
                indeg[arc.other_vertex() as usize] += 1;
            }
        }
        indeg
    }

    /// Verifies the structural invariants: monotone row bounds with the
    /// correct sentinel, in-range endpoint ids, at least one direction flag
    /// per arc, and rows laid out in direction-class order.
    pub fn check_consistency(&self) -> Result<()> {
        let n = self.num_vertices();
        let m = self.num_arcs();
        ensure!(self.first_arc[n] == m, "first-arc sentinel does not match the arc count");
        for u in 0..n {
            ensure!(
                self.first_arc[u] <= self.first_arc[u + 1],
                "first-arc array not monotone at vertex {}",
                u
            );
            let row = self.arcs(u as u32);
            for (i, arc) in row.iter().enumerate() {
                ensure!(
                    (arc.other_vertex() as usize) < n,
                    "arc endpoint {} out of range at vertex {}",
                    arc.other_vertex(),
                    u
                );
                ensure!(
                    arc.forward() || arc.backward(),
                    "arc with no direction flag at vertex {}",
                    u
                );
                if i > 0 {
                    ensure!(
                        row[i - 1].direction_class() <= arc.direction_class(),
                        "direction classes out of order at vertex {}",
                        u
                    );
                }
            }
        }
        Ok(())
    }

    /// Logs the vertex and arc counts and the out-degree distribution
    /// extremes.
    pub fn dump_statistics(&self) {
        let n = self.num_vertices();
        let mut min_deg = usize::MAX;
        let mut max_deg = 0;
        for u in 0..n {
            let deg = self.first_arc[u + 1] - self.first_arc[u];
            min_deg = min_deg.min(deg);
            max_deg = max_deg.max(deg);
        }
        if n == 0 {
            min_deg = 0;
        }
        log::info!(
            "graph: {} vertices, {} arc entities ({}), degrees min {} / max {} / avg {:.2}",
            n,
            self.num_arcs(),
            if self.directed { "directed" } else { "undirected" },
            min_deg,
            max_deg,
            if n == 0 { 0.0 } else { self.num_arcs() as f64 / n as f64 },
        );
    }
}

/// Input graph file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Metis,
    Dimacs,
    Binary,
}

/// Load-time transformations applied by the text loaders.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Treat the input as undirected, materializing both directions on the
    /// same arcs.
    pub undirected: bool,
    /// Swap arc endpoints, yielding the reverse graph.
    pub transpose: bool,
    /// Deduplicate parallel arcs after parsing.
    pub dedup_parallel: bool,
}

/// Loads a graph in the given format.
///
/// The binary format carries its own directedness and is stored free of
/// parallel arcs, so `options` only affect the text formats, as does the
/// convention that the on-disk name is the given path with a `.gr` suffix.
pub fn load(
    path: impl AsRef<Path>,
    format: GraphFormat,
    options: LoadOptions,
    pl: &mut impl ProgressLog,
) -> Result<CsrGraph> {
    let path = path.as_ref();
    let graph = match format {
        GraphFormat::Metis => load_metis(path, options, pl)
            .with_context(|| format!("loading METIS graph {}", path.display()))?,
        GraphFormat::Dimacs => load_dimacs(path, options, pl)
            .with_context(|| format!("loading DIMACS graph {}", path.display()))?,
        GraphFormat::Binary => read_binary(path, pl)
            .with_context(|| format!("loading binary graph {}", path.display()))?,
    };
    graph.check_consistency()?;
    Ok(graph)
}

/// Sorts an arc list lexicographically and removes duplicates.
fn dedup_arcs(arcs: &mut Vec<(u32, u32)>) {
    arcs.sort_unstable();
    arcs.dedup();
}
