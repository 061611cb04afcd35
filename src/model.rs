//! The independent-cascade edge-presence oracle.
//!
//! No IC instance is ever materialized: whether an arc is live in instance i
//! is a pure function of the arc, the instance index, the instance count and
//! the run's random seed, evaluated on demand during traversal. This is what
//! keeps preprocessing memory-bounded.

use crate::graph::CsrGraph;

/// Probabilities are integers in `[0, RESOLUTION)` compared against the hash
/// of the edge.
pub const RESOLUTION: u32 = 3_000_000;

/// The cascade model determining per-edge liveness probabilities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CascadeModel {
    /// Edge (u, v) is live with probability 1 / indeg(v).
    Weighted,
    /// Every edge is live with the same probability.
    Binary { probability: f64 },
    /// Edge probability is drawn from {0.1, 0.01, 0.001} by a second use of
    /// the edge hash.
    Trivalency,
}

/// Deterministic liveness predicate over all instances of the cascade model.
pub struct LiveEdgeOracle {
    model: CascadeModel,
    random_seed: u32,
    bin_prob: u32,
    tri_prob: [u32; 3],
    indeg: Box<[u32]>,
}

impl LiveEdgeOracle {
    /// Creates the oracle for a graph. In-degrees are computed once here;
    /// they parameterize the weighted model.
    pub fn new(graph: &CsrGraph, model: CascadeModel, random_seed: u32) -> Self {
        let bin_prob = match model {
            CascadeModel::Binary { probability } => (probability * RESOLUTION as f64) as u32,
            _ => RESOLUTION / 10,
        };
        LiveEdgeOracle {
            model,
            random_seed,
            bin_prob,
            tri_prob: [RESOLUTION / 10, RESOLUTION / 100, RESOLUTION / 1000],
            indeg: graph.in_degrees().into_boxed_slice(),
        }
    }

    pub fn model(&self) -> CascadeModel {
        self.model
    }

    /// Whether the arc (u, v) is live in instance `instance` of a model with
    /// `num_instances` instances.
    ///
    /// Deterministic in all arguments and the seed. Only meaningful for arcs
    /// present in the graph; in particular the weighted model divides by
    /// indeg(v), which existing arcs guarantee to be positive.
    #[inline(always)]
    pub fn alive(&self, u: u32, v: u32, instance: u16, num_instances: u16) -> bool {
        let h = self.edge_hash(u, v, instance, num_instances);
        let threshold = match self.model {
            CascadeModel::Weighted => {
                debug_assert!(self.indeg[v as usize] > 0);
                RESOLUTION.min(RESOLUTION / self.indeg[v as usize])
            }
            CascadeModel::Binary { .. } => self.bin_prob,
            CascadeModel::Trivalency => self.tri_prob[(h % 3) as usize],
        };
        h % RESOLUTION < threshold
    }

    /// A Murmur3-style finalizing hash of (seed, num_instances, u, v,
    /// instance), matching the reference bit for bit so that instances are
    /// reproducible across implementations.
    #[inline(always)]
    fn edge_hash(&self, u: u32, v: u32, instance: u16, num_instances: u16) -> u32 {
        const C1: u32 = 0xcc9e_2d51;
        const C2: u32 = 0x1b87_3593;

        #[inline(always)]
        fn scramble(mut k: u32) -> u32 {
            k = k.wrapping_mul(C1);
            k = k.rotate_left(15);
            k.wrapping_mul(C2)
        }

        let mut h = self
            .random_seed
            .wrapping_shl(16)
            .wrapping_add(num_instances as u32);

        h ^= scramble(u);
        h = h.rotate_left(13);
        h = h.wrapping_mul(5).wrapping_add(0xe654_6b64);

        h ^= scramble(v);
        h = h.rotate_left(13);
        h = h.wrapping_mul(5).wrapping_add(0xe654_6b64);

        // The instance block is xored in without a further mixing round;
        // the finalizer below does the remaining avalanching.
        h ^= scramble(instance as u32);

        // 10 is the input length in bytes.
        h ^= 10;
        h ^= h >> 16;
        h = h.wrapping_mul(0x85eb_ca6b);
        h ^= h >> 13;
        h = h.wrapping_mul(0xc2b2_ae35);
        h ^= h >> 16;

        h
    }
}
