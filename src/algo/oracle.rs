//! The influence oracle: combined bottom-k reachability sketches and the
//! estimator answering spread queries over them.
//!
//! Preprocessing permutes all n·ℓ vertex/instance pairs globally and runs one
//! pruned backward visit per pair, instance by instance, in rank order; a
//! vertex's sketch ends up holding the k smallest ranks whose pair reaches
//! it. A query merges the sketches of the seed set and evaluates the Cohen
//! inverse-probability estimator on the surviving rank/τ pairs.

use super::bfs::{Direction, InstanceBfs};
use super::sketch;
use crate::graph::CsrGraph;
use crate::model::{CascadeModel, LiveEdgeOracle};
use crate::stats::StatsWriter;
use crate::utils::{random_permutation, KahanSummation, VisitSet};
use dsi_progress_logger::ProgressLog;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::convert::Infallible;
use std::ops::ControlFlow;
use std::time::Instant;

/// How random query seed sets are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMethod {
    /// Vertices drawn uniformly, with replacement.
    Uniform,
    /// Spatially clustered vertices sampled from a small forward
    /// neighborhood, for queries with heavily overlapping reach.
    Neighborhood,
}

impl std::fmt::Display for SeedMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SeedMethod::Uniform => "uni",
            SeedMethod::Neighborhood => "neigh",
        })
    }
}

/// The preprocessed influence oracle over a graph.
pub struct InfluenceOracle<'a> {
    graph: &'a CsrGraph,
    oracle: LiveEdgeOracle,
    k: u16,
    num_instances: u16,
    random_seed: u32,
    /// Per-vertex combined bottom-k sketches, ascending.
    sketches: Vec<Vec<u64>>,
    bfs: InstanceBfs,
    seed_space: VisitSet,
    levels: Vec<u32>,
    rng: StdRng,
    preprocessing_ms: f64,
    total_sketch_entries: u64,
    // Estimator merge buffers, reused across queries.
    merge_src: Vec<(u64, u64)>,
    merge_dst: Vec<(u64, u64)>,
    index_src: Vec<usize>,
    index_dst: Vec<usize>,
}

impl<'a> InfluenceOracle<'a> {
    pub fn new(
        graph: &'a CsrGraph,
        model: CascadeModel,
        random_seed: u32,
        k: u16,
        num_instances: u16,
    ) -> Self {
        assert!(k > 0 && num_instances > 0);
        let n = graph.num_vertices();
        InfluenceOracle {
            graph,
            oracle: LiveEdgeOracle::new(graph, model, random_seed),
            k,
            num_instances,
            random_seed,
            sketches: vec![Vec::new(); n],
            bfs: InstanceBfs::new(n),
            seed_space: VisitSet::new(n),
            levels: vec![u32::MAX; n],
            rng: StdRng::seed_from_u64(random_seed as u64),
            preprocessing_ms: 0.0,
            total_sketch_entries: 0,
            merge_src: Vec::new(),
            merge_dst: Vec::new(),
            index_src: Vec::new(),
            index_dst: Vec::new(),
        }
    }

    /// The per-vertex sketches; empty until [`preprocess`](Self::preprocess)
    /// has run.
    pub fn sketches(&self) -> &[Vec<u64>] {
        &self.sketches
    }

    pub fn preprocessing_ms(&self) -> f64 {
        self.preprocessing_ms
    }

    /// Builds the combined bottom-k reachability sketches.
    pub fn preprocess(&mut self, pl: &mut impl ProgressLog) {
        let n = self.graph.num_vertices();
        let l = self.num_instances as usize;
        let k = self.k as usize;
        let num_ranks = n as u64 * self.num_instances as u64;

        // One global permutation assigns each vertex/instance pair its rank:
        // the value at position r encodes the pair, r itself is the rank.
        let permutation = random_permutation(num_ranks, self.random_seed as u64);
        let mut instance_ranks: Vec<Vec<(u64, u32)>> = vec![Vec::new(); l];
        for (rank, &value) in permutation.iter().enumerate() {
            let instance = (value / n as u64) as usize;
            let source = (value % n as u64) as u32;
            instance_ranks[instance].push((rank as u64, source));
        }
        drop(permutation);

        pl.item_name("instance");
        pl.expected_updates(Some(l));
        pl.start("Computing combined bottom-k reachability sketches...");
        let start = Instant::now();

        let mut local_sketches: Vec<Vec<u64>> = vec![Vec::new(); n];
        let mut scratch = Vec::new();
        for (instance, ranks) in instance_ranks.iter().enumerate() {
            debug_assert_eq!(ranks.len(), n);
            // Pairs of one instance arrive in increasing rank order, so a
            // vertex whose local sketch is full can never accept a later
            // rank and prunes the visit.
            for &(rank, source) in ranks {
                let _ = self.bfs.run(
                    self.graph,
                    &self.oracle,
                    self.num_instances,
                    [source],
                    instance as u16,
                    Direction::Backward,
                    |_| false,
                    |u| {
                        let local = &mut local_sketches[u as usize];
                        if local.len() >= k {
                            ControlFlow::<Infallible, _>::Continue(false)
                        } else {
                            local.push(rank);
                            ControlFlow::Continue(true)
                        }
                    },
                );
            }

            // Fold this instance's sketches into the combined ones and make
            // room for the next instance.
            self.total_sketch_entries = 0;
            for u in 0..n {
                sketch::merge_trimmed(&mut self.sketches[u], &local_sketches[u], k, &mut scratch);
                self.total_sketch_entries += self.sketches[u].len() as u64;
                local_sketches[u].clear();
            }
            pl.update();
        }

        self.preprocessing_ms = start.elapsed().as_secs_f64() * 1000.0;
        pl.done();
    }

    /// Estimates the expected spread of a seed set from the preprocessed
    /// sketches.
    ///
    /// The seed sketches are turned into rank/τ lists closed by a sentinel
    /// pair and merged pairwise in ⌈log₂ |S|⌉ rounds; at rank collisions the
    /// pair with the larger τ survives. The estimate is n·Σ 1/τ over the
    /// merged list.
    pub fn estimate(&mut self, seed_set: &[u32]) -> f64 {
        if seed_set.is_empty() {
            return 0.0;
        }
        let n = self.graph.num_vertices() as u64;
        let k = self.k as usize;
        let sentinel = n * self.num_instances as u64;

        let merge_src = &mut self.merge_src;
        let merge_dst = &mut self.merge_dst;
        let index_src = &mut self.index_src;
        let index_dst = &mut self.index_dst;
        merge_src.clear();
        index_src.clear();

        // A full sketch contributes its first k − 1 ranks with τ equal to
        // its largest rank; a partial one contributes everything with the
        // sentinel τ.
        for &s in seed_set {
            let sketch = &self.sketches[s as usize];
            let full = sketch.len() == k;
            let num = sketch.len() - usize::from(full);
            let tau = sketch::tau(sketch, k, sentinel);
            index_src.push(merge_src.len());
            for &rank in &sketch[..num] {
                merge_src.push((rank, tau));
            }
            merge_src.push((sentinel, 0));
        }
        index_src.push(merge_src.len());

        while index_src.len() > 2 {
            let num_chunks = index_src.len() - 1;
            merge_dst.clear();
            index_dst.clear();
            let mut chunk = 0;
            while chunk < num_chunks {
                index_dst.push(merge_dst.len());

                // An odd chunk at the end moves to the next round as is.
                if chunk + 1 == num_chunks {
                    merge_dst.extend_from_slice(&merge_src[index_src[chunk]..index_src[chunk + 1]]);
                    chunk += 1;
                    continue;
                }

                let mut p1 = index_src[chunk];
                let mut p2 = index_src[chunk + 1];
                loop {
                    let a = merge_src[p1];
                    let b = merge_src[p2];
                    if a.0 < b.0 {
                        merge_dst.push(a);
                        p1 += 1;
                    } else if b.0 < a.0 {
                        merge_dst.push(b);
                        p2 += 1;
                    } else if a.1 > b.1 {
                        merge_dst.push(a);
                        p1 += 1;
                        p2 += 1;
                    } else {
                        merge_dst.push(b);
                        // Once the sentinels meet, the merged chunk is done.
                        if a.0 == sentinel {
                            break;
                        }
                        p1 += 1;
                        p2 += 1;
                    }
                }
                chunk += 2;
            }
            index_dst.push(merge_dst.len());
            std::mem::swap(merge_src, merge_dst);
            std::mem::swap(index_src, index_dst);
        }

        merge_src.pop();
        let mut sum = KahanSummation::new();
        for &(_, tau) in merge_src.iter() {
            sum.add(1.0 / tau as f64);
        }
        sum.value() * n as f64
    }

    /// Exact expected spread of a seed set by Monte-Carlo simulation over
    /// `num_eval` instances: one multi-source forward visit per instance.
    pub fn exact_influence(&mut self, seed_set: &[u32], num_eval: u16) -> f64 {
        let mut size = 0u64;
        for instance in 0..num_eval {
            let _ = self.bfs.run(
                self.graph,
                &self.oracle,
                num_eval,
                seed_set.iter().copied(),
                instance,
                Direction::Forward,
                |_| false,
                |_| {
                    size += 1;
                    ControlFlow::<Infallible, _>::Continue(true)
                },
            );
        }
        size as f64 / num_eval as f64
    }

    /// Generates a random seed set of the given size.
    pub fn generate_seed_set(&mut self, size: usize, method: SeedMethod) -> Vec<u32> {
        let mut seed_set = Vec::with_capacity(size);
        match method {
            SeedMethod::Uniform => {
                let n = self.graph.num_vertices() as u32;
                for _ in 0..size {
                    seed_set.push(self.rng.gen_range(0..n));
                }
            }
            SeedMethod::Neighborhood => {
                let num_arcs = self.graph.num_arcs();
                assert!(num_arcs > 0, "neighborhood sampling needs at least one arc");
                while seed_set.len() < size {
                    // A uniformly drawn backward arc names its other endpoint
                    // with probability proportional to that endpoint's
                    // out-degree.
                    let root = loop {
                        let arc = self.graph.arc_by_id(self.rng.gen_range(0..num_arcs));
                        if arc.backward() {
                            break arc.other_vertex();
                        }
                    };

                    // Grow a level-by-level forward ball around the root
                    // until a level would push the visit past the number of
                    // seeds still needed; that final level completes but is
                    // not expanded.
                    let space = &mut self.seed_space;
                    space.clear();
                    space.insert(root);
                    self.levels[root as usize] = 0;
                    let mut cur = 0;
                    let mut final_level = u32::MAX;
                    while cur < space.len() {
                        let u = space.key(cur);
                        cur += 1;
                        if self.levels[u as usize] > final_level {
                            break;
                        }
                        if cur >= size - seed_set.len() {
                            final_level = self.levels[u as usize];
                        }
                        if self.levels[u as usize] == final_level {
                            continue;
                        }
                        for arc in self.graph.arcs(u) {
                            if !arc.forward() {
                                continue;
                            }
                            let v = arc.other_vertex();
                            if space.contains(v) {
                                continue;
                            }
                            self.levels[v as usize] = self.levels[u as usize] + 1;
                            space.insert(v);
                        }
                    }

                    for index in 0..space.len() {
                        self.levels[space.key(index) as usize] = u32::MAX;
                    }
                    while space.len() > cur {
                        space.delete_back();
                    }

                    // Sample without replacement from the ball; if it was
                    // too small, grow another one from a fresh arc.
                    while seed_set.len() < size && !space.is_empty() {
                        let index = self.rng.gen::<u32>() as usize % space.len();
                        seed_set.push(space.delete_by_index(index));
                    }
                }
            }
        }
        seed_set
    }

    /// Runs batches of random queries, comparing the estimator with exact
    /// simulation and recording per-query and per-size statistics.
    #[allow(clippy::too_many_arguments)]
    pub fn run_queries(
        &mut self,
        sizes: &[usize],
        size_range: &str,
        method: SeedMethod,
        num_queries: u32,
        num_eval: u16,
        stats: &mut StatsWriter,
        pl: &mut impl ProgressLog,
    ) {
        stats.add("NumberOfVertices", self.graph.num_vertices());
        stats.add("NumberOfArcs", self.graph.num_arcs());
        stats.add("PreprocessingElapsedMilliseconds", self.preprocessing_ms);
        stats.add("NumberOfQueries", num_queries);
        stats.add("SeedGenerator", method);
        stats.add("SeedSizeRange", size_range);
        stats.add("TotalSketchesSize", self.total_sketch_entries);
        stats.add("TotalSketchesBytes", self.total_sketch_entries * 8);
        stats.add("NumberOfSeedSetSizes", sizes.len());

        for (size_index, &size) in sizes.iter().enumerate() {
            stats.add(&format!("{}_SeedSetSize", size_index), size);
            pl.info(format_args!(
                "Running {} queries with seed set size {}...",
                num_queries, size
            ));

            let mut avg_error = 0.0;
            let mut avg_estimated = 0.0;
            let mut avg_exact = 0.0;
            let mut avg_estimator_ms = 0.0;
            let mut avg_exact_ms = 0.0;
            for query in 0..num_queries {
                let seed_set = self.generate_seed_set(size, method);
                debug_assert_eq!(seed_set.len(), size);

                let timer = Instant::now();
                let estimated = self.estimate(&seed_set);
                let estimator_ms = timer.elapsed().as_secs_f64() * 1000.0;
                let timer = Instant::now();
                let exact = self.exact_influence(&seed_set, num_eval);
                let exact_ms = timer.elapsed().as_secs_f64() * 1000.0;
                let error = (estimated - exact).abs() / exact;

                avg_error += error;
                avg_estimated += estimated;
                avg_exact += exact;
                avg_estimator_ms += estimator_ms;
                avg_exact_ms += exact_ms;

                let vertex_ids = seed_set
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                stats.add(&format!("{}_{}_VertexIds", size_index, query), vertex_ids);
                stats.add(&format!("{}_{}_EstimatedInfluence", size_index, query), estimated);
                stats.add(&format!("{}_{}_ExactInfluence", size_index, query), exact);
                stats.add(&format!("{}_{}_Error", size_index, query), error);
                stats.add(
                    &format!("{}_{}_EstimatorElapsedMilliseconds", size_index, query),
                    estimator_ms,
                );
                stats.add(
                    &format!("{}_{}_ExactElapsedMilliseconds", size_index, query),
                    exact_ms,
                );
            }
            avg_error /= num_queries as f64;
            avg_estimated /= num_queries as f64;
            avg_exact /= num_queries as f64;
            avg_estimator_ms /= num_queries as f64;
            avg_exact_ms /= num_queries as f64;

            pl.info(format_args!(
                "done (est = {:.4}, ex = {:.4}, err = {:.4}, test = {:.5} ms, tex = {:.5} ms)",
                avg_estimated, avg_exact, avg_error, avg_estimator_ms, avg_exact_ms
            ));
            stats.add(&format!("{}_AverageEstimatedInfluence", size_index), avg_estimated);
            stats.add(&format!("{}_AverageExactInfluence", size_index), avg_exact);
            stats.add(&format!("{}_AverageError", size_index), avg_error);
            stats.add(
                &format!("{}_AverageEstimatorElapsedMilliseconds", size_index),
                avg_estimator_ms,
            );
            stats.add(
                &format!("{}_AverageExactElapsedMilliseconds", size_index),
                avg_exact_ms,
            );
        }
    }
}
