//! SKIM: sketch-based influence maximization.
//!
//! The greedy loop interleaves three phases. Phase A consumes vertex/instance
//! pairs from the [`RankStream`] and grows per-vertex sketch *counters* with
//! pruned backward visits until some vertex's counter fills to k; that vertex
//! is the next seed, with the Cohen estimate `(k − 1)·n / rank` of its
//! marginal influence. Once the stream is exhausted the loop switches to
//! bucket-based selection over the residual counters (Phase B). Phase C then
//! propagates coverage from the chosen seed with one forward visit per
//! instance and retires every sketch contribution of the newly covered pairs
//! through the inverse sketch index.

use super::bfs::{Direction, InstanceBfs};
use super::ranks::RankStream;
use crate::graph::CsrGraph;
use crate::model::{CascadeModel, LiveEdgeOracle};
use crate::utils::Threads;
use dsi_progress_logger::ProgressLog;
use rayon::prelude::*;
use std::collections::HashMap;
use std::convert::Infallible;
use std::ops::ControlFlow;
use std::time::Instant;
use sux::bits::BitVec;

/// The default seed of the random number generators.
pub const DEFAULT_RANDOM_SEED: u32 = 31101982;

/// Parameters of a [`maximize`] run.
#[derive(Debug, Clone)]
pub struct SkimConfig {
    /// Number of seeds to select; 0 selects up to one per vertex.
    pub seed_set_size: u32,
    /// Sketch size.
    pub k: u16,
    /// Number of IC instances.
    pub num_instances: u16,
    /// Instances for the final exact-influence evaluation; 0 disables it.
    pub num_eval_instances: u16,
    /// Worker threads for coverage propagation.
    pub num_threads: usize,
    pub random_seed: u32,
}

impl Default for SkimConfig {
    fn default() -> Self {
        SkimConfig {
            seed_set_size: 0,
            k: 64,
            num_instances: 64,
            num_eval_instances: 0,
            num_threads: 1,
            random_seed: DEFAULT_RANDOM_SEED,
        }
    }
}

/// A selected seed vertex.
///
/// Timings are cumulative over the run up to and including this seed's
/// iteration, mirroring the coverage traces the run can emit.
#[derive(Debug, Clone)]
pub struct Seed {
    pub vertex: u32,
    /// Rank-based estimate of the marginal influence at selection time.
    pub estimated_influence: f64,
    /// Marginal influence actually realized by coverage propagation (or by
    /// the final evaluation, when enabled).
    pub exact_influence: f64,
    pub sketch_ms: f64,
    pub influence_ms: f64,
}

/// The outcome of a [`maximize`] run.
#[derive(Debug, Clone)]
pub struct SkimResult {
    /// The seeds, in selection order.
    pub seeds: Vec<Seed>,
    pub ranks_used: u64,
    pub num_permutations: u32,
    pub total_estimated_influence: f64,
    pub total_exact_influence: f64,
    pub sketch_ms: f64,
    pub influence_ms: f64,
    pub total_ms: f64,
    /// Whether the run stopped because every vertex/instance pair was
    /// covered before the requested seed count was reached.
    pub reached_total_coverage: bool,
}

#[inline(always)]
fn pack(vertex: u32, instance: u16) -> u64 {
    ((vertex as u64) << 16) | instance as u64
}

#[inline(always)]
fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Greedily selects a seed set maximizing the expected spread under the
/// given cascade model.
pub fn maximize(
    graph: &CsrGraph,
    model: CascadeModel,
    config: &SkimConfig,
    pl: &mut impl ProgressLog,
) -> SkimResult {
    let n = graph.num_vertices();
    let l = config.num_instances;
    let k = config.k;
    assert!(k > 0 && l > 0);
    let target = if config.seed_set_size == 0 {
        n as u64
    } else {
        config.seed_set_size as u64
    };

    let oracle = LiveEdgeOracle::new(graph, model, config.random_seed);
    let mut stream = RankStream::new(n as u32, l, config.random_seed as u64);
    let mut inverse_sketches: HashMap<u64, Vec<u32>> = HashMap::new();
    let mut sketch_sizes: Vec<u16> = vec![0; n];
    let mut covered: Vec<BitVec> = (0..l).map(|_| BitVec::new(n)).collect();

    let num_workers = config.num_threads.max(1);
    let mut workers: Vec<InstanceBfs> = (0..num_workers).map(|_| InstanceBfs::new(n)).collect();
    let pool = (num_workers > 1).then(|| Threads::NumThreads(num_workers).build());

    // Saturation state; allocated only if the rank stream runs dry.
    let mut saturated = false;
    let mut buckets: Vec<Vec<u32>> = Vec::new();
    let mut bucket_pos: Vec<u32> = Vec::new();
    let mut bucket_top: u16 = 0;

    let mut seeds: Vec<Seed> = Vec::new();
    let mut total_estimated = 0.0;
    let mut total_exact = 0.0;
    let mut sketch_ms = 0.0;
    let mut influence_ms = 0.0;
    let mut reached_total_coverage = false;
    let global_start = Instant::now();

    pl.item_name("seed");
    pl.expected_updates(Some(target as usize));
    pl.start("Selecting seed vertices...");

    'greedy: while (seeds.len() as u64) < target {
        let mut new_seed: Option<(u32, f64)> = None;

        if !saturated {
            let phase_start = Instant::now();
            // Phase A: draw ranks and build sketch counters until a sketch
            // fills to k.
            loop {
                let Some((source, instance)) = stream.next_pair() else {
                    break;
                };
                if covered[instance as usize][source as usize] {
                    continue;
                }
                let cov = &covered[instance as usize];
                let inverse_sketch = inverse_sketches.entry(pack(source, instance)).or_default();
                let outcome = workers[0].run(
                    graph,
                    &oracle,
                    l,
                    [source],
                    instance,
                    Direction::Backward,
                    |w| cov[w as usize],
                    |u| {
                        inverse_sketch.push(u);
                        sketch_sizes[u as usize] += 1;
                        if sketch_sizes[u as usize] == k {
                            ControlFlow::Break(u)
                        } else {
                            ControlFlow::Continue(true)
                        }
                    },
                );
                if let ControlFlow::Break(vertex) = outcome {
                    let estimate = (k - 1) as f64 * n as f64 / stream.rank() as f64;
                    new_seed = Some((vertex, estimate));
                    break;
                }
            }
            sketch_ms += elapsed_ms(phase_start);

            if new_seed.is_none() {
                // Out of fresh ranks: fall back to selecting by residual
                // sketch size.
                pl.info(format_args!(
                    "graph saturated (|S| = {}, rank = {})",
                    seeds.len(),
                    stream.rank()
                ));
                buckets = vec![Vec::new(); k as usize];
                bucket_pos = vec![0; n];
                let mut num_bucketed = 0usize;
                for u in 0..n {
                    let size = sketch_sizes[u];
                    if size > 0 {
                        bucket_pos[u] = buckets[size as usize].len() as u32;
                        buckets[size as usize].push(u as u32);
                        bucket_top = bucket_top.max(size);
                        num_bucketed += 1;
                    }
                }
                pl.info(format_args!(
                    "saturation buckets built over {} vertices",
                    num_bucketed
                ));
                saturated = true;
            }
        }

        if saturated {
            // Phase B: the highest non-empty bucket holds the vertex with
            // the largest residual sketch.
            while bucket_top > 0 && buckets[bucket_top as usize].is_empty() {
                bucket_top -= 1;
            }
            if bucket_top == 0 {
                pl.info(format_args!("total coverage reached (|S| = {})", seeds.len()));
                reached_total_coverage = true;
                break 'greedy;
            }
            let vertex = *buckets[bucket_top as usize]
                .last()
                .expect("bucket_top indexes a non-empty bucket");
            new_seed = Some((vertex, sketch_sizes[vertex as usize] as f64 / l as f64));
        }

        let (vertex, estimated) = new_seed.expect("one of the phases selected a seed");

        // Phase C: propagate coverage from the new seed in every instance.
        // Each instance is owned by exactly one worker, which collects the
        // inverse-sketch hits it sees; the hit queues are drained after the
        // join, in instance order, so the run is deterministic for any
        // thread count.
        let phase_start = Instant::now();
        let per_instance: Vec<(u64, Vec<u32>)> = match &pool {
            Some(pool) => {
                let chunk_size = covered.len().div_ceil(num_workers);
                pool.install(|| {
                    covered
                        .par_chunks_mut(chunk_size)
                        .zip(workers.par_iter_mut())
                        .enumerate()
                        .map(|(chunk_index, (cov_chunk, bfs))| {
                            cov_chunk
                                .iter_mut()
                                .enumerate()
                                .map(|(offset, cov)| {
                                    cover_instance(
                                        graph,
                                        &oracle,
                                        l,
                                        vertex,
                                        (chunk_index * chunk_size + offset) as u16,
                                        cov,
                                        &inverse_sketches,
                                        bfs,
                                    )
                                })
                                .collect::<Vec<_>>()
                        })
                        .collect::<Vec<_>>()
                })
                .into_iter()
                .flatten()
                .collect()
            }
            None => {
                let bfs = &mut workers[0];
                covered
                    .iter_mut()
                    .enumerate()
                    .map(|(instance, cov)| {
                        cover_instance(
                            graph,
                            &oracle,
                            l,
                            vertex,
                            instance as u16,
                            cov,
                            &inverse_sketches,
                            bfs,
                        )
                    })
                    .collect()
            }
        };

        let mut newly_covered = 0u64;
        for (instance, (count, hits)) in per_instance.into_iter().enumerate() {
            newly_covered += count;
            for u in hits {
                let inverse_sketch = inverse_sketches
                    .remove(&pack(u, instance as u16))
                    .expect("hits point at present inverse sketches");
                for &w in &inverse_sketch {
                    if saturated {
                        let size = sketch_sizes[w as usize] as usize;
                        let pos = bucket_pos[w as usize] as usize;
                        let last = *buckets[size]
                            .last()
                            .expect("w is in the bucket of its sketch size");
                        bucket_pos[last as usize] = pos as u32;
                        buckets[size].swap_remove(pos);
                        if size > 1 {
                            bucket_pos[w as usize] = buckets[size - 1].len() as u32;
                            buckets[size - 1].push(w);
                        }
                    }
                    sketch_sizes[w as usize] -= 1;
                }
            }
        }

        let exact = newly_covered as f64 / l as f64;
        influence_ms += elapsed_ms(phase_start);
        total_estimated += estimated;
        total_exact += exact;
        seeds.push(Seed {
            vertex,
            estimated_influence: estimated,
            exact_influence: exact,
            sketch_ms,
            influence_ms,
        });
        pl.update();
    }
    pl.done();
    let total_ms = elapsed_ms(global_start);

    // The optional evaluation re-derives exact influences on an independent
    // set of instances; it is not part of the measured running time.
    if config.num_eval_instances != 0 {
        total_exact = evaluate_exact(
            graph,
            &oracle,
            &mut seeds,
            config.num_eval_instances,
            &mut workers[0],
            pl,
        );
    }

    SkimResult {
        seeds,
        ranks_used: stream.rank(),
        num_permutations: stream.num_permutations(),
        total_estimated_influence: total_estimated,
        total_exact_influence: total_exact,
        sketch_ms,
        influence_ms,
        total_ms,
        reached_total_coverage,
    }
}

/// Forward visit from the seed in one instance: counts the newly covered
/// vertices, records which of them have an inverse-sketch entry, and marks
/// them covered. Vertices covered by earlier seeds are excluded, so the
/// visit reaches exactly the seed's marginal contribution.
#[allow(clippy::too_many_arguments)]
fn cover_instance(
    graph: &CsrGraph,
    oracle: &LiveEdgeOracle,
    num_instances: u16,
    seed_vertex: u32,
    instance: u16,
    cov: &mut BitVec,
    inverse_sketches: &HashMap<u64, Vec<u32>>,
    bfs: &mut InstanceBfs,
) -> (u64, Vec<u32>) {
    let mut newly_covered = 0u64;
    let mut hits = Vec::new();
    let _ = bfs.run(
        graph,
        oracle,
        num_instances,
        [seed_vertex],
        instance,
        Direction::Forward,
        |w| cov[w as usize],
        |u| {
            newly_covered += 1;
            if inverse_sketches.contains_key(&pack(u, instance)) {
                hits.push(u);
            }
            ControlFlow::<Infallible, _>::Continue(true)
        },
    );
    for &u in bfs.visited().keys() {
        cov.set(u as usize, true);
    }
    (newly_covered, hits)
}

/// Replays the seed sequence on `num_eval` fresh instances, assigning each
/// seed the marginal influence it contributes there. The coverage bitmaps
/// persist across seeds, so the values sum to the exact spread of the whole
/// set.
fn evaluate_exact(
    graph: &CsrGraph,
    oracle: &LiveEdgeOracle,
    seeds: &mut [Seed],
    num_eval: u16,
    bfs: &mut InstanceBfs,
    pl: &mut impl ProgressLog,
) -> f64 {
    let n = graph.num_vertices();
    let mut marked: Vec<BitVec> = (0..num_eval).map(|_| BitVec::new(n)).collect();

    pl.item_name("seed");
    pl.expected_updates(Some(seeds.len()));
    pl.start(format!(
        "Evaluating exact influence on {} instances...",
        num_eval
    ));
    let mut total = 0.0;
    for seed in seeds.iter_mut() {
        let mut size = 0u64;
        for instance in 0..num_eval {
            let m = &mut marked[instance as usize];
            if m[seed.vertex as usize] {
                continue;
            }
            let _ = bfs.run(
                graph,
                oracle,
                num_eval,
                [seed.vertex],
                instance,
                Direction::Forward,
                |w| m[w as usize],
                |_| {
                    size += 1;
                    ControlFlow::<Infallible, _>::Continue(true)
                },
            );
            for &u in bfs.visited().keys() {
                m.set(u as usize, true);
            }
        }
        seed.exact_influence = size as f64 / num_eval as f64;
        total += seed.exact_influence;
        pl.update();
    }
    pl.done();
    total
}
