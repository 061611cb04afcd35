//! Run statistics and coverage traces.
//!
//! Statistics files are ordered `key = value` lines. Failing to write them
//! is never fatal: a run whose numbers appear on the console should not die
//! on a bad output path, so failures are logged and skipped.

use crate::algo::skim::{Seed, SkimResult};
use crate::graph::CsrGraph;
use std::fmt::Display;
use std::fmt::Write as _;
use std::path::Path;

/// An ordered `key = value` statistics accumulator.
#[derive(Default)]
pub struct StatsWriter {
    buffer: String,
}

impl StatsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one `key = value` line.
    pub fn add(&mut self, key: &str, value: impl Display) {
        // Writing into a String cannot fail.
        let _ = writeln!(self.buffer, "{} = {}", key, value);
    }

    /// The accumulated lines.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Writes the accumulated lines to a file. Non-fatal on failure.
    pub fn write_to(&self, path: &Path) {
        if let Err(error) = std::fs::write(path, &self.buffer) {
            log::warn!("could not write statistics to {}: {}", path.display(), error);
        }
    }
}

/// Assembles the statistics of a maximization run: the run totals followed
/// by per-seed marginal/cumulative influences and timings, keyed by the
/// seed's position in the selection order.
pub fn skim_stats(graph: &CsrGraph, result: &SkimResult) -> StatsWriter {
    let mut stats = StatsWriter::new();
    stats.add("NumberOfVertices", graph.num_vertices());
    stats.add("NumberOfArcs", graph.num_arcs() / 2);
    stats.add("TotalEstimatedInfluence", result.total_estimated_influence);
    stats.add("TotalExactInfluence", result.total_exact_influence);
    stats.add("TotalElapsedMilliseconds", result.total_ms);
    stats.add("SketchBuildingElapsedMilliseconds", result.sketch_ms);
    stats.add("InfluenceComputationElapsedMilliseconds", result.influence_ms);
    stats.add("NumberOfRanksUsed", result.ranks_used);
    stats.add("NumberOfSeedVertices", result.seeds.len());
    stats.add("RankComputationMethod", "shuffle");
    stats.add("NumberOfPermutationsComputed", result.num_permutations);

    let mut cumulative_estimated = 0.0;
    let mut cumulative_exact = 0.0;
    for (i, seed) in result.seeds.iter().enumerate() {
        cumulative_estimated += seed.estimated_influence;
        cumulative_exact += seed.exact_influence;
        stats.add(
            &format!("{}_MarginalEstimatedInfluence", i),
            seed.estimated_influence,
        );
        stats.add(
            &format!("{}_CumulativeEstimatedInfluence", i),
            cumulative_estimated,
        );
        stats.add(&format!("{}_MarginalExactInfluence", i), seed.exact_influence);
        stats.add(&format!("{}_CumulativeExactInfluence", i), cumulative_exact);
        stats.add(&format!("{}_VertexId", i), seed.vertex);
        stats.add(
            &format!("{}_TotalElapsedMilliseconds", i),
            seed.sketch_ms + seed.influence_ms,
        );
        stats.add(
            &format!("{}_SketchBuildingElapsedMilliseconds", i),
            seed.sketch_ms,
        );
        stats.add(
            &format!("{}_InfluenceComputationElapsedMilliseconds", i),
            seed.influence_ms,
        );
    }
    stats
}

/// Writes the coverage trace: the vertex count, seed count and total
/// running time, then one `vertex TAB cumulative-spread TAB cumulative-ms`
/// line per seed in selection order. Non-fatal on failure.
pub fn write_coverage(path: &Path, num_vertices: usize, seeds: &[Seed]) {
    let mut buffer = String::new();
    let total_ms = seeds
        .last()
        .map(|seed| seed.sketch_ms + seed.influence_ms)
        .unwrap_or(0.0);
    let _ = writeln!(buffer, "{}", num_vertices);
    let _ = writeln!(buffer, "{}", seeds.len());
    let _ = writeln!(buffer, "{}", total_ms);
    let mut cumulative_exact = 0.0;
    for seed in seeds {
        cumulative_exact += seed.exact_influence;
        let _ = writeln!(
            buffer,
            "{}\t{}\t{}",
            seed.vertex,
            cumulative_exact,
            seed.sketch_ms + seed.influence_ms
        );
    }
    if let Err(error) = std::fs::write(path, buffer) {
        log::warn!("could not write coverage to {}: {}", path.display(), error);
    }
}
