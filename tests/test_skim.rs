use anyhow::Result;
use dsi_progress_logger::no_logging;
use influmax::algo::ranks::RankStream;
use influmax::algo::skim::{maximize, SkimConfig};
use influmax::graph::CsrGraph;
use influmax::model::CascadeModel;
use std::collections::HashSet;

#[test]
fn test_rank_stream_visits_every_pair_once() {
    let (n, l) = (7u32, 5u16);
    let mut stream = RankStream::new(n, l, 42);
    let mut seen = HashSet::new();
    while let Some((source, instance)) = stream.next_pair() {
        assert!(source < n);
        assert!(instance < l);
        assert!(seen.insert((source, instance)), "pair drawn twice");
    }
    assert_eq!(seen.len(), n as usize * l as usize);
    assert_eq!(stream.rank(), n as u64 * l as u64);
    assert_eq!(stream.num_permutations(), l as u32);
}

#[test]
fn test_path_single_seed() -> Result<()> {
    // Directed path 0 -> 1 -> 2 -> 3. Every head has in-degree 1, so under
    // the weighted model every edge is live deterministically; the only
    // vertex reaching all four sources is 0, which must be the seed and
    // covers the whole path.
    let graph = CsrGraph::from_arc_list(4, &[(0, 1), (1, 2), (2, 3)], true);
    let config = SkimConfig {
        seed_set_size: 1,
        k: 4,
        num_instances: 1,
        random_seed: 1,
        ..SkimConfig::default()
    };
    let result = maximize(&graph, CascadeModel::Weighted, &config, no_logging![]);

    assert_eq!(result.seeds.len(), 1);
    assert_eq!(result.seeds[0].vertex, 0);
    assert_eq!(result.seeds[0].exact_influence, 4.0);
    assert_eq!(result.total_exact_influence, 4.0);
    Ok(())
}

#[test]
fn test_two_components_two_seeds() -> Result<()> {
    // Two disjoint directed triangles with p = 1: one seed covers each
    // triangle entirely.
    let graph = CsrGraph::from_arc_list(
        6,
        &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)],
        true,
    );
    let config = SkimConfig {
        seed_set_size: 2,
        k: 4,
        num_instances: 4,
        ..SkimConfig::default()
    };
    let result = maximize(
        &graph,
        CascadeModel::Binary { probability: 1.0 },
        &config,
        no_logging![],
    );

    assert_eq!(result.seeds.len(), 2);
    let triangles: HashSet<u32> = result.seeds.iter().map(|s| s.vertex / 3).collect();
    assert_eq!(triangles.len(), 2, "both seeds in the same triangle");
    assert_eq!(result.seeds[0].exact_influence, 3.0);
    assert_eq!(result.seeds[1].exact_influence, 3.0);
    assert_eq!(result.total_exact_influence, 6.0);
    Ok(())
}

#[test]
fn test_one_seed_per_component_at_full_coverage() -> Result<()> {
    // With p = 1 and no seed budget, the run must stop at total coverage
    // after exactly one seed per strongly connected component.
    let graph = CsrGraph::from_arc_list(
        6,
        &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)],
        true,
    );
    let config = SkimConfig {
        seed_set_size: 0,
        k: 4,
        num_instances: 4,
        ..SkimConfig::default()
    };
    let result = maximize(
        &graph,
        CascadeModel::Binary { probability: 1.0 },
        &config,
        no_logging![],
    );

    assert_eq!(result.seeds.len(), 2);
    assert!(result.reached_total_coverage);
    Ok(())
}

fn random_arcs(n: u32, num_arcs: usize, mut state: u64) -> Vec<(u32, u32)> {
    let mut arcs = Vec::new();
    while arcs.len() < num_arcs {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let from = ((state >> 33) % n as u64) as u32;
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let to = ((state >> 33) % n as u64) as u32;
        if from != to {
            arcs.push((from, to));
        }
    }
    arcs.sort_unstable();
    arcs.dedup();
    arcs
}

#[test]
fn test_deterministic_across_runs_and_threads() -> Result<()> {
    let graph = CsrGraph::from_arc_list(30, &random_arcs(30, 90, 7), true);
    let config = SkimConfig {
        seed_set_size: 8,
        k: 8,
        num_instances: 8,
        ..SkimConfig::default()
    };

    let first = maximize(&graph, CascadeModel::Weighted, &config, no_logging![]);
    let second = maximize(&graph, CascadeModel::Weighted, &config, no_logging![]);
    let parallel = maximize(
        &graph,
        CascadeModel::Weighted,
        &SkimConfig {
            num_threads: 4,
            ..config.clone()
        },
        no_logging![],
    );

    for other in [&second, &parallel] {
        assert_eq!(first.seeds.len(), other.seeds.len());
        for (a, b) in first.seeds.iter().zip(&other.seeds) {
            assert_eq!(a.vertex, b.vertex);
            assert_eq!(a.estimated_influence, b.estimated_influence);
            assert_eq!(a.exact_influence, b.exact_influence);
        }
        assert_eq!(first.ranks_used, other.ranks_used);
    }
    Ok(())
}

#[test]
fn test_marginals_are_nonnegative_and_bounded() -> Result<()> {
    let graph = CsrGraph::from_arc_list(30, &random_arcs(30, 90, 11), true);
    let config = SkimConfig {
        seed_set_size: 0,
        k: 4,
        num_instances: 4,
        ..SkimConfig::default()
    };
    let result = maximize(&graph, CascadeModel::Weighted, &config, no_logging![]);

    // Coverage is monotone: marginal gains are non-negative and cumulate to
    // at most n.
    let mut cumulative = 0.0;
    for seed in &result.seeds {
        assert!(seed.exact_influence >= 0.0);
        cumulative += seed.exact_influence;
    }
    assert!(cumulative <= graph.num_vertices() as f64 + 1e-9);
    assert_eq!(cumulative, result.total_exact_influence);
    Ok(())
}

#[test]
fn test_zero_arc_graph_unit_influence() -> Result<()> {
    // Without arcs every seed covers exactly itself; the zero seed budget
    // targets all n vertices.
    let graph = CsrGraph::from_arc_list(5, &[], true);
    let config = SkimConfig {
        seed_set_size: 0,
        k: 2,
        num_instances: 2,
        ..SkimConfig::default()
    };
    let result = maximize(&graph, CascadeModel::Weighted, &config, no_logging![]);

    assert_eq!(result.seeds.len(), 5);
    for seed in &result.seeds {
        assert_eq!(seed.exact_influence, 1.0);
    }
    let vertices: HashSet<u32> = result.seeds.iter().map(|s| s.vertex).collect();
    assert_eq!(vertices.len(), 5);
    Ok(())
}

#[test]
fn test_single_vertex() -> Result<()> {
    let graph = CsrGraph::from_arc_list(1, &[], true);
    let result = maximize(
        &graph,
        CascadeModel::Weighted,
        &SkimConfig {
            seed_set_size: 1,
            k: 4,
            num_instances: 4,
            ..SkimConfig::default()
        },
        no_logging![],
    );
    assert_eq!(result.seeds.len(), 1);
    assert_eq!(result.seeds[0].vertex, 0);
    assert_eq!(result.seeds[0].exact_influence, 1.0);

    // Asking for more seeds than the graph can yield ends at total
    // coverage.
    let saturated = maximize(
        &graph,
        CascadeModel::Weighted,
        &SkimConfig {
            seed_set_size: 5,
            k: 8,
            num_instances: 2,
            ..SkimConfig::default()
        },
        no_logging![],
    );
    assert_eq!(saturated.seeds.len(), 1);
    assert!(saturated.reached_total_coverage);
    Ok(())
}

#[test]
fn test_evaluation_replaces_exact_influence() -> Result<()> {
    // With p = 1 the evaluation instances agree with the run's coverage.
    let graph = CsrGraph::from_arc_list(
        6,
        &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)],
        true,
    );
    let config = SkimConfig {
        seed_set_size: 2,
        k: 4,
        num_instances: 4,
        num_eval_instances: 3,
        ..SkimConfig::default()
    };
    let result = maximize(
        &graph,
        CascadeModel::Binary { probability: 1.0 },
        &config,
        no_logging![],
    );
    assert_eq!(result.total_exact_influence, 6.0);
    for seed in &result.seeds {
        assert_eq!(seed.exact_influence, 3.0);
    }
    Ok(())
}
