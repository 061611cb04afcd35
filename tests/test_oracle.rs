use anyhow::Result;
use dsi_progress_logger::no_logging;
use influmax::algo::oracle::{InfluenceOracle, SeedMethod};
use influmax::graph::CsrGraph;
use influmax::model::{CascadeModel, LiveEdgeOracle};
use influmax::utils::random_permutation;

/// Forward reachability of `root` in one instance, by a plain stack search
/// independent of the library's visit machinery.
fn reach(
    graph: &CsrGraph,
    oracle: &LiveEdgeOracle,
    root: u32,
    instance: u16,
    num_instances: u16,
) -> Vec<bool> {
    let mut reached = vec![false; graph.num_vertices()];
    let mut stack = vec![root];
    reached[root as usize] = true;
    while let Some(u) = stack.pop() {
        for arc in graph.forward_arcs(u) {
            let w = arc.other_vertex();
            if oracle.alive(u, w, instance, num_instances) && !reached[w as usize] {
                reached[w as usize] = true;
                stack.push(w);
            }
        }
    }
    reached
}

fn test_graph() -> CsrGraph {
    CsrGraph::from_arc_list(
        8,
        &[
            (0, 1),
            (1, 2),
            (2, 0),
            (2, 3),
            (3, 4),
            (4, 5),
            (5, 3),
            (6, 0),
            (1, 6),
            (4, 7),
        ],
        true,
    )
}

#[test]
fn test_sketches_are_exact_bottom_k() -> Result<()> {
    let graph = test_graph();
    let (k, l, seed) = (3u16, 4u16, 12345u32);

    let mut oracle = InfluenceOracle::new(&graph, CascadeModel::Weighted, seed, k, l);
    oracle.preprocess(no_logging![]);

    // Recompute every sketch from first principles: the rank of position r
    // in the global permutation belongs to vertex v iff v reaches the
    // pair's source in the pair's instance.
    let n = graph.num_vertices();
    let edge_oracle = LiveEdgeOracle::new(&graph, CascadeModel::Weighted, seed);
    let permutation = random_permutation(n as u64 * l as u64, seed as u64);

    let mut reachable = vec![Vec::new(); l as usize];
    for instance in 0..l {
        for v in 0..n as u32 {
            reachable[instance as usize].push(reach(&graph, &edge_oracle, v, instance, l));
        }
    }

    for v in 0..n {
        let mut expected = Vec::new();
        for (rank, &value) in permutation.iter().enumerate() {
            let instance = (value / n as u64) as usize;
            let source = (value % n as u64) as usize;
            if reachable[instance][v][source] {
                expected.push(rank as u64);
            }
        }
        expected.truncate(k as usize);

        let sketch = &oracle.sketches()[v];
        assert!(sketch.len() <= k as usize);
        assert!(sketch.windows(2).all(|w| w[0] < w[1]), "sketch not ascending");
        assert_eq!(sketch, &expected, "wrong sketch for vertex {}", v);
    }
    Ok(())
}

#[test]
fn test_single_vertex_estimates() -> Result<()> {
    let graph = test_graph();
    let n = graph.num_vertices() as f64;
    let (k, l) = (6u16, 4u16);
    let sentinel = graph.num_vertices() as u64 * l as u64;

    let mut oracle = InfluenceOracle::new(&graph, CascadeModel::Weighted, 12345, k, l);
    oracle.preprocess(no_logging![]);

    for v in 0..graph.num_vertices() {
        let sketch = oracle.sketches()[v].clone();
        let estimate = oracle.estimate(&[v as u32]);
        let expected = if sketch.len() == k as usize {
            n * (k as f64 - 1.0) / *sketch.last().unwrap() as f64
        } else {
            n * sketch.len() as f64 / sentinel as f64
        };
        assert!(
            (estimate - expected).abs() < 1e-9,
            "vertex {}: estimate {} vs {}",
            v,
            estimate,
            expected
        );
    }
    Ok(())
}

#[test]
fn test_clique_estimate_is_exact() -> Result<()> {
    // In K5 with p = 1 every pair reaches every vertex, so every sketch is
    // the ranks 0..8 and the estimator collapses to the exact spread.
    let graph = CsrGraph::from_arc_list(
        5,
        &[
            (0, 1),
            (0, 2),
            (0, 3),
            (0, 4),
            (1, 2),
            (1, 3),
            (1, 4),
            (2, 3),
            (2, 4),
            (3, 4),
        ],
        false,
    );
    let mut oracle = InfluenceOracle::new(
        &graph,
        CascadeModel::Binary { probability: 1.0 },
        31101982,
        8,
        8,
    );
    oracle.preprocess(no_logging![]);

    let estimate = oracle.estimate(&[0]);
    assert!((estimate - 5.0).abs() < 1e-9, "estimate {}", estimate);
    Ok(())
}

#[test]
fn test_single_instance_matches_simulation() -> Result<()> {
    // With one instance and sketches that cannot fill, the estimator counts
    // reachable vertices exactly.
    let graph = CsrGraph::from_arc_list(5, &[(0, 1), (1, 2), (1, 3)], true);
    let mut oracle = InfluenceOracle::new(&graph, CascadeModel::Weighted, 7, 10, 1);
    oracle.preprocess(no_logging![]);

    for seed_set in [vec![0u32], vec![0, 4], vec![0, 1], vec![2, 3, 4]] {
        let estimate = oracle.estimate(&seed_set);
        let exact = oracle.exact_influence(&seed_set, 1);
        assert!(
            (estimate - exact).abs() < 1e-9,
            "{:?}: estimate {} vs exact {}",
            seed_set,
            estimate,
            exact
        );
    }
    Ok(())
}

fn bipartite() -> CsrGraph {
    CsrGraph::from_arc_list(5, &[(0, 2), (0, 3), (0, 4), (1, 2), (1, 3), (1, 4)], true)
}

#[test]
fn test_bipartite_estimate_with_large_k() -> Result<()> {
    // With k exceeding the number of reachable pairs the sketches stay
    // partial, so the only estimation error left is the Monte-Carlo noise of
    // the instances themselves.
    let graph = bipartite();
    let mut oracle = InfluenceOracle::new(
        &graph,
        CascadeModel::Binary { probability: 0.5 },
        31101982,
        300,
        64,
    );
    oracle.preprocess(no_logging![]);

    let estimate = oracle.estimate(&[0]);
    let exact = oracle.exact_influence(&[0], 1024);
    let error = (estimate - exact).abs() / exact;
    assert!(error < 0.15, "estimate {} vs exact {}", estimate, exact);
    Ok(())
}

#[test]
fn test_bipartite_estimate_with_small_k() -> Result<()> {
    let graph = bipartite();
    let mut oracle = InfluenceOracle::new(
        &graph,
        CascadeModel::Binary { probability: 0.5 },
        31101982,
        32,
        64,
    );
    oracle.preprocess(no_logging![]);

    let estimate = oracle.estimate(&[0]);
    let exact = oracle.exact_influence(&[0], 1024);
    let error = (estimate - exact).abs() / exact;
    assert!(error < 0.6, "estimate {} vs exact {}", estimate, exact);
    Ok(())
}

#[test]
fn test_seed_generators() -> Result<()> {
    let graph = test_graph();
    let mut oracle = InfluenceOracle::new(&graph, CascadeModel::Weighted, 99, 4, 4);

    for size in [1, 3, 7] {
        let uniform = oracle.generate_seed_set(size, SeedMethod::Uniform);
        assert_eq!(uniform.len(), size);
        assert!(uniform.iter().all(|&v| (v as usize) < graph.num_vertices()));

        let clustered = oracle.generate_seed_set(size, SeedMethod::Neighborhood);
        assert_eq!(clustered.len(), size);
        assert!(clustered
            .iter()
            .all(|&v| (v as usize) < graph.num_vertices()));
    }

    // The generator sequence is a pure function of the construction seed.
    let mut first = InfluenceOracle::new(&graph, CascadeModel::Weighted, 99, 4, 4);
    let mut second = InfluenceOracle::new(&graph, CascadeModel::Weighted, 99, 4, 4);
    for size in [1, 3, 7] {
        assert_eq!(
            first.generate_seed_set(size, SeedMethod::Uniform),
            second.generate_seed_set(size, SeedMethod::Uniform)
        );
        assert_eq!(
            first.generate_seed_set(size, SeedMethod::Neighborhood),
            second.generate_seed_set(size, SeedMethod::Neighborhood)
        );
    }
    Ok(())
}
