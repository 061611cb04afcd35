use anyhow::Result;
use influmax::graph::CsrGraph;
use influmax::model::{CascadeModel, LiveEdgeOracle, RESOLUTION};

fn path_graph(n: u32) -> CsrGraph {
    let arcs: Vec<(u32, u32)> = (0..n - 1).map(|u| (u, u + 1)).collect();
    CsrGraph::from_arc_list(n, &arcs, true)
}

#[test]
fn test_determinism() {
    let graph = path_graph(4);
    let oracle = LiveEdgeOracle::new(&graph, CascadeModel::Binary { probability: 0.5 }, 42);
    let again = LiveEdgeOracle::new(&graph, CascadeModel::Binary { probability: 0.5 }, 42);
    for instance in 0..32 {
        for u in 0..3 {
            assert_eq!(
                oracle.alive(u, u + 1, instance, 32),
                again.alive(u, u + 1, instance, 32)
            );
        }
    }
}

#[test]
fn test_seed_changes_instances() {
    let graph = path_graph(4);
    let oracle = LiveEdgeOracle::new(&graph, CascadeModel::Binary { probability: 0.5 }, 1);
    let other = LiveEdgeOracle::new(&graph, CascadeModel::Binary { probability: 0.5 }, 2);
    let mut differs = false;
    for instance in 0..64 {
        for u in 0..3 {
            if oracle.alive(u, u + 1, instance, 64) != other.alive(u, u + 1, instance, 64) {
                differs = true;
            }
        }
    }
    assert!(differs);
}

#[test]
fn test_weighted_unit_indegree_always_alive() {
    // Along a path every head has in-degree 1, so the weighted threshold is
    // the full resolution and every edge is live in every instance.
    let graph = path_graph(6);
    let oracle = LiveEdgeOracle::new(&graph, CascadeModel::Weighted, 31101982);
    for instance in 0..64 {
        for u in 0..5 {
            assert!(oracle.alive(u, u + 1, instance, 64));
        }
    }
}

#[test]
fn test_weighted_thins_by_indegree() {
    // A star into vertex 0: the weighted threshold of an edge depends on the
    // in-degree of its head, so edges into the hub are live in roughly one
    // tenth of the instances.
    let leaves = 10u32;
    let arcs: Vec<(u32, u32)> = (1..=leaves).map(|u| (u, 0)).collect();
    let graph = CsrGraph::from_arc_list(leaves + 1, &arcs, true);
    let oracle = LiveEdgeOracle::new(&graph, CascadeModel::Weighted, 31101982);

    let mut alive = 0u32;
    let mut total = 0u32;
    for instance in 0..64 {
        for u in 1..=leaves {
            total += 1;
            if oracle.alive(u, 0, instance, 64) {
                alive += 1;
            }
        }
    }
    // The threshold is 1/10; the live fraction must be near it.
    assert!(alive < total / 4, "{} of {} edges alive", alive, total);
    assert!(alive > 0, "no live edges at all");
}

#[test]
fn test_binary_extremes() {
    let graph = path_graph(4);
    let always = LiveEdgeOracle::new(&graph, CascadeModel::Binary { probability: 1.0 }, 7);
    let never = LiveEdgeOracle::new(&graph, CascadeModel::Binary { probability: 0.0 }, 7);
    for instance in 0..16 {
        for u in 0..3 {
            assert!(always.alive(u, u + 1, instance, 16));
            assert!(!never.alive(u, u + 1, instance, 16));
        }
    }
}

#[test]
fn test_trivalency_thins_edges() {
    // Trivalency probabilities are at most 1/10, so across many instances
    // both live and dead edges must occur.
    let graph = path_graph(4);
    let oracle = LiveEdgeOracle::new(&graph, CascadeModel::Trivalency, 31101982);
    let mut alive = 0u32;
    let mut total = 0u32;
    for instance in 0..512 {
        for u in 0..3 {
            total += 1;
            if oracle.alive(u, u + 1, instance, 512) {
                alive += 1;
            }
        }
    }
    assert!(alive > 0);
    assert!(alive < total / 4, "{} of {} edges alive", alive, total);
}

#[test]
fn test_resolution_constant() {
    assert_eq!(RESOLUTION, 3_000_000);
}
