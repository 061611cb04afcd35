use anyhow::Result;
use clap::Parser;
use dsi_progress_logger::ProgressLogger;
use influmax::algo::skim::{self, SkimConfig};
use influmax::cli::{
    init_logging, print_usage_and_exit, resolve_format, resolve_model, CommonArgs, GraphArgs,
    ModelArgs,
};
use influmax::{graph, stats};
use std::path::PathBuf;

/// Greedy sketch-based influence maximization.
///
/// Selects a seed set whose expected spread under the independent-cascade
/// model is within a (1 − 1/e − ε) factor of the optimum.
#[derive(Parser, Debug)]
#[command(name = "skim", about = "Greedy sketch-based influence maximization")]
struct Cli {
    #[clap(flatten)]
    graph: GraphArgs,

    #[clap(flatten)]
    model: ModelArgs,

    #[clap(flatten)]
    common: CommonArgs,

    /// Size of the seed set to compute (0 = up to one seed per vertex).
    #[arg(short = 'N', long = "seeds", default_value_t = 0)]
    seed_set_size: u32,

    /// Number of instances to evaluate the exact influence on (0 = off).
    #[arg(long = "leval", default_value_t = 0)]
    num_eval_instances: u16,

    /// Number of threads.
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    num_threads: usize,

    /// NUMA node to pin the process to.
    #[arg(long = "numa")]
    numa_node: Option<u32>,

    /// File to write detailed coverage information to.
    #[arg(long = "oc")]
    coverage: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.common.quiet)?;

    let Some(input) = &cli.graph.input else {
        print_usage_and_exit::<Cli>();
    };
    let Some(format) = resolve_format(&cli.graph.graph_type) else {
        print_usage_and_exit::<Cli>();
    };
    let Some(model) = resolve_model(&cli.model) else {
        print_usage_and_exit::<Cli>();
    };
    if let Some(node) = cli.numa_node {
        log::warn!("NUMA pinning is not supported, ignoring node {}", node);
    }

    let mut pl = (!cli.common.quiet).then(ProgressLogger::default);

    let graph = graph::load(input, format, cli.graph.load_options(), &mut pl)?;
    graph.dump_statistics();

    let config = SkimConfig {
        seed_set_size: cli.seed_set_size,
        k: cli.common.k,
        num_instances: cli.common.num_instances,
        num_eval_instances: cli.num_eval_instances,
        num_threads: cli.num_threads,
        random_seed: cli.common.seed,
    };
    let result = skim::maximize(&graph, model, &config, &mut pl);

    let n = graph.num_vertices() as f64;
    println!("Random seed: {}.", cli.common.seed);
    println!("Number of seed vertices computed: {}.", result.seeds.len());
    println!("Number of ranks used: {}.", result.ranks_used);
    println!(
        "Permutations computed: {} (each of size: {}).",
        result.num_permutations,
        graph.num_vertices()
    );
    println!("Building sketches: {} sec.", result.sketch_ms / 1000.0);
    println!("Computing influence: {} sec.", result.influence_ms / 1000.0);
    println!("Total time: {} sec.", result.total_ms / 1000.0);
    println!(
        "Estimated spread of solution: {} ({} %).",
        result.total_estimated_influence,
        100.0 * result.total_estimated_influence / n
    );
    println!(
        "Exact spread of solution: {} ({} %).",
        result.total_exact_influence,
        100.0 * result.total_exact_influence / n
    );
    println!(
        "Quality gap: {} %",
        100.0 * (1.0 - result.total_exact_influence / result.total_estimated_influence)
    );

    if let Some(path) = &cli.common.stats {
        stats::skim_stats(&graph, &result).write_to(path);
    }
    if let Some(path) = &cli.coverage {
        stats::write_coverage(path, graph.num_vertices(), &result.seeds);
    }

    Ok(())
}
