use anyhow::Result;
use clap::Parser;
use dsi_progress_logger::{ProgressLog, ProgressLogger};
use influmax::algo::oracle::InfluenceOracle;
use influmax::cli::{
    init_logging, print_usage_and_exit, resolve_format, resolve_model, resolve_seed_method,
    CommonArgs, GraphArgs, ModelArgs,
};
use influmax::stats::StatsWriter;
use influmax::utils::extract_range;
use influmax::graph;
use std::fmt::Write as _;

/// The influence oracle: preprocesses combined bottom-k reachability
/// sketches, then answers expected-spread queries from them, comparing
/// against exact Monte-Carlo simulation.
#[derive(Parser, Debug)]
#[command(name = "oracle", about = "Sketch-based influence estimation oracle")]
struct Cli {
    #[clap(flatten)]
    graph: GraphArgs,

    #[clap(flatten)]
    model: ModelArgs,

    #[clap(flatten)]
    common: CommonArgs,

    /// Sizes of the random seed sets, as ranges (e.g. `5-10,20-30`).
    #[arg(short = 'N', long = "sizes", default_value = "1-50")]
    sizes: String,

    /// Method to generate seed sets: uni or neigh.
    #[arg(short = 'g', long = "generator", default_value = "uni")]
    generator: String,

    /// Number of random queries per seed-set size.
    #[arg(short = 'n', long = "queries", default_value_t = 100)]
    num_queries: u32,

    /// Number of instances for exact evaluation (default: same as -l).
    #[arg(long = "leval")]
    num_eval_instances: Option<u16>,

    /// Estimate the influence of every single vertex instead of running
    /// random queries; writes `vertex TAB influence` lines to the stats
    /// file.
    #[arg(short = 'a', long = "all-vertices")]
    all_vertices: bool,

    /// NUMA node to pin the process to.
    #[arg(long = "numa")]
    numa_node: Option<u32>,
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
    let Some(method) = resolve_seed_method(&cli.generator) else {
        print_usage_and_exit::<Cli>();
    };
    if let Some(node) = cli.numa_node {
        log::warn!("NUMA pinning is not supported, ignoring node {}", node);
    }

    let mut pl = (!cli.common.quiet).then(ProgressLogger::default);

    let graph = graph::load(input, format, cli.graph.load_options(), &mut pl)?;
    graph.dump_statistics();

    let mut oracle = InfluenceOracle::new(
        &graph,
        model,
        cli.common.seed,
        cli.common.k,
        cli.common.num_instances,
    );
    oracle.preprocess(&mut pl);

    if cli.all_vertices {
        pl.item_name("vertex");
        pl.expected_updates(Some(graph.num_vertices()));
        pl.start("Estimating the influence of every vertex...");
        let mut buffer = String::new();
        for vertex in 0..graph.num_vertices() as u32 {
            let influence = oracle.estimate(&[vertex]);
            let _ = writeln!(buffer, "{}\t{}", vertex, influence);
            pl.light_update();
        }
        pl.done();
        if let Some(path) = &cli.common.stats {
            if let Err(error) = std::fs::write(path, buffer) {
                log::warn!(
                    "could not write per-vertex influences to {}: {}",
                    path.display(),
                    error
                );
            }
        }
    } else {
        let sizes = extract_range(&cli.sizes)?;
        let num_eval = cli
            .num_eval_instances
            .unwrap_or(cli.common.num_instances);
        let mut stats = StatsWriter::new();
        oracle.run_queries(
            &sizes,
            &cli.sizes,
            method,
            cli.num_queries,
            num_eval,
            &mut stats,
            &mut pl,
        );
        if let Some(path) = &cli.common.stats {
            stats.write_to(path);
        }
    }

    Ok(())
}
