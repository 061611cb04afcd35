//! Argument structures and helpers shared by the two binaries.
//!
//! Values with a closed set of spellings (`--type`, `-m`, `-g`) are parsed
//! as plain strings and resolved here: an unknown spelling prints the usage
//! screen and exits with status 0, and so does a missing input path.

use crate::algo::oracle::SeedMethod;
use crate::graph::{GraphFormat, LoadOptions};
use crate::model::CascadeModel;
use anyhow::Result;
use clap::{Args, CommandFactory};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct GraphArgs {
    /// The input graph file; for the binary type the on-disk file is
    /// `<path>.gr`.
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Type of the input: metis, dimacs or bin.
    #[arg(long = "type", default_value = "metis")]
    pub graph_type: String,

    /// Treat the input as an undirected graph.
    #[arg(long)]
    pub undir: bool,

    /// Remove parallel arcs from the input.
    #[arg(long)]
    pub nopar: bool,

    /// Transpose the input (reverse graph).
    #[arg(long)]
    pub trans: bool,
}

impl GraphArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            undirected: self.undir,
            transpose: self.trans,
            dedup_parallel: self.nopar,
        }
    }
}

#[derive(Args, Debug)]
pub struct ModelArgs {
    /// IC model to use: binary, trivalency or weighted.
    #[arg(short = 'm', long = "model", default_value = "weighted")]
    pub model: String,

    /// Probability with which an arc is live (binary model).
    #[arg(short = 'p', long = "probability", default_value_t = 0.1)]
    pub probability: f64,
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// The k value of the reachability sketches.
    #[arg(short = 'k', long = "sketch-size", default_value_t = 64)]
    pub k: u16,

    /// Number of instances of the IC model.
    #[arg(short = 'l', long = "instances", default_value_t = 64)]
    pub num_instances: u16,

    /// Seed for the random number generators.
    #[arg(long = "seed", default_value_t = crate::algo::skim::DEFAULT_RANDOM_SEED)]
    pub seed: u32,

    /// Omit progress output.
    #[arg(short = 'v', long = "quiet")]
    pub quiet: bool,

    /// File to write statistics to.
    #[arg(long = "os")]
    pub stats: Option<PathBuf>,
}

/// Prints the usage screen of the given command and exits successfully.
pub fn print_usage_and_exit<C: CommandFactory>() -> ! {
    let _ = C::command().print_help();
    std::process::exit(0);
}

/// Resolves the `--type` string; `None` asks the caller to print usage.
pub fn resolve_format(graph_type: &str) -> Option<GraphFormat> {
    match graph_type {
        "metis" => Some(GraphFormat::Metis),
        "dimacs" => Some(GraphFormat::Dimacs),
        "bin" => Some(GraphFormat::Binary),
        _ => None,
    }
}

/// Resolves the `-m` string and the binary probability.
pub fn resolve_model(args: &ModelArgs) -> Option<CascadeModel> {
    match args.model.as_str() {
        "weighted" => Some(CascadeModel::Weighted),
        "binary" => Some(CascadeModel::Binary {
            probability: args.probability,
        }),
        "trivalency" => Some(CascadeModel::Trivalency),
        _ => None,
    }
}

/// Resolves the `-g` string.
pub fn resolve_seed_method(method: &str) -> Option<SeedMethod> {
    match method {
        "uni" => Some(SeedMethod::Uniform),
        "neigh" => Some(SeedMethod::Neighborhood),
        _ => None,
    }
}

/// Initializes stderr logging; quiet runs still report warnings and errors.
pub fn init_logging(quiet: bool) -> Result<()> {
    stderrlog::new()
        .verbosity(if quiet { 1 } else { 2 })
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;
    Ok(())
}
