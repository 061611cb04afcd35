pub mod algo;
pub mod cli;
pub mod graph;
pub mod model;
pub mod stats;
pub mod utils;

pub mod prelude {
    pub use crate::algo::bfs::{Direction, InstanceBfs};
    pub use crate::algo::oracle::{InfluenceOracle, SeedMethod};
    pub use crate::algo::skim::{maximize, SkimConfig, SkimResult, DEFAULT_RANDOM_SEED};
    pub use crate::graph::{CsrGraph, GraphFormat, LoadOptions};
    pub use crate::model::{CascadeModel, LiveEdgeOracle};
}
