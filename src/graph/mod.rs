//! Graph representation and algorithms module

pub mod algorithms;
pub mod builder;
pub mod compressed;

pub use builder::{build_graph, GraphBuilder};
pub use compressed::WeightedGraph;
