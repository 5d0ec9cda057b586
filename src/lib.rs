//! Community detection over a thresholded sparse similarity matrix

pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod storage;

pub use anyhow::Result;
pub use cluster::{Community, Louvain, Partition};
pub use config::Config;
pub use data::SparseMatrix;
pub use error::{ConfigError, Error, LoadError, WriteError};
pub use graph::WeightedGraph;
