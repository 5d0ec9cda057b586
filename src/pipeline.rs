//! Loader → filter → builder → detector → writer

use crate::cluster::metrics::PartitionQuality;
use crate::cluster::{Louvain, Partition};
use crate::config::Config;
use crate::data::filter::{filter_edges, weight_distribution};
use crate::data::npz::load_npz;
use crate::data::{SparseMatrix, WeightDistribution};
use crate::error::{ConfigError, Error};
use crate::graph::{build_graph, WeightedGraph};
use crate::storage::write_communities;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything one threshold produced, kept for diagnostics
#[derive(Debug, Clone)]
pub struct Detection {
    pub threshold: f64,

    /// Matrix entries at or above the threshold, self-loops included
    pub retained_entries: usize,

    /// Distribution of the retained weights
    pub distribution: WeightDistribution,

    pub graph: WeightedGraph,

    pub partition: Partition,
}

/// Filter, build and partition for `config.threshold`
pub fn detect_communities(matrix: &SparseMatrix, config: &Config) -> Detection {
    let edges = filter_edges(matrix, config.threshold);
    let distribution = weight_distribution(&edges.weights);

    log::info!("Making graph with threshold {}", config.threshold);
    let graph = build_graph(&edges);
    let partition = Louvain::from_config(config).detect(&graph);

    Detection {
        threshold: config.threshold,
        retained_entries: edges.len(),
        distribution,
        graph,
        partition,
    }
}

/// Load `input`, detect communities and write them to `output`
pub fn run(input: &Path, output: &Path, config: &Config) -> Result<(SparseMatrix, Detection), Error> {
    config.validate()?;

    let matrix = load_npz(input)?;
    let detection = detect_communities(&matrix, config);
    write_communities(&detection.partition, output)?;

    Ok((matrix, detection))
}

/// Metrics of one threshold in a sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub threshold: f64,
    pub retained_entries: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub quality: PartitionQuality,
}

/// Run the detector for each threshold, independently and in parallel.
///
/// Results come back in the order of `thresholds`.
pub fn sweep(
    matrix: &SparseMatrix,
    thresholds: &[f64],
    config: &Config,
) -> Result<Vec<SweepPoint>, ConfigError> {
    let configs = thresholds
        .iter()
        .map(|&threshold| {
            let config = config.with_threshold(threshold);
            config.validate().map(|_| config)
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::info!("Sweeping {} thresholds", configs.len());

    let points = configs
        .par_iter()
        .map(|config| {
            let detection = detect_communities(matrix, config);
            let quality = PartitionQuality::evaluate(&detection.graph, &detection.partition, config);
            SweepPoint {
                threshold: config.threshold,
                retained_entries: detection.retained_entries,
                node_count: detection.graph.node_count,
                edge_count: detection.graph.edge_count(),
                quality,
            }
        })
        .collect();

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_matrix() -> SparseMatrix {
        SparseMatrix::from_triplets(
            (4, 4),
            vec![(0, 1, 8.0), (1, 0, 8.0), (1, 2, 9.0), (2, 1, 9.0)],
        )
    }

    #[test]
    fn scenario_yields_single_community() {
        let detection = detect_communities(&scenario_matrix(), &Config::default());

        assert_eq!(detection.retained_entries, 4);
        assert_eq!(detection.graph.edge_count(), 2);
        assert_eq!(detection.partition.len(), 1);
        assert_eq!(detection.partition.communities[0].members, vec![0, 1, 2]);
        assert_eq!(detection.distribution.values, vec![8.0, 9.0]);
    }

    #[test]
    fn threshold_above_max_yields_nothing() {
        let detection = detect_communities(&scenario_matrix(), &Config::default().with_threshold(10.0));

        assert_eq!(detection.retained_entries, 0);
        assert!(detection.graph.is_empty());
        assert!(detection.partition.is_empty());
    }

    #[test]
    fn sweep_keeps_threshold_order() {
        let points = sweep(&scenario_matrix(), &[10.0, 9.0, 7.0], &Config::default()).unwrap();

        let thresholds: Vec<f64> = points.iter().map(|p| p.threshold).collect();
        assert_eq!(thresholds, vec![10.0, 9.0, 7.0]);
        assert_eq!(points[0].edge_count, 0);
        assert_eq!(points[1].edge_count, 1);
        assert_eq!(points[2].edge_count, 2);
    }

    #[test]
    fn sweep_rejects_non_finite_threshold() {
        let err = sweep(&scenario_matrix(), &[1.0, f64::INFINITY], &Config::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFinite { name: "threshold", .. }));
    }
}
