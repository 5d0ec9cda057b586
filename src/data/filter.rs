//! Threshold filtering of matrix entries

use crate::data::SparseMatrix;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Entries that survived a threshold, as parallel arrays in matrix order.
///
/// Self-loops are still present here; the graph builder drops them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredEdges {
    pub threshold: f64,
    pub rows: Vec<u32>,
    pub cols: Vec<u32>,
    pub weights: Vec<f64>,
}

impl FilteredEdges {
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterate over `(row, col, weight)`
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
        self.rows
            .iter()
            .zip(&self.cols)
            .zip(&self.weights)
            .map(|((&row, &col), &weight)| (row, col, weight))
    }
}

/// Select entries whose weight is at least `threshold`
pub fn threshold_mask(matrix: &SparseMatrix, threshold: f64) -> Vec<bool> {
    matrix.values.iter().map(|&value| value >= threshold).collect()
}

/// Keep the entries selected by `mask`
pub fn apply_mask(matrix: &SparseMatrix, mask: &[bool], threshold: f64) -> FilteredEdges {
    debug_assert_eq!(mask.len(), matrix.nnz());

    let retained = mask.iter().filter(|&&keep| keep).count();
    let mut edges = FilteredEdges {
        threshold,
        rows: Vec::with_capacity(retained),
        cols: Vec::with_capacity(retained),
        weights: Vec::with_capacity(retained),
    };

    for ((row, col, weight), &keep) in matrix.entries().zip(mask) {
        if !keep {
            continue;
        }
        edges.rows.push(row);
        edges.cols.push(col);
        edges.weights.push(weight);
    }

    edges
}

/// Mask and extract in one step
pub fn filter_edges(matrix: &SparseMatrix, threshold: f64) -> FilteredEdges {
    let mask = threshold_mask(matrix, threshold);
    let edges = apply_mask(matrix, &mask, threshold);

    log::info!(
        "Threshold {} keeps {} of {} entries",
        threshold,
        edges.len(),
        matrix.nnz()
    );

    edges
}

/// Distribution of retained weights. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightDistribution {
    /// Distinct weights, ascending
    pub values: Vec<f64>,

    /// Occurrences of each distinct weight
    pub counts: Vec<usize>,

    /// `counts` divided by the number of weights
    pub frequencies: Vec<f64>,

    /// Summary statistics, absent when no weight was retained
    pub summary: Option<WeightSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// Count distinct weights and their normalized frequencies
pub fn weight_distribution(weights: &[f64]) -> WeightDistribution {
    if weights.is_empty() {
        return WeightDistribution::default();
    }

    let grouped: Vec<(f64, usize)> = weights
        .iter()
        .copied()
        .sorted_by(|a, b| a.total_cmp(b))
        .dedup_with_count()
        .map(|(count, value)| (value, count))
        .collect();

    let total = weights.len() as f64;
    let summary = WeightSummary {
        min: weights.min(),
        max: weights.max(),
        mean: weights.mean(),
        std_dev: if weights.len() > 1 { weights.std_dev() } else { 0.0 },
    };

    let distribution = WeightDistribution {
        values: grouped.iter().map(|&(value, _)| value).collect(),
        counts: grouped.iter().map(|&(_, count)| count).collect(),
        frequencies: grouped.iter().map(|&(_, count)| count as f64 / total).collect(),
        summary: Some(summary),
    };

    for ((value, count), frequency) in distribution
        .values
        .iter()
        .zip(&distribution.counts)
        .zip(&distribution.frequencies)
    {
        log::debug!(
            "Value: {}, Normalized Frequency: {:.4}, Actual Frequency: {}",
            value,
            frequency,
            count
        );
    }

    distribution
}
