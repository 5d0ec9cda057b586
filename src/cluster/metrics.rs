//! Partition quality and per-community statistics

use crate::cluster::{Community, Partition};
use crate::config::Config;
use crate::graph::algorithms::component_sizes;
use crate::graph::WeightedGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Weighted modularity of a partition.
///
/// `Q = Σ_c [ L_c / m − γ (d_c / 2m)² ]` where `L_c` is the weight inside
/// community `c`, `d_c` the summed weighted degree of its members and `m`
/// the total edge weight. Zero for a graph without edges.
pub fn modularity(graph: &WeightedGraph, partition: &Partition, resolution: f64) -> f64 {
    let m = graph.total_weight();
    if m <= 0.0 {
        return 0.0;
    }

    let labels = partition.labels_for(graph);
    let count = labels.iter().copied().max().map_or(0, |max| max + 1);
    let mut internal = vec![0.0; count];
    let mut totals = vec![0.0; count];

    for node in 0..graph.node_count {
        totals[labels[node]] += graph.strength(node);
    }
    for (a, b, weight) in graph.edges() {
        if labels[a as usize] == labels[b as usize] {
            internal[labels[a as usize]] += weight;
        }
    }

    internal
        .iter()
        .zip(&totals)
        .map(|(&inside, &total)| inside / m - resolution * (total / (2.0 * m)).powi(2))
        .sum()
}

/// Coverage and performance of a partition, ignoring weights.
///
/// Coverage is the share of edges inside communities. Performance is the
/// share of node pairs that are either an intra-community edge or an
/// inter-community non-edge.
pub fn partition_quality(graph: &WeightedGraph, partition: &Partition) -> (f64, f64) {
    let labels = partition.labels_for(graph);

    let edges = graph.edge_count();
    let intra_edges = graph
        .edges()
        .filter(|&(a, b, _)| labels[a as usize] == labels[b as usize])
        .count();
    let inter_edges = edges - intra_edges;

    let coverage = if edges == 0 {
        0.0
    } else {
        intra_edges as f64 / edges as f64
    };

    let n = graph.node_count as u64;
    let possible_pairs = n * n.saturating_sub(1) / 2;
    let performance = if possible_pairs == 0 {
        0.0
    } else {
        let mut sizes = vec![0u64; labels.iter().copied().max().map_or(0, |max| max + 1)];
        for &label in &labels {
            sizes[label] += 1;
        }
        let intra_pairs: u64 = sizes.iter().map(|&s| s * s.saturating_sub(1) / 2).sum();
        let inter_non_edges = possible_pairs - intra_pairs - inter_edges as u64;
        (intra_edges as u64 + inter_non_edges) as f64 / possible_pairs as f64
    };

    (coverage, performance)
}

/// Edge density inside a community: edges / possible edges
pub fn community_density(graph: &WeightedGraph, community: &Community) -> f64 {
    let n = community.members.len();
    if n <= 1 {
        return 1.0; // By convention, singleton communities have density 1
    }

    let nodes = compact_members(graph, community);
    let internal_edges = internal_links(graph, &nodes)
        .filter(|&(a, b, _)| a < b)
        .count();

    2.0 * internal_edges as f64 / (n * (n - 1)) as f64
}

/// Members with the largest weighted degree inside their community
pub fn central_nodes(graph: &WeightedGraph, community: &Community, top: usize) -> Vec<u32> {
    let nodes = compact_members(graph, community);

    let mut strengths: Vec<(u32, f64)> = nodes
        .iter()
        .map(|&node| {
            let strength: f64 = graph
                .neighbors(node as usize)
                .filter(|(neighbor, _)| nodes.contains(neighbor))
                .map(|(_, weight)| weight)
                .sum();
            (graph.node_ids[node as usize], strength)
        })
        .collect();

    // Highest strength first, lower matrix index on ties
    strengths.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    strengths.into_iter().take(top).map(|(id, _)| id).collect()
}

fn compact_members(graph: &WeightedGraph, community: &Community) -> HashSet<u32> {
    community
        .members
        .iter()
        .filter_map(|&member| graph.index_of(member))
        .collect()
}

/// Adjacency entries with both ends in `nodes` (each edge seen twice)
fn internal_links<'a>(
    graph: &'a WeightedGraph,
    nodes: &'a HashSet<u32>,
) -> impl Iterator<Item = (u32, u32, f64)> + 'a {
    nodes.iter().flat_map(move |&node| {
        graph
            .neighbors(node as usize)
            .filter(move |(neighbor, _)| nodes.contains(neighbor))
            .map(move |(neighbor, weight)| (node, neighbor, weight))
    })
}

/// Quality measures of one partition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartitionQuality {
    pub modularity: f64,
    pub coverage: f64,
    pub performance: f64,
    pub community_count: usize,
    /// Share of communities smaller than the configured cutoff
    pub small_community_fraction: f64,
}

impl PartitionQuality {
    pub fn evaluate(graph: &WeightedGraph, partition: &Partition, config: &Config) -> Self {
        let (coverage, performance) = partition_quality(graph, partition);
        let small = partition
            .iter()
            .filter(|community| community.size < config.small_community_size)
            .count();

        let quality = Self {
            modularity: modularity(graph, partition, config.resolution),
            coverage,
            performance,
            community_count: partition.len(),
            small_community_fraction: if partition.is_empty() {
                0.0
            } else {
                small as f64 / partition.len() as f64
            },
        };

        log::debug!(
            "modularity: {:.4}, coverage: {:.4}, performance: {:.4}, small share: {:.4}",
            quality.modularity,
            quality.coverage,
            quality.performance,
            quality.small_community_fraction
        );

        quality
    }
}

/// Size and shape of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub total_weight: f64,
    pub avg_degree: f64,
    pub component_count: usize,
    pub largest_component: usize,
}

impl GraphStats {
    pub fn of(graph: &WeightedGraph) -> Self {
        let components = component_sizes(graph);

        Self {
            node_count: graph.node_count,
            edge_count: graph.edge_count(),
            total_weight: graph.total_weight(),
            avg_degree: if graph.node_count == 0 {
                0.0
            } else {
                2.0 * graph.edge_count() as f64 / graph.node_count as f64
            },
            component_count: components.len(),
            largest_component: components.first().copied().unwrap_or(0),
        }
    }
}

/// Density and central members of one community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySummary {
    pub id: u32,
    pub size: usize,
    pub density: f64,
    pub central_nodes: Vec<u32>,
}

/// Summaries for every community, in partition order
pub fn summarize_communities(graph: &WeightedGraph, partition: &Partition) -> Vec<CommunitySummary> {
    partition
        .iter()
        .map(|community| CommunitySummary {
            id: community.id,
            size: community.size,
            density: community_density(graph, community),
            central_nodes: central_nodes(graph, community, 5),
        })
        .collect()
}
