//! Louvain algorithm for community detection.
//!
//! Multi-level greedy modularity optimization (Blondel et al. 2008):
//!
//! 1. **Local moving**: every node starts in its own community and is moved
//!    to the neighbouring community with the largest modularity gain, pass
//!    after pass, until a pass moves nothing.
//! 2. **Aggregation**: communities become nodes of a coarser graph; weights
//!    between communities are summed and internal weight becomes a
//!    self-loop.
//! 3. Both phases repeat on the coarse graph while modularity keeps
//!    improving by more than `min_modularity_gain`.
//!
//! Nodes are visited in index order and ties keep the earlier candidate, so
//! the result is deterministic for a given graph. Other Louvain
//! implementations (which usually shuffle nodes) may group nodes
//! differently.

use crate::cluster::Partition;
use crate::config::Config;
use crate::graph::WeightedGraph;
use std::collections::HashMap;

/// Louvain community detection algorithm.
#[derive(Debug, Clone)]
pub struct Louvain {
    /// Resolution parameter (gamma).
    resolution: f64,
    /// Minimum modularity improvement for another level.
    min_modularity_gain: f64,
    /// Maximum local-moving passes per level.
    max_passes: usize,
    /// Maximum levels of aggregation.
    max_levels: usize,
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

impl Louvain {
    /// Create a new Louvain detector with default settings.
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Detector using the Louvain parameters of a run configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            resolution: config.resolution,
            min_modularity_gain: config.min_modularity_gain,
            max_passes: config.max_passes,
            max_levels: config.max_levels,
        }
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set maximum aggregation levels.
    pub fn with_max_levels(mut self, levels: usize) -> Self {
        self.max_levels = levels;
        self
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Partition the graph into communities
    pub fn detect(&self, graph: &WeightedGraph) -> Partition {
        log::info!(
            "Running Louvain on {} nodes and {} edges",
            graph.node_count,
            graph.edge_count()
        );

        let labels = self.detect_labels(graph);
        let partition = Partition::from_labels(graph, &labels);

        log::info!("Found {} communities", partition.len());

        partition
    }

    /// Community label of every compact node
    pub fn detect_labels(&self, graph: &WeightedGraph) -> Vec<usize> {
        let n = graph.node_count;
        if n == 0 {
            return Vec::new();
        }

        let mut level = LevelGraph::from_graph(graph);
        let m = level.total_weight();
        if m <= 0.0 {
            // Nothing to gain: every node stays on its own
            return (0..n).collect();
        }

        let mut membership: Vec<usize> = (0..n).collect();
        let mut modularity = level.modularity(&membership, n, m, self.resolution);

        for depth in 0..self.max_levels {
            let (mut communities, moved) = self.local_moving(&level, m);
            if !moved {
                break;
            }

            let count = renumber(&mut communities);
            for label in membership.iter_mut() {
                *label = communities[*label];
            }

            let improved = level.modularity(&communities, count, m, self.resolution);
            log::debug!(
                "Level {}: {} nodes into {} communities, modularity {:.6}",
                depth,
                level.len(),
                count,
                improved
            );

            if improved - modularity <= self.min_modularity_gain {
                break;
            }
            modularity = improved;

            if count == level.len() {
                break;
            }
            level = level.aggregate(&communities, count);
        }

        membership
    }

    /// Phase 1: move nodes between neighbouring communities.
    /// Returns (communities, whether any node moved).
    fn local_moving(&self, level: &LevelGraph, m: f64) -> (Vec<usize>, bool) {
        let n = level.len();
        let mut communities: Vec<usize> = (0..n).collect();
        let mut totals = level.degrees.clone();

        // Scratch space reused across nodes
        let mut link_weight = vec![0.0; n];
        let mut linked = vec![false; n];
        let mut touched: Vec<usize> = Vec::new();

        let mut any_moved = false;

        for _pass in 0..self.max_passes {
            let mut moved = 0usize;

            for node in 0..n {
                let current = communities[node];
                let k = level.degrees[node];

                for &(neighbor, weight) in &level.adjacency[node] {
                    let community = communities[neighbor];
                    if !linked[community] {
                        linked[community] = true;
                        touched.push(community);
                    }
                    link_weight[community] += weight;
                }

                // Take the node out of its community before comparing
                totals[current] -= k;

                let gain = |community: usize| {
                    link_weight[community] / m
                        - self.resolution * totals[community] * k / (2.0 * m * m)
                };

                let mut best = current;
                let mut best_gain = gain(current);
                for &community in &touched {
                    let candidate = gain(community);
                    if candidate > best_gain {
                        best_gain = candidate;
                        best = community;
                    }
                }

                totals[best] += k;
                if best != current {
                    communities[node] = best;
                    moved += 1;
                }

                for community in touched.drain(..) {
                    linked[community] = false;
                    link_weight[community] = 0.0;
                }
            }

            if moved == 0 {
                break;
            }
            any_moved = true;
        }

        (communities, any_moved)
    }
}

/// Relabel communities to `0..count` in order of first appearance
fn renumber(communities: &mut [usize]) -> usize {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    for label in communities.iter_mut() {
        let next = mapping.len();
        *label = *mapping.entry(*label).or_insert(next);
    }
    mapping.len()
}

/// Weighted graph of one Louvain level, with self-loops
#[derive(Debug, Clone)]
struct LevelGraph {
    /// Neighbours and weights, self-loops excluded
    adjacency: Vec<Vec<(usize, f64)>>,
    /// Self-loop weight of each node
    self_loops: Vec<f64>,
    /// Weighted degree, self-loops counted twice
    degrees: Vec<f64>,
}

impl LevelGraph {
    fn from_graph(graph: &WeightedGraph) -> Self {
        let adjacency: Vec<Vec<(usize, f64)>> = (0..graph.node_count)
            .map(|node| {
                graph
                    .neighbors(node)
                    .map(|(neighbor, weight)| (neighbor as usize, weight))
                    .collect()
            })
            .collect();
        let degrees = (0..graph.node_count).map(|node| graph.strength(node)).collect();

        Self {
            adjacency,
            self_loops: vec![0.0; graph.node_count],
            degrees,
        }
    }

    fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Edge weights counted once, plus self-loops
    fn total_weight(&self) -> f64 {
        let links: f64 = self.adjacency.iter().flatten().map(|&(_, w)| w).sum();
        links / 2.0 + self.self_loops.iter().sum::<f64>()
    }

    fn modularity(&self, communities: &[usize], count: usize, m: f64, resolution: f64) -> f64 {
        let mut internal = vec![0.0; count];
        let mut totals = vec![0.0; count];

        for node in 0..self.len() {
            let community = communities[node];
            totals[community] += self.degrees[node];
            internal[community] += self.self_loops[node];
            for &(neighbor, weight) in &self.adjacency[node] {
                // Each link is seen from both ends
                if communities[neighbor] == community {
                    internal[community] += weight / 2.0;
                }
            }
        }

        internal
            .iter()
            .zip(&totals)
            .map(|(&inside, &total)| inside / m - resolution * (total / (2.0 * m)).powi(2))
            .sum()
    }

    /// Phase 2: collapse each community into a single node
    fn aggregate(&self, communities: &[usize], count: usize) -> Self {
        let mut links: Vec<HashMap<usize, f64>> = vec![HashMap::new(); count];
        let mut self_loops = vec![0.0; count];
        let mut degrees = vec![0.0; count];

        for node in 0..self.len() {
            let community = communities[node];
            degrees[community] += self.degrees[node];
            self_loops[community] += self.self_loops[node];

            for &(neighbor, weight) in &self.adjacency[node] {
                let other = communities[neighbor];
                if other == community {
                    self_loops[community] += weight / 2.0;
                } else {
                    *links[community].entry(other).or_insert(0.0) += weight;
                }
            }
        }

        let adjacency = links
            .into_iter()
            .map(|map| {
                let mut list: Vec<(usize, f64)> = map.into_iter().collect();
                list.sort_unstable_by_key(|&(neighbor, _)| neighbor);
                list
            })
            .collect();

        Self {
            adjacency,
            self_loops,
            degrees,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FilteredEdges;
    use crate::graph::build_graph;
    use std::collections::HashSet;

    fn graph_of(triplets: &[(u32, u32, f64)]) -> WeightedGraph {
        build_graph(&FilteredEdges {
            threshold: 0.0,
            rows: triplets.iter().map(|t| t.0).collect(),
            cols: triplets.iter().map(|t| t.1).collect(),
            weights: triplets.iter().map(|t| t.2).collect(),
        })
    }

    fn two_triangles() -> WeightedGraph {
        graph_of(&[
            (0, 1, 1.0),
            (1, 2, 1.0),
            (0, 2, 1.0),
            (3, 4, 1.0),
            (4, 5, 1.0),
            (3, 5, 1.0),
            (2, 3, 0.1),
        ])
    }

    fn assert_valid_partition(graph: &WeightedGraph, partition: &Partition) {
        let mut seen = HashSet::new();
        for community in partition.iter() {
            assert!(!community.members.is_empty());
            for &member in &community.members {
                assert!(seen.insert(member), "node {} in two communities", member);
            }
        }
        let expected: HashSet<u32> = graph.node_ids.iter().copied().collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn empty_graph_gives_empty_partition() {
        let partition = Louvain::new().detect(&WeightedGraph::empty());
        assert!(partition.is_empty());
    }

    #[test]
    fn path_collapses_into_one_community() {
        let graph = graph_of(&[(0, 1, 8.0), (1, 0, 8.0), (1, 2, 9.0), (2, 1, 9.0)]);
        let partition = Louvain::new().detect(&graph);

        assert_valid_partition(&graph, &partition);
        assert_eq!(partition.len(), 1);
        assert_eq!(partition.communities[0].members, vec![0, 1, 2]);
    }

    #[test]
    fn weak_bridge_separates_triangles() {
        let graph = two_triangles();
        let partition = Louvain::new().detect(&graph);

        assert_valid_partition(&graph, &partition);
        assert_eq!(partition.len(), 2);
        assert_eq!(partition.communities[0].members, vec![0, 1, 2]);
        assert_eq!(partition.communities[1].members, vec![3, 4, 5]);
    }

    #[test]
    fn disconnected_pairs_stay_apart() {
        let graph = graph_of(&[(0, 1, 1.0), (2, 3, 1.0), (4, 5, 1.0)]);
        let partition = Louvain::new().detect(&graph);

        assert_valid_partition(&graph, &partition);
        assert_eq!(partition.len(), 3);
        assert!(partition.iter().all(|c| c.size == 2));
    }

    #[test]
    fn ring_of_cliques_is_valid_at_any_resolution() {
        let mut triplets = Vec::new();
        for clique in 0..6u32 {
            let base = clique * 4;
            for a in 0..4 {
                for b in (a + 1)..4 {
                    triplets.push((base + a, base + b, 1.0));
                }
            }
            triplets.push((base, (base + 5) % 24, 1.0));
        }
        let graph = graph_of(&triplets);

        for resolution in [0.25, 1.0, 4.0] {
            let partition = Louvain::new().with_resolution(resolution).detect(&graph);
            assert_valid_partition(&graph, &partition);
        }

        let partition = Louvain::new().detect(&graph);
        assert_eq!(partition.len(), 6);
    }

    #[test]
    fn builder_setters_apply() {
        let louvain = Louvain::new().with_resolution(2.5).with_max_levels(1);
        assert_eq!(louvain.resolution(), 2.5);
        assert_eq!(louvain.max_levels, 1);

        let graph = two_triangles();
        let single_level = Louvain::new().with_max_levels(1).detect(&graph);
        assert_valid_partition(&graph, &single_level);
    }

    #[test]
    fn detection_is_deterministic() {
        let graph = two_triangles();
        let first = Louvain::new().detect(&graph);
        let second = Louvain::new().detect(&graph);
        assert_eq!(first, second);
    }

    #[test]
    fn aggregation_preserves_total_weight() {
        let graph = two_triangles();
        let level = LevelGraph::from_graph(&graph);
        let m = level.total_weight();

        let coarse = level.aggregate(&[0, 0, 0, 1, 1, 1], 2);
        assert!((coarse.total_weight() - m).abs() < 1e-12);
        assert!((coarse.self_loops[0] - 3.0).abs() < 1e-12);
        assert_eq!(coarse.adjacency[0], vec![(1, 0.1)]);

        // Modularity is unchanged by collapsing communities
        let fine = level.modularity(&[0, 0, 0, 1, 1, 1], 2, m, 1.0);
        let coarse_q = coarse.modularity(&[0, 1], 2, m, 1.0);
        assert!((fine - coarse_q).abs() < 1e-12);
    }

    #[test]
    fn renumber_uses_first_appearance() {
        let mut labels = vec![5, 5, 2, 9, 2];
        assert_eq!(renumber(&mut labels), 3);
        assert_eq!(labels, vec![0, 0, 1, 2, 1]);
    }
}
