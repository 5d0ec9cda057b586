//! Graph construction module

use crate::data::FilteredEdges;
use crate::graph::WeightedGraph;
use std::collections::HashMap;

/// Builder for incrementally constructing a WeightedGraph
pub struct GraphBuilder {
    /// Mapping from matrix indices to compact node indices
    id_to_index: HashMap<u32, u32>,

    /// Matrix index of each compact node, in order of first appearance
    node_ids: Vec<u32>,

    /// Neighbour weights per node; re-inserting an edge overwrites it
    adjacency: Vec<HashMap<u32, f64>>,

    /// Number of self-loop entries that were dropped
    skipped_self_loops: usize,
}

impl GraphBuilder {
    /// Create a new graph builder with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id_to_index: HashMap::with_capacity(capacity),
            node_ids: Vec::with_capacity(capacity),
            adjacency: Vec::with_capacity(capacity),
            skipped_self_loops: 0,
        }
    }

    /// Get or create the compact node for a matrix index
    pub fn get_or_create_node(&mut self, id: u32) -> u32 {
        if let Some(&idx) = self.id_to_index.get(&id) {
            return idx;
        }

        let idx = self.node_ids.len() as u32;
        self.id_to_index.insert(id, idx);
        self.node_ids.push(id);
        self.adjacency.push(HashMap::new());

        idx
    }

    /// Add or overwrite the undirected edge `{a, b}`.
    ///
    /// Self-loops are skipped without creating a node; returns whether the
    /// edge was inserted.
    pub fn add_edge(&mut self, a: u32, b: u32, weight: f64) -> bool {
        if a == b {
            self.skipped_self_loops += 1;
            return false;
        }

        let a_idx = self.get_or_create_node(a);
        let b_idx = self.get_or_create_node(b);

        self.adjacency[a_idx as usize].insert(b_idx, weight);
        self.adjacency[b_idx as usize].insert(a_idx, weight);

        true
    }

    /// Number of self-loop entries dropped so far
    pub fn skipped_self_loops(&self) -> usize {
        self.skipped_self_loops
    }

    /// Build the compressed graph
    pub fn build(self) -> WeightedGraph {
        let node_count = self.node_ids.len();
        let entry_count: usize = self.adjacency.iter().map(|list| list.len()).sum();

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut neighbors = Vec::with_capacity(entry_count);
        let mut weights = Vec::with_capacity(entry_count);
        offsets.push(0);

        for list in self.adjacency {
            // Sorted for binary search in edge lookups
            let mut list: Vec<(u32, f64)> = list.into_iter().collect();
            list.sort_unstable_by_key(|&(neighbor, _)| neighbor);

            for (neighbor, weight) in list {
                neighbors.push(neighbor);
                weights.push(weight);
            }
            offsets.push(neighbors.len());
        }

        WeightedGraph {
            node_count,
            offsets,
            neighbors,
            weights,
            node_ids: self.node_ids,
            index: self.id_to_index,
        }
    }
}

/// Build the undirected graph of a filtered edge set.
///
/// Later entries for the same pair overwrite earlier ones, so for a
/// symmetric matrix `(j, i)` decides the weight of `{i, j}` when it comes
/// after `(i, j)`.
pub fn build_graph(edges: &FilteredEdges) -> WeightedGraph {
    let mut builder = GraphBuilder::with_capacity(edges.len() / 2);

    for (row, col, weight) in edges.iter() {
        builder.add_edge(row, col, weight);
    }

    if builder.skipped_self_loops() > 0 {
        log::debug!("Skipped {} self-loops", builder.skipped_self_loops());
    }

    let graph = builder.build();

    log::info!(
        "Built graph with {} nodes and {} edges",
        graph.node_count,
        graph.edge_count()
    );
    log::debug!("Graph uses about {} bytes", graph.memory_usage());

    graph
}
