//! Compressed undirected weighted graph

use std::collections::HashMap;
use std::mem;

/// Compressed sparse row representation of an undirected weighted graph.
///
/// Nodes are numbered compactly (`0..node_count`); `node_ids` maps them back
/// to matrix indices. Every undirected edge is stored once per endpoint and
/// each adjacency list is sorted by neighbour.
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    /// Number of nodes in the graph
    pub node_count: usize,

    /// offsets[i] to offsets[i+1] is the neighbour range of node i
    pub offsets: Vec<usize>,

    /// Concatenated neighbour lists (compact indices)
    pub neighbors: Vec<u32>,

    /// Weight of each entry in `neighbors`
    pub weights: Vec<f64>,

    /// Matrix index of each compact node
    pub node_ids: Vec<u32>,

    /// Matrix index to compact node
    pub(crate) index: HashMap<u32, u32>,
}

impl WeightedGraph {
    /// Graph with no nodes
    pub fn empty() -> Self {
        Self {
            offsets: vec![0],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    /// Neighbours of a node with edge weights
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (u32, f64)> + '_ {
        let range = self.offsets[node]..self.offsets[node + 1];
        self.neighbors[range.clone()]
            .iter()
            .copied()
            .zip(self.weights[range].iter().copied())
    }

    /// Number of neighbours of a node
    pub fn degree(&self, node: usize) -> usize {
        self.offsets[node + 1] - self.offsets[node]
    }

    /// Sum of the weights of a node's edges
    pub fn strength(&self, node: usize) -> f64 {
        self.weights[self.offsets[node]..self.offsets[node + 1]].iter().sum()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.neighbors.len() / 2
    }

    /// Sum of all undirected edge weights, each edge counted once
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum::<f64>() / 2.0
    }

    /// Weight of the edge between two compact nodes
    pub fn edge_weight(&self, a: usize, b: u32) -> Option<f64> {
        let start = self.offsets[a];
        let end = self.offsets[a + 1];
        self.neighbors[start..end]
            .binary_search(&b)
            .ok()
            .map(|pos| self.weights[start + pos])
    }

    pub fn has_edge(&self, a: usize, b: u32) -> bool {
        self.edge_weight(a, b).is_some()
    }

    /// Compact index of a matrix index, if that node is in the graph
    pub fn index_of(&self, matrix_index: u32) -> Option<u32> {
        self.index.get(&matrix_index).copied()
    }

    /// Every undirected edge once, as `(a, b, weight)` with `a < b`
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
        (0..self.node_count).flat_map(move |a| {
            self.neighbors(a)
                .filter(move |&(b, _)| (a as u32) < b)
                .map(move |(b, w)| (a as u32, b, w))
        })
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let base = mem::size_of::<Self>();
        let offsets = self.offsets.capacity() * mem::size_of::<usize>();
        let neighbors = self.neighbors.capacity() * mem::size_of::<u32>();
        let weights = self.weights.capacity() * mem::size_of::<f64>();
        let ids = self.node_ids.capacity() * mem::size_of::<u32>();
        let index = self.index.capacity() * 2 * mem::size_of::<u32>();

        base + offsets + neighbors + weights + ids + index
    }
}
