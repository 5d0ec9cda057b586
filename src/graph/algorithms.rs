//! Graph algorithms for analysis

use crate::graph::WeightedGraph;

/// Union-Find data structure for connected component analysis
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of node i)
    parent: Vec<u32>,

    /// Size of each set, valid at the roots
    size: Vec<u32>,
}

impl DisjointSets {
    /// Create a new DisjointSets data structure with singleton sets
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size as u32).collect(),
            size: vec![1; size],
        }
    }

    /// Find the root of the set containing x with path compression
    pub fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }

        let mut node = x;
        while node != root {
            let next = self.parent[node as usize];
            self.parent[node as usize] = root;
            node = next;
        }

        root
    }

    /// Union the sets containing x and y, smaller under larger
    pub fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return;
        }

        let (big, small) = if self.size[root_x as usize] >= self.size[root_y as usize] {
            (root_x, root_y)
        } else {
            (root_y, root_x)
        };
        self.parent[small as usize] = big;
        self.size[big as usize] += self.size[small as usize];
    }

    /// Get the size of the set containing x
    pub fn size(&mut self, x: u32) -> u32 {
        let root = self.find(x);
        self.size[root as usize]
    }
}

/// Sizes of the connected components of a graph, largest first
pub fn component_sizes(graph: &WeightedGraph) -> Vec<usize> {
    let mut sets = DisjointSets::new(graph.node_count);

    for (a, b, _) in graph.edges() {
        sets.union(a, b);
    }

    let mut sizes = Vec::new();
    for node in 0..graph.node_count as u32 {
        if sets.find(node) == node {
            sizes.push(sets.size(node) as usize);
        }
    }
    sizes.sort_unstable_by(|a, b| b.cmp(a));

    log::debug!("Graph has {} connected components", sizes.len());

    sizes
}
