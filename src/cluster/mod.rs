//! Communities and partitions of the similarity graph

pub mod louvain;
pub mod metrics;

use crate::graph::WeightedGraph;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub use louvain::Louvain;

/// A group of nodes found by community detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    /// Position of this community in its partition
    pub id: u32,

    /// Members of this community (matrix indices, ascending)
    pub members: Vec<u32>,

    /// Size of the community
    pub size: usize,
}

/// Disjoint communities covering every node of a graph.
///
/// Communities are ordered largest first, ties broken by smallest member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub communities: Vec<Community>,
}

impl Partition {
    /// Group the graph's nodes by community label (one label per compact node)
    pub fn from_labels(graph: &WeightedGraph, labels: &[usize]) -> Self {
        debug_assert_eq!(labels.len(), graph.node_count);

        let groups = labels
            .iter()
            .zip(&graph.node_ids)
            .map(|(&label, &id)| (label, id))
            .into_group_map();

        let mut members: Vec<Vec<u32>> = groups
            .into_values()
            .map(|mut members| {
                members.sort_unstable();
                members
            })
            .collect();
        members.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));

        let communities = members
            .into_iter()
            .enumerate()
            .map(|(id, members)| Community {
                id: id as u32,
                size: members.len(),
                members,
            })
            .collect();

        Self { communities }
    }

    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Community> {
        self.communities.iter()
    }

    /// Total number of nodes across all communities
    pub fn node_count(&self) -> usize {
        self.communities.iter().map(|c| c.size).sum()
    }

    /// Community position for each compact node of `graph`.
    ///
    /// Nodes the partition does not mention get a label of their own.
    pub fn labels_for(&self, graph: &WeightedGraph) -> Vec<usize> {
        let mut labels = vec![usize::MAX; graph.node_count];

        for (position, community) in self.communities.iter().enumerate() {
            for &member in &community.members {
                if let Some(node) = graph.index_of(member) {
                    labels[node as usize] = position;
                }
            }
        }

        let mut next = self.communities.len();
        for label in labels.iter_mut().filter(|label| **label == usize::MAX) {
            *label = next;
            next += 1;
        }

        labels
    }
}
