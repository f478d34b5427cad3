//! Bipartite protein/pathway graph and its builder.

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{NodeIndex, UnGraph};
use tracing::debug;

use crate::error::NetworkError;
use crate::membership::MembershipTable;

/// Which side of the bipartite graph a node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Protein,
    Pathway,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub side: Side,
}

/// A membership edge, always stored protein first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub protein: String,
    pub pathway: String,
}

impl Edge {
    pub fn new(protein: impl Into<String>, pathway: impl Into<String>) -> Self {
        Edge {
            protein: protein.into(),
            pathway: pathway.into(),
        }
    }
}

/// Undirected graph of proteins and pathways with one edge per membership.
#[derive(Debug, Clone, Default)]
pub struct BipartiteGraph {
    graph: UnGraph<Node, ()>,
    node_indices: HashMap<String, NodeIndex>,
}

impl BipartiteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, or returns the existing one when it already sits on the
    /// same side. Re-adding an id with the other side is a conflict.
    pub fn add_node(&mut self, id: &str, side: Side) -> Result<NodeIndex, NetworkError> {
        if let Some(&index) = self.node_indices.get(id) {
            if self.graph[index].side != side {
                return Err(NetworkError::NodeIdentityConflict { id: id.to_string() });
            }
            return Ok(index);
        }
        let index = self.graph.add_node(Node {
            id: id.to_string(),
            side,
        });
        self.node_indices.insert(id.to_string(), index);
        Ok(index)
    }

    /// Connects a protein to a pathway. Adding an existing edge is a no-op.
    pub fn add_membership(&mut self, protein: &str, pathway: &str) -> Result<(), NetworkError> {
        let pathway_index = self.add_node(pathway, Side::Pathway)?;
        let protein_index = self.add_node(protein, Side::Protein)?;
        if self.graph.find_edge(protein_index, pathway_index).is_none() {
            self.graph.add_edge(protein_index, pathway_index, ());
        }
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    pub fn side(&self, id: &str) -> Option<Side> {
        self.node_indices.get(id).map(|&index| self.graph[index].side)
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_indices.get(id).copied()
    }

    /// Node ids with their side, sorted by id.
    pub fn nodes(&self) -> Vec<(&str, Side)> {
        let mut nodes: Vec<_> = self
            .graph
            .node_weights()
            .map(|node| (node.id.as_str(), node.side))
            .collect();
        nodes.sort();
        nodes
    }

    pub fn node_ids(&self) -> BTreeSet<String> {
        self.node_indices.keys().cloned().collect()
    }

    /// Membership edges in canonical (protein, pathway) order.
    pub fn edges(&self) -> BTreeSet<Edge> {
        self.graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .map(|(a, b)| {
                let (a, b) = (&self.graph[a], &self.graph[b]);
                match a.side {
                    Side::Protein => Edge::new(&a.id, &b.id),
                    Side::Pathway => Edge::new(&b.id, &a.id),
                }
            })
            .collect()
    }

    /// The underlying petgraph graph, for algorithms and rendering.
    pub fn inner(&self) -> &UnGraph<Node, ()> {
        &self.graph
    }
}

/// Builds the bipartite graph for `table` together with the set of proteins
/// common to every pathway.
pub fn build(table: &MembershipTable) -> Result<(BipartiteGraph, BTreeSet<String>), NetworkError> {
    if table.is_empty() {
        return Err(NetworkError::EmptyInput);
    }

    let mut graph = BipartiteGraph::new();
    for (pathway, proteins) in table.iter() {
        graph.add_node(pathway, Side::Pathway)?;
        for protein in proteins {
            graph.add_membership(protein, pathway)?;
        }
    }

    let common = table.common_proteins();
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        common = common.len(),
        "built bipartite graph"
    );
    Ok((graph, common))
}
