//! # repair-network
//!
//! Bipartite network of DNA-repair pathways and the proteins taking part in
//! them. A membership table is turned into a graph, proteins are categorized
//! by a fixed priority over pathways, and the result is handed to Graphviz.
//!
//! ```no_run
//! use repair_network::{MembershipTable, RepairNetwork, Style};
//! use repair_network::community::Louvain;
//!
//! let mut network = RepairNetwork::build(MembershipTable::dna_repair(), &Style::default())?;
//! network.detect_communities(&Louvain::default());
//! network.save_graph_to_dot("network.dot", "DNA repair")?;
//! # Ok::<(), repair_network::NetworkError>(())
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rayon::prelude::*;
use tracing::info;

pub mod classify;
pub mod community;
pub mod config;
pub mod error;
pub mod graph;
pub mod membership;
pub mod render;

pub use classify::{Category, Classification, EdgeAttributes, NodeAttributes, Style, classify};
pub use community::{CommunityId, Partition, Partitioner};
pub use config::{ConfigError, NetworkConfig};
pub use error::NetworkError;
pub use graph::{BipartiteGraph, Edge, Side, build};
pub use membership::MembershipTable;

/// A built and classified network, with an optional community partition.
#[derive(Debug, Clone)]
pub struct RepairNetwork {
    pub membership: MembershipTable,
    pub graph: BipartiteGraph,
    pub common: BTreeSet<String>,
    pub classification: Classification,
    pub partition: Partition,
}

impl RepairNetwork {
    /// Builds the graph for `membership` and classifies it with `style`.
    pub fn build(membership: MembershipTable, style: &Style) -> Result<Self, NetworkError> {
        let (graph, common) = graph::build(&membership)?;
        let classification = classify::classify(&graph, &membership, &common, style);
        Ok(RepairNetwork {
            membership,
            graph,
            common,
            classification,
            partition: Partition::new(),
        })
    }

    pub fn from_path(path: impl AsRef<Path>, style: &Style) -> Result<Self, NetworkError> {
        Self::build(MembershipTable::from_path(path)?, style)
    }

    /// Re-derives node and edge attributes, for instance after a style change.
    pub fn reclassify(&mut self, style: &Style) {
        self.classification = classify::classify(&self.graph, &self.membership, &self.common, style);
    }

    pub fn detect_communities(&mut self, partitioner: &dyn Partitioner) {
        self.partition = partitioner.partition(&self.graph);
        info!(
            communities = community::communities(&self.partition).len(),
            "detected communities"
        );
    }

    pub fn communities(&self) -> BTreeMap<CommunityId, Vec<String>> {
        community::communities(&self.partition)
    }

    pub fn to_dot(&self, title: &str) -> String {
        let partition = (!self.partition.is_empty()).then_some(&self.partition);
        render::to_dot(&self.graph, &self.classification, partition, title)
    }

    pub fn save_graph_to_dot(&self, path: impl AsRef<Path>, title: &str) -> Result<(), NetworkError> {
        let partition = (!self.partition.is_empty()).then_some(&self.partition);
        render::save_dot(path, &self.graph, &self.classification, partition, title)
    }

    pub fn render_image(
        dot_file: impl AsRef<Path>,
        output_image: impl AsRef<Path>,
        engine: &str,
    ) -> Result<(), NetworkError> {
        render::render_image(dot_file, output_image, engine)
    }
}

/// Builds and classifies every table independently, in parallel. Results keep
/// the order of `tables`.
pub fn analyze_batch(
    tables: &[MembershipTable],
    style: &Style,
) -> Vec<Result<Classification, NetworkError>> {
    tables
        .par_iter()
        .map(|table| {
            let (graph, common) = graph::build(table)?;
            Ok(classify::classify(&graph, table, &common, style))
        })
        .collect()
}
