//! Node and edge display attributes derived from pathway membership.
//!
//! A protein can sit in several pathways but is shown with one category
//! only. Categories are tried in a fixed order: common proteins first, then
//! each pathway in the order the membership table declares them. The first
//! matching rule wins. Edges are classified separately: an edge is
//! highlighted when either endpoint belongs to the highlight pathway.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::graph::{BipartiteGraph, Edge, Side};
use crate::membership::MembershipTable;

/// Colors handed out to pathways that have no configured color.
const FALLBACK_PALETTE: &[&str] = &[
    "red", "green", "pink", "lightblue", "orange", "purple", "gold", "cyan", "brown",
];

/// Display category of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Present in every pathway.
    Common,
    /// First matching pathway in priority order.
    Pathway(String),
    /// Pathway-side nodes and proteins matching no rule.
    Other,
}

impl Category {
    pub fn name(&self) -> &str {
        match self {
            Category::Common => "common",
            Category::Pathway(pathway) => pathway.as_str(),
            Category::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAttributes {
    pub category: Category,
    pub size: u32,
    pub color: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeAttributes {
    pub highlighted: bool,
    pub color: String,
    pub width: u32,
}

/// Colors, sizes and the highlight pathway used by [`classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub highlight_pathway: String,
    pub common_color: String,
    pub other_color: String,
    pub common_size: u32,
    pub pathway_size: u32,
    pub other_size: u32,
    pub highlight_color: String,
    pub highlight_width: u32,
    pub edge_color: String,
    pub edge_width: u32,
    pub pathway_colors: BTreeMap<String, String>,
}

impl Default for Style {
    fn default() -> Self {
        let pathway_colors = [
            ("HR", "red"),
            ("NHEJ", "green"),
            ("MMR", "pink"),
            ("BER", "lightblue"),
            ("NER", "orange"),
            ("G4", "purple"),
        ]
        .into_iter()
        .map(|(pathway, color)| (pathway.to_string(), color.to_string()))
        .collect();

        Style {
            highlight_pathway: "G4".to_string(),
            common_color: "blue".to_string(),
            other_color: "gray".to_string(),
            common_size: 3000,
            pathway_size: 2500,
            other_size: 5000,
            highlight_color: "black".to_string(),
            highlight_width: 4,
            edge_color: "gray".to_string(),
            edge_width: 1,
            pathway_colors,
        }
    }
}

impl Style {
    /// Color for the pathway at `position` in declaration order. An exact key
    /// wins over one differing only in ASCII case.
    pub fn pathway_color(&self, pathway: &str, position: usize) -> String {
        self.pathway_colors
            .get(pathway)
            .or_else(|| {
                self.pathway_colors
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(pathway))
                    .map(|(_, color)| color)
            })
            .cloned()
            .unwrap_or_else(|| FALLBACK_PALETTE[position % FALLBACK_PALETTE.len()].to_string())
    }
}

/// Attribute maps for every node and edge of a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub nodes: BTreeMap<String, NodeAttributes>,
    pub edges: BTreeMap<Edge, EdgeAttributes>,
}

impl Classification {
    pub fn category(&self, id: &str) -> Option<&Category> {
        self.nodes.get(id).map(|attrs| &attrs.category)
    }

    /// Number of nodes per category.
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for attrs in self.nodes.values() {
            *counts.entry(attrs.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn highlighted_edges(&self) -> usize {
        self.edges.values().filter(|attrs| attrs.highlighted).count()
    }
}

struct Rule<'a> {
    members: &'a BTreeSet<String>,
    category: Category,
    color: String,
    size: u32,
}

/// Ordered first-match rule table: common set, then pathways in order.
fn rules<'a>(
    membership: &'a MembershipTable,
    common: &'a BTreeSet<String>,
    style: &Style,
) -> Vec<Rule<'a>> {
    let mut rules = vec![Rule {
        members: common,
        category: Category::Common,
        color: style.common_color.clone(),
        size: style.common_size,
    }];
    rules.extend(
        membership
            .iter()
            .enumerate()
            .map(|(position, (pathway, proteins))| Rule {
                members: proteins,
                category: Category::Pathway(pathway.to_string()),
                color: style.pathway_color(pathway, position),
                size: style.pathway_size,
            }),
    );
    rules
}

/// Derives display attributes for every node and edge of `graph`.
pub fn classify(
    graph: &BipartiteGraph,
    membership: &MembershipTable,
    common: &BTreeSet<String>,
    style: &Style,
) -> Classification {
    let rules = rules(membership, common, style);

    let nodes = graph
        .nodes()
        .into_iter()
        .map(|(id, side)| {
            let matched = match side {
                Side::Protein => rules.iter().find(|rule| rule.members.contains(id)),
                Side::Pathway => None,
            };
            let attrs = match matched {
                Some(rule) => NodeAttributes {
                    category: rule.category.clone(),
                    size: rule.size,
                    color: rule.color.clone(),
                    label: Some(id.to_string()),
                },
                None => NodeAttributes {
                    category: Category::Other,
                    size: style.other_size,
                    color: style.other_color.clone(),
                    label: None,
                },
            };
            (id.to_string(), attrs)
        })
        .collect();

    let empty = BTreeSet::new();
    let highlight = match membership.proteins(&style.highlight_pathway) {
        Some(proteins) => proteins,
        None => {
            warn!(
                pathway = %style.highlight_pathway,
                "highlight pathway not in membership table, no edge will be highlighted"
            );
            &empty
        }
    };

    let edges = graph
        .edges()
        .into_iter()
        .map(|edge| {
            let highlighted =
                highlight.contains(&edge.protein) || highlight.contains(&edge.pathway);
            let attrs = if highlighted {
                EdgeAttributes {
                    highlighted,
                    color: style.highlight_color.clone(),
                    width: style.highlight_width,
                }
            } else {
                EdgeAttributes {
                    highlighted,
                    color: style.edge_color.clone(),
                    width: style.edge_width,
                }
            };
            (edge, attrs)
        })
        .collect();

    let classification = Classification { nodes, edges };
    debug!(
        nodes = classification.nodes.len(),
        highlighted = classification.highlighted_edges(),
        "classified graph"
    );
    classification
}
