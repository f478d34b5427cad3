//! Community partition of the bipartite graph.
//!
//! The partition is reported alongside the categorized graph but never drives
//! node categories. Any [`Partitioner`] can be plugged in.

use std::collections::{BTreeMap, HashMap};

use petgraph::algo::tarjan_scc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::BipartiteGraph;

pub type CommunityId = usize;

/// Node id → community id.
pub type Partition = BTreeMap<String, CommunityId>;

/// Assigns every node of a graph to a community.
pub trait Partitioner {
    fn partition(&self, graph: &BipartiteGraph) -> Partition;
}

/// Which partitioner to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Louvain,
    Components,
}

/// Louvain modularity optimization. Node visiting order is shuffled with a
/// seeded generator, so one seed always yields the same partition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Louvain {
    pub resolution: f64,
    pub seed: u64,
}

impl Default for Louvain {
    fn default() -> Self {
        Louvain {
            resolution: 1.0,
            seed: 42,
        }
    }
}

/// One community per connected component.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectedComponents;

/// Symmetric weighted adjacency. A self loop of weight `w` is stored once
/// under `adjacency[i][i]`.
#[derive(Debug, Clone)]
struct LevelGraph {
    adjacency: Vec<BTreeMap<usize, f64>>,
}

impl LevelGraph {
    fn from_graph(graph: &BipartiteGraph, ids: &[&str]) -> Self {
        let positions: HashMap<&str, usize> =
            ids.iter().enumerate().map(|(pos, id)| (*id, pos)).collect();
        let mut adjacency = vec![BTreeMap::new(); ids.len()];
        for edge in graph.edges() {
            let a = positions[edge.protein.as_str()];
            let b = positions[edge.pathway.as_str()];
            *adjacency[a].entry(b).or_insert(0.0) += 1.0;
            *adjacency[b].entry(a).or_insert(0.0) += 1.0;
        }
        LevelGraph { adjacency }
    }

    fn len(&self) -> usize {
        self.adjacency.len()
    }

    fn degree(&self, node: usize) -> f64 {
        self.adjacency[node]
            .iter()
            .map(|(&other, &weight)| if other == node { 2.0 * weight } else { weight })
            .sum()
    }

    fn total_weight(&self) -> f64 {
        (0..self.len()).map(|node| self.degree(node)).sum::<f64>() / 2.0
    }

    /// Collapses every community into a single node.
    fn aggregate(&self, membership: &[usize], communities: usize) -> Self {
        let mut adjacency = vec![BTreeMap::new(); communities];
        for (node, neighbors) in self.adjacency.iter().enumerate() {
            for (&other, &weight) in neighbors.range(node..) {
                let (a, b) = (membership[node], membership[other]);
                *adjacency[a].entry(b).or_insert(0.0) += weight;
                if a != b {
                    *adjacency[b].entry(a).or_insert(0.0) += weight;
                }
            }
        }
        LevelGraph { adjacency }
    }
}

impl Louvain {
    pub fn new(resolution: f64, seed: u64) -> Self {
        Louvain { resolution, seed }
    }

    /// Local moving phase. Returns dense community labels and whether any
    /// node changed community.
    fn one_level(&self, level: &LevelGraph, rng: &mut StdRng) -> (Vec<usize>, bool) {
        let n = level.len();
        let m2 = 2.0 * level.total_weight();
        let degrees: Vec<f64> = (0..n).map(|node| level.degree(node)).collect();
        let mut community: Vec<usize> = (0..n).collect();
        let mut totals = degrees.clone();
        let mut order: Vec<usize> = (0..n).collect();
        let mut moved_any = false;

        const MAX_PASSES: usize = 100;
        for _ in 0..MAX_PASSES {
            order.shuffle(rng);
            let mut moved = false;

            for &node in &order {
                let own = community[node];
                let k = degrees[node];

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for (&other, &weight) in &level.adjacency[node] {
                    if other != node {
                        *links.entry(community[other]).or_insert(0.0) += weight;
                    }
                }

                totals[own] -= k;
                let gain = |target: usize, weight: f64| {
                    weight - self.resolution * totals[target] * k / m2
                };
                let mut best = own;
                let mut best_gain = gain(own, links.get(&own).copied().unwrap_or(0.0));
                for (&target, &weight) in &links {
                    let candidate = gain(target, weight);
                    if candidate > best_gain + f64::EPSILON {
                        best = target;
                        best_gain = candidate;
                    }
                }
                totals[best] += k;

                if best != own {
                    community[node] = best;
                    moved = true;
                    moved_any = true;
                }
            }

            if !moved {
                break;
            }
        }

        (renumber(&community), moved_any)
    }
}

/// Relabels communities densely in order of first appearance.
fn renumber(labels: &[usize]) -> Vec<usize> {
    let mut mapping = HashMap::new();
    labels
        .iter()
        .map(|label| {
            let next = mapping.len();
            *mapping.entry(*label).or_insert(next)
        })
        .collect()
}

impl Partitioner for Louvain {
    fn partition(&self, graph: &BipartiteGraph) -> Partition {
        let ids: Vec<&str> = graph.nodes().into_iter().map(|(id, _)| id).collect();
        let mut level = LevelGraph::from_graph(graph, &ids);
        let mut assignment: Vec<usize> = (0..ids.len()).collect();

        if level.total_weight() > 0.0 {
            let mut rng = StdRng::seed_from_u64(self.seed);
            let mut levels = 0;
            loop {
                let (membership, moved) = self.one_level(&level, &mut rng);
                if !moved {
                    break;
                }
                let communities = membership.iter().max().map_or(0, |max| max + 1);
                for slot in assignment.iter_mut() {
                    *slot = membership[*slot];
                }
                level = level.aggregate(&membership, communities);
                levels += 1;
            }
            debug!(levels, "louvain converged");
        }

        let assignment = renumber(&assignment);
        ids.into_iter()
            .map(str::to_string)
            .zip(assignment)
            .collect()
    }
}

impl Partitioner for ConnectedComponents {
    fn partition(&self, graph: &BipartiteGraph) -> Partition {
        let inner = graph.inner();
        let mut component_of = HashMap::new();
        for (component, nodes) in tarjan_scc(inner).into_iter().enumerate() {
            for node in nodes {
                component_of.insert(inner[node].id.clone(), component);
            }
        }

        let ids: Vec<String> = graph.node_ids().into_iter().collect();
        let labels: Vec<usize> = ids.iter().map(|id| component_of[id]).collect();
        ids.into_iter().zip(renumber(&labels)).collect()
    }
}

/// Groups node ids by community, each group sorted.
pub fn communities(partition: &Partition) -> BTreeMap<CommunityId, Vec<String>> {
    let mut groups: BTreeMap<CommunityId, Vec<String>> = BTreeMap::new();
    for (id, &community) in partition {
        groups.entry(community).or_default().push(id.clone());
    }
    groups
}

/// Modularity of `partition` over the unit-weight graph. Edges with an
/// endpoint missing from `partition` are left out.
pub fn modularity(graph: &BipartiteGraph, partition: &Partition, resolution: f64) -> f64 {
    let covered: Vec<(CommunityId, CommunityId)> = graph
        .edges()
        .iter()
        .filter_map(|edge| Some((*partition.get(&edge.protein)?, *partition.get(&edge.pathway)?)))
        .collect();
    let m = covered.len() as f64;
    if m == 0.0 {
        return 0.0;
    }

    let mut internal: HashMap<CommunityId, f64> = HashMap::new();
    let mut totals: HashMap<CommunityId, f64> = HashMap::new();
    for &(a, b) in &covered {
        if a == b {
            *internal.entry(a).or_insert(0.0) += 1.0;
        }
        *totals.entry(a).or_insert(0.0) += 1.0;
        *totals.entry(b).or_insert(0.0) += 1.0;
    }

    totals
        .iter()
        .map(|(community, total)| {
            let inside = internal.get(community).copied().unwrap_or(0.0);
            inside / m - resolution * (total / (2.0 * m)).powi(2)
        })
        .sum()
}
