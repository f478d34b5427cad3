//! End-to-end behavior of loading, building and classifying membership tables.

use std::collections::BTreeSet;
use std::fs;

use pretty_assertions::assert_eq;
use repair_network::community::Algorithm;
use repair_network::config::CommunityConfig;
use repair_network::{
    Category, Edge, MembershipTable, NetworkError, RepairNetwork, Style, build, classify,
};
use rstest::rstest;

fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[test]
fn overlapping_pathways_scenario() {
    let table = MembershipTable::from_pairs([("A", vec!["p1", "p2"]), ("B", vec!["p2", "p3"])]);
    let (graph, common) = build(&table).unwrap();

    assert_eq!(common, ids(&["p2"]));
    assert_eq!(graph.node_ids(), ids(&["p1", "p2", "p3", "A", "B"]));
    assert_eq!(
        graph.edges(),
        BTreeSet::from([
            Edge::new("p1", "A"),
            Edge::new("p2", "A"),
            Edge::new("p2", "B"),
            Edge::new("p3", "B"),
        ])
    );

    let classification = classify(&graph, &table, &common, &Style::default());
    assert_eq!(classification.category("p2"), Some(&Category::Common));
    assert_eq!(classification.category("p1"), Some(&Category::Pathway("A".into())));
    assert_eq!(classification.category("p3"), Some(&Category::Pathway("B".into())));
}

#[test]
fn single_pathway_scenario() {
    let table = MembershipTable::from_pairs([("A", vec!["p1", "p2"])]);
    let network = RepairNetwork::build(table, &Style::default()).unwrap();

    assert_eq!(network.common, ids(&["p1", "p2"]));
    assert_eq!(network.classification.category("p1"), Some(&Category::Common));
    assert_eq!(network.classification.category("p2"), Some(&Category::Common));
}

#[test]
fn empty_table_scenario() {
    let err = RepairNetwork::build(MembershipTable::new(), &Style::default()).unwrap_err();
    assert!(matches!(err, NetworkError::EmptyInput));
}

#[test]
fn common_wins_over_hr() {
    let table = MembershipTable::from_pairs([
        ("HR", vec!["BRCA1", "ATM"]),
        ("G4", vec!["BRCA1", "WRN"]),
    ]);
    let network = RepairNetwork::build(table, &Style::default()).unwrap();
    assert_eq!(network.classification.category("BRCA1"), Some(&Category::Common));
}

#[test]
fn building_twice_gives_identical_sets() {
    let table = MembershipTable::dna_repair();
    let (first, first_common) = build(&table).unwrap();
    let (second, second_common) = build(&table).unwrap();

    assert_eq!(first.node_ids(), second.node_ids());
    assert_eq!(first.edges(), second.edges());
    assert_eq!(first_common, second_common);
}

#[rstest]
#[case::csv("memberships.csv", "pathway,protein\nHR,BRCA1\nHR,ATM\nG4,BRCA1\nG4,WRN\nHR,ATM\n")]
#[case::toml(
    "memberships.toml",
    "[[pathway]]\nname = \"HR\"\nproteins = [\"BRCA1\", \"ATM\"]\n\n[[pathway]]\nname = \"G4\"\nproteins = [\"BRCA1\", \"WRN\"]\n"
)]
fn loads_tables_from_files(#[case] name: &str, #[case] contents: &str) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();

    let network = RepairNetwork::from_path(&path, &Style::default()).unwrap();
    assert_eq!(network.membership.pathway_ids().collect::<Vec<_>>(), vec!["HR", "G4"]);
    assert_eq!(network.graph.edge_count(), 4);
    assert_eq!(network.common, ids(&["BRCA1"]));
    assert_eq!(network.classification.highlighted_edges(), 3);
}

#[test]
fn conflicting_identifier_in_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conflict.csv");
    fs::write(&path, "pathway,protein\nHR,G4\nG4,WRN\n").unwrap();

    let err = RepairNetwork::from_path(&path, &Style::default()).unwrap_err();
    assert!(matches!(err, NetworkError::NodeIdentityConflict { ref id } if id == "G4"));
    assert!(err.to_string().contains("'G4'"));
}

#[rstest]
#[case::louvain(Algorithm::Louvain)]
#[case::components(Algorithm::Components)]
fn partition_does_not_change_categories(#[case] algorithm: Algorithm) {
    let partitioner = CommunityConfig {
        algorithm,
        ..CommunityConfig::default()
    }
    .partitioner();
    let mut network = RepairNetwork::build(MembershipTable::dna_repair(), &Style::default()).unwrap();
    let before = network.classification.clone();
    network.detect_communities(partitioner.as_ref());

    assert_eq!(network.partition.len(), network.graph.node_count());
    assert_eq!(network.classification, before);
}

#[test]
fn dot_file_lists_every_labeled_protein() {
    let network = RepairNetwork::build(MembershipTable::dna_repair(), &Style::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("network.dot");
    network.save_graph_to_dot(&path, "DNA repair").unwrap();

    let dot = fs::read_to_string(&path).unwrap();
    for (id, attrs) in &network.classification.nodes {
        if attrs.label.is_some() {
            assert!(dot.contains(&format!("label=\"{id}\"")), "missing label for {id}");
        }
    }
}
