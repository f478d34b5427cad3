//! Pathway → protein membership tables and their loaders.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;

use crate::error::NetworkError;

/// Ordered mapping from pathway identifier to the proteins taking part in it.
///
/// Pathway declaration order is kept: it is the priority order used when a
/// protein belongs to several pathways. Protein sets are kept sorted so every
/// consumer sees the same iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipTable {
    pathways: Vec<(String, BTreeSet<String>)>,
}

#[derive(Debug, Deserialize)]
struct MembershipRecord {
    pathway: String,
    protein: String,
}

#[derive(Debug, Deserialize)]
struct MembershipFile {
    #[serde(default)]
    pathway: Vec<PathwayEntry>,
}

#[derive(Debug, Deserialize)]
struct PathwayEntry {
    name: String,
    proteins: Vec<String>,
}

impl MembershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `proteins` to `pathway`, declaring the pathway if it is new.
    ///
    /// A repeated declaration merges into the first one and keeps its
    /// position in the priority order.
    pub fn insert<I, S>(&mut self, pathway: impl Into<String>, proteins: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pathway = pathway.into();
        let index = match self.pathways.iter().position(|(name, _)| *name == pathway) {
            Some(index) => index,
            None => {
                self.pathways.push((pathway, BTreeSet::new()));
                self.pathways.len() - 1
            }
        };
        self.pathways[index]
            .1
            .extend(proteins.into_iter().map(Into::into));
    }

    /// Builds a table from `(pathway, proteins)` pairs, in order.
    pub fn from_pairs<I, P, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, Vec<S>)>,
        P: Into<String>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (pathway, proteins) in pairs {
            table.insert(pathway, proteins);
        }
        table
    }

    /// The DNA-repair dataset: HR, NHEJ, MMR, BER, NER and G4 with their
    /// participating proteins.
    pub fn dna_repair() -> Self {
        Self::from_pairs([
            (
                "HR",
                vec![
                    "ATM", "ATR", "PARP1", "BLM", "EXOI", "WRN", "FANCD", "FANCJ", "MRE11",
                    "RAD50", "NBS1", "RPA", "BRCA1", "BRCA2", "RAD51", "POLδ", "LIGASE I",
                ],
            ),
            (
                "NHEJ",
                vec![
                    "ARTEMIS", "ATM", "ATR", "PARP1", "XLF", "XRCC4", "KU70/80", "DNAPKCs",
                    "POLµ", "LIGASE IV",
                ],
            ),
            (
                "MMR",
                vec![
                    "PCNA", "RFC", "MSH2", "MSH3", "MSH6", "PMS1", "PMS2", "MLH1", "MLH3", "RPA",
                    "EXO1", "POLδ", "LIGASE I",
                ],
            ),
            (
                "BER",
                vec![
                    "PCNA", "PARP1", "PARP2", "OGG1", "APE1", "XRCC1", "DNA2", "FEN1",
                    "LIGASE I", "LIGASE III", "POLβ", "NEIL1", "NEIL2", "NEIL3",
                ],
            ),
            (
                "NER",
                vec![
                    "PCNA", "XPA", "XPB", "XPC", "XPD", "XPE", "XPG", "XPF", "XRCC1", "ERCC1",
                    "POLδ", "POLε", "LIGASE I", "RPA", "TFIIH",
                ],
            ),
            (
                "G4",
                vec![
                    "PARP1", "BLM", "WRN", "PCNA", "MRE11", "RAD50", "NBS1", "RPA", "FANCJ",
                    "BRCA1", "BRCA2", "RAD51", "DNAPKCs", "MSH2", "MLH1", "OGG1", "APE1",
                    "NEIL1", "NEIL2", "NEIL3", "XPB", "XPD",
                ],
            ),
        ])
    }

    /// Loads a table from a `.csv` or `.toml` file, chosen by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, NetworkError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Self::from_csv(path),
            Some("toml") => Self::from_toml_str(&fs::read_to_string(path)?),
            _ => Err(NetworkError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Reads `pathway,protein` rows. Pathways are ordered by first appearance.
    /// Fields are taken verbatim, surrounding whitespace included.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, NetworkError> {
        let reader = ReaderBuilder::new().from_path(path)?;
        Self::from_csv_reader(reader)
    }

    pub fn from_csv_reader<R: std::io::Read>(
        mut reader: csv::Reader<R>,
    ) -> Result<Self, NetworkError> {
        let mut table = Self::new();
        for record in reader.deserialize() {
            let record: MembershipRecord = record?;
            table.insert(record.pathway, [record.protein]);
        }
        table.validate()?;
        Ok(table)
    }

    /// Parses `[[pathway]]` entries with `name` and `proteins` keys.
    pub fn from_toml_str(source: &str) -> Result<Self, NetworkError> {
        let file: MembershipFile = toml::from_str(source)?;
        let mut table = Self::new();
        for entry in file.pathway {
            table.insert(entry.name, entry.proteins);
        }
        table.validate()?;
        Ok(table)
    }

    /// Rejects empty pathway or protein identifiers and pathways declared
    /// without proteins.
    pub fn validate(&self) -> Result<(), NetworkError> {
        for (pathway, proteins) in &self.pathways {
            if pathway.is_empty() || proteins.iter().any(String::is_empty) {
                return Err(NetworkError::EmptyIdentifier {
                    pathway: pathway.clone(),
                });
            }
        }
        match self.pathways.iter().find(|(_, proteins)| proteins.is_empty()) {
            Some((pathway, _)) => Err(NetworkError::EmptyPathway {
                pathway: pathway.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pathways.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pathways.len()
    }

    /// Pathways and their proteins in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.pathways
            .iter()
            .map(|(pathway, proteins)| (pathway.as_str(), proteins))
    }

    pub fn pathway_ids(&self) -> impl Iterator<Item = &str> {
        self.pathways.iter().map(|(pathway, _)| pathway.as_str())
    }

    pub fn proteins(&self, pathway: &str) -> Option<&BTreeSet<String>> {
        self.pathways
            .iter()
            .find(|(name, _)| name == pathway)
            .map(|(_, proteins)| proteins)
    }

    /// Proteins present in every pathway. A single pathway yields its own set.
    pub fn common_proteins(&self) -> BTreeSet<String> {
        let mut sets = self.pathways.iter().map(|(_, proteins)| proteins);
        let Some(first) = sets.next() else {
            return BTreeSet::new();
        };
        sets.fold(first.clone(), |acc, proteins| {
            acc.intersection(proteins).cloned().collect()
        })
    }

    /// Total number of distinct (pathway, protein) memberships.
    pub fn membership_count(&self) -> usize {
        self.pathways.iter().map(|(_, proteins)| proteins.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn keeps_declaration_order_and_merges_repeats() {
        let mut table = MembershipTable::new();
        table.insert("NHEJ", ["ATM"]);
        table.insert("HR", ["BRCA1"]);
        table.insert("NHEJ", ["XLF", "ATM"]);

        assert_eq!(table.pathway_ids().collect::<Vec<_>>(), vec!["NHEJ", "HR"]);
        assert_eq!(table.proteins("NHEJ"), Some(&set(&["ATM", "XLF"])));
        assert_eq!(table.membership_count(), 3);
    }

    #[test]
    fn common_proteins_of_single_pathway_is_whole_set() {
        let table = MembershipTable::from_pairs([("A", vec!["p1", "p2"])]);
        assert_eq!(table.common_proteins(), set(&["p1", "p2"]));
    }

    #[test]
    fn common_proteins_of_disjoint_pathways_is_empty() {
        let table = MembershipTable::from_pairs([("A", vec!["p1"]), ("B", vec!["p2"])]);
        assert!(table.common_proteins().is_empty());
    }

    #[test]
    fn dna_repair_dataset_has_no_protein_common_to_all_pathways() {
        let table = MembershipTable::dna_repair();
        assert_eq!(table.len(), 6);
        assert!(table.common_proteins().is_empty());
        assert!(table.proteins("G4").is_some_and(|g4| g4.contains("PARP1")));
    }

    #[test]
    fn identifiers_are_not_normalized() {
        let table = MembershipTable::from_pairs([("A", vec!["POLδ", "POLD", "pold"])]);
        assert_eq!(table.membership_count(), 3);
    }

    #[test]
    fn parses_csv_rows_in_first_appearance_order() {
        let data = "pathway,protein\nB,p2\nA,p1\nB,p3\nB,p2\n";
        let reader = ReaderBuilder::new().from_reader(data.as_bytes());
        let table = MembershipTable::from_csv_reader(reader).unwrap();

        assert_eq!(table.pathway_ids().collect::<Vec<_>>(), vec!["B", "A"]);
        assert_eq!(table.proteins("B"), Some(&set(&["p2", "p3"])));
    }

    #[test]
    fn csv_empty_protein_is_rejected() {
        let data = "pathway,protein\nA,p1\nB,\n";
        let reader = ReaderBuilder::new().from_reader(data.as_bytes());
        let err = MembershipTable::from_csv_reader(reader).unwrap_err();
        assert!(matches!(err, NetworkError::EmptyIdentifier { pathway } if pathway == "B"));
    }

    #[test]
    fn csv_empty_pathway_is_rejected() {
        let data = "pathway,protein\n,p1\n";
        let reader = ReaderBuilder::new().from_reader(data.as_bytes());
        let err = MembershipTable::from_csv_reader(reader).unwrap_err();
        assert!(matches!(err, NetworkError::EmptyIdentifier { pathway } if pathway.is_empty()));
    }

    #[test]
    fn csv_keeps_surrounding_whitespace() {
        let data = "pathway,protein\nA,p1\nA, p1\n";
        let reader = ReaderBuilder::new().from_reader(data.as_bytes());
        let table = MembershipTable::from_csv_reader(reader).unwrap();
        assert_eq!(table.proteins("A"), Some(&set(&[" p1", "p1"])));
    }

    #[test]
    fn toml_keeps_surrounding_whitespace() {
        let source = "[[pathway]]\nname = \"A\"\nproteins = [\" p1\", \"p1\"]\n";
        let table = MembershipTable::from_toml_str(source).unwrap();
        assert_eq!(table.membership_count(), 2);
    }

    #[test]
    fn toml_empty_protein_is_rejected() {
        let source = "[[pathway]]\nname = \"A\"\nproteins = [\"\"]\n";
        let err = MembershipTable::from_toml_str(source).unwrap_err();
        assert!(matches!(err, NetworkError::EmptyIdentifier { pathway } if pathway == "A"));
    }

    #[test]
    fn toml_empty_pathway_name_is_rejected() {
        let source = "[[pathway]]\nname = \"\"\nproteins = [\"p1\"]\n";
        let err = MembershipTable::from_toml_str(source).unwrap_err();
        assert!(matches!(err, NetworkError::EmptyIdentifier { .. }));
    }

    #[test]
    fn parses_toml_pathway_array() {
        let source = r#"
[[pathway]]
name = "HR"
proteins = ["BRCA1", "RAD51"]

[[pathway]]
name = "G4"
proteins = ["BRCA1"]
"#;
        let table = MembershipTable::from_toml_str(source).unwrap();
        assert_eq!(table.pathway_ids().collect::<Vec<_>>(), vec!["HR", "G4"]);
        assert_eq!(table.common_proteins(), set(&["BRCA1"]));
    }

    #[test]
    fn toml_pathway_with_empty_list_is_rejected() {
        let source = "[[pathway]]\nname = \"HR\"\nproteins = []\n";
        let err = MembershipTable::from_toml_str(source).unwrap_err();
        assert!(matches!(err, NetworkError::EmptyPathway { .. }));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = MembershipTable::from_path("table.json").unwrap_err();
        assert!(matches!(err, NetworkError::UnsupportedFormat { .. }));
    }
}
