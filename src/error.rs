//! Error types for network construction, loading and rendering.

use std::path::PathBuf;

/// Errors raised while loading a membership table, building the graph or
/// handing it to Graphviz.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// The membership table has no pathways.
    #[error("membership table is empty")]
    EmptyInput,

    /// A protein identifier collides with a pathway identifier.
    #[error("identifier '{id}' is used both as a protein and as a pathway")]
    NodeIdentityConflict { id: String },

    /// A pathway or protein identifier is the empty string.
    #[error("empty identifier in pathway '{pathway}'")]
    EmptyIdentifier { pathway: String },

    /// A pathway was declared without any proteins.
    #[error("pathway '{pathway}' lists no proteins")]
    EmptyPathway { pathway: String },

    /// The input file extension is not one of the known formats.
    #[error("unsupported membership file format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The external Graphviz invocation failed.
    #[error("render failed: {0}")]
    Render(String),
}
