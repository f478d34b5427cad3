//! Graphviz export of a classified graph.
//!
//! Layout and drawing belong to Graphviz. This module only writes the DOT
//! description and shells out to the layout engine.

use std::path::Path;
use std::process::Command;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{EdgeReference, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use tracing::info;

use crate::classify::Classification;
use crate::community::Partition;
use crate::error::NetworkError;
use crate::graph::{BipartiteGraph, Edge, Node, Side};

/// Points per inch; node sizes are areas in square points.
const POINTS_PER_INCH: f64 = 72.0;

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Diameter in inches of a node drawn with area `size` in square points.
fn diameter(size: u32) -> f64 {
    f64::from(size).sqrt() / POINTS_PER_INCH
}

/// Renders `graph` as an undirected DOT graph carrying every node and edge
/// attribute of `classification`.
pub fn to_dot(
    graph: &BipartiteGraph,
    classification: &Classification,
    partition: Option<&Partition>,
    title: &str,
) -> String {
    let inner = graph.inner();

    let edge_attrs = |g: &UnGraph<Node, ()>, edge: EdgeReference<'_, ()>| {
        let (a, b) = (&g[edge.source()], &g[edge.target()]);
        let key = match a.side {
            Side::Protein => Edge::new(&a.id, &b.id),
            Side::Pathway => Edge::new(&b.id, &a.id),
        };
        match classification.edges.get(&key) {
            Some(attrs) => format!("color=\"{}\", penwidth={}", escape(&attrs.color), attrs.width),
            None => String::new(),
        }
    };

    let node_attrs = |_: &UnGraph<Node, ()>, (_, node): (NodeIndex, &Node)| {
        let shape = match node.side {
            Side::Protein => "circle",
            Side::Pathway => "doublecircle",
        };
        let tooltip = match partition.and_then(|partition| partition.get(&node.id)) {
            Some(community) => format!("{} (community {})", node.id, community),
            None => node.id.clone(),
        };
        match classification.nodes.get(&node.id) {
            Some(attrs) => format!(
                "label=\"{}\", shape={}, style=filled, fixedsize=true, width={:.2}, fillcolor=\"{}\", tooltip=\"{}\"",
                escape(attrs.label.as_deref().unwrap_or("")),
                shape,
                diameter(attrs.size),
                escape(&attrs.color),
                escape(&tooltip),
            ),
            None => format!("label=\"\", shape={}, tooltip=\"{}\"", shape, escape(&tooltip)),
        }
    };

    let dot = Dot::with_attr_getters(
        inner,
        &[Config::EdgeNoLabel, Config::NodeNoLabel, Config::GraphContentOnly],
        &edge_attrs,
        &node_attrs,
    );

    format!(
        "graph {{\n    label=\"{}\";\n    labelloc=t;\n    fontsize=20;\n    overlap=false;\n    node [fontname=\"Helvetica-Bold\", fontsize=14];\n{:?}}}\n",
        escape(title),
        dot
    )
}

/// Writes the DOT description of `graph` to `path`.
pub fn save_dot(
    path: impl AsRef<Path>,
    graph: &BipartiteGraph,
    classification: &Classification,
    partition: Option<&Partition>,
    title: &str,
) -> Result<(), NetworkError> {
    let path = path.as_ref();
    std::fs::write(path, to_dot(graph, classification, partition, title))?;
    info!(path = %path.display(), "wrote dot file");
    Ok(())
}

/// Lays out and draws `dot_file` with the Graphviz `engine` binary. The
/// output format follows the extension of `output_image`.
pub fn render_image(
    dot_file: impl AsRef<Path>,
    output_image: impl AsRef<Path>,
    engine: &str,
) -> Result<(), NetworkError> {
    let dot_file = dot_file.as_ref();
    let output_image = output_image.as_ref();
    let format = output_image
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("png");

    let status = Command::new(engine)
        .arg(format!("-T{format}"))
        .arg(dot_file)
        .arg("-o")
        .arg(output_image)
        .status()
        .map_err(|err| NetworkError::Render(format!("failed to run {engine}: {err}")))?;
    if !status.success() {
        return Err(NetworkError::Render(format!("{engine} exited with {status}")));
    }

    info!(engine, image = %output_image.display(), "rendered image");
    Ok(())
}

/// Opens `image` with the platform's default viewer.
pub fn open_image(image: impl AsRef<Path>) -> Result<(), NetworkError> {
    let image = image.as_ref();
    let mut command = if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };

    command.arg(image).status()?;
    Ok(())
}
