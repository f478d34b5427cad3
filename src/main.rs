use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use repair_network::*;

/// Map DNA-repair pathways to their proteins and draw the network.
#[derive(Debug, Parser)]
#[command(name = "repair-network", version, about)]
struct Cli {
    /// Membership table (`.csv` or `.toml`); the built-in DNA-repair dataset
    /// is used when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Configuration file (defaults to ./repair-network.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the DOT file
    #[arg(long)]
    dot: Option<PathBuf>,

    /// Where to write the rendered image
    #[arg(long)]
    image: Option<PathBuf>,

    /// Run Graphviz on the DOT file
    #[arg(long)]
    render: bool,

    /// Open the rendered image (implies --render)
    #[arg(long)]
    open: bool,

    /// Classify several membership tables in parallel and print a summary
    /// line per table instead of drawing
    #[arg(long, num_args = 1.., conflicts_with_all = ["input", "render", "open"])]
    batch: Vec<PathBuf>,

    #[arg(short, long)]
    quiet: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("repair-network error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = NetworkConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;

    if !cli.batch.is_empty() {
        return run_batch(&cli.batch, &config);
    }

    // 1. Load memberships and build the classified graph
    let membership = match &cli.input {
        Some(path) => MembershipTable::from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => MembershipTable::dna_repair(),
    };
    let mut network = RepairNetwork::build(membership, &config.style)?;

    // 2. Partition
    network.detect_communities(config.community.partitioner().as_ref());

    // 3. Save and visualize
    let dot_path = cli.dot.unwrap_or(config.render.dot_path);
    let image_path = cli.image.unwrap_or(config.render.image_path);
    network.save_graph_to_dot(&dot_path, &config.render.title)?;
    if cli.render || cli.open {
        RepairNetwork::render_image(&dot_path, &image_path, &config.render.engine)?;
        if cli.open {
            render::open_image(&image_path)?;
        }
    }

    // 4. Print summary
    print_summary(&network);
    Ok(())
}

fn run_batch(paths: &[PathBuf], config: &NetworkConfig) -> anyhow::Result<()> {
    let tables = paths
        .iter()
        .map(|path| {
            MembershipTable::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    for (path, result) in paths.iter().zip(analyze_batch(&tables, &config.style)) {
        match result {
            Ok(classification) => println!(
                "{}: {} nodes, {} highlighted edges",
                path.display(),
                classification.nodes.len(),
                classification.highlighted_edges()
            ),
            Err(error) => println!("{}: {error}", path.display()),
        }
    }
    Ok(())
}

fn print_summary(network: &RepairNetwork) {
    if network.common.is_empty() {
        println!("No protein is common to every pathway");
    } else {
        let common: Vec<&str> = network.common.iter().map(String::as_str).collect();
        println!("Common proteins: {}", common.join(", "));
    }

    for (category, count) in network.classification.category_counts() {
        println!("  {:<8} {} nodes", category.name(), count);
    }
    println!(
        "Highlighted edges: {} of {}",
        network.classification.highlighted_edges(),
        network.graph.edge_count()
    );

    let communities = network.communities();
    println!("Detected {} communities:", communities.len());
    for (id, members) in communities {
        println!("Community {} ({} members): {}", id, members.len(), members.join(", "));
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("REPAIR_NET_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_render_flags() {
        let cli = Cli::try_parse_from(["repair-network", "--input", "table.csv", "--open", "-v"])
            .expect("cli should parse");
        assert_eq!(cli.input, Some(PathBuf::from("table.csv")));
        assert!(cli.open);
        assert!(cli.verbose);
    }

    #[test]
    fn batch_conflicts_with_input() {
        let result = Cli::try_parse_from(["repair-network", "--input", "a.csv", "--batch", "b.csv"]);
        assert!(result.is_err());
    }
}
