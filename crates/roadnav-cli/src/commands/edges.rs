use std::io::Write;
use std::path::Path;

use anyhow::Result;

use crate::commands::{load_config, prepare_navigator};
use crate::output::{render_edges, OutputFormat};

/// Handle the edges subcommand: dump every persistent graph edge.
pub fn handle_edges_command<W: Write>(
    network_path: &Path,
    config_path: Option<&Path>,
    format: OutputFormat,
    writer: &mut W,
) -> Result<()> {
    let config = load_config(config_path)?;
    let navigator = prepare_navigator(network_path, &config)?;
    let edges = navigator.edges()?;
    render_edges(navigator.network().persistent_node_count(), &edges, format, writer)
}
