// One module per subcommand; main.rs only parses and dispatches.

pub mod edges;
pub mod route;

use std::path::Path;

use anyhow::{Context, Result};
use roadnav_lib::{load_network, NavigationConfig, Navigator};

/// Load the network and configuration, and build the graph.
pub fn prepare_navigator(
    network_path: &Path,
    config: &NavigationConfig,
) -> Result<Navigator> {
    let network = load_network(network_path).with_context(|| {
        format!("failed to load road network from {}", network_path.display())
    })?;
    let mut navigator = Navigator::new(network);
    navigator
        .construct_graph(config)
        .context("failed to build the road graph")?;
    Ok(navigator)
}

/// Read the config file if one was given, otherwise use defaults.
pub fn load_config(path: Option<&Path>) -> Result<NavigationConfig> {
    match path {
        Some(path) => NavigationConfig::from_path(path)
            .with_context(|| format!("failed to read config from {}", path.display())),
        None => Ok(NavigationConfig::default()),
    }
}
