use std::sync::Arc;

use glam::DVec3;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::NavigationConfig;
use crate::curve::OrientedPoint;
use crate::error::{Error, Result};
use crate::graph::{GraphEdge, GraphNode, RoadGraph};
use crate::network::RoadNetwork;
use crate::reconstruct::reconstruct_path;

/// Result of a path query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationPath {
    /// Continuous oriented polyline from the start to the goal.
    pub points: Vec<OrientedPoint>,
    /// Graph nodes the search visited, in travel order.
    pub nodes: Vec<GraphNode>,
    pub cost: f64,
    /// Node expansions taken by the search.
    pub steps: usize,
}

/// Owns a road network and the graph cached from it.
///
/// The graph is rebuilt wholesale by [`Navigator::construct_graph`] and
/// shared behind an [`Arc`], so cloned handles can keep answering queries
/// from other threads while the owner rebuilds.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    network: RoadNetwork,
    graph: Option<Arc<RoadGraph>>,
}

impl Navigator {
    pub fn new(network: RoadNetwork) -> Self {
        Self {
            network,
            graph: None,
        }
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    /// Mutable access to the network. The cached graph is kept; queries
    /// detect a changed node count and report [`Error::MatrixSizeMismatch`].
    pub fn network_mut(&mut self) -> &mut RoadNetwork {
        &mut self.network
    }

    /// Rebuild the base graph from the current network.
    ///
    /// On failure the previous graph is dropped, so no query runs against a
    /// graph that no longer matches its network.
    pub fn construct_graph(&mut self, config: &NavigationConfig) -> Result<Arc<RoadGraph>> {
        self.graph = None;
        let graph = Arc::new(RoadGraph::construct(&self.network, config)?);
        info!(
            nodes = graph.node_count(),
            roads = self.network.roads.len(),
            "road graph ready"
        );
        self.graph = Some(Arc::clone(&graph));
        Ok(graph)
    }

    pub fn invalidate_graph(&mut self) {
        self.graph = None;
    }

    pub fn graph(&self) -> Option<&Arc<RoadGraph>> {
        self.graph.as_ref()
    }

    fn current_graph(&self) -> Result<&RoadGraph> {
        let graph = self.graph.as_deref().ok_or(Error::GraphNotBuilt)?;
        graph.ensure_matches(&self.network)?;
        Ok(graph)
    }

    /// Find a continuous path between two world positions.
    ///
    /// Only the per-query options of `config` are read: `distance_factor`,
    /// `step_size` and `resolution` were fixed when the graph was built, and
    /// connectors default to the graph's own `step_size`.
    pub fn find_path(
        &self,
        start: DVec3,
        goal: DVec3,
        config: &NavigationConfig,
    ) -> Result<NavigationPath> {
        config.validate_query()?;
        let graph = self.current_graph()?;
        let route = graph.route(start, goal, config)?;
        let points = reconstruct_path(graph, &route.nodes, start, goal, config)?;
        debug!(
            points = points.len(),
            nodes = route.nodes.len(),
            cost = route.cost,
            steps = route.steps,
            "path reconstructed"
        );
        Ok(NavigationPath {
            points,
            nodes: route.nodes,
            cost: route.cost,
            steps: route.steps,
        })
    }

    /// All persistent graph edges with their costs.
    pub fn edges(&self) -> Result<Vec<GraphEdge>> {
        Ok(self.current_graph()?.edges())
    }
}
