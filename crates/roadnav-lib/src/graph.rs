//! Curve-aware routing graph over a [`RoadNetwork`].
//!
//! The persistent graph holds one node per intersection hub and one per
//! anchor, in that order per intersection. Edges:
//!
//! - hub to each of its anchors: straight-line distance ([`EdgeKind::Radial`]);
//! - anchor to anchor across a road bound at both ends: the road's arc
//!   length ([`EdgeKind::Road`]);
//! - every other pair: straight-line distance times `distance_factor`
//!   ([`EdgeKind::Fallback`]), so the graph is always connected.
//!
//! A query projects its start and goal onto the nearest feature, adds them as
//! transient [`EntryExit`] nodes through an [`OverlayMatrix`], and runs the
//! search on the overlay. The base matrix is never modified by a query.

use std::fmt;

use glam::DVec3;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::NavigationConfig;
use crate::curve::{OrientedPoint, SampledCurve, WORLD_FORWARD, WORLD_UP};
use crate::error::{Error, Result};
use crate::matrix::{Matrix, OverlayMatrix, WeightMatrix};
use crate::network::{AnchorId, IntersectionId, Road, RoadEnd, RoadEndpoint, RoadId, RoadNetwork};
use crate::search::{
    find_path_a_star, find_path_dijkstra, DistanceHeuristic, HeuristicKind, SearchOutcome,
};

/// Lower bound applied to every edge so coincident nodes stay connected
/// (the search ignores edges at or below `1e-6`).
pub const MIN_EDGE_WEIGHT: f64 = 1e-5;

/// Transient nodes closer than this to a persistent node are nudged.
pub const COINCIDENCE_EPSILON: f64 = 1e-3;

/// Distance a coincident transient node is moved along its feature.
pub const NUDGE_OFFSET: f64 = 1e-2;

/// Feature a transient node was projected onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Interior of a road.
    Road(RoadId),
    /// Straight line from an anchor to its intersection hub.
    AnchorLine(AnchorId),
}

/// Query endpoint projected onto the network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntryExit {
    pub position: DVec3,
    pub feature: Feature,
    /// Arc length from the road start, or distance from the anchor towards
    /// its hub.
    pub distance_along: f64,
    pub forward: DVec3,
    pub up: DVec3,
}

impl EntryExit {
    pub fn oriented(&self) -> OrientedPoint {
        OrientedPoint::new(self.position, self.forward, self.up)
    }
}

/// Node of the routing graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphNode {
    Intersection(IntersectionId),
    Anchor(AnchorId),
    EntryExit(EntryExit),
}

/// Classification of a persistent edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Radial,
    Road,
    Fallback,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EdgeKind::Radial => "radial",
            EdgeKind::Road => "road",
            EdgeKind::Fallback => "fallback",
        };
        f.pad(value)
    }
}

/// Persistent edge as reported by [`RoadGraph::edges`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphEdge {
    pub from: usize,
    pub to: usize,
    pub from_position: DVec3,
    pub to_position: DVec3,
    pub cost: f64,
    pub kind: EdgeKind,
}

/// Node path found by a query, before geometry is reconstructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphRoute {
    pub nodes: Vec<GraphNode>,
    pub cost: f64,
    pub steps: usize,
}

/// Cached sampling of one road.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadGeometry {
    road: Road,
    curve: SampledCurve,
    segment_offsets: Vec<f64>,
}

impl RoadGeometry {
    fn sample(road: &Road, config: &NavigationConfig) -> Result<Self> {
        let curve = road.evenly_spaced_points(config.step_size, config.resolution)?;
        let mut offset = 0.0;
        let segment_offsets = curve
            .segment_lengths()
            .iter()
            .map(|length| {
                let start = offset;
                offset += length;
                start
            })
            .collect();
        Ok(Self {
            road: road.clone(),
            curve,
            segment_offsets,
        })
    }

    pub fn road(&self) -> &Road {
        &self.road
    }

    pub fn curve(&self) -> &SampledCurve {
        &self.curve
    }

    pub fn length(&self) -> f64 {
        self.curve.length()
    }

    /// Arc length from the road start to the end at `end`.
    pub fn distance_of(&self, end: RoadEndpoint) -> f64 {
        match end {
            RoadEndpoint::Start => 0.0,
            RoadEndpoint::End => self.length(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AnchorInfo {
    pub(crate) intersection: IntersectionId,
    pub(crate) position: DVec3,
    pub(crate) up: DVec3,
    pub(crate) node: usize,
    pub(crate) road: Option<RoadEnd>,
}

#[derive(Debug, Clone, PartialEq)]
struct IntersectionInfo {
    position: DVec3,
    radius: f64,
    node: usize,
    anchors: Vec<AnchorId>,
}

/// Base graph built from a network snapshot.
#[derive(Debug, Clone)]
pub struct RoadGraph {
    nodes: Vec<GraphNode>,
    positions: Vec<DVec3>,
    weights: Matrix,
    roads: Vec<RoadGeometry>,
    anchors: Vec<AnchorInfo>,
    intersections: Vec<IntersectionInfo>,
    fallback_edges: usize,
    step_size: f64,
    resolution: f64,
}

impl RoadGraph {
    /// Rebuild the whole graph from `network`.
    ///
    /// The network is validated first; a single malformed road fails the
    /// build rather than producing a partial graph.
    pub fn construct(network: &RoadNetwork, config: &NavigationConfig) -> Result<Self> {
        config.validate()?;
        network.validate()?;

        let node_count = network.persistent_node_count();
        let mut nodes = Vec::with_capacity(node_count);
        let mut positions = Vec::with_capacity(node_count);
        let mut anchor_nodes = vec![0usize; network.anchors.len()];
        let mut intersections = Vec::with_capacity(network.intersections.len());

        for (index, intersection) in network.intersections.iter().enumerate() {
            let hub_node = nodes.len();
            nodes.push(GraphNode::Intersection(IntersectionId(index)));
            positions.push(intersection.position);
            for &anchor in &intersection.anchors {
                anchor_nodes[anchor.0] = nodes.len();
                nodes.push(GraphNode::Anchor(anchor));
                positions.push(network.anchors[anchor.0].position);
            }
            intersections.push(IntersectionInfo {
                position: intersection.position,
                radius: intersection.radius,
                node: hub_node,
                anchors: intersection.anchors.clone(),
            });
        }

        let anchors: Vec<AnchorInfo> = network
            .anchors
            .iter()
            .zip(&anchor_nodes)
            .map(|(anchor, &node)| AnchorInfo {
                intersection: anchor.intersection,
                position: anchor.position,
                up: anchor.up(),
                node,
                road: anchor.road,
            })
            .collect();

        let mut weights = Matrix::new(node_count, node_count);
        for hub in &intersections {
            for anchor in &hub.anchors {
                let info = &anchors[anchor.0];
                weights.set_symmetric(
                    info.node,
                    hub.node,
                    edge_weight(info.position.distance(hub.position)),
                )?;
            }
        }

        let roads = network
            .roads
            .iter()
            .map(|road| RoadGeometry::sample(road, config))
            .collect::<Result<Vec<_>>>()?;

        for geometry in &roads {
            let (Some(start), Some(end)) = (geometry.road.start_anchor, geometry.road.end_anchor)
            else {
                continue;
            };
            let (a, b) = (anchors[start.0].node, anchors[end.0].node);
            if a != b {
                weights.set_symmetric(a, b, edge_weight(geometry.length()))?;
            }
        }

        let mut fallback_edges = 0usize;
        for i in 0..node_count {
            for j in (i + 1)..node_count {
                if weights.get(i, j).is_some_and(f64::is_finite) {
                    continue;
                }
                let cost = positions[i].distance(positions[j]) * config.distance_factor;
                weights.set_symmetric(i, j, edge_weight(cost))?;
                fallback_edges += 1;
            }
        }

        debug!(
            nodes = node_count,
            roads = roads.len(),
            fallback_edges,
            "constructed road graph"
        );

        Ok(Self {
            nodes,
            positions,
            weights,
            roads,
            anchors,
            intersections,
            fallback_edges,
            step_size: config.step_size,
            resolution: config.resolution,
        })
    }

    /// Number of persistent nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    /// Number of synthesised fallback pairs.
    pub fn fallback_edge_count(&self) -> usize {
        self.fallback_edges
    }

    /// Arc-length spacing the roads were sampled at.
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn road_geometry(&self, road: RoadId) -> Option<&RoadGeometry> {
        self.roads.get(road.0)
    }

    pub fn anchor_node(&self, anchor: AnchorId) -> Option<usize> {
        self.anchors.get(anchor.0).map(|info| info.node)
    }

    pub fn intersection_node(&self, intersection: IntersectionId) -> Option<usize> {
        self.intersections.get(intersection.0).map(|info| info.node)
    }

    pub(crate) fn anchor_info(&self, anchor: AnchorId) -> Option<&AnchorInfo> {
        self.anchors.get(anchor.0)
    }

    /// Fail with [`Error::MatrixSizeMismatch`] if `network` has changed shape
    /// since this graph was built.
    pub fn ensure_matches(&self, network: &RoadNetwork) -> Result<()> {
        let expected = network.persistent_node_count();
        if expected != self.node_count() || self.weights.width() != self.node_count() {
            return Err(Error::MatrixSizeMismatch {
                expected,
                actual: self.weights.width(),
            });
        }
        Ok(())
    }

    /// World position of a node.
    pub fn node_position(&self, node: &GraphNode) -> DVec3 {
        match node {
            GraphNode::Intersection(id) => self.intersections[id.0].position,
            GraphNode::Anchor(id) => self.anchors[id.0].position,
            GraphNode::EntryExit(entry) => entry.position,
        }
    }

    /// Up vector of a node.
    pub fn node_up(&self, node: &GraphNode) -> DVec3 {
        match node {
            GraphNode::Intersection(_) => WORLD_UP,
            GraphNode::Anchor(id) => self.anchors[id.0].up,
            GraphNode::EntryExit(entry) => entry.up,
        }
    }

    /// Road joining two anchors, if one is bound to both.
    pub fn road_between(&self, a: AnchorId, b: AnchorId) -> Option<RoadId> {
        let road_end = self.anchors.get(a.0)?.road?;
        let other = match road_end.end {
            RoadEndpoint::Start => RoadEndpoint::End,
            RoadEndpoint::End => RoadEndpoint::Start,
        };
        let geometry = self.roads.get(road_end.road.0)?;
        (geometry.road.anchor_at(other) == Some(b)).then_some(road_end.road)
    }

    /// Classification of the persistent edge between nodes `i` and `j`.
    pub fn edge_kind(&self, i: usize, j: usize) -> Option<EdgeKind> {
        if i == j {
            return None;
        }
        let weight = self.weights.get(i, j)?;
        if !weight.is_finite() {
            return None;
        }
        let kind = match (self.nodes[i], self.nodes[j]) {
            (GraphNode::Intersection(hub), GraphNode::Anchor(anchor))
            | (GraphNode::Anchor(anchor), GraphNode::Intersection(hub))
                if self.anchors[anchor.0].intersection == hub =>
            {
                EdgeKind::Radial
            }
            (GraphNode::Anchor(a), GraphNode::Anchor(b)) if self.road_between(a, b).is_some() => {
                EdgeKind::Road
            }
            _ => EdgeKind::Fallback,
        };
        Some(kind)
    }

    /// Every persistent edge with its cost, for visualisation.
    pub fn edges(&self) -> Vec<GraphEdge> {
        let mut edges = Vec::new();
        for i in 0..self.node_count() {
            for j in (i + 1)..self.node_count() {
                let Some(kind) = self.edge_kind(i, j) else {
                    continue;
                };
                edges.push(GraphEdge {
                    from: i,
                    to: j,
                    from_position: self.positions[i],
                    to_position: self.positions[j],
                    cost: self.weights.get(i, j).unwrap_or(f64::INFINITY),
                    kind,
                });
            }
        }
        edges
    }

    /// Project `point` onto the nearest road, or onto an anchor line of an
    /// intersection whose radius contains it.
    pub fn resolve(&self, point: DVec3) -> Result<EntryExit> {
        if !point.is_finite() {
            return Err(Error::InvalidQuery { position: point });
        }

        let mut best_road: Option<(RoadId, f64, f64)> = None;
        for (index, geometry) in self.roads.iter().enumerate() {
            let Some(projection) = geometry.road.project(point) else {
                continue;
            };
            if matches!(best_road, Some((_, _, distance)) if distance <= projection.distance) {
                continue;
            }
            let segment = geometry.road.segment(projection.segment);
            let along = geometry.segment_offsets[projection.segment]
                + segment.arc_length_to(projection.t, self.resolution);
            best_road = Some((RoadId(index), along, projection.distance));
        }

        let mut best_anchor: Option<(AnchorId, f64, f64)> = None;
        for hub in self.intersections.iter().filter(|hub| hub.contains(point)) {
            for &anchor in &hub.anchors {
                let info = &self.anchors[anchor.0];
                let (along, distance) = project_onto_line(point, info.position, hub.position);
                if matches!(best_anchor, Some((_, _, best)) if best <= distance) {
                    continue;
                }
                best_anchor = Some((anchor, along, distance));
            }
        }

        match (best_road, best_anchor) {
            (Some((road, along, road_distance)), Some((anchor, anchor_along, anchor_distance))) => {
                if road_distance <= anchor_distance {
                    Ok(self.road_entry(road, along))
                } else {
                    Ok(self.anchor_entry(anchor, anchor_along))
                }
            }
            (Some((road, along, _)), None) => Ok(self.road_entry(road, along)),
            (None, Some((anchor, along, _))) => Ok(self.anchor_entry(anchor, along)),
            (None, None) => Err(Error::InvalidQuery { position: point }),
        }
    }

    /// Transient node at arc length `distance` along `road`.
    pub fn road_entry(&self, road: RoadId, distance: f64) -> EntryExit {
        let geometry = &self.roads[road.0];
        let distance = distance.clamp(0.0, geometry.length());
        let sample = geometry.curve.point_at_distance(distance);
        EntryExit {
            position: sample.position,
            feature: Feature::Road(road),
            distance_along: distance,
            forward: sample.forward,
            up: sample.up,
        }
    }

    /// Transient node `distance` from `anchor` towards its hub.
    pub fn anchor_entry(&self, anchor: AnchorId, distance: f64) -> EntryExit {
        let info = &self.anchors[anchor.0];
        let hub = self.intersections[info.intersection.0].position;
        let length = info.position.distance(hub);
        let distance = distance.clamp(0.0, length);
        let fraction = if length > 0.0 { distance / length } else { 0.0 };
        EntryExit {
            position: info.position.lerp(hub, fraction),
            feature: Feature::AnchorLine(anchor),
            distance_along: distance,
            forward: (hub - info.position).try_normalize().unwrap_or(WORLD_FORWARD),
            up: info.up.lerp(WORLD_UP, fraction).try_normalize().unwrap_or(WORLD_UP),
        }
    }

    fn feature_length(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Road(road) => self.roads[road.0].length(),
            Feature::AnchorLine(anchor) => {
                let info = &self.anchors[anchor.0];
                info.position
                    .distance(self.intersections[info.intersection.0].position)
            }
        }
    }

    fn entry_at(&self, feature: Feature, distance: f64) -> EntryExit {
        match feature {
            Feature::Road(road) => self.road_entry(road, distance),
            Feature::AnchorLine(anchor) => self.anchor_entry(anchor, distance),
        }
    }

    /// Move `entry` off any persistent node it coincides with.
    ///
    /// The node slides `NUDGE_OFFSET` along its own feature (backwards when
    /// there is no room ahead), so position and `distance_along` always
    /// describe the same point.
    pub fn nudge(&self, entry: EntryExit) -> EntryExit {
        let Some(node) = self
            .positions
            .iter()
            .position(|position| position.distance(entry.position) < COINCIDENCE_EPSILON)
        else {
            return entry;
        };

        let length = self.feature_length(entry.feature);
        let forward = entry.distance_along + NUDGE_OFFSET;
        let shifted = if forward <= length {
            forward
        } else {
            entry.distance_along - NUDGE_OFFSET
        };
        let nudged = self.entry_at(entry.feature, shifted);
        warn!(
            node,
            from = entry.distance_along,
            to = nudged.distance_along,
            "query point coincides with a graph node; nudging along its feature"
        );
        nudged
    }

    /// Find the node route between two world points.
    pub fn route(&self, start: DVec3, goal: DVec3, config: &NavigationConfig) -> Result<GraphRoute> {
        let start_entry = self.nudge(self.resolve(start)?);
        let goal_entry = self.nudge(self.resolve(goal)?);

        let base_count = self.node_count();
        let (start_index, goal_index) = (base_count, base_count + 1);
        let mut overlay =
            OverlayMatrix::new(&self.weights, 0, 0, base_count + 2, base_count + 2)?;
        self.connect(&mut overlay, start_index, &start_entry)?;
        self.connect(&mut overlay, goal_index, &goal_entry)?;
        if let Some(direct) = direct_cost(&start_entry, &goal_entry) {
            overlay.set_symmetric(start_index, goal_index, edge_weight(direct))?;
        }

        let outcome = match config.heuristic {
            HeuristicKind::Distance => {
                let mut positions = Vec::with_capacity(base_count + 2);
                positions.extend_from_slice(&self.positions);
                positions.push(start_entry.position);
                positions.push(goal_entry.position);
                find_path_a_star(
                    &overlay,
                    start_index,
                    goal_index,
                    &DistanceHeuristic::new(&positions),
                    config.max_search_steps,
                )?
            }
            HeuristicKind::Zero => {
                find_path_dijkstra(&overlay, start_index, goal_index, config.max_search_steps)?
            }
        };

        self.log_fallback_usage(&outcome);

        let nodes = outcome
            .path
            .iter()
            .map(|&index| match index {
                i if i == start_index => GraphNode::EntryExit(start_entry),
                i if i == goal_index => GraphNode::EntryExit(goal_entry),
                i => self.nodes[i],
            })
            .collect();

        debug!(
            cost = outcome.cost,
            steps = outcome.steps,
            heuristic = %config.heuristic,
            "route found"
        );

        Ok(GraphRoute {
            nodes,
            cost: outcome.cost,
            steps: outcome.steps,
        })
    }

    fn connect(
        &self,
        overlay: &mut OverlayMatrix<'_>,
        index: usize,
        entry: &EntryExit,
    ) -> Result<()> {
        match entry.feature {
            Feature::Road(road) => {
                let geometry = &self.roads[road.0];
                for end in [RoadEndpoint::Start, RoadEndpoint::End] {
                    let Some(anchor) = geometry.road.anchor_at(end) else {
                        continue;
                    };
                    let cost = (geometry.distance_of(end) - entry.distance_along).abs();
                    overlay.set_symmetric(index, self.anchors[anchor.0].node, edge_weight(cost))?;
                }
            }
            Feature::AnchorLine(anchor) => {
                let info = &self.anchors[anchor.0];
                let hub = &self.intersections[info.intersection.0];
                overlay.set_symmetric(
                    index,
                    info.node,
                    edge_weight(entry.position.distance(info.position)),
                )?;
                overlay.set_symmetric(
                    index,
                    hub.node,
                    edge_weight(entry.position.distance(hub.position)),
                )?;
            }
        }
        Ok(())
    }

    fn log_fallback_usage(&self, outcome: &SearchOutcome) {
        let fallback_hops = outcome
            .path
            .windows(2)
            .filter(|pair| {
                pair[0] < self.node_count()
                    && pair[1] < self.node_count()
                    && self.edge_kind(pair[0], pair[1]) == Some(EdgeKind::Fallback)
            })
            .count();
        if fallback_hops > 0 {
            warn!(
                fallback_hops,
                "route uses synthesised fallback edges; the network may be disconnected"
            );
        }
    }
}

impl IntersectionInfo {
    fn contains(&self, point: DVec3) -> bool {
        self.position.distance(point) <= self.radius
    }
}

fn edge_weight(cost: f64) -> f64 {
    cost.max(MIN_EDGE_WEIGHT)
}

fn direct_cost(start: &EntryExit, goal: &EntryExit) -> Option<f64> {
    match (start.feature, goal.feature) {
        (Feature::Road(a), Feature::Road(b)) if a == b => {
            Some((goal.distance_along - start.distance_along).abs())
        }
        (Feature::AnchorLine(a), Feature::AnchorLine(b)) if a == b => {
            Some(start.position.distance(goal.position))
        }
        _ => None,
    }
}

/// Distance along `from -> to` of the closest point to `point`, and the
/// distance from `point` to it.
fn project_onto_line(point: DVec3, from: DVec3, to: DVec3) -> (f64, f64) {
    let axis = to - from;
    let length = axis.length();
    if length == 0.0 {
        return (0.0, point.distance(from));
    }
    let along = ((point - from).dot(axis) / length).clamp(0.0, length);
    let closest = from + axis * (along / length);
    (along, point.distance(closest))
}
