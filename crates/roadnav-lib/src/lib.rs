//! Road network navigation library.
//!
//! Roads are chains of cubic Bezier segments bound to anchors around
//! intersection hubs. This crate resamples roads into oriented polylines,
//! builds a curve-aware weight matrix over the network, searches it with A*
//! and stitches the resulting node route back into continuous geometry.
//! Consumers (the CLI, embedding applications) should go through
//! [`Navigator`] rather than driving the graph directly.

pub mod config;
pub mod curve;
pub mod error;
pub mod graph;
pub mod heap;
pub mod matrix;
pub mod navigator;
pub mod network;
pub mod reconstruct;
pub mod search;

pub use config::NavigationConfig;
pub use curve::{evenly_spaced_points, Aabb, CubicSegment, OrientedPoint, SampledCurve};
pub use error::{Error, Result};
pub use graph::{EdgeKind, EntryExit, Feature, GraphEdge, GraphNode, GraphRoute, RoadGraph};
pub use heap::IndexedMinHeap;
pub use matrix::{Matrix, OverlayMatrix, WeightMatrix};
pub use navigator::{NavigationPath, Navigator};
pub use network::{
    load_network, Anchor, AnchorId, Intersection, IntersectionId, Road, RoadEnd, RoadEndpoint,
    RoadId, RoadNetwork,
};
pub use reconstruct::reconstruct_path;
pub use search::{
    find_path_a_star, find_path_dijkstra, DistanceHeuristic, Heuristic, HeuristicKind,
    SearchOutcome, ZeroHeuristic,
};
