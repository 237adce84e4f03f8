use std::path::PathBuf;

use glam::DVec3;
use thiserror::Error;

use crate::network::{AnchorId, IntersectionId, RoadId};

/// Convenient result alias for the road navigation library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Neither a road nor an anchor line could be resolved for a query endpoint.
    #[error("no road or anchor could be resolved for query point {position}")]
    InvalidQuery { position: DVec3 },

    /// A path query was issued before the graph was constructed.
    #[error("road graph has not been constructed")]
    GraphNotBuilt,

    /// The cached graph no longer matches the network it was built from.
    #[error("cached weight matrix covers {actual} nodes but the network has {expected}; rebuild the graph")]
    MatrixSizeMismatch { expected: usize, actual: usize },

    /// The open set emptied before the goal was reached.
    #[error("search exhausted without reaching node {goal} from node {start}")]
    SearchExhausted { start: usize, goal: usize },

    /// The search hit its expansion ceiling.
    #[error("search exceeded the step limit of {max_steps}")]
    StepLimitExceeded { max_steps: usize },

    /// A road does not describe a chain of cubic segments.
    #[error("road {road} has {control_points} control points; expected 3n+1 with n >= 1")]
    MalformedRoad { road: RoadId, control_points: usize },

    /// A road does not carry one normal per anchor point.
    #[error("road {road} has {actual} anchor normals; expected {expected}")]
    NormalCountMismatch {
        road: RoadId,
        expected: usize,
        actual: usize,
    },

    /// A reference points outside the network arena.
    #[error("{kind} {index} referenced by the network does not exist")]
    DanglingReference { kind: &'static str, index: usize },

    /// Anchor and road disagree about their link.
    #[error("anchor {anchor} and road {road} are not linked in both directions")]
    InconsistentLink { anchor: AnchorId, road: RoadId },

    /// An anchor is listed by an intersection it does not belong to.
    #[error("anchor {anchor} is listed by intersection {intersection} but belongs elsewhere")]
    ForeignAnchor {
        anchor: AnchorId,
        intersection: IntersectionId,
    },

    /// An intersection lists the same anchor more than once.
    #[error("intersection {intersection} lists anchor {anchor} more than once")]
    DuplicateAnchor {
        anchor: AnchorId,
        intersection: IntersectionId,
    },

    /// An anchor already carries a road endpoint.
    #[error("anchor {anchor} is already linked to road {road}")]
    AnchorAlreadyLinked { anchor: AnchorId, road: RoadId },

    /// Control point input to the resampler cannot form cubic segments.
    #[error("{count} control points cannot form cubic segments")]
    InvalidControlPointCount { count: usize },

    /// Resampler received a normal count that does not match the anchors.
    #[error("curve has {expected} anchors but {actual} normals")]
    CurveNormalCount { expected: usize, actual: usize },

    /// Resampling spacing must be a positive finite number.
    #[error("invalid resampling spacing {spacing}")]
    InvalidSpacing { spacing: f64 },

    /// Resampling resolution must be a positive finite number.
    #[error("invalid resampling resolution {resolution}")]
    InvalidResolution { resolution: f64 },

    /// Fallback edges must never be cheaper than the straight line they span.
    #[error("fallback distance factor {factor} must be finite and at least 1")]
    InvalidDistanceFactor { factor: f64 },

    /// Query points farther than this get a connector; must be finite and non-negative.
    #[error("invalid connect distance {distance}")]
    InvalidConnectDistance { distance: f64 },

    /// A straight connector would need more samples than allowed.
    #[error("connector of length {length} needs more than {limit} samples at step {step}")]
    ConnectorTooDense { length: f64, step: f64, limit: usize },

    /// Matrix access outside its dimensions.
    #[error("matrix index ({x}, {y}) outside {width}x{height}")]
    MatrixIndexOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// Overlay dimensions cannot contain the wrapped matrix at the given offset.
    #[error("overlay {width}x{height} cannot hold a {base_width}x{base_height} matrix at ({start_x}, {start_y})")]
    InvalidOverlay {
        start_x: usize,
        start_y: usize,
        width: usize,
        height: usize,
        base_width: usize,
        base_height: usize,
    },

    /// Writes through an overlay never reach the wrapped matrix.
    #[error("overlay cell ({x}, {y}) belongs to the read-only base matrix")]
    OverlayReadOnly { x: usize, y: usize },

    /// Heap already holds as many entries as it has slots.
    #[error("priority queue is full (capacity {capacity})")]
    HeapFull { capacity: usize },

    /// Index is already present in the heap.
    #[error("index {index} is already queued")]
    HeapIndexPresent { index: usize },

    /// Index is not present in the heap.
    #[error("index {index} is not queued")]
    HeapIndexAbsent { index: usize },

    /// Index exceeds the heap's lookup table.
    #[error("index {index} exceeds priority queue capacity {capacity}")]
    HeapIndexOutOfRange { index: usize, capacity: usize },

    /// Search endpoint outside the graph.
    #[error("node {index} outside graph of {len} nodes")]
    NodeOutOfRange { index: usize, len: usize },

    /// Raised when loading a network file fails to parse.
    #[error("failed to parse road network {path}: {source}")]
    NetworkParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
