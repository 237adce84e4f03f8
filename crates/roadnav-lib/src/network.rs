//! Authored road network: roads, anchors and intersections.
//!
//! Entities live in flat arenas addressed by typed ids. Roads are chains of
//! cubic segments whose ends may be bound to an [`Anchor`]; anchors sit
//! radially around an [`Intersection`] hub. Binding is bidirectional: the
//! anchor records the road end and the road records the anchor.

use std::fmt;
use std::fs;
use std::path::Path;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::{evenly_spaced_points, CubicSegment, SampledCurve, WORLD_UP};
use crate::error::{Error, Result};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

arena_id!(
    /// Index of a road in [`RoadNetwork::roads`].
    RoadId
);
arena_id!(
    /// Index of an anchor in [`RoadNetwork::anchors`].
    AnchorId
);
arena_id!(
    /// Index of an intersection in [`RoadNetwork::intersections`].
    IntersectionId
);

/// Which end of a road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadEndpoint {
    Start,
    End,
}

/// A specific end of a specific road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoadEnd {
    pub road: RoadId,
    pub end: RoadEndpoint,
}

/// Chain of cubic Bezier segments with one up vector per anchor point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub control_points: Vec<DVec3>,
    pub normals: Vec<DVec3>,
    #[serde(default)]
    pub start_anchor: Option<AnchorId>,
    #[serde(default)]
    pub end_anchor: Option<AnchorId>,
}

/// Closest point on a road to some query position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadProjection {
    pub segment: usize,
    pub t: f64,
    pub position: DVec3,
    /// Distance from the query position to `position`.
    pub distance: f64,
}

impl Road {
    pub fn new(control_points: Vec<DVec3>, normals: Vec<DVec3>) -> Self {
        Self {
            control_points,
            normals,
            start_anchor: None,
            end_anchor: None,
        }
    }

    /// Single straight segment with handles at the thirds.
    pub fn straight(from: DVec3, to: DVec3) -> Self {
        Self::new(
            vec![from, from.lerp(to, 1.0 / 3.0), from.lerp(to, 2.0 / 3.0), to],
            vec![WORLD_UP, WORLD_UP],
        )
    }

    pub fn segment_count(&self) -> usize {
        self.control_points.len().saturating_sub(1) / 3
    }

    /// Cubic segment `index`; panics if out of range.
    pub fn segment(&self, index: usize) -> CubicSegment {
        let base = index * 3;
        CubicSegment::new(
            self.control_points[base],
            self.control_points[base + 1],
            self.control_points[base + 2],
            self.control_points[base + 3],
        )
    }

    pub fn segments(&self) -> impl Iterator<Item = CubicSegment> + '_ {
        (0..self.segment_count()).map(|index| self.segment(index))
    }

    pub fn anchor_at(&self, end: RoadEndpoint) -> Option<AnchorId> {
        match end {
            RoadEndpoint::Start => self.start_anchor,
            RoadEndpoint::End => self.end_anchor,
        }
    }

    fn anchor_slot(&mut self, end: RoadEndpoint) -> &mut Option<AnchorId> {
        match end {
            RoadEndpoint::Start => &mut self.start_anchor,
            RoadEndpoint::End => &mut self.end_anchor,
        }
    }

    /// Whether the control point layout forms at least one cubic segment.
    pub fn is_well_formed(&self) -> bool {
        self.control_points.len() >= 4 && self.control_points.len() % 3 == 1
    }

    pub fn evenly_spaced_points(&self, spacing: f64, resolution: f64) -> Result<SampledCurve> {
        evenly_spaced_points(&self.control_points, &self.normals, spacing, resolution)
    }

    /// Polyline arc length at `resolution`.
    pub fn arc_length(&self, resolution: f64) -> f64 {
        self.segments()
            .map(|segment| segment.arc_length(resolution))
            .sum()
    }

    /// Nearest point on the road to `point`.
    ///
    /// Each segment is inverted, the parameter clamped to `[0, 1]` and
    /// compared against both segment ends, so a poor Newton result can only
    /// make the answer less precise, never leave the road.
    pub fn project(&self, point: DVec3) -> Option<RoadProjection> {
        let mut best: Option<RoadProjection> = None;
        for (index, segment) in self.segments().enumerate() {
            let inverted = segment.invert(point);
            let inverted = if inverted.is_finite() {
                inverted.clamp(0.0, 1.0)
            } else {
                0.5
            };
            for t in [inverted, 0.0, 1.0] {
                let position = segment.evaluate(t);
                let distance = position.distance(point);
                if matches!(best, Some(current) if current.distance <= distance) {
                    continue;
                }
                best = Some(RoadProjection {
                    segment: index,
                    t,
                    position,
                    distance,
                });
            }
        }
        best
    }
}

/// Connection point on an intersection that may bind one road end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub intersection: IntersectionId,
    pub position: DVec3,
    #[serde(default)]
    pub rotation: DQuat,
    #[serde(default)]
    pub road: Option<RoadEnd>,
}

impl Anchor {
    pub fn up(&self) -> DVec3 {
        self.rotation * WORLD_UP
    }
}

/// Hub position with radially arranged anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub position: DVec3,
    #[serde(default)]
    pub anchors: Vec<AnchorId>,
    /// Query points within this distance of the hub may resolve to the
    /// intersection's anchor lines.
    pub radius: f64,
}

impl Intersection {
    pub fn contains(&self, point: DVec3) -> bool {
        self.position.distance(point) <= self.radius
    }
}

/// Complete authored network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadNetwork {
    #[serde(default)]
    pub intersections: Vec<Intersection>,
    #[serde(default)]
    pub anchors: Vec<Anchor>,
    #[serde(default)]
    pub roads: Vec<Road>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn road(&self, id: RoadId) -> Option<&Road> {
        self.roads.get(id.0)
    }

    pub fn anchor(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.get(id.0)
    }

    pub fn intersection(&self, id: IntersectionId) -> Option<&Intersection> {
        self.intersections.get(id.0)
    }

    /// Number of nodes the base graph holds for this network.
    pub fn persistent_node_count(&self) -> usize {
        self.intersections.len() + self.anchors.len()
    }

    pub fn add_intersection(&mut self, position: DVec3, radius: f64) -> IntersectionId {
        self.intersections.push(Intersection {
            position,
            anchors: Vec::new(),
            radius,
        });
        IntersectionId(self.intersections.len() - 1)
    }

    pub fn add_anchor(
        &mut self,
        intersection: IntersectionId,
        position: DVec3,
        rotation: DQuat,
    ) -> Result<AnchorId> {
        let id = AnchorId(self.anchors.len());
        let hub = self
            .intersections
            .get_mut(intersection.0)
            .ok_or(Error::DanglingReference {
                kind: "intersection",
                index: intersection.0,
            })?;
        hub.anchors.push(id);
        self.anchors.push(Anchor {
            intersection,
            position,
            rotation,
            road: None,
        });
        Ok(id)
    }

    pub fn add_road(&mut self, road: Road) -> RoadId {
        self.roads.push(road);
        RoadId(self.roads.len() - 1)
    }

    /// Bind `end` of `road` to `anchor`.
    ///
    /// The road endpoint (and its adjacent handle, rigidly) moves onto the
    /// anchor and takes the anchor's up vector. An anchor already holding a
    /// road is rejected; an anchor previously bound to this road end is
    /// released.
    pub fn link(&mut self, anchor: AnchorId, road: RoadId, end: RoadEndpoint) -> Result<()> {
        let anchor_entry = self.anchors.get(anchor.0).ok_or(Error::DanglingReference {
            kind: "anchor",
            index: anchor.0,
        })?;
        if let Some(existing) = anchor_entry.road {
            return Err(Error::AnchorAlreadyLinked {
                anchor,
                road: existing.road,
            });
        }
        let (position, up) = (anchor_entry.position, anchor_entry.up());

        let road_entry = self.roads.get_mut(road.0).ok_or(Error::DanglingReference {
            kind: "road",
            index: road.0,
        })?;
        if !road_entry.is_well_formed() {
            return Err(Error::MalformedRoad {
                road,
                control_points: road_entry.control_points.len(),
            });
        }

        let previous = road_entry.anchor_slot(end).replace(anchor);
        let count = road_entry.control_points.len();
        let (endpoint, handle) = match end {
            RoadEndpoint::Start => (0, 1),
            RoadEndpoint::End => (count - 1, count - 2),
        };
        let delta = position - road_entry.control_points[endpoint];
        road_entry.control_points[endpoint] = position;
        road_entry.control_points[handle] += delta;
        match end {
            RoadEndpoint::Start => {
                if let Some(normal) = road_entry.normals.first_mut() {
                    *normal = up;
                }
            }
            RoadEndpoint::End => {
                if let Some(normal) = road_entry.normals.last_mut() {
                    *normal = up;
                }
            }
        }

        if let Some(previous) = previous.filter(|previous| *previous != anchor) {
            if let Some(entry) = self.anchors.get_mut(previous.0) {
                entry.road = None;
            }
        }
        self.anchors[anchor.0].road = Some(RoadEnd { road, end });
        Ok(())
    }

    /// Release whatever road end `anchor` holds.
    pub fn unlink(&mut self, anchor: AnchorId) -> Result<Option<RoadEnd>> {
        let entry = self.anchors.get_mut(anchor.0).ok_or(Error::DanglingReference {
            kind: "anchor",
            index: anchor.0,
        })?;
        let Some(road_end) = entry.road.take() else {
            return Ok(None);
        };
        if let Some(road) = self.roads.get_mut(road_end.road.0) {
            let slot = road.anchor_slot(road_end.end);
            if *slot == Some(anchor) {
                *slot = None;
            }
        }
        Ok(Some(road_end))
    }

    /// Check structural invariants; any violation rejects the whole network.
    pub fn validate(&self) -> Result<()> {
        for (index, road) in self.roads.iter().enumerate() {
            let id = RoadId(index);
            if !road.is_well_formed() {
                return Err(Error::MalformedRoad {
                    road: id,
                    control_points: road.control_points.len(),
                });
            }
            let expected = road.segment_count() + 1;
            if road.normals.len() != expected {
                return Err(Error::NormalCountMismatch {
                    road: id,
                    expected,
                    actual: road.normals.len(),
                });
            }
            for end in [RoadEndpoint::Start, RoadEndpoint::End] {
                let Some(anchor_id) = road.anchor_at(end) else {
                    continue;
                };
                let anchor = self.anchor(anchor_id).ok_or(Error::DanglingReference {
                    kind: "anchor",
                    index: anchor_id.0,
                })?;
                if anchor.road != Some(RoadEnd { road: id, end }) {
                    return Err(Error::InconsistentLink {
                        anchor: anchor_id,
                        road: id,
                    });
                }
            }
        }

        for (index, anchor) in self.anchors.iter().enumerate() {
            let id = AnchorId(index);
            let hub = self
                .intersection(anchor.intersection)
                .ok_or(Error::DanglingReference {
                    kind: "intersection",
                    index: anchor.intersection.0,
                })?;
            if !hub.anchors.contains(&id) {
                return Err(Error::ForeignAnchor {
                    anchor: id,
                    intersection: anchor.intersection,
                });
            }
            if let Some(road_end) = anchor.road {
                let road = self.road(road_end.road).ok_or(Error::DanglingReference {
                    kind: "road",
                    index: road_end.road.0,
                })?;
                if road.anchor_at(road_end.end) != Some(id) {
                    return Err(Error::InconsistentLink {
                        anchor: id,
                        road: road_end.road,
                    });
                }
            }
        }

        let mut listed = vec![false; self.anchors.len()];
        for (index, intersection) in self.intersections.iter().enumerate() {
            let id = IntersectionId(index);
            for &anchor_id in &intersection.anchors {
                let anchor = self.anchor(anchor_id).ok_or(Error::DanglingReference {
                    kind: "anchor",
                    index: anchor_id.0,
                })?;
                if anchor.intersection != id {
                    return Err(Error::ForeignAnchor {
                        anchor: anchor_id,
                        intersection: id,
                    });
                }
                if std::mem::replace(&mut listed[anchor_id.0], true) {
                    return Err(Error::DuplicateAnchor {
                        anchor: anchor_id,
                        intersection: id,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Load and validate a road network from a JSON file.
pub fn load_network(path: &Path) -> Result<RoadNetwork> {
    debug!(path = %path.display(), "loading road network");
    let contents = fs::read_to_string(path)?;
    let network: RoadNetwork =
        serde_json::from_str(&contents).map_err(|source| Error::NetworkParse {
            path: path.to_path_buf(),
            source,
        })?;
    network.validate()?;
    debug!(
        intersections = network.intersections.len(),
        anchors = network.anchors.len(),
        roads = network.roads.len(),
        "road network loaded"
    );
    Ok(network)
}
