//! Turn a node route into a continuous oriented polyline.

use glam::DVec3;

use crate::config::NavigationConfig;
use crate::curve::{OrientedPoint, DUPLICATE_EPSILON, WORLD_FORWARD};
use crate::error::{Error, Result};
use crate::graph::{EntryExit, Feature, GraphNode, RoadGeometry, RoadGraph};
use crate::network::{AnchorId, RoadEndpoint, RoadId};

/// Most divisions a single straight connector may be split into.
pub const MAX_CONNECTOR_DIVISIONS: usize = 100_000;

/// Stitch curve samples and connectors along `nodes`, then extend the result
/// so it starts at `start` and ends at `goal`.
///
/// Connectors are subdivided at the query's `connector_step`, or at the
/// graph's own sampling step when none is given.
pub fn reconstruct_path(
    graph: &RoadGraph,
    nodes: &[GraphNode],
    start: DVec3,
    goal: DVec3,
    config: &NavigationConfig,
) -> Result<Vec<OrientedPoint>> {
    let mut points = Vec::new();
    let step = config.connector_step_or(graph.step_size());

    if let [only] = nodes {
        push_point(
            &mut points,
            OrientedPoint::new(graph.node_position(only), WORLD_FORWARD, graph.node_up(only)),
        );
    }

    for pair in nodes.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        let samples = match (from, to) {
            (GraphNode::EntryExit(a), GraphNode::EntryExit(b)) => match (a.feature, b.feature) {
                (Feature::Road(ra), Feature::Road(rb)) if ra == rb => {
                    entry_slice(graph, ra, a, b.distance_along, Some(b))
                }
                _ => None,
            },
            (GraphNode::Anchor(a), GraphNode::Anchor(b)) => full_road(graph, *a, *b),
            (GraphNode::EntryExit(entry), GraphNode::Anchor(anchor)) => {
                entry_to_anchor(graph, entry, *anchor, false)
            }
            (GraphNode::Anchor(anchor), GraphNode::EntryExit(entry)) => {
                entry_to_anchor(graph, entry, *anchor, true)
            }
            _ => None,
        };

        let samples = match samples {
            Some(samples) => samples,
            None => straight_connector(
                graph.node_position(from),
                graph.node_up(from),
                graph.node_position(to),
                graph.node_up(to),
                step,
            )?,
        };
        for sample in samples {
            push_point(&mut points, sample);
        }
    }

    connect_endpoints(points, start, goal, config.min_distance_to_connect, step)
}

fn push_point(points: &mut Vec<OrientedPoint>, point: OrientedPoint) {
    if let Some(last) = points.last() {
        if last.position.distance(point.position) <= DUPLICATE_EPSILON {
            return;
        }
    }
    points.push(point);
}

/// Samples along `road` between arc lengths `from` and `to`, in travel order.
fn road_slice(geometry: &RoadGeometry, from: f64, to: f64) -> Vec<OrientedPoint> {
    let curve = geometry.curve();
    let descending = to < from;
    let orient = |point: OrientedPoint| if descending { point.reversed() } else { point };

    let mut samples = vec![orient(curve.point_at_distance(from))];
    let interior = curve.indices_between(from.min(to), from.max(to));
    let interior = &curve.points()[interior];
    if descending {
        samples.extend(interior.iter().rev().copied().map(orient));
    } else {
        samples.extend(interior.iter().copied());
    }
    samples.push(orient(curve.point_at_distance(to)));
    samples
}

fn entry_slice(
    graph: &RoadGraph,
    road: RoadId,
    entry: &EntryExit,
    to: f64,
    exit: Option<&EntryExit>,
) -> Option<Vec<OrientedPoint>> {
    let geometry = graph.road_geometry(road)?;
    let mut samples = road_slice(geometry, entry.distance_along, to);
    if let Some(first) = samples.first_mut() {
        first.position = entry.position;
    }
    if let (Some(exit), Some(last)) = (exit, samples.last_mut()) {
        last.position = exit.position;
    }
    Some(samples)
}

fn full_road(graph: &RoadGraph, from: AnchorId, to: AnchorId) -> Option<Vec<OrientedPoint>> {
    let road = graph.road_between(from, to)?;
    let geometry = graph.road_geometry(road)?;
    let forward = geometry.road().start_anchor == Some(from);
    let points = geometry.curve().points();
    Some(if forward {
        points.to_vec()
    } else {
        points.iter().rev().map(|point| point.reversed()).collect()
    })
}

/// Partial road between a transient node and the anchor bound to its road.
fn entry_to_anchor(
    graph: &RoadGraph,
    entry: &EntryExit,
    anchor: AnchorId,
    towards_entry: bool,
) -> Option<Vec<OrientedPoint>> {
    let Feature::Road(road) = entry.feature else {
        return None;
    };
    let road_end = graph.anchor_info(anchor)?.road?;
    if road_end.road != road {
        return None;
    }
    let geometry = graph.road_geometry(road)?;
    let anchor_distance = match road_end.end {
        RoadEndpoint::Start => 0.0,
        RoadEndpoint::End => geometry.length(),
    };

    if towards_entry {
        let mut samples = road_slice(geometry, anchor_distance, entry.distance_along);
        if let Some(last) = samples.last_mut() {
            last.position = entry.position;
        }
        Some(samples)
    } else {
        entry_slice(graph, road, entry, anchor_distance, None)
    }
}

/// Straight segment subdivided every `step`, with ups interpolated between
/// the two ends.
fn straight_connector(
    from: DVec3,
    from_up: DVec3,
    to: DVec3,
    to_up: DVec3,
    step: f64,
) -> Result<Vec<OrientedPoint>> {
    let length = from.distance(to);
    let forward = (to - from).try_normalize().unwrap_or(WORLD_FORWARD);
    let divisions = (length / step).ceil();
    if !(divisions <= MAX_CONNECTOR_DIVISIONS as f64) {
        return Err(Error::ConnectorTooDense {
            length,
            step,
            limit: MAX_CONNECTOR_DIVISIONS,
        });
    }
    let divisions = (divisions as usize).max(1);
    Ok((0..=divisions)
        .map(|index| {
            let fraction = index as f64 / divisions as f64;
            let up = from_up
                .lerp(to_up, fraction)
                .try_normalize()
                .unwrap_or(from_up);
            OrientedPoint::new(from.lerp(to, fraction), forward, up)
        })
        .collect())
}

fn connect_endpoints(
    points: Vec<OrientedPoint>,
    start: DVec3,
    goal: DVec3,
    threshold: f64,
    step: f64,
) -> Result<Vec<OrientedPoint>> {
    let Some(&first) = points.first() else {
        return Ok(points);
    };
    let mut connected = Vec::with_capacity(points.len());
    if first.position.distance(start) > threshold {
        for sample in straight_connector(start, first.up, first.position, first.up, step)? {
            push_point(&mut connected, sample);
        }
    }
    for point in points {
        push_point(&mut connected, point);
    }

    if let Some(&last) = connected.last() {
        if last.position.distance(goal) > threshold {
            for sample in straight_connector(last.position, last.up, goal, last.up, step)? {
                push_point(&mut connected, sample);
            }
        }
    }
    Ok(connected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::WORLD_UP;

    #[test]
    fn straight_connector_hits_both_ends() {
        let from = DVec3::ZERO;
        let to = DVec3::new(0.0, 0.0, 2.5);
        let samples = straight_connector(from, WORLD_UP, to, WORLD_UP, 1.0).unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].position, from);
        assert_eq!(samples[3].position, to);
        assert!(samples.iter().all(|s| s.forward == DVec3::Z));
    }

    #[test]
    fn oversubdivided_connector_is_rejected() {
        let to = DVec3::new(0.0, 0.0, 2.5);
        assert!(matches!(
            straight_connector(DVec3::ZERO, WORLD_UP, to, WORLD_UP, 1e-12),
            Err(Error::ConnectorTooDense { .. })
        ));
        assert!(straight_connector(DVec3::ZERO, WORLD_UP, to, WORLD_UP, 0.0).is_err());
    }

    #[test]
    fn push_point_drops_duplicates() {
        let mut points = Vec::new();
        let sample = OrientedPoint::new(DVec3::ONE, WORLD_FORWARD, WORLD_UP);
        push_point(&mut points, sample);
        push_point(&mut points, sample);
        assert_eq!(points.len(), 1);
    }
}
