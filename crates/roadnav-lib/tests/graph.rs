mod common;

use glam::DVec3;
use roadnav_lib::graph::COINCIDENCE_EPSILON;
use roadnav_lib::{
    EdgeKind, Error, Feature, GraphNode, NavigationConfig, Road, RoadGraph, WeightMatrix,
};

use common::{island_network, straight_road_network, two_road_network};

fn build(network: &roadnav_lib::RoadNetwork) -> RoadGraph {
    RoadGraph::construct(network, &NavigationConfig::default()).expect("graph builds")
}

#[test]
fn nodes_follow_intersection_then_anchor_order() {
    let fixture = two_road_network();
    let graph = build(&fixture.network);
    let [west, middle, east] = fixture.hubs;
    let [a0, a1, a2, a3] = fixture.anchors;

    assert_eq!(graph.node_count(), 7);
    assert_eq!(
        graph.nodes(),
        &[
            GraphNode::Intersection(west),
            GraphNode::Anchor(a0),
            GraphNode::Intersection(middle),
            GraphNode::Anchor(a1),
            GraphNode::Anchor(a2),
            GraphNode::Intersection(east),
            GraphNode::Anchor(a3),
        ]
    );
    assert_eq!(graph.anchor_node(a2), Some(4));
    assert_eq!(graph.intersection_node(east), Some(5));
}

#[test]
fn road_edges_use_arc_length() {
    let fixture = two_road_network();
    let graph = build(&fixture.network);
    let [a0, a1, a2, a3] = fixture.anchors.map(|anchor| graph.anchor_node(anchor).unwrap());
    let weights = graph.weights();

    let straight = weights.get(a0, a1).expect("in range");
    assert!((straight - 10.0).abs() < 1e-9);

    let arched = weights.get(a2, a3).expect("in range");
    let geometry = graph.road_geometry(fixture.roads[1]).expect("road cached");
    assert_eq!(arched, geometry.length());
    assert!(arched > 10.0, "arc length must exceed the chord");
    assert_eq!(weights.get(a3, a2), Some(arched));
}

#[test]
fn radial_and_fallback_edges() {
    let fixture = two_road_network();
    let graph = build(&fixture.network);
    let weights = graph.weights();
    let middle = graph.intersection_node(fixture.hubs[1]).unwrap();
    let a1 = graph.anchor_node(fixture.anchors[1]).unwrap();
    let west = graph.intersection_node(fixture.hubs[0]).unwrap();
    let east = graph.intersection_node(fixture.hubs[2]).unwrap();

    assert!((weights.get(a1, middle).unwrap() - 2.0).abs() < 1e-12);
    assert!((weights.get(west, east).unwrap() - 280.0).abs() < 1e-9);
    assert_eq!(graph.edge_kind(a1, middle), Some(EdgeKind::Radial));
    assert_eq!(graph.edge_kind(west, east), Some(EdgeKind::Fallback));
    assert_eq!(graph.edge_kind(west, west), None);
}

#[test]
fn edges_are_classified() {
    let fixture = two_road_network();
    let graph = build(&fixture.network);
    let edges = graph.edges();

    assert_eq!(edges.len(), 21);
    let count = |kind| edges.iter().filter(|edge| edge.kind == kind).count();
    assert_eq!(count(EdgeKind::Radial), 4);
    assert_eq!(count(EdgeKind::Road), 2);
    assert_eq!(count(EdgeKind::Fallback), 15);
    assert_eq!(graph.fallback_edge_count(), 15);
    assert!(edges.iter().all(|edge| edge.cost.is_finite() && edge.from < edge.to));
}

#[test]
fn island_pairs_get_scaled_fallback() {
    let network = island_network();
    let config = NavigationConfig {
        distance_factor: 3.0,
        ..NavigationConfig::default()
    };
    let graph = RoadGraph::construct(&network, &config).expect("graph builds");

    // anchors at x = 1 and x = 9
    let left = graph.anchor_node(network.intersections[0].anchors[0]).unwrap();
    let right = graph.anchor_node(network.intersections[1].anchors[0]).unwrap();
    assert!((graph.weights().get(left, right).unwrap() - 24.0).abs() < 1e-9);
    assert_eq!(graph.edge_kind(left, right), Some(EdgeKind::Fallback));
}

#[test]
fn malformed_road_fails_the_whole_build() {
    let mut network = straight_road_network();
    network.add_road(Road::new(
        vec![DVec3::ZERO, DVec3::X, DVec3::Y],
        vec![DVec3::Y],
    ));
    let error = RoadGraph::construct(&network, &NavigationConfig::default())
        .expect_err("road with three control points");
    assert!(matches!(
        error,
        Error::MalformedRoad {
            control_points: 3,
            ..
        }
    ));
}

#[test]
fn invalid_config_is_rejected() {
    let config = NavigationConfig {
        step_size: -1.0,
        ..NavigationConfig::default()
    };
    assert!(matches!(
        RoadGraph::construct(&straight_road_network(), &config),
        Err(Error::InvalidSpacing { .. })
    ));
}

#[test]
fn distance_factor_below_one_is_rejected() {
    for factor in [-1.0, 0.5, f64::NAN, f64::INFINITY] {
        let config = NavigationConfig {
            distance_factor: factor,
            ..NavigationConfig::default()
        };
        assert!(
            matches!(
                RoadGraph::construct(&island_network(), &config),
                Err(Error::InvalidDistanceFactor { .. })
            ),
            "factor {factor} accepted"
        );
    }
}

#[test]
fn fallback_cost_scales_with_distance_factor() {
    let config = NavigationConfig {
        distance_factor: 1.0,
        ..NavigationConfig::default()
    };
    let graph = RoadGraph::construct(&island_network(), &config).expect("graph builds");
    let fallback = graph
        .edges()
        .into_iter()
        .find(|edge| edge.kind == EdgeKind::Fallback)
        .expect("island has fallback edges");
    let straight = fallback.from_position.distance(fallback.to_position);
    assert!((fallback.cost - straight).abs() < 1e-9);
}

#[test]
fn resolve_prefers_road_interior() {
    let graph = build(&straight_road_network());
    let entry = graph.resolve(DVec3::new(4.0, 0.0, 0.3)).expect("resolves");

    assert!(matches!(entry.feature, Feature::Road(_)));
    assert!((entry.distance_along - 4.0).abs() < 1e-6);
    assert!(entry.position.distance(DVec3::new(4.0, 0.0, 0.0)) < 1e-6);
    assert!(entry.forward.distance(DVec3::X) < 1e-9);
}

#[test]
fn coincident_road_endpoint_is_nudged_inwards() {
    let graph = build(&straight_road_network());
    let end = DVec3::new(10.0, 0.0, 0.0);
    let entry = graph.nudge(graph.resolve(end).expect("resolves"));

    assert!((entry.distance_along - 9.99).abs() < 1e-6);
    assert!(entry.position.distance(end) > COINCIDENCE_EPSILON);
    assert!((entry.position.x - entry.distance_along).abs() < 1e-6);
}

#[test]
fn hub_query_resolves_to_anchor_line_and_is_nudged() {
    let fixture = two_road_network();
    let graph = build(&fixture.network);
    let entry = graph.nudge(graph.resolve(DVec3::new(12.0, 0.0, 0.5)).expect("resolves"));

    assert_eq!(entry.feature, Feature::AnchorLine(fixture.anchors[1]));
    assert!((entry.distance_along - 1.99).abs() < 1e-9);
    assert!(entry.position.distance(DVec3::new(11.99, 0.0, 0.0)) < 1e-9);
}

#[test]
fn points_outside_every_feature_are_invalid() {
    let graph = build(&island_network());
    assert!(matches!(
        graph.resolve(DVec3::new(5.0, 0.0, 0.0)),
        Err(Error::InvalidQuery { .. })
    ));
    assert!(matches!(
        graph.resolve(DVec3::new(f64::NAN, 0.0, 0.0)),
        Err(Error::InvalidQuery { .. })
    ));
}
