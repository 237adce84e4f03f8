//! Shared network fixtures for integration tests.

use std::path::PathBuf;

use glam::{DQuat, DVec3};
use roadnav_lib::{AnchorId, IntersectionId, Road, RoadEndpoint, RoadId, RoadNetwork};

/// Path to fixtures directory used by tests.
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// Handles into [`two_road_network`].
#[allow(dead_code)]
pub struct TwoRoads {
    pub network: RoadNetwork,
    pub hubs: [IntersectionId; 3],
    pub anchors: [AnchorId; 4],
    pub roads: [RoadId; 2],
}

/// Hub at `position` with a single anchor at `anchor`.
#[allow(dead_code)]
pub fn hub_with_anchor(
    network: &mut RoadNetwork,
    position: DVec3,
    anchor: DVec3,
    radius: f64,
) -> (IntersectionId, AnchorId) {
    let hub = network.add_intersection(position, radius);
    let anchor = network
        .add_anchor(hub, anchor, DQuat::IDENTITY)
        .expect("hub exists");
    (hub, anchor)
}

/// A 10-unit straight road along +X from `(0,0,0)`, bound at both ends to
/// hubs at `x = -2` and `x = 12`.
#[allow(dead_code)]
pub fn straight_road_network() -> RoadNetwork {
    let mut network = RoadNetwork::new();
    let (_, start) = hub_with_anchor(&mut network, DVec3::new(-2.0, 0.0, 0.0), DVec3::ZERO, 1.5);
    let (_, end) = hub_with_anchor(
        &mut network,
        DVec3::new(12.0, 0.0, 0.0),
        DVec3::new(10.0, 0.0, 0.0),
        1.5,
    );
    let road = network.add_road(Road::straight(DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0)));
    network.link(start, road, RoadEndpoint::Start).expect("link start");
    network.link(end, road, RoadEndpoint::End).expect("link end");
    network
}

/// Straight road `0 -> 10` and an arched road `14 -> 24` meeting at a shared
/// hub at `x = 12`. Matches `docs/fixtures/sample_network.json`.
#[allow(dead_code)]
pub fn two_road_network() -> TwoRoads {
    let mut network = RoadNetwork::new();
    let (west, a0) = hub_with_anchor(&mut network, DVec3::new(-2.0, 0.0, 0.0), DVec3::ZERO, 1.5);
    let middle = network.add_intersection(DVec3::new(12.0, 0.0, 0.0), 1.5);
    let a1 = network
        .add_anchor(middle, DVec3::new(10.0, 0.0, 0.0), DQuat::IDENTITY)
        .expect("hub exists");
    let a2 = network
        .add_anchor(middle, DVec3::new(14.0, 0.0, 0.0), DQuat::IDENTITY)
        .expect("hub exists");
    let (east, a3) = hub_with_anchor(
        &mut network,
        DVec3::new(26.0, 0.0, 0.0),
        DVec3::new(24.0, 0.0, 0.0),
        1.5,
    );

    let straight = network.add_road(Road::straight(DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0)));
    let arched = network.add_road(Road::new(
        vec![
            DVec3::new(14.0, 0.0, 0.0),
            DVec3::new(17.0, 0.0, 3.0),
            DVec3::new(21.0, 0.0, 3.0),
            DVec3::new(24.0, 0.0, 0.0),
        ],
        vec![DVec3::Y, DVec3::Y],
    ));
    network.link(a0, straight, RoadEndpoint::Start).expect("link");
    network.link(a1, straight, RoadEndpoint::End).expect("link");
    network.link(a2, arched, RoadEndpoint::Start).expect("link");
    network.link(a3, arched, RoadEndpoint::End).expect("link");

    TwoRoads {
        network,
        hubs: [west, middle, east],
        anchors: [a0, a1, a2, a3],
        roads: [straight, arched],
    }
}

/// Two hubs ten units apart with one anchor each and no road between them.
#[allow(dead_code)]
pub fn island_network() -> RoadNetwork {
    let mut network = RoadNetwork::new();
    hub_with_anchor(&mut network, DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0), 1.0);
    hub_with_anchor(
        &mut network,
        DVec3::new(10.0, 0.0, 0.0),
        DVec3::new(9.0, 0.0, 0.0),
        1.0,
    );
    network
}
