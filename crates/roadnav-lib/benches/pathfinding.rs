use criterion::{criterion_group, criterion_main, Criterion};
use glam::{DQuat, DVec3};
use once_cell::sync::Lazy;
use roadnav_lib::{
    evenly_spaced_points, HeuristicKind, NavigationConfig, Navigator, Road, RoadEndpoint,
    RoadNetwork,
};
use std::hint::black_box;

const GRID: usize = 6;
const SPACING: f64 = 20.0;
const ARM: f64 = 3.0;

/// `GRID x GRID` intersections with four anchors each; neighbours are joined
/// by gently arched roads.
fn grid_network() -> RoadNetwork {
    let mut network = RoadNetwork::new();
    let mut east = Vec::new();
    let mut west = Vec::new();
    let mut north = Vec::new();
    let mut south = Vec::new();

    for row in 0..GRID {
        for column in 0..GRID {
            let center = DVec3::new(column as f64 * SPACING, 0.0, row as f64 * SPACING);
            let hub = network.add_intersection(center, ARM * 1.5);
            let mut anchor = |offset: DVec3| {
                network
                    .add_anchor(hub, center + offset, DQuat::IDENTITY)
                    .expect("hub exists")
            };
            east.push(anchor(DVec3::X * ARM));
            west.push(anchor(-DVec3::X * ARM));
            north.push(anchor(DVec3::Z * ARM));
            south.push(anchor(-DVec3::Z * ARM));
        }
    }

    let arch = |from: DVec3, to: DVec3| {
        let bend = DVec3::Y * 2.0;
        Road::new(
            vec![
                from,
                from.lerp(to, 1.0 / 3.0) + bend,
                from.lerp(to, 2.0 / 3.0) + bend,
                to,
            ],
            vec![DVec3::Y, DVec3::Y],
        )
    };

    for row in 0..GRID {
        for column in 0..GRID {
            let index = row * GRID + column;
            if column + 1 < GRID {
                let (from, to) = (east[index], west[index + 1]);
                let road = network.add_road(arch(
                    network.anchors[from.0].position,
                    network.anchors[to.0].position,
                ));
                network.link(from, road, RoadEndpoint::Start).expect("link");
                network.link(to, road, RoadEndpoint::End).expect("link");
            }
            if row + 1 < GRID {
                let (from, to) = (north[index], south[index + GRID]);
                let road = network.add_road(arch(
                    network.anchors[from.0].position,
                    network.anchors[to.0].position,
                ));
                network.link(from, road, RoadEndpoint::Start).expect("link");
                network.link(to, road, RoadEndpoint::End).expect("link");
            }
        }
    }
    network
}

static NETWORK: Lazy<RoadNetwork> = Lazy::new(grid_network);
static NAVIGATOR: Lazy<Navigator> = Lazy::new(|| {
    let mut navigator = Navigator::new(NETWORK.clone());
    navigator
        .construct_graph(&NavigationConfig::default())
        .expect("graph builds");
    navigator
});

fn benchmark_pathfinding(c: &mut Criterion) {
    let navigator = &*NAVIGATOR;
    let far = (GRID - 1) as f64 * SPACING;
    let start = DVec3::new(SPACING / 2.0, 0.5, 0.0);
    let goal = DVec3::new(far, 0.5, far - SPACING / 2.0);

    c.bench_function("construct_graph_grid", |b| {
        let config = NavigationConfig::default();
        b.iter(|| {
            let mut navigator = Navigator::new(NETWORK.clone());
            let graph = navigator.construct_graph(&config).expect("graph builds");
            black_box(graph.node_count())
        });
    });

    c.bench_function("a_star_grid_corner_to_corner", |b| {
        let config = NavigationConfig::default();
        b.iter(|| {
            let path = navigator.find_path(start, goal, &config).expect("path exists");
            black_box(path.points.len())
        });
    });

    c.bench_function("dijkstra_grid_corner_to_corner", |b| {
        let config = NavigationConfig {
            heuristic: HeuristicKind::Zero,
            ..NavigationConfig::default()
        };
        b.iter(|| {
            let path = navigator.find_path(start, goal, &config).expect("path exists");
            black_box(path.steps)
        });
    });

    c.bench_function("evenly_spaced_points_arch", |b| {
        let road = &NETWORK.roads[0];
        b.iter(|| {
            let curve = evenly_spaced_points(&road.control_points, &road.normals, 0.5, 1.0)
                .expect("valid road");
            black_box(curve.len())
        });
    });
}

criterion_group!(benches, benchmark_pathfinding);
criterion_main!(benches);
