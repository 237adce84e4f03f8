//! Output formatting for path and edge reports.

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use roadnav_lib::{Feature, GraphEdge, GraphNode, NavigationPath};
use serde::Serialize;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

#[derive(Serialize)]
struct EdgeReport<'a> {
    node_count: usize,
    edges: &'a [GraphEdge],
}

/// Short label for a graph node.
pub fn describe_node(node: &GraphNode) -> String {
    match node {
        GraphNode::Intersection(id) => format!("intersection {id}"),
        GraphNode::Anchor(id) => format!("anchor {id}"),
        GraphNode::EntryExit(entry) => match entry.feature {
            Feature::Road(road) => {
                format!("road {road} at {:.3}", entry.distance_along)
            }
            Feature::AnchorLine(anchor) => {
                format!("anchor line {anchor} at {:.3}", entry.distance_along)
            }
        },
    }
}

/// Render a path query result.
pub fn render_path<W: Write>(
    path: &NavigationPath,
    format: OutputFormat,
    writer: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, path)?;
            writeln!(writer)?;
        }
        OutputFormat::Text => {
            writeln!(
                writer,
                "Path: {} points, cost {:.3}, {} search steps",
                path.points.len(),
                path.cost,
                path.steps
            )?;
            writeln!(writer, "Nodes:")?;
            for node in &path.nodes {
                writeln!(writer, "- {}", describe_node(node))?;
            }
            writeln!(writer, "Points:")?;
            for point in &path.points {
                let p = point.position;
                writeln!(writer, "  {:.3} {:.3} {:.3}", p.x, p.y, p.z)?;
            }
        }
    }
    Ok(())
}

/// Render the persistent edge list.
pub fn render_edges<W: Write>(
    node_count: usize,
    edges: &[GraphEdge],
    format: OutputFormat,
    writer: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, &EdgeReport { node_count, edges })?;
            writeln!(writer)?;
        }
        OutputFormat::Text => {
            writeln!(writer, "Graph: {} nodes, {} edges", node_count, edges.len())?;
            for edge in edges {
                writeln!(
                    writer,
                    "{:>4} -> {:<4} {:<8} {:.3}",
                    edge.from, edge.to, edge.kind, edge.cost
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use roadnav_lib::{EdgeKind, IntersectionId, OrientedPoint};

    #[test]
    fn text_path_lists_nodes_and_points() {
        let path = NavigationPath {
            points: vec![
                OrientedPoint::new(DVec3::ZERO, DVec3::X, DVec3::Y),
                OrientedPoint::new(DVec3::X, DVec3::X, DVec3::Y),
            ],
            nodes: vec![GraphNode::Intersection(IntersectionId(3))],
            cost: 1.0,
            steps: 2,
        };
        let mut buffer = Vec::new();
        render_path(&path, OutputFormat::Text, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("Path: 2 points, cost 1.000, 2 search steps"));
        assert!(text.contains("- intersection #3"));
        assert!(text.contains("  1.000 0.000 0.000"));
    }

    #[test]
    fn json_edges_include_kind() {
        let edges = [GraphEdge {
            from: 0,
            to: 1,
            from_position: DVec3::ZERO,
            to_position: DVec3::X,
            cost: 1.0,
            kind: EdgeKind::Radial,
        }];
        let mut buffer = Vec::new();
        render_edges(2, &edges, OutputFormat::Json, &mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(value["node_count"], 2);
        assert_eq!(value["edges"][0]["kind"], "radial");
    }
}
