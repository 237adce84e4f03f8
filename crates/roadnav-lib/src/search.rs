use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};
use crate::heap::IndexedMinHeap;
use crate::matrix::WeightMatrix;

/// Default ceiling on node expansions per search.
pub const DEFAULT_MAX_SEARCH_STEPS: usize = 10_000;

/// Edges at or below this cost are treated as absent.
pub const NEGLIGIBLE_WEIGHT: f64 = 1e-6;

/// Estimate of the remaining cost between two nodes.
pub trait Heuristic {
    fn estimate(&self, from: usize, goal: usize) -> f64;
}

/// Always zero; turns A* into Dijkstra's algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroHeuristic;

impl Heuristic for ZeroHeuristic {
    fn estimate(&self, _from: usize, _goal: usize) -> f64 {
        0.0
    }
}

/// Straight-line distance between node positions.
#[derive(Debug, Clone, Copy)]
pub struct DistanceHeuristic<'a> {
    positions: &'a [DVec3],
}

impl<'a> DistanceHeuristic<'a> {
    pub fn new(positions: &'a [DVec3]) -> Self {
        Self { positions }
    }
}

impl Heuristic for DistanceHeuristic<'_> {
    fn estimate(&self, from: usize, goal: usize) -> f64 {
        match (self.positions.get(from), self.positions.get(goal)) {
            (Some(a), Some(b)) => a.distance(*b),
            _ => 0.0,
        }
    }
}

/// Heuristic selector exposed through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicKind {
    /// Straight-line distance (A*).
    #[default]
    Distance,
    /// No estimate (Dijkstra).
    Zero,
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            HeuristicKind::Distance => "distance",
            HeuristicKind::Zero => "zero",
        };
        f.write_str(value)
    }
}

/// Successful search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    /// Node indices from start to goal inclusive.
    pub path: Vec<usize>,
    /// Sum of edge weights along `path`.
    pub cost: f64,
    /// Nodes expanded before the goal was popped.
    pub steps: usize,
}

/// Run A* over `weights` from `start` to `goal`.
///
/// Every non-goal node popped from the open set counts as one step. Once
/// `max_steps` expansions have happened, popping another non-goal node fails
/// with [`Error::StepLimitExceeded`]; an empty open set fails with
/// [`Error::SearchExhausted`].
pub fn find_path_a_star<M, H>(
    weights: &M,
    start: usize,
    goal: usize,
    heuristic: &H,
    max_steps: usize,
) -> Result<SearchOutcome>
where
    M: WeightMatrix + ?Sized,
    H: Heuristic + ?Sized,
{
    let node_count = weights.height();
    if weights.width() != node_count {
        return Err(Error::MatrixSizeMismatch {
            expected: node_count,
            actual: weights.width(),
        });
    }
    for index in [start, goal] {
        if index >= node_count {
            return Err(Error::NodeOutOfRange {
                index,
                len: node_count,
            });
        }
    }

    if start == goal {
        return Ok(SearchOutcome {
            path: vec![start],
            cost: 0.0,
            steps: 0,
        });
    }

    let mut g_score = vec![f64::INFINITY; node_count];
    let mut came_from: Vec<Option<usize>> = vec![None; node_count];
    let mut open = IndexedMinHeap::with_capacity(node_count);

    g_score[start] = 0.0;
    open.insert(start, heuristic.estimate(start, goal))?;

    let mut steps = 0usize;
    while let Some(current) = open.extract_min() {
        if current == goal {
            let path = reconstruct_path(&came_from, start, goal);
            trace!(steps, cost = g_score[goal], nodes = path.len(), "search reached goal");
            return Ok(SearchOutcome {
                path,
                cost: g_score[goal],
                steps,
            });
        }

        if steps >= max_steps {
            return Err(Error::StepLimitExceeded { max_steps });
        }
        steps += 1;

        let current_score = g_score[current];
        for next in 0..node_count {
            if next == current {
                continue;
            }
            let Some(weight) = weights.get(next, current) else {
                continue;
            };
            if !weight.is_finite() || weight <= NEGLIGIBLE_WEIGHT {
                continue;
            }

            let tentative = current_score + weight;
            if tentative < g_score[next] {
                g_score[next] = tentative;
                came_from[next] = Some(current);
                open.insert_or_update(next, tentative + heuristic.estimate(next, goal))?;
            }
        }
    }

    Err(Error::SearchExhausted { start, goal })
}

/// Dijkstra's algorithm: A* with [`ZeroHeuristic`].
pub fn find_path_dijkstra<M>(
    weights: &M,
    start: usize,
    goal: usize,
    max_steps: usize,
) -> Result<SearchOutcome>
where
    M: WeightMatrix + ?Sized,
{
    find_path_a_star(weights, start, goal, &ZeroHeuristic, max_steps)
}

fn reconstruct_path(came_from: &[Option<usize>], start: usize, goal: usize) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(node) = current {
        path.push(node);
        if node == start {
            break;
        }
        current = came_from[node];
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;

    #[test]
    fn negligible_edges_are_ignored() {
        let mut weights = Matrix::new(3, 3);
        weights.set_symmetric(0, 1, 1e-9).unwrap();
        weights.set_symmetric(0, 2, 1.0).unwrap();
        weights.set_symmetric(2, 1, 1.0).unwrap();

        let outcome = find_path_dijkstra(&weights, 0, 1, 100).unwrap();
        assert_eq!(outcome.path, vec![0, 2, 1]);
        assert!((outcome.cost - 2.0).abs() < 1e-12);
    }

    #[test]
    fn heuristic_kind_display_matches_serde() {
        assert_eq!(HeuristicKind::Distance.to_string(), "distance");
        assert_eq!(
            serde_json::to_string(&HeuristicKind::Zero).unwrap(),
            "\"zero\""
        );
    }
}
