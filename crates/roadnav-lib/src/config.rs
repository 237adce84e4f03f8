use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::search::{HeuristicKind, DEFAULT_MAX_SEARCH_STEPS};

/// Tunables for graph construction and path queries.
///
/// `distance_factor`, `step_size` and `resolution` shape the base graph and
/// are read by [`crate::Navigator::construct_graph`]; queries ignore them.
/// The remaining options apply per query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Multiplier on straight-line distance for synthesised fallback edges.
    pub distance_factor: f64,
    /// Arc-length spacing of resampled road points.
    pub step_size: f64,
    /// Sub-step density used while resampling.
    pub resolution: f64,
    /// Query points farther than this from the reconstructed path get a
    /// straight connector.
    pub min_distance_to_connect: f64,
    /// Subdivision step for straight connectors; `None` uses the `step_size`
    /// the graph was built with.
    pub connector_step: Option<f64>,
    /// Ceiling on node expansions per search.
    pub max_search_steps: usize,
    pub heuristic: HeuristicKind,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            distance_factor: 10.0,
            step_size: 1.0,
            resolution: 1.0,
            min_distance_to_connect: 0.5,
            connector_step: None,
            max_search_steps: DEFAULT_MAX_SEARCH_STEPS,
            heuristic: HeuristicKind::Distance,
        }
    }
}

impl NavigationConfig {
    /// Read a JSON configuration; missing fields keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Step used when subdividing straight connectors, falling back to
    /// `default_step` (the spacing the graph was sampled at).
    pub fn connector_step_or(&self, default_step: f64) -> f64 {
        self.connector_step.unwrap_or(default_step)
    }

    /// Reject values the resampler or graph builder cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(Error::InvalidSpacing {
                spacing: self.step_size,
            });
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::InvalidResolution {
                resolution: self.resolution,
            });
        }
        if !(self.distance_factor.is_finite() && self.distance_factor >= 1.0) {
            return Err(Error::InvalidDistanceFactor {
                factor: self.distance_factor,
            });
        }
        self.validate_query()
    }

    /// Check only the options read per query.
    pub fn validate_query(&self) -> Result<()> {
        if let Some(step) = self.connector_step {
            if !(step.is_finite() && step > 0.0) {
                return Err(Error::InvalidSpacing { spacing: step });
            }
        }
        let distance = self.min_distance_to_connect;
        if !(distance.is_finite() && distance >= 0.0) {
            return Err(Error::InvalidConnectDistance { distance });
        }
        Ok(())
    }
}
