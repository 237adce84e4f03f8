//! Route command handler for path queries between two world positions.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use glam::DVec3;
use roadnav_lib::{HeuristicKind, NavigationConfig};
use tracing::info;

use crate::commands::{load_config, prepare_navigator};
use crate::output::{render_path, OutputFormat};

/// Heuristic selector accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HeuristicArg {
    /// Straight-line distance (A*).
    Distance,
    /// No estimate (Dijkstra).
    Zero,
}

impl From<HeuristicArg> for HeuristicKind {
    fn from(value: HeuristicArg) -> Self {
        match value {
            HeuristicArg::Distance => HeuristicKind::Distance,
            HeuristicArg::Zero => HeuristicKind::Zero,
        }
    }
}

/// Arguments for the route command.
#[derive(Args, Debug, Clone)]
pub struct RouteArgs {
    /// Start position as `x,y,z`.
    #[arg(long = "from", value_parser = parse_point, allow_hyphen_values = true)]
    pub from: DVec3,
    /// Goal position as `x,y,z`.
    #[arg(long = "to", value_parser = parse_point, allow_hyphen_values = true)]
    pub to: DVec3,
    /// Override the search step ceiling.
    #[arg(long)]
    pub max_steps: Option<usize>,
    /// Override the search heuristic.
    #[arg(long, value_enum)]
    pub heuristic: Option<HeuristicArg>,
    /// Override the road resampling step.
    #[arg(long)]
    pub step_size: Option<f64>,
    /// Override the fallback edge multiplier (at least 1).
    #[arg(long)]
    pub distance_factor: Option<f64>,
}

impl RouteArgs {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, mut config: NavigationConfig) -> NavigationConfig {
        if let Some(max_steps) = self.max_steps {
            config.max_search_steps = max_steps;
        }
        if let Some(heuristic) = self.heuristic {
            config.heuristic = heuristic.into();
        }
        if let Some(step_size) = self.step_size {
            config.step_size = step_size;
        }
        if let Some(distance_factor) = self.distance_factor {
            config.distance_factor = distance_factor;
        }
        config
    }
}

/// Parse `x,y,z` into a point.
pub fn parse_point(value: &str) -> std::result::Result<DVec3, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid coordinate in '{value}': {err}"))?;
    match parts.as_slice() {
        [x, y, z] => Ok(DVec3::new(*x, *y, *z)),
        _ => Err(format!(
            "expected three comma-separated coordinates, got '{value}'"
        )),
    }
}

/// Handle the route subcommand.
pub fn handle_route_command<W: Write>(
    network_path: &Path,
    config_path: Option<&Path>,
    args: &RouteArgs,
    format: OutputFormat,
    writer: &mut W,
) -> Result<()> {
    let config = args.apply(load_config(config_path)?);
    let navigator = prepare_navigator(network_path, &config)?;

    let path = navigator
        .find_path(args.from, args.to, &config)
        .with_context(|| format!("no path from {} to {}", args.from, args.to))?;
    info!(
        points = path.points.len(),
        cost = path.cost,
        steps = path.steps,
        "route computed"
    );

    render_path(&path, format, writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_point_accepts_three_coordinates() {
        assert_eq!(
            parse_point("1, -2.5,3").unwrap(),
            DVec3::new(1.0, -2.5, 3.0)
        );
        assert!(parse_point("1,2").is_err());
        assert!(parse_point("1,2,x").is_err());
    }

    #[test]
    fn overrides_replace_config_values() {
        let args = RouteArgs {
            from: DVec3::ZERO,
            to: DVec3::X,
            max_steps: Some(7),
            heuristic: Some(HeuristicArg::Zero),
            step_size: None,
            distance_factor: Some(2.0),
        };
        let config = args.apply(NavigationConfig::default());
        assert_eq!(config.max_search_steps, 7);
        assert_eq!(config.heuristic, HeuristicKind::Zero);
        assert_eq!(config.distance_factor, 2.0);
        assert_eq!(config.step_size, NavigationConfig::default().step_size);
    }
}
