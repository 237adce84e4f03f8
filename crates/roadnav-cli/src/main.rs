use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use roadnav_cli::commands::edges::handle_edges_command;
use roadnav_cli::commands::route::{handle_route_command, RouteArgs};
use roadnav_cli::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "Curve-aware road network navigation")]
struct Cli {
    /// Road network JSON file.
    #[arg(long, global = true)]
    network: Option<PathBuf>,

    /// Navigation config JSON file; built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find a path between two world positions.
    Route(RouteArgs),
    /// List every persistent graph edge with its cost.
    Edges,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let network = cli
        .network
        .ok_or_else(|| anyhow::anyhow!("--network <FILE> is required"))?;
    let config = cli.config.as_deref();
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Command::Route(args) => {
            handle_route_command(&network, config, args, cli.format, &mut stdout)
        }
        Command::Edges => handle_edges_command(&network, config, cli.format, &mut stdout),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
