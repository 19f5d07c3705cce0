//! graph-mesh binary: operator commands on stdin, an actor mesh behind them.

use anyhow::{Context, Result};
use clap::Parser;
use graph_mesh::{spawn_mesh, Controller, ReportSink};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "graph-mesh")]
#[command(about = "Directed graph of vertex actors answering connectivity queries by token passing")]
#[command(version)]
struct Args {
    /// Number of vertices in the mesh
    #[arg(value_parser = clap::value_parser!(u8).range(1..=10))]
    vertices: u8,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    info!(vertices = args.vertices, "starting graph mesh");

    let (controller, coordinator) = spawn_mesh(args.vertices as usize, ReportSink::Stdout)
        .context("failed to start actor group")?;

    // Drive commands until the channel closes, a dispatch goes group-fatal,
    // or the operator interrupts us.
    let outcome: graph_mesh::Result<()> = tokio::select! {
        result = command_loop(&controller) => result,
        result = signal::ctrl_c() => {
            info!("interrupt received");
            result.map_err(graph_mesh::MeshError::from)
        }
    };

    // Command-channel breakage tears the group down but is still an orderly
    // exit; only startup failures leave with a non-zero status.
    if let Err(e) = outcome {
        error!(error = %e, "command loop failed, stopping the group");
    }
    coordinator.shutdown().await;
    Ok(())
}

/// Read operator lines from stdin until EOF.
async fn command_loop(controller: &Controller) -> graph_mesh::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        controller.dispatch_line(&line).await?;
    }
    info!("command channel closed");
    Ok(())
}

fn init_logging(args: &Args) {
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();
}
