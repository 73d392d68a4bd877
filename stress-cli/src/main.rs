//! # guac-stress
//!
//! Load and fuzz harness for Guacamole protocol gateways. Acts as a
//! synthetic client: drives a normal session while measuring per-frame
//! timing and throughput, and can optionally hammer the connection with
//! adversarial random traffic.
//!
//! ## Usage
//!
//! ```bash
//! # Passive load: read and measure frames, echo syncs
//! guac-stress --protocol=vnc --hostname=test --port=5901 gateway:4822
//!
//! # Stop cleanly after ten seconds
//! guac-stress --protocol=vnc --hostname=test --time-limit=10000
//!
//! # Active fuzzing of the remote parser
//! guac-stress --protocol=vnc --hostname=test --enable=hammer
//! ```
//!
//! Exit code 0 means the configured time limit was reached; 1 means a
//! configuration error, connection failure, remote-signalled error, or
//! unexpected stream closure.

use std::process::ExitCode;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

mod args;
mod hammer;
mod session;

use session::{Session, SessionEnd};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let options = match args::parse_args(&argv) {
        Ok(options) => options,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Connecting to {}, port {}...", options.host, options.port);
    let connection =
        match stress_client::connect(&options.host, options.port, &options.config).await {
            Ok(connection) => connection,
            Err(e) => {
                tracing::error!("{}", e);
                return ExitCode::FAILURE;
            }
        };
    tracing::info!("Connected.");

    let (reader, writer) = connection.split();
    let session = Session::new(options.time_limit);

    // Writer ownership is partitioned statically: the hammer task takes
    // the write half, or the session loop keeps it for sync echoes.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (writer, hammer_task) = if options.hammer {
        tracing::info!("Hammer mode enabled.");
        let task = hammer::spawn_hammer(writer, StdRng::from_entropy(), None, shutdown_rx);
        (None, Some(task))
    } else {
        (Some(writer), None)
    };

    let report = session.run(reader, writer).await;

    if let Some(task) = hammer_task {
        let _ = shutdown_tx.send(true);
        match task.await {
            Ok(outcome) => tracing::debug!("Hammer finished: {:?}", outcome),
            Err(e) => tracing::warn!("Hammer task failed: {}", e),
        }
    }

    tracing::info!(
        "Disconnected ({} frames measured).",
        report.frames.len()
    );
    match report.end {
        SessionEnd::TimeLimit => ExitCode::SUCCESS,
        SessionEnd::RemoteError(_) | SessionEnd::StreamClosed => ExitCode::FAILURE,
    }
}
