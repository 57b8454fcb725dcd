//! Deposit verifier service.
//!
//! ## Usage
//!
//! ```bash
//! zkbridge-verifier --config verifier.toml --port 5001
//! ```

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use clap::Parser;
use futures::future::select_all;
use tokio::{
    net::TcpListener,
    signal::unix::{SignalKind, signal},
};
use tracing::{info, warn};
use zkbridge_verifier::{AppState, Config, Verifier, app, init_metrics, set_build_info};

/// Command-line interface for the zkbridge verifier.
#[derive(Parser, Debug)]
#[command(name = "zkbridge-verifier")]
#[command(about = "Validates deposit proofs and admits each deposit once", long_about = None)]
struct Cli {
    /// Config file path.
    #[arg(long, short, default_value = "verifier.toml")]
    config: PathBuf,

    /// Port to listen on, overriding the config file.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_ansi(true)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let metrics = init_metrics()?;
    set_build_info(env!("CARGO_PKG_VERSION"));

    let verifier = Verifier::from_config(&config)?;
    info!(
        proof_types = ?verifier.proof_types().map(ToString::to_string).collect::<Vec<_>>(),
        require_recursive_proof = config.require_recursive_proof,
        store = ?config.store,
        "Loaded configuration"
    );
    let router = app(AppState::new(Arc::new(verifier), metrics));

    let port = cli.port.unwrap_or(config.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("zkbridge verifier listening on {addr}");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("zkbridge verifier stopped");
    Ok(())
}

async fn shutdown_signal() {
    let mut signals: Vec<_> = [SignalKind::interrupt(), SignalKind::terminate()]
        .into_iter()
        .filter_map(|kind| signal(kind).ok())
        .collect();

    if signals.is_empty() {
        warn!("No shutdown signals could be registered");
        return std::future::pending().await;
    }

    let _ = select_all(signals.iter_mut().map(|s| Box::pin(s.recv()))).await;

    info!("Received shutdown signal, starting graceful shutdown");
}
