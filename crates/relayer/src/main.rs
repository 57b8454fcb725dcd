//! Deposit relayer service.
//!
//! ## Usage
//!
//! ```bash
//! zkbridge-relayer --config relayer.toml
//! ```

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, bail};
use clap::Parser;
use futures::future::select_all;
use tokio::{
    net::TcpListener,
    signal::unix::{SignalKind, signal},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use zkbridge_client::VerifierClient;
use zkbridge_relayer::{
    Config, DepositPipeline, ProofAssembler, ProofGenerator, RelayerService, WitnessBuilder,
    init_metrics, metrics_app,
};
use zkbridge_signer::SigningKey;

#[derive(Parser, Debug)]
#[command(name = "zkbridge-relayer")]
#[command(about = "Relays source-chain deposits to the zkbridge verifier")]
struct Cli {
    /// Config file path.
    #[arg(long, short, default_value = "relayer.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let signer = SigningKey::from_config(&config.signer).context("Failed to load signing key")?;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .build()
        .context("Failed to build HTTP client")?;
    let client = VerifierClient::with_client(config.verifier_url.clone(), http_client)?;

    info!(
        verifier_url = %config.verifier_url,
        watcher_id = %config.watcher_id,
        prover_id = %config.prover_id,
        generator = ?config.generator,
        "Loaded configuration"
    );

    if let Err(e) = client.health().await {
        // The verifier may come up later; submissions fail individually until then.
        error!(error = %e, "Verifier health check failed");
    }

    let pipeline = Arc::new(DepositPipeline::new(
        WitnessBuilder::new(config.watcher_id.clone()),
        ProofAssembler::new(signer, config.prover_id.clone())
            .with_generator(ProofGenerator::from_config(&config.generator)),
        client,
    ));

    let shutdown_token = CancellationToken::new();
    let mut handles = Vec::new();

    // Start metrics endpoint.

    if let Some(port) = config.metrics_port {
        let router = metrics_app(init_metrics()?);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await?;
        info!("Metrics listening on {addr}");

        let shutdown_token = shutdown_token.clone();
        handles.push(tokio::spawn(async move {
            let shutdown = shutdown_token.cancelled_owned();
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "Metrics server error");
            }
        }));
    }

    // Start relayer service.

    {
        let service = RelayerService::new(
            pipeline,
            config.feed.build(),
            config.interval_ms,
            config.max_in_flight,
        );
        let shutdown_token = shutdown_token.clone();

        handles.push(tokio::spawn(async move {
            service.run(shutdown_token).await;
        }));
    }

    info!("All services started, waiting for shutdown signal");

    let mut signals: Vec<_> = [SignalKind::interrupt(), SignalKind::terminate()]
        .into_iter()
        .filter_map(|kind| signal(kind).ok())
        .collect();

    if signals.is_empty() {
        bail!("No shutdown signals could be registered");
    }

    let _ = select_all(signals.iter_mut().map(|s| Box::pin(s.recv()))).await;

    info!("Received shutdown signal, shutting down");

    shutdown_token.cancel();

    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "Service task failed");
        }
    }

    info!("All services stopped, exiting");

    Ok(())
}
