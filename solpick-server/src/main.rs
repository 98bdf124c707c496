//! Solana payment link backend.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p solpick-server --release
//!
//! # Run with custom config path
//! solpick-server --config /path/to/config.toml
//!
//! # Configure logging level
//! RUST_LOG=debug solpick-server
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `config.toml`)
//! - `HOST` - Override bind address (default: `0.0.0.0`)
//! - `PORT` - Override port (default: `5000`)
//! - `SOLANA_RPC_URL` - Solana JSON-RPC endpoint
//! - `SOLANA_CLUSTER` - Public cluster to use when no RPC URL is set
//! - `HOSTED_PICK_BASE_URL` - Hosted payment page
//! - `RATE_LIMIT_WINDOW`, `RATE_LIMIT_MAX` - Per-IP request budget
//! - `RUST_LOG` - Log level filter (default: `info`)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use solpick::qr::QrOptions;
use solpick_svm::chain::{LedgerHistory, RpcClient};
use solpick_svm::pay::ReferenceVerifier;
use tracing_subscriber::EnvFilter;

use solpick_server::config::ServerConfig;
use solpick_server::handlers::AppState;
use solpick_server::rate_limit::IpRateLimiter;
use solpick_server::store::{MemoryStore, PaymentStore};
use solpick_server::sweeper::spawn_sweeper;
use solpick_server::util::SigDown;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CONFIG", default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Args::parse()).await {
        tracing::error!("Server failed: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    let config = ServerConfig::load_from(&args.config)?;
    let rpc_url = config.resolved_rpc_url();
    tracing::info!(
        host = %config.host,
        port = config.port,
        %rpc_url,
        hosted_pick_base_url = %config.hosted_pick_base_url,
        "Loaded configuration"
    );

    let sig_down = SigDown::try_new()?;
    let shutdown = sig_down.cancellation_token();

    let store = Arc::new(MemoryStore::new(config.payment_ttl()));
    spawn_sweeper(
        sig_down.task_tracker(),
        Arc::clone(&store) as Arc<dyn PaymentStore>,
        config.sweep_interval(),
        shutdown.clone(),
    );

    let limiter = Arc::new(IpRateLimiter::new(&config.rate_limit));
    spawn_limiter_cleanup(&sig_down, Arc::clone(&limiter));

    let rpc = RpcClient::new(rpc_url);
    let state = Arc::new(AppState {
        store,
        verifier: ReferenceVerifier::new(
            Arc::new(rpc) as Arc<dyn LedgerHistory>,
            config.verifier,
        ),
        hosted_pick_base_url: config.hosted_pick_base_url.clone(),
        retry: config.retry.policy(),
        qr: QrOptions::default(),
    });

    let app = solpick_server::build_app(state, limiter);

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on http://{addr}");

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await;

    sig_down.shutdown().await;
    served?;
    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Periodically forgets clients whose rate limit buckets have refilled.
fn spawn_limiter_cleanup(sig_down: &SigDown, limiter: Arc<IpRateLimiter>) {
    let cancel = sig_down.cancellation_token();
    sig_down.task_tracker().spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => limiter.retain_recent(),
            }
        }
    });
}
