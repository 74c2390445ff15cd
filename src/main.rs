//! URL fetching RPC worker (v1)
//!
//! Accepts MessagePack-encoded HTTP request descriptions, performs each
//! request once against the target URL, and answers with a classified
//! `(success, body, code, headers)` tuple.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌────────────────────────────────────────────────────────┐
//!                   │                     URLFETCHER                          │
//!                   │                                                         │
//!   RPC call        │  ┌───────────┐   ┌──────────┐   ┌──────────┐            │
//!   ────────────────┼─▶│ transport │──▶│   wire   │──▶│  fetch   │            │
//!   (get / post)    │  │  server   │   │  decode  │   │ builder  │            │
//!                   │  └───────────┘   └──────────┘   └────┬─────┘            │
//!                   │                                      │                  │
//!                   │                                      ▼                  │
//!                   │                                ┌──────────┐   outbound  │
//!                   │                                │ executor │───────────▶─┼── target
//!                   │                                │ (client) │◀───────────-┼── server
//!                   │                                └────┬─────┘             │
//!                   │                                     │                   │
//!   4-tuple         │  ┌───────────┐   ┌──────────┐   ┌───▼──────┐            │
//!   ◀───────────────┼──│  worker   │◀──│   wire   │◀──│ classify │            │
//!                   │  │ sink/guard│   │  encode  │   └──────────┘            │
//!                   │  └───────────┘   └──────────┘                           │
//!                   │                                                         │
//!                   │  config · observability · lifecycle                     │
//!                   └────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use urlfetcher::config::{load_config, validation::validate_config, WorkerConfig};
use urlfetcher::lifecycle::{signals, Shutdown};
use urlfetcher::observability::{logging, metrics};
use urlfetcher::{ReqwestClient, Worker, WorkerServer};

#[derive(Parser)]
#[command(name = "urlfetcher")]
#[command(about = "RPC worker that performs HTTP requests on behalf of callers", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => WorkerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(|errors| {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })?;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("urlfetcher v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_redirects = config.client.max_redirects,
        follow_redirects_by_default = config.client.follow_redirects_by_default,
        max_payload_bytes = config.limits.max_payload_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let client = ReqwestClient::from_config(&config.client)?;
    let worker = Arc::new(Worker::new(client, config.limits.clone()));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for calls");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    WorkerServer::new(worker)
        .run(listener, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
