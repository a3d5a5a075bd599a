//! BloodChain server binary.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 BLOODCHAIN                    │
//!                    │                                               │
//!   Client Request   │  ┌────────┐    ┌──────────────┐              │
//!   ─────────────────┼─▶│  http  │───▶│   donation   │              │
//!                    │  │ server │    │   recorder   │              │
//!                    │  └────────┘    └──────┬───────┘              │
//!                    │                       │                      │
//!                    │          ┌────────────┼─────────────┐        │
//!                    │          ▼                          ▼        │
//!                    │   ┌─────────────┐          ┌──────────────┐  │
//!                    │   │ state store │          │ledger client │──┼──▶ Ledger
//!                    │   │ (lock-owned)│          │ (sign+commit)│  │    Network
//!                    │   └─────────────┘          └──────────────┘  │
//!                    │                                               │
//!                    │  Cross-cutting: config, observability         │
//!                    └──────────────────────────────────────────────┘
//! ```
//!
//! Donations always land in the state store; certificate issuance is
//! best-effort. Without a deployment descriptor the service runs in
//! degraded local-only mode and certificates stay unissued.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use bloodchain::config::{load_config, load_deployment, AppConfig};
use bloodchain::donation::DonationRecorder;
use bloodchain::ledger::{IssuerWallet, LedgerClient};
use bloodchain::{AppState, HttpServer, StateStore};

#[derive(Parser, Debug)]
#[command(name = "bloodchain", about = "Blood donation certificate service")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply without it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration before logging so the configured filter applies.
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    bloodchain::observability::logging::init(&config.observability.log_filter);

    tracing::info!("bloodchain v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        ledger_api_url = %config.ledger.api_url,
        "Configuration loaded"
    );

    let store = Arc::new(StateStore::new());

    // The deployment descriptor decides whether the ledger integration
    // is active; its absence selects degraded local-only mode.
    let ledger = match load_deployment(Path::new(&config.deployment.descriptor_path)) {
        Some(descriptor) => {
            tracing::info!(
                network = %descriptor.network,
                deployer = descriptor.deployer.as_deref().unwrap_or("unknown"),
                "Deployment descriptor found, activating ledger integration"
            );
            let issuer = IssuerWallet::load_or_generate();
            match LedgerClient::new(&config.ledger, issuer) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Ledger client initialization failed, certificates will be stored locally"
                    );
                    None
                }
            }
        }
        None => {
            tracing::warn!(
                descriptor_path = %config.deployment.descriptor_path,
                "No deployment descriptor found, certificates will be stored locally"
            );
            None
        }
    };

    let recorder = Arc::new(DonationRecorder::new(store.clone(), ledger.clone()));
    let state = AppState {
        store,
        recorder,
        ledger,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "BloodChain server listening");

    HttpServer::new(state).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
