//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, request timeout)
//! - Bind to the listener and serve until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::donation::DonationRecorder;
use crate::http::handlers;
use crate::ledger::LedgerClient;
use crate::store::StateStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StateStore>,
    pub recorder: Arc<DonationRecorder>,
    /// Present only when the deployment descriptor activated the
    /// ledger integration; `None` is degraded local-only mode.
    pub ledger: Option<Arc<LedgerClient>>,
}

/// HTTP server for the donation API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server with the full API surface.
    pub fn new(state: AppState) -> Self {
        let router = Router::new()
            .route("/health", get(handlers::health))
            .route("/api/donors/register", post(handlers::register_donor))
            .route("/api/donations/record", post(handlers::record_donation))
            .route("/api/inventory", get(handlers::get_inventory))
            .route("/api/donors", get(handlers::list_donors))
            .route("/api/donors/{wallet}", get(handlers::get_donor))
            .route("/api/donations", get(handlers::list_donations))
            .route("/api/certificates/{id}", get(handlers::verify_certificate))
            .route("/api/stats", get(handlers::get_stats))
            .layer(TraceLayer::new_for_http())
            // Outlives the ledger commit deadline, so slow commits
            // degrade before the request itself times out.
            .layer(TimeoutLayer::new(Duration::from_secs(60)))
            .with_state(state);

        Self { router }
    }

    /// Serve requests on the listener until a shutdown signal arrives.
    pub async fn run(self, listener: TcpListener) -> std::io::Result<()> {
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
