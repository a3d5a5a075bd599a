//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;

use bloodchain::config::LedgerConfig;
use bloodchain::donation::DonationRecorder;
use bloodchain::ledger::{IssuerWallet, Keypair, LedgerClient};
use bloodchain::{AppState, HttpServer, StateStore};

type TxMap = Arc<Mutex<HashMap<String, serde_json::Value>>>;

#[derive(Clone)]
struct MockState {
    txs: TxMap,
    failing: Arc<AtomicBool>,
    hanging: Arc<AtomicBool>,
}

/// A programmable in-process ledger endpoint speaking the transaction
/// commit/fetch/search API.
#[derive(Clone)]
pub struct MockLedger {
    pub base_url: String,
    txs: TxMap,
    failing: Arc<AtomicBool>,
    hanging: Arc<AtomicBool>,
}

impl MockLedger {
    /// Make every commit fail with 503.
    #[allow(dead_code)]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every commit stall past any sane deadline.
    #[allow(dead_code)]
    pub fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }

    /// Number of committed transactions.
    #[allow(dead_code)]
    pub fn committed(&self) -> usize {
        self.txs.lock().unwrap().len()
    }
}

/// Start a mock ledger on an ephemeral port.
pub async fn start_mock_ledger() -> MockLedger {
    let state = MockState {
        txs: Arc::new(Mutex::new(HashMap::new())),
        failing: Arc::new(AtomicBool::new(false)),
        hanging: Arc::new(AtomicBool::new(false)),
    };

    let app = Router::new()
        .route("/api/v1/transactions", post(commit_tx))
        .route("/api/v1/transactions/{id}", get(fetch_tx))
        .route("/api/v1/assets", get(search_assets))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockLedger {
        base_url: format!("http://{addr}/api/v1/"),
        txs: state.txs,
        failing: state.failing,
        hanging: state.hanging,
    }
}

async fn commit_tx(
    State(state): State<MockState>,
    Json(tx): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    if state.hanging.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_secs(30)).await;
    }
    if state.failing.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "message": "ledger unavailable" })),
        );
    }
    let id = tx["id"].as_str().unwrap_or_default().to_string();
    state.txs.lock().unwrap().insert(id.clone(), tx);
    (StatusCode::ACCEPTED, Json(serde_json::json!({ "id": id })))
}

async fn fetch_tx(
    State(state): State<MockState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    state
        .txs
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn search_assets(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let query = params
        .get("search")
        .map(|q| q.to_lowercase())
        .unwrap_or_default();
    let matches: Vec<serde_json::Value> = state
        .txs
        .lock()
        .unwrap()
        .values()
        .filter_map(|tx| {
            let data = tx.get("asset")?.get("data")?;
            let rendered = serde_json::to_string(data).ok()?.to_lowercase();
            rendered
                .contains(&query)
                .then(|| serde_json::json!({ "id": tx["id"], "data": data }))
        })
        .collect();
    Json(serde_json::json!(matches))
}

/// Build a ledger client against the given endpoint with short test
/// deadlines.
#[allow(dead_code)]
pub fn test_ledger_client(api_url: &str) -> LedgerClient {
    let config = LedgerConfig {
        api_url: api_url.to_string(),
        commit_timeout_secs: 2,
        request_timeout_secs: 2,
    };
    LedgerClient::new(&config, IssuerWallet::from_keypair(Keypair::generate())).unwrap()
}

/// Start a full BloodChain service on an ephemeral port, optionally
/// wired to a ledger endpoint. Returns the service base URL.
#[allow(dead_code)]
pub async fn start_app(ledger_url: Option<&str>) -> String {
    let store = Arc::new(StateStore::new());
    let ledger = ledger_url.map(|url| Arc::new(test_ledger_client(url)));
    let recorder = Arc::new(DonationRecorder::new(store.clone(), ledger.clone()));
    let state = AppState {
        store,
        recorder,
        ledger,
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        HttpServer::new(state).run(listener).await.unwrap();
    });

    format!("http://{addr}")
}
