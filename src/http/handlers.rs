//! Request handlers for the donation API.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::donation::{DonationOutcome, DonationRequest};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::ledger::VerifyOutcome;
use crate::store::{Donor, DonorRegistration};

#[derive(Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: &'static str,
    pub donor: Donor,
}

#[derive(Serialize)]
pub struct RecordResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(flatten)]
    pub outcome: DonationOutcome,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn register_donor(
    State(state): State<AppState>,
    Json(registration): Json<DonorRegistration>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let donor = state.store.register_donor(registration)?;
    Ok(Json(RegisterResponse {
        success: true,
        message: "Donor registered successfully",
        donor,
    }))
}

pub async fn record_donation(
    State(state): State<AppState>,
    Json(request): Json<DonationRequest>,
) -> Result<Json<RecordResponse>, ApiError> {
    let outcome = state.recorder.record(request).await?;
    Ok(Json(RecordResponse {
        success: true,
        message: "Donation recorded successfully",
        outcome,
    }))
}

pub async fn get_inventory(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "inventory": state.store.inventory(),
        "lastUpdated": crate::now_rfc3339(),
    }))
}

pub async fn list_donors(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "donors": state.store.list_donors() }))
}

pub async fn get_donor(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let profile = state
        .store
        .donor_profile(&wallet)
        .ok_or_else(|| ApiError::NotFound("Donor not found".to_string()))?;
    Ok(Json(serde_json::json!(profile)))
}

pub async fn list_donations(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "donations": state.store.list_donations() }))
}

/// Verify a certificate by its ledger transaction id. An unknown id is
/// a `success: false` payload, never an error; a missing ledger
/// integration is 503.
pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ledger = state.ledger.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Certificate service not available".to_string())
    })?;

    match ledger.verify(&id).await? {
        VerifyOutcome::Found(found) => Ok(Json(serde_json::json!({
            "success": true,
            "certificate": found.certificate,
            "metadata": found.metadata,
            "timestamp": found.timestamp,
            "verified": found.verified,
        }))),
        VerifyOutcome::NotFound => Ok(Json(serde_json::json!({
            "success": false,
            "message": "Certificate not found",
        }))),
    }
}

pub async fn get_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!(state.store.stats()))
}
