//! Ledger error and result definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::transaction::CertificateAsset;

/// Errors that can occur talking to the certificate ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Network request failed.
    #[error("ledger request failed: {0}")]
    Http(String),

    /// Request exceeded its deadline.
    #[error("ledger request timed out after {0} seconds")]
    Timeout(u64),

    /// The ledger refused the submitted transaction.
    #[error("ledger rejected transaction: {0}")]
    Rejected(String),

    /// A referenced transaction does not exist on the ledger.
    #[error("transaction {0} not found on ledger")]
    NotFound(String),

    /// Transaction serialization or payload decoding failed.
    #[error("transaction encoding failed: {0}")]
    Encoding(String),

    /// Invalid key material.
    #[error("key error: {0}")]
    Key(String),

    /// Ledger integration is not configured.
    #[error("ledger not available: {0}")]
    NotAvailable(String),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Outcome of a successful certificate issuance.
///
/// Carries the issuer's public key only; private material never
/// crosses the client boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReceipt {
    pub transaction_id: String,
    pub certificate_number: String,
    pub issuer_public_key: String,
}

/// Outcome of a certificate lookup. An unknown transaction id is a
/// negative outcome, not an error.
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    Found(VerifiedCertificate),
    NotFound,
}

/// A certificate fetched back from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedCertificate {
    pub certificate: CertificateAsset,
    pub metadata: serde_json::Value,
    /// The metadata's own timestamp, when present.
    pub timestamp: Option<String>,
    /// Echo of the asset's verified flag.
    pub verified: bool,
}

/// Outcome of a successful ownership transfer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub transaction_id: String,
}

/// One asset returned from a free-form search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetMatch {
    pub id: String,
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::Timeout(30);
        assert_eq!(err.to_string(), "ledger request timed out after 30 seconds");

        let err = LedgerError::NotFound("abc123".to_string());
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_issue_receipt_carries_public_key_only() {
        let receipt = IssueReceipt {
            transaction_id: "tx".to_string(),
            certificate_number: "BLC-1".to_string(),
            issuer_public_key: "pk".to_string(),
        };
        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["transactionId"], "tx");
        assert!(json.get("issuerPrivateKey").is_none());
    }
}
