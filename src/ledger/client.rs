//! HTTP client for the certificate ledger endpoint.
//!
//! # Responsibilities
//! - Build, sign and submit certificate transactions for commit
//! - Fetch and verify previously committed certificates
//! - Reassign certificate ownership
//! - Apply an explicit deadline to every network call
//!
//! Every call is a single-shot async operation; dropping the future
//! aborts the underlying request, so caller-side cancellation never
//! leaks a wait.

use std::time::Duration;

use tokio::time::timeout;
use url::Url;

use crate::config::schema::LedgerConfig;
use crate::ledger::keys::{IssuerWallet, Keypair};
use crate::ledger::transaction::{
    make_create_transaction, make_transfer_transaction, next_certificate_number, sign_transaction,
    CertificateAsset, Transaction, TxMetadata, CERTIFICATE_TYPE, ISSUER_LABEL,
};
use crate::ledger::types::{
    AssetMatch, IssueReceipt, LedgerError, LedgerResult, TransferReceipt, VerifiedCertificate,
    VerifyOutcome,
};
use crate::store::BloodType;

/// Fields a certificate is minted from.
#[derive(Debug, Clone)]
pub struct CertificateRequest {
    pub donor_id: u64,
    pub donor_name: String,
    pub blood_type: BloodType,
    pub quantity: u32,
    pub location: String,
    pub hospital_id: Option<String>,
    pub donation_type: Option<String>,
    pub notes: Option<String>,
}

/// Client for the ledger network endpoint. Holds one connection pool
/// and the persistent issuer identity for its lifetime.
pub struct LedgerClient {
    http: reqwest::Client,
    base_url: Url,
    issuer: IssuerWallet,
    commit_timeout: Duration,
    request_timeout: Duration,
}

impl LedgerClient {
    /// Create a client against the configured ledger endpoint.
    pub fn new(config: &LedgerConfig, issuer: IssuerWallet) -> LedgerResult<Self> {
        // Url::join treats the last path segment as a file unless the
        // base ends with a slash.
        let mut api_url = config.api_url.clone();
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        let base_url: Url = api_url
            .parse()
            .map_err(|e| LedgerError::Http(format!("invalid ledger URL '{api_url}': {e}")))?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LedgerError::Http(e.to_string()))?;

        tracing::info!(
            api_url = %base_url,
            issuer_public_key = %issuer.public_key_hex(),
            "Ledger client initialized"
        );

        Ok(Self {
            http,
            base_url,
            issuer,
            commit_timeout: Duration::from_secs(config.commit_timeout_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// The persistent issuer's public key.
    pub fn issuer_public_key(&self) -> String {
        self.issuer.public_key_hex()
    }

    /// Issue a donor certificate: build a CREATE transaction owned by
    /// the issuer, sign it and block until the ledger commits it.
    pub async fn issue(&self, request: CertificateRequest) -> LedgerResult<IssueReceipt> {
        let certificate_number = next_certificate_number();
        let asset = CertificateAsset {
            kind: CERTIFICATE_TYPE.to_string(),
            donor_id: request.donor_id.to_string(),
            donor_name: request.donor_name,
            blood_type: request.blood_type,
            donation_date: crate::now_rfc3339(),
            location: request.location,
            quantity: request.quantity,
            certificate_number: certificate_number.clone(),
            issuer: ISSUER_LABEL.to_string(),
            verified: true,
        };
        let metadata = TxMetadata::new(request.hospital_id, request.donation_type, request.notes);

        let unsigned =
            make_create_transaction(asset, &metadata, &self.issuer.public_key_hex())?;
        let signed = sign_transaction(unsigned, self.issuer.keypair())?;
        let transaction_id = signed
            .id
            .clone()
            .ok_or_else(|| LedgerError::Encoding("signed transaction has no id".to_string()))?;

        self.submit_commit(&signed).await?;

        tracing::info!(
            transaction_id = %transaction_id,
            certificate_number = %certificate_number,
            "Certificate issued on ledger"
        );
        Ok(IssueReceipt {
            transaction_id,
            certificate_number,
            issuer_public_key: self.issuer.public_key_hex(),
        })
    }

    /// Fetch a certificate by transaction id. Read-only and idempotent;
    /// an unknown id yields `VerifyOutcome::NotFound`, not an error.
    pub async fn verify(&self, transaction_id: &str) -> LedgerResult<VerifyOutcome> {
        let Some(tx) = self.fetch_transaction(transaction_id).await? else {
            return Ok(VerifyOutcome::NotFound);
        };
        let certificate = tx.certificate().cloned().ok_or_else(|| {
            LedgerError::Encoding(format!(
                "transaction {transaction_id} carries no certificate payload"
            ))
        })?;
        let timestamp = tx
            .metadata
            .get("timestamp")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let verified = certificate.verified;
        Ok(VerifyOutcome::Found(VerifiedCertificate {
            certificate,
            metadata: tx.metadata,
            timestamp,
            verified,
        }))
    }

    /// Transfer certificate ownership to a new key holder. Consumes
    /// output 0 of the creation transaction, signed by the current
    /// owner.
    pub async fn transfer(
        &self,
        transaction_id: &str,
        current_owner: &Keypair,
        new_owner_public_key: &str,
    ) -> LedgerResult<TransferReceipt> {
        let create_tx = self
            .fetch_transaction(transaction_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(transaction_id.to_string()))?;

        let unsigned =
            make_transfer_transaction(&create_tx, new_owner_public_key, crate::now_rfc3339())?;
        let signed = sign_transaction(unsigned, current_owner)?;
        let transfer_id = signed
            .id
            .clone()
            .ok_or_else(|| LedgerError::Encoding("signed transaction has no id".to_string()))?;

        self.submit_commit(&signed).await?;

        tracing::info!(
            source_transaction = %transaction_id,
            transfer_transaction = %transfer_id,
            "Certificate ownership transferred"
        );
        Ok(TransferReceipt {
            transaction_id: transfer_id,
        })
    }

    /// Free-form asset search pass-through.
    pub async fn search(&self, query: &str) -> LedgerResult<Vec<AssetMatch>> {
        let url = self.endpoint("assets")?;
        let fut = async {
            let resp = self
                .http
                .get(url)
                .query(&[("search", query)])
                .send()
                .await
                .map_err(|e| LedgerError::Http(e.to_string()))?;
            if !resp.status().is_success() {
                return Err(LedgerError::Rejected(format!(
                    "asset search failed with status {}",
                    resp.status()
                )));
            }
            resp.json::<Vec<AssetMatch>>()
                .await
                .map_err(|e| LedgerError::Encoding(e.to_string()))
        };
        match timeout(self.request_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout(self.request_timeout.as_secs())),
        }
    }

    async fn fetch_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>> {
        let url = self.endpoint(&format!("transactions/{transaction_id}"))?;
        let fut = async {
            let resp = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| LedgerError::Http(e.to_string()))?;
            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !resp.status().is_success() {
                return Err(LedgerError::Http(format!(
                    "transaction fetch failed with status {}",
                    resp.status()
                )));
            }
            resp.json::<Transaction>()
                .await
                .map(Some)
                .map_err(|e| LedgerError::Encoding(e.to_string()))
        };
        match timeout(self.request_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout(self.request_timeout.as_secs())),
        }
    }

    /// Submit a signed transaction and wait for durable commit.
    async fn submit_commit(&self, tx: &Transaction) -> LedgerResult<()> {
        let url = self.endpoint("transactions")?;
        let fut = async {
            let resp = self
                .http
                .post(url)
                .query(&[("mode", "commit")])
                .json(tx)
                .send()
                .await
                .map_err(|e| LedgerError::Http(e.to_string()))?;
            if resp.status().is_success() {
                Ok(())
            } else {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                Err(LedgerError::Rejected(format!("{status}: {body}")))
            }
        };
        match timeout(self.commit_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout(self.commit_timeout.as_secs())),
        }
    }

    fn endpoint(&self, path: &str) -> LedgerResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| LedgerError::Http(format!("invalid endpoint path '{path}': {e}")))
    }
}

impl std::fmt::Debug for LedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerClient")
            .field("base_url", &self.base_url.as_str())
            .field("issuer_public_key", &self.issuer.public_key_hex())
            .field("commit_timeout", &self.commit_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> LedgerClient {
        let config = LedgerConfig {
            // No trailing slash on purpose; new() must normalize it.
            api_url: "http://localhost:9984/api/v1".to_string(),
            commit_timeout_secs: 30,
            request_timeout_secs: 10,
        };
        LedgerClient::new(&config, IssuerWallet::from_keypair(Keypair::generate())).unwrap()
    }

    #[test]
    fn test_endpoint_joins_relative_paths() {
        let client = test_client();
        assert_eq!(
            client.endpoint("transactions").unwrap().as_str(),
            "http://localhost:9984/api/v1/transactions"
        );
        assert_eq!(
            client.endpoint("transactions/abc").unwrap().as_str(),
            "http://localhost:9984/api/v1/transactions/abc"
        );
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let config = LedgerConfig {
            api_url: "not a url".to_string(),
            commit_timeout_secs: 30,
            request_timeout_secs: 10,
        };
        let result = LedgerClient::new(&config, IssuerWallet::from_keypair(Keypair::generate()));
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_hides_private_material() {
        let rendered = format!("{:?}", test_client());
        assert!(rendered.contains("issuer_public_key"));
        assert!(!rendered.contains("signing"));
    }
}
