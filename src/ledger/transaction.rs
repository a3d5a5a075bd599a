//! Ledger transaction construction and signing.
//!
//! # Responsibilities
//! - Model CREATE (certificate issuance) and TRANSFER (ownership
//!   reassignment) transactions
//! - Canonical encoding, content-derived transaction ids
//! - Detached Ed25519 signatures over the canonical encoding
//! - Unique, time-derived certificate numbering

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ledger::keys::Keypair;
use crate::ledger::types::{LedgerError, LedgerResult};
use crate::store::BloodType;

/// Prefix of human-readable certificate numbers.
pub const CERTIFICATE_PREFIX: &str = "BLC";

/// Asset type tag for donor certificates.
pub const CERTIFICATE_TYPE: &str = "DonorCertificate";

/// Issuer label stamped into every certificate.
pub const ISSUER_LABEL: &str = "BloodChain Network";

const TX_VERSION: &str = "2.0";

/// The ledger-resident certificate payload. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateAsset {
    #[serde(rename = "type")]
    pub kind: String,
    pub donor_id: String,
    pub donor_name: String,
    pub blood_type: BloodType,
    /// RFC3339 donation timestamp.
    pub donation_date: String,
    pub location: String,
    pub quantity: u32,
    pub certificate_number: String,
    pub issuer: String,
    pub verified: bool,
}

/// Transaction metadata for certificate issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxMetadata {
    /// RFC3339 issuance timestamp.
    pub timestamp: String,
    pub hospital_id: String,
    pub donation_type: String,
    pub notes: String,
}

impl TxMetadata {
    /// Metadata stamped with the current time, applying the standard
    /// defaults for any field the caller left out.
    pub fn new(
        hospital_id: Option<String>,
        donation_type: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            timestamp: crate::now_rfc3339(),
            hospital_id: hospital_id.unwrap_or_else(|| "HOSP001".to_string()),
            donation_type: donation_type.unwrap_or_else(|| "Whole Blood".to_string()),
            notes: notes.unwrap_or_else(|| "Regular donation".to_string()),
        }
    }
}

/// Operation kind of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Transfer,
}

/// Asset payload: full data for CREATE, a back-reference for TRANSFER.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Asset {
    Data { data: CertificateAsset },
    Ref { id: String },
}

/// A spending rule: only the holder of the matching private key may
/// spend this output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub details: ConditionDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionDetails {
    #[serde(rename = "type")]
    pub kind: String,
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub condition: Condition,
    pub public_keys: Vec<String>,
    pub amount: String,
}

impl Output {
    /// Single-signature output bound to one Ed25519 public key.
    pub fn ed25519(public_key: &str) -> Self {
        Self {
            condition: Condition {
                details: ConditionDetails {
                    kind: "ed25519-sha-256".to_string(),
                    public_key: public_key.to_string(),
                },
            },
            public_keys: vec![public_key.to_string()],
            amount: "1".to_string(),
        }
    }
}

/// Back-reference from a TRANSFER input to the output it consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fulfills {
    pub transaction_id: String,
    pub output_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Input {
    pub owners_before: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfills: Option<Fulfills>,
    /// Hex Ed25519 signature over the canonical encoding; absent until
    /// the transaction is signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfillment: Option<String>,
}

/// The signed envelope submitted to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Content-derived id; absent until signing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub operation: Operation,
    pub version: String,
    pub asset: Asset,
    pub metadata: serde_json::Value,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

impl Transaction {
    /// The certificate payload, for CREATE transactions.
    pub fn certificate(&self) -> Option<&CertificateAsset> {
        match &self.asset {
            Asset::Data { data } => Some(data),
            Asset::Ref { .. } => None,
        }
    }
}

/// Build an unsigned CREATE transaction carrying a certificate,
/// owned by `owner_public_key`.
pub fn make_create_transaction(
    asset: CertificateAsset,
    metadata: &TxMetadata,
    owner_public_key: &str,
) -> LedgerResult<Transaction> {
    let metadata = serde_json::to_value(metadata)
        .map_err(|e| LedgerError::Encoding(e.to_string()))?;
    Ok(Transaction {
        id: None,
        operation: Operation::Create,
        version: TX_VERSION.to_string(),
        asset: Asset::Data { data: asset },
        metadata,
        inputs: vec![Input {
            owners_before: vec![owner_public_key.to_string()],
            fulfills: None,
            fulfillment: None,
        }],
        outputs: vec![Output::ed25519(owner_public_key)],
    })
}

/// Build an unsigned TRANSFER transaction consuming output 0 of a
/// committed CREATE transaction and rebinding it to `new_owner`.
pub fn make_transfer_transaction(
    create_tx: &Transaction,
    new_owner_public_key: &str,
    transferred_at: String,
) -> LedgerResult<Transaction> {
    let source_id = create_tx
        .id
        .clone()
        .ok_or_else(|| LedgerError::Encoding("source transaction has no id".to_string()))?;
    let output = create_tx
        .outputs
        .first()
        .ok_or_else(|| LedgerError::Encoding("source transaction has no outputs".to_string()))?;

    Ok(Transaction {
        id: None,
        operation: Operation::Transfer,
        version: TX_VERSION.to_string(),
        asset: Asset::Ref { id: source_id.clone() },
        metadata: serde_json::json!({ "transferredAt": transferred_at }),
        inputs: vec![Input {
            owners_before: output.public_keys.clone(),
            fulfills: Some(Fulfills {
                transaction_id: source_id,
                output_index: 0,
            }),
            fulfillment: None,
        }],
        outputs: vec![Output::ed25519(new_owner_public_key)],
    })
}

/// Canonical encoding: the transaction serialized without its id and
/// without input fulfillments. Both the transaction id and the
/// detached signature are computed over these bytes.
pub fn canonical_bytes(tx: &Transaction) -> LedgerResult<Vec<u8>> {
    let mut unsigned = tx.clone();
    unsigned.id = None;
    for input in &mut unsigned.inputs {
        input.fulfillment = None;
    }
    serde_json::to_vec(&unsigned).map_err(|e| LedgerError::Encoding(e.to_string()))
}

/// Sign a transaction: fill every input fulfillment with a detached
/// signature over the canonical encoding and derive the id from it.
pub fn sign_transaction(mut tx: Transaction, key: &Keypair) -> LedgerResult<Transaction> {
    let canonical = canonical_bytes(&tx)?;
    let signature = key.sign_hex(&canonical);
    for input in &mut tx.inputs {
        input.fulfillment = Some(signature.clone());
    }
    tx.id = Some(hex::encode(Sha256::digest(&canonical)));
    Ok(tx)
}

static LAST_CERTIFICATE_SUFFIX: AtomicU64 = AtomicU64::new(0);

/// Next certificate number: `BLC-<unix millis>`, strictly increasing
/// within the process even when two issuances land in the same
/// millisecond.
pub fn next_certificate_number() -> String {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    let mut last = LAST_CERTIFICATE_SUFFIX.load(Ordering::Relaxed);
    loop {
        let candidate = now_ms.max(last + 1);
        match LAST_CERTIFICATE_SUFFIX.compare_exchange(
            last,
            candidate,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => return format!("{CERTIFICATE_PREFIX}-{candidate}"),
            Err(actual) => last = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::keys::verify_hex;

    fn sample_asset() -> CertificateAsset {
        CertificateAsset {
            kind: CERTIFICATE_TYPE.to_string(),
            donor_id: "1".to_string(),
            donor_name: "Yash".to_string(),
            blood_type: BloodType::OPositive,
            donation_date: "2026-01-01T00:00:00Z".to_string(),
            location: "City Hospital".to_string(),
            quantity: 350,
            certificate_number: "BLC-1700000000000".to_string(),
            issuer: ISSUER_LABEL.to_string(),
            verified: true,
        }
    }

    fn sample_metadata() -> TxMetadata {
        TxMetadata {
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            hospital_id: "HOSP001".to_string(),
            donation_type: "Whole Blood".to_string(),
            notes: "Regular donation".to_string(),
        }
    }

    #[test]
    fn test_metadata_defaults() {
        let metadata = TxMetadata::new(None, None, None);
        assert_eq!(metadata.hospital_id, "HOSP001");
        assert_eq!(metadata.donation_type, "Whole Blood");
        assert_eq!(metadata.notes, "Regular donation");
        assert!(!metadata.timestamp.is_empty());
    }

    #[test]
    fn test_transaction_id_is_content_derived() {
        let key = Keypair::generate();
        let tx = make_create_transaction(sample_asset(), &sample_metadata(), &key.public_key_hex())
            .unwrap();
        let a = sign_transaction(tx.clone(), &key).unwrap();
        let b = sign_transaction(tx, &key).unwrap();
        assert_eq!(a.id, b.id);
        assert!(a.id.as_deref().unwrap().len() == 64);
    }

    #[test]
    fn test_different_content_different_id() {
        let key = Keypair::generate();
        let mut other = sample_asset();
        other.quantity = 400;
        let a = sign_transaction(
            make_create_transaction(sample_asset(), &sample_metadata(), &key.public_key_hex())
                .unwrap(),
            &key,
        )
        .unwrap();
        let b = sign_transaction(
            make_create_transaction(other, &sample_metadata(), &key.public_key_hex()).unwrap(),
            &key,
        )
        .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_signature_verifies_over_canonical_bytes() {
        let key = Keypair::generate();
        let tx = make_create_transaction(sample_asset(), &sample_metadata(), &key.public_key_hex())
            .unwrap();
        let signed = sign_transaction(tx, &key).unwrap();

        let canonical = canonical_bytes(&signed).unwrap();
        let fulfillment = signed.inputs[0].fulfillment.as_deref().unwrap();
        assert!(verify_hex(&key.public_key_hex(), &canonical, fulfillment));
    }

    #[test]
    fn test_create_wire_shape() {
        let key = Keypair::generate();
        let tx = sign_transaction(
            make_create_transaction(sample_asset(), &sample_metadata(), &key.public_key_hex())
                .unwrap(),
            &key,
        )
        .unwrap();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["operation"], "CREATE");
        assert_eq!(json["asset"]["data"]["type"], "DonorCertificate");
        assert_eq!(json["asset"]["data"]["bloodType"], "O+");
        assert_eq!(json["metadata"]["hospitalId"], "HOSP001");
        assert_eq!(json["outputs"][0]["public_keys"][0], key.public_key_hex());
    }

    #[test]
    fn test_transfer_references_create() {
        let issuer = Keypair::generate();
        let new_owner = Keypair::generate();
        let create = sign_transaction(
            make_create_transaction(sample_asset(), &sample_metadata(), &issuer.public_key_hex())
                .unwrap(),
            &issuer,
        )
        .unwrap();

        let transfer = make_transfer_transaction(
            &create,
            &new_owner.public_key_hex(),
            "2026-02-01T00:00:00Z".to_string(),
        )
        .unwrap();
        assert_eq!(transfer.operation, Operation::Transfer);
        let fulfills = transfer.inputs[0].fulfills.as_ref().unwrap();
        assert_eq!(Some(&fulfills.transaction_id), create.id.as_ref());
        assert_eq!(fulfills.output_index, 0);
        assert_eq!(transfer.inputs[0].owners_before, vec![issuer.public_key_hex()]);
        assert_eq!(
            transfer.outputs[0].public_keys,
            vec![new_owner.public_key_hex()]
        );
        assert_eq!(transfer.metadata["transferredAt"], "2026-02-01T00:00:00Z");
    }

    #[test]
    fn test_transfer_requires_committed_source() {
        let issuer = Keypair::generate();
        let unsigned = make_create_transaction(
            sample_asset(),
            &sample_metadata(),
            &issuer.public_key_hex(),
        )
        .unwrap();
        let result = make_transfer_transaction(&unsigned, "pk", "now".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_certificate_numbers_strictly_increase() {
        let mut previous = 0u64;
        for _ in 0..100 {
            let number = next_certificate_number();
            let suffix: u64 = number
                .strip_prefix("BLC-")
                .and_then(|s| s.parse().ok())
                .unwrap();
            assert!(suffix > previous);
            previous = suffix;
        }
    }
}
