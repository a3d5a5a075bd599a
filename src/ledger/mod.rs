//! Certificate ledger integration.
//!
//! # Data Flow
//! ```text
//! donation recorder ──▶ client.issue ──▶ keys (issuer identity)
//!                                    ──▶ transaction (build + sign)
//!                                    ──▶ POST /transactions?mode=commit
//!
//! verify / transfer ──▶ client ──▶ GET /transactions/{id} (+ re-sign for transfer)
//! ```
//!
//! The ledger network is an external collaborator assumed to provide
//! tamper-evident commit semantics; this module only constructs, signs
//! and exchanges transactions with it.

pub mod client;
pub mod keys;
pub mod transaction;
pub mod types;

pub use client::{CertificateRequest, LedgerClient};
pub use keys::{IssuerWallet, Keypair};
pub use types::{IssueReceipt, LedgerError, LedgerResult, VerifyOutcome};
