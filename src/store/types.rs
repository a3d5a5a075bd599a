//! Donor, donation and reward data model, plus store error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the state store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or malformed caller input. Always recoverable.
    #[error("{0}")]
    Validation(String),

    /// Unknown donor or donation. Recoverable, reported to the caller.
    #[error("{0}")]
    NotFound(String),

    /// A calling-protocol invariant was broken. Programming defect,
    /// not a user-facing condition.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The eight ABO/Rh blood types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
}

impl BloodType {
    /// All blood types, in inventory display order.
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::OPositive,
        BloodType::ONegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
    ];

    /// The wire label ("A+", "O-", ...).
    pub fn label(&self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
        }
    }
}

impl std::fmt::Display for BloodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A registered donor. Mutated only by the donation recorder
/// (donation count and reward total); never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    /// Sequential id, assigned at registration.
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub blood_type: BloodType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub wallet_address: String,
    pub donation_count: u32,
    pub total_rewards: u64,
    /// RFC3339 registration timestamp.
    pub registered_at: String,
}

/// One recorded donation event. Immutable once appended, except for
/// `certificate_id` which transitions empty -> set exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    /// Sequential id.
    pub id: u64,
    pub donor_id: u64,
    pub donor_wallet: String,
    pub blood_type: BloodType,
    /// Donated volume in millilitres; always positive.
    pub quantity: u32,
    pub location: String,
    pub hospital_id: String,
    /// RFC3339 collection timestamp.
    pub timestamp: String,
    /// Locally generated reference hash for this record.
    pub reference_hash: String,
    /// Ledger transaction id of the issued certificate, when issuance
    /// succeeded. Absent means "locally recorded, not yet externally
    /// verifiable" -- a valid state, not an error.
    pub certificate_id: Option<String>,
}

/// Reward breakdown for a single donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardBreakdown {
    pub base_reward: u64,
    pub bonus: u64,
    pub total: u64,
    /// Donor's donation count after this donation.
    pub donation_count: u32,
}

/// Compact donor view for listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSummary {
    pub id: u64,
    pub name: String,
    pub blood_type: BloodType,
    pub donation_count: u32,
    pub total_rewards: u64,
    pub wallet_address: String,
}

impl From<&Donor> for DonorSummary {
    fn from(donor: &Donor) -> Self {
        Self {
            id: donor.id,
            name: donor.name.clone(),
            blood_type: donor.blood_type,
            donation_count: donor.donation_count,
            total_rewards: donor.total_rewards,
            wallet_address: donor.wallet_address.clone(),
        }
    }
}

/// Donation joined with the donor's display name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationView {
    #[serde(flatten)]
    pub donation: Donation,
    pub donor_name: String,
}
