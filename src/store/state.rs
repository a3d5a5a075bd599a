//! Process-wide donor/donation/inventory registry.
//!
//! # Responsibilities
//! - Single source of truth for local accounting
//! - Atomic donation recording (donation append + inventory bump +
//!   donor counter move together, under one write lock)
//! - Deterministic reward arithmetic
//!
//! The lock is never held across an await point; every operation takes
//! it, mutates, and releases before returning.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::types::{
    BloodType, Donation, DonationView, Donor, DonorSummary, RewardBreakdown, StoreError,
    StoreResult,
};

/// Registration input. Fields arrive optional so the store can report
/// missing ones as a validation failure rather than a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorRegistration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub blood_type: Option<BloodType>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub wallet_address: Option<String>,
}

/// Donor joined with their donation history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorProfile {
    pub donor: Donor,
    pub donations: Vec<Donation>,
    pub stats: DonorStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorStats {
    pub total_donations: u32,
    pub total_rewards: u64,
}

/// Aggregate statistics view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub total_donors: usize,
    pub total_donations: usize,
    pub total_units_collected: u64,
    pub blood_inventory: BTreeMap<BloodType, u64>,
    /// The ten most recent donations, newest first.
    pub recent_donations: Vec<Donation>,
}

#[derive(Default)]
struct Inner {
    donors: Vec<Donor>,
    donations: Vec<Donation>,
    inventory: BTreeMap<BloodType, u64>,
}

/// Lock-guarded in-memory registry of donors, donations and inventory.
pub struct StateStore {
    inner: RwLock<Inner>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// Create an empty store with all inventory buckets at zero.
    pub fn new() -> Self {
        let mut inventory = BTreeMap::new();
        for bt in BloodType::ALL {
            inventory.insert(bt, 0);
        }
        Self {
            inner: RwLock::new(Inner {
                donors: Vec::new(),
                donations: Vec::new(),
                inventory,
            }),
        }
    }

    /// Register a new donor with the next sequential id.
    ///
    /// Wallet references are unique, compared case-insensitively.
    pub fn register_donor(&self, reg: DonorRegistration) -> StoreResult<Donor> {
        let name = reg.name.as_deref().map(str::trim).unwrap_or_default();
        let wallet = reg.wallet_address.as_deref().map(str::trim).unwrap_or_default();
        let Some(blood_type) = reg.blood_type else {
            return Err(StoreError::Validation("Missing required fields".to_string()));
        };
        if name.is_empty() || wallet.is_empty() {
            return Err(StoreError::Validation("Missing required fields".to_string()));
        }

        let mut inner = self.write();
        if inner
            .donors
            .iter()
            .any(|d| d.wallet_address.eq_ignore_ascii_case(wallet))
        {
            return Err(StoreError::Validation(
                "Donor already registered for this wallet".to_string(),
            ));
        }

        let donor = Donor {
            id: inner.donors.len() as u64 + 1,
            name: name.to_string(),
            email: reg.email,
            blood_type,
            phone: reg.phone,
            address: reg.address,
            wallet_address: wallet.to_string(),
            donation_count: 0,
            total_rewards: 0,
            registered_at: crate::now_rfc3339(),
        };
        inner.donors.push(donor.clone());

        tracing::info!(
            donor_id = donor.id,
            blood_type = %donor.blood_type,
            "Donor registered"
        );
        Ok(donor)
    }

    /// Case-insensitive donor lookup by wallet reference.
    pub fn find_donor_by_wallet(&self, wallet: &str) -> Option<Donor> {
        self.read()
            .donors
            .iter()
            .find(|d| d.wallet_address.eq_ignore_ascii_case(wallet))
            .cloned()
    }

    /// Record one donation: append the donation, bump the inventory
    /// bucket and the donor's count under a single write lock.
    ///
    /// Returns the new donation and the donor's post-increment count.
    pub fn record_donation(
        &self,
        wallet: &str,
        blood_type: BloodType,
        quantity: u32,
        location: String,
        hospital_id: String,
    ) -> StoreResult<(Donation, u32)> {
        if quantity == 0 {
            return Err(StoreError::Validation(
                "Quantity must be a positive number".to_string(),
            ));
        }

        let mut inner = self.write();
        let (donor_id, count) = {
            let donor = inner
                .donors
                .iter_mut()
                .find(|d| d.wallet_address.eq_ignore_ascii_case(wallet))
                .ok_or_else(|| {
                    StoreError::NotFound("Donor not found. Please register first.".to_string())
                })?;
            donor.donation_count += 1;
            (donor.id, donor.donation_count)
        };

        let donation = Donation {
            id: inner.donations.len() as u64 + 1,
            donor_id,
            donor_wallet: wallet.to_string(),
            blood_type,
            quantity,
            location,
            hospital_id,
            timestamp: crate::now_rfc3339(),
            reference_hash: format!("0x{}", &Uuid::new_v4().simple().to_string()[..16]),
            certificate_id: None,
        };
        *inner.inventory.entry(blood_type).or_insert(0) += u64::from(quantity);
        inner.donations.push(donation.clone());

        tracing::info!(
            donation_id = donation.id,
            donor_id = donation.donor_id,
            blood_type = %blood_type,
            quantity = quantity,
            "Donation recorded"
        );
        Ok((donation, count))
    }

    /// Reward for a donation, as a pure function of the donor's
    /// post-increment donation count: 100 for the first donation, 50
    /// afterwards, plus a 20 bonus on every fifth donation.
    pub fn compute_reward(donation_count: u32) -> RewardBreakdown {
        let base_reward = if donation_count == 1 { 100 } else { 50 };
        let bonus = if donation_count % 5 == 0 { 20 } else { 0 };
        RewardBreakdown {
            base_reward,
            bonus,
            total: base_reward + bonus,
            donation_count,
        }
    }

    /// Accumulate a reward onto the donor's running total.
    pub fn add_reward(&self, donor_id: u64, amount: u64) -> StoreResult<()> {
        let mut inner = self.write();
        let donor = inner
            .donors
            .iter_mut()
            .find(|d| d.id == donor_id)
            .ok_or_else(|| StoreError::NotFound("Donor not found".to_string()))?;
        donor.total_rewards += amount;
        Ok(())
    }

    /// Set a donation's certificate id, exactly once. A second attach
    /// on the same donation fails loudly instead of overwriting.
    pub fn attach_certificate(&self, donation_id: u64, transaction_id: &str) -> StoreResult<()> {
        let mut inner = self.write();
        let donation = inner
            .donations
            .iter_mut()
            .find(|d| d.id == donation_id)
            .ok_or_else(|| StoreError::NotFound("Donation not found".to_string()))?;
        if donation.certificate_id.is_some() {
            return Err(StoreError::InvariantViolation(format!(
                "donation {donation_id} already has a certificate attached"
            )));
        }
        donation.certificate_id = Some(transaction_id.to_string());
        Ok(())
    }

    /// Current inventory snapshot, all eight blood types present.
    pub fn inventory(&self) -> BTreeMap<BloodType, u64> {
        self.read().inventory.clone()
    }

    pub fn list_donors(&self) -> Vec<DonorSummary> {
        self.read().donors.iter().map(DonorSummary::from).collect()
    }

    /// All donations, each joined with the donor's display name.
    pub fn list_donations(&self) -> Vec<DonationView> {
        let inner = self.read();
        inner
            .donations
            .iter()
            .map(|donation| DonationView {
                donation: donation.clone(),
                donor_name: inner
                    .donors
                    .iter()
                    .find(|d| d.id == donation.donor_id)
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect()
    }

    /// Donor plus their donation history and totals.
    pub fn donor_profile(&self, wallet: &str) -> Option<DonorProfile> {
        let inner = self.read();
        let donor = inner
            .donors
            .iter()
            .find(|d| d.wallet_address.eq_ignore_ascii_case(wallet))?
            .clone();
        let donations: Vec<Donation> = inner
            .donations
            .iter()
            .filter(|d| d.donor_wallet.eq_ignore_ascii_case(wallet))
            .cloned()
            .collect();
        let stats = DonorStats {
            total_donations: donor.donation_count,
            total_rewards: donor.total_rewards,
        };
        Some(DonorProfile {
            donor,
            donations,
            stats,
        })
    }

    pub fn get_donation(&self, donation_id: u64) -> Option<Donation> {
        self.read()
            .donations
            .iter()
            .find(|d| d.id == donation_id)
            .cloned()
    }

    /// Aggregate statistics with the ten most recent donations.
    pub fn stats(&self) -> StatsView {
        let inner = self.read();
        StatsView {
            total_donors: inner.donors.len(),
            total_donations: inner.donations.len(),
            total_units_collected: inner.donations.iter().map(|d| u64::from(d.quantity)).sum(),
            blood_inventory: inner.inventory.clone(),
            recent_donations: inner.donations.iter().rev().take(10).cloned().collect(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
