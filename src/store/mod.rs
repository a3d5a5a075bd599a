//! Local accounting: donors, donations and blood inventory.
//!
//! # Data Flow
//! ```text
//! donation recorder ──▶ StateStore (one write lock per mutation)
//!                          ├── donors       (registration, counters, rewards)
//!                          ├── donations    (append-only, certificate id set once)
//!                          └── inventory    (monotonically non-decreasing buckets)
//! ```

pub mod state;
pub mod types;

pub use state::{DonorProfile, DonorRegistration, StateStore, StatsView};
pub use types::{
    BloodType, Donation, DonationView, Donor, DonorSummary, RewardBreakdown, StoreError,
    StoreResult,
};
