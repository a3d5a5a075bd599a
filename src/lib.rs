//! BloodChain donation ledger service library.

pub mod config;
pub mod donation;
pub mod http;
pub mod ledger;
pub mod observability;
pub mod store;

pub use config::AppConfig;
pub use http::{AppState, HttpServer};
pub use store::StateStore;

/// Current time as an RFC3339 string. Falls back to the unix-seconds
/// representation if formatting ever fails.
pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc().unix_timestamp().to_string())
}
