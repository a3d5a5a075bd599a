//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML config
//! files; every section has sensible defaults so the service runs with
//! no config file at all.

use serde::{Deserialize, Serialize};

/// Root configuration for the BloodChain service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Certificate ledger endpoint settings.
    pub ledger: LedgerConfig,

    /// Deployment descriptor settings.
    pub deployment: DeploymentConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5001").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5001".to_string(),
        }
    }
}

/// Certificate ledger endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Base API URL of the ledger network endpoint.
    pub api_url: String,

    /// Deadline for commit submissions (issue, transfer).
    pub commit_timeout_secs: u64,

    /// Deadline for read-only calls (verify, search).
    pub request_timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:9984/api/v1/".to_string(),
            commit_timeout_secs: 30,
            request_timeout_secs: 10,
        }
    }
}

/// Deployment descriptor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Path of the deployment descriptor written at deploy time.
    /// Absence of the file selects degraded local-only mode.
    pub descriptor_path: String,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            descriptor_path: "deployment.json".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter when RUST_LOG is unset.
    pub log_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "bloodchain=debug,tower_http=info".to_string(),
        }
    }
}
