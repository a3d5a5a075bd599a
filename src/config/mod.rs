//! Configuration subsystem: schema, loading and validation.

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_deployment, ConfigError, DeploymentDescriptor};
pub use schema::{AppConfig, LedgerConfig};
