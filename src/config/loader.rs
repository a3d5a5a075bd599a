//! Configuration and deployment-descriptor loading from disk.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use crate::config::schema::AppConfig;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {e}"),
            ConfigError::Parse(e) => write!(f, "Parse error: {e}"),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: AppConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "listener.bind_address '{}' is not a valid socket address",
            config.listener.bind_address
        ));
    }
    if config.ledger.api_url.parse::<url::Url>().is_err() {
        errors.push(format!(
            "ledger.api_url '{}' is not a valid URL",
            config.ledger.api_url
        ));
    }
    if config.ledger.commit_timeout_secs == 0 {
        errors.push("ledger.commit_timeout_secs must be positive".to_string());
    }
    if config.ledger.request_timeout_secs == 0 {
        errors.push("ledger.request_timeout_secs must be positive".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Deployment descriptor written by the contract deployment step.
/// Its presence at startup activates the ledger integration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDescriptor {
    pub network: String,
    #[serde(default)]
    pub blood_coin: Option<String>,
    #[serde(default)]
    pub blood_bank: Option<String>,
    #[serde(default)]
    pub deployer: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Read the deployment descriptor if one exists.
///
/// Absence is not an error; it selects degraded local-only mode. A
/// malformed descriptor is logged and treated the same way.
pub fn load_deployment(path: &Path) -> Option<DeploymentDescriptor> {
    if !path.exists() {
        return None;
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read deployment descriptor");
            return None;
        }
    };
    match serde_json::from_str::<DeploymentDescriptor>(&content) {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed deployment descriptor");
            None
        }
    }
}
