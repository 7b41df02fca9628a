mod server;
mod store;


pub use server::*;
pub use store::*;

use serde::Deserialize;

/// Top-level configuration for the ebloodbank server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct EbloodbankConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Store backend configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthRefConfig,
    /// Workflow retry limits.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Reference to the auth config file from `ebloodbank.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct AuthRefConfig {
    /// Whether authentication is enabled.
    ///
    /// With auth disabled every caller is treated as an anonymous admin.
    #[serde(default)]
    pub enabled: bool,
    /// Path to the auth config file (`auth.toml`), relative to
    /// `ebloodbank.toml` or absolute.
    pub config_path: Option<String>,
}

/// Retry limits for the gateway workflows.
#[derive(Debug, Deserialize)]
pub struct GatewayConfig {
    /// Compare-and-swap attempts for one request transition.
    #[serde(default = "default_max_cas_attempts")]
    pub max_cas_attempts: u32,
    /// Attempts at drawing an unused six-digit code.
    #[serde(default = "default_max_code_attempts")]
    pub max_code_attempts: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_cas_attempts: default_max_cas_attempts(),
            max_code_attempts: default_max_code_attempts(),
        }
    }
}

fn default_max_cas_attempts() -> u32 {
    ebloodbank_gateway::builder::DEFAULT_MAX_CAS_ATTEMPTS
}

fn default_max_code_attempts() -> u32 {
    ebloodbank_gateway::builder::DEFAULT_MAX_CODE_ATTEMPTS
}
