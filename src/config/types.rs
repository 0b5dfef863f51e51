//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// OKX connection configuration
    #[serde(default)]
    pub okx: OkxConfig,
    /// Gateway behaviour settings
    #[serde(default)]
    pub settings: GatewaySettings,
}

/// OKX platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkxConfig {
    /// API key for authenticated requests
    #[serde(default)]
    pub api_key: Option<String>,
    /// API secret for signing requests
    #[serde(default)]
    pub api_secret: Option<String>,
    /// API passphrase
    #[serde(default)]
    pub api_passphrase: Option<String>,
    /// Base URL for the REST API
    #[serde(default = "default_okx_rest_url")]
    pub rest_url: String,
    /// Route requests to the demo trading environment
    #[serde(default)]
    pub simulated: bool,
    /// Instrument type used for metadata lookups
    #[serde(default = "default_instrument_type")]
    pub instrument_type: String,
}

impl Default for OkxConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            api_passphrase: None,
            rest_url: default_okx_rest_url(),
            simulated: false,
            instrument_type: default_instrument_type(),
        }
    }
}

impl OkxConfig {
    /// Credentials, if all three parts are configured
    pub fn credentials(&self) -> Option<ApiCredentials> {
        match (&self.api_key, &self.api_secret, &self.api_passphrase) {
            (Some(key), Some(secret), Some(passphrase)) => Some(ApiCredentials::new(
                key.clone(),
                secret.clone(),
                passphrase.clone(),
            )),
            _ => None,
        }
    }
}

fn default_okx_rest_url() -> String {
    "https://www.okx.com".to_string()
}

fn default_instrument_type() -> String {
    "FUTURES".to_string()
}

/// Gateway behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Lifetime of cached balance and positions
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    /// Wait after a leverage change before trading again
    #[serde(default = "default_leverage_cooldown")]
    pub leverage_cooldown_seconds: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout_seconds: default_request_timeout(),
            cache_ttl_seconds: default_cache_ttl(),
            leverage_cooldown_seconds: default_leverage_cooldown(),
        }
    }
}

impl GatewaySettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn leverage_cooldown(&self) -> Duration {
        Duration::from_secs(self.leverage_cooldown_seconds)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_cache_ttl() -> u64 {
    15
}

fn default_leverage_cooldown() -> u64 {
    5
}

/// API credentials for authenticated requests
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl ApiCredentials {
    pub fn new(api_key: String, api_secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            api_secret,
            passphrase,
        }
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}
