//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::{AppConfig, GatewaySettings, OkxConfig};
use crate::common::errors::{GatewayError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. `OKX_*` environment variables (e.g. `OKX_API_KEY`)
/// 2. Environment variables prefixed with `APP__` (e.g. `APP__SETTINGS__CACHE_TTL_SECONDS`)
/// 3. Configuration file (TOML format)
/// 4. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| GatewayError::Configuration(e.to_string()))?;

    let mut app: AppConfig = config
        .try_deserialize()
        .map_err(|e| GatewayError::Configuration(e.to_string()))?;

    apply_okx_env(&mut app.okx)?;
    Ok(app)
}

/// Load configuration from environment variables only
pub fn load_from_env() -> Result<AppConfig> {
    // Try to load from .env file
    dotenvy::dotenv().ok();

    let mut okx = OkxConfig::default();
    apply_okx_env(&mut okx)?;

    Ok(AppConfig {
        okx,
        settings: GatewaySettings::default(),
    })
}

fn apply_okx_env(okx: &mut OkxConfig) -> Result<()> {
    if let Ok(key) = std::env::var("OKX_API_KEY") {
        okx.api_key = Some(key);
    }
    if let Ok(secret) = std::env::var("OKX_API_SECRET") {
        okx.api_secret = Some(secret);
    }
    if let Ok(passphrase) = std::env::var("OKX_API_PASSPHRASE") {
        okx.api_passphrase = Some(passphrase);
    }
    if let Ok(url) = std::env::var("OKX_REST_URL") {
        okx.rest_url = url;
    }
    if let Ok(inst_type) = std::env::var("OKX_INSTRUMENT_TYPE") {
        okx.instrument_type = inst_type;
    }
    if let Ok(simulated) = std::env::var("OKX_SIMULATED") {
        okx.simulated = parse_flag(&simulated).ok_or_else(|| {
            GatewayError::Configuration(format!("OKX_SIMULATED is not a boolean: {}", simulated))
        })?;
    }
    Ok(())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = std::env::temp_dir().join(format!("okx_gateway_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gateway.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[okx]
rest_url = "https://demo.example.com"
instrument_type = "SWAP"

[settings]
cache_ttl_seconds = 30
"#
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.okx.instrument_type, "SWAP");
        assert_eq!(config.settings.cache_ttl_seconds, 30);
        assert_eq!(config.settings.leverage_cooldown_seconds, 5);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Some("/nonexistent/gateway.toml")).unwrap();
        assert_eq!(config.settings.request_timeout_seconds, 30);
    }
}
