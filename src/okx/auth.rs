//! Authentication utilities for the OKX v5 API

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::common::errors::{GatewayError, Result};
use crate::config::types::ApiCredentials;

type HmacSha256 = Hmac<Sha256>;

/// Format a timestamp the way OKX expects it: ISO-8601, UTC, milliseconds
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generate HMAC-SHA256 signature for API requests
///
/// # Arguments
/// * `secret` - API secret key (used as raw bytes)
/// * `timestamp` - ISO-8601 timestamp, identical to the `OK-ACCESS-TIMESTAMP` header
/// * `method` - HTTP method (GET, POST)
/// * `request_path` - Endpoint path including the query string
/// * `body` - Request body (empty string for GET requests)
pub fn sign_request(
    secret: &str,
    timestamp: &str,
    method: &str,
    request_path: &str,
    body: &str,
) -> Result<String> {
    let message = format!(
        "{}{}{}{}",
        timestamp,
        method.to_uppercase(),
        request_path,
        body
    );

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| GatewayError::Authentication(format!("Failed to create HMAC: {}", e)))?;
    mac.update(message.as_bytes());

    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Generate authentication headers for a request signed now
pub fn generate_auth_headers(
    credentials: &ApiCredentials,
    method: &str,
    request_path: &str,
    body: &str,
) -> Result<AuthHeaders> {
    let timestamp = format_timestamp(Utc::now());
    let signature = sign_request(
        &credentials.api_secret,
        &timestamp,
        method,
        request_path,
        body,
    )?;

    Ok(AuthHeaders {
        api_key: credentials.api_key.clone(),
        signature,
        timestamp,
        passphrase: credentials.passphrase.clone(),
    })
}

/// Authentication headers for API requests
#[derive(Clone)]
pub struct AuthHeaders {
    pub api_key: String,
    pub signature: String,
    pub timestamp: String,
    pub passphrase: String,
}

impl AuthHeaders {
    /// Add authentication headers to a reqwest RequestBuilder
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("OK-ACCESS-KEY", &self.api_key)
            .header("OK-ACCESS-SIGN", &self.signature)
            .header("OK-ACCESS-TIMESTAMP", &self.timestamp)
            .header("OK-ACCESS-PASSPHRASE", &self.passphrase)
    }
}
