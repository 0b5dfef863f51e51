//! Error types for the gateway

use thiserror::Error;

use super::types::Direction;

/// Result type alias using our GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// HTTP transport errors (connect, timeout, TLS)
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Non-success HTTP status that is not covered by a more specific variant
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded: {message}, retry after {retry_after_seconds:?} seconds")]
    RateLimit {
        message: String,
        retry_after_seconds: Option<u64>,
    },

    /// The exchange answered, but with a non-success code
    #[error("{operation} rejected by exchange: code={code} msg={message}")]
    ExchangeRejected {
        operation: String,
        code: String,
        message: String,
    },

    /// Invalid API response (missing fields, unparsable numbers)
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Close requested with implicit quantity but nothing to close
    #[error("No {side} position found for {symbol}")]
    NoPositionFound { symbol: String, side: Direction },

    /// Quantity precision could not be resolved for an instrument
    #[error("Precision unavailable for {symbol}: {reason}")]
    PrecisionUnavailable { symbol: String, reason: String },

    /// Leverage change call failed
    #[error("Failed to set {symbol} leverage to {leverage}x: {source}")]
    LeverageChangeFailed {
        symbol: String,
        leverage: u32,
        #[source]
        source: Box<GatewayError>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Whether the failure happened before the exchange could answer with a business code
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GatewayError::HttpRequest(_)
                | GatewayError::HttpStatus { .. }
                | GatewayError::JsonParse(_)
                | GatewayError::Authentication(_)
                | GatewayError::RateLimit { .. }
        )
    }

    /// Exchange status code, if this is a rejection
    pub fn exchange_code(&self) -> Option<&str> {
        match self {
            GatewayError::ExchangeRejected { code, .. } => Some(code),
            GatewayError::LeverageChangeFailed { source, .. } => source.exchange_code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let err = GatewayError::HttpStatus {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert!(err.is_transport());

        let err = GatewayError::ExchangeRejected {
            operation: "place order".to_string(),
            code: "51008".to_string(),
            message: "Insufficient balance".to_string(),
        };
        assert!(!err.is_transport());
        assert_eq!(err.exchange_code(), Some("51008"));
    }

    #[test]
    fn test_leverage_failure_keeps_source() {
        let err = GatewayError::LeverageChangeFailed {
            symbol: "BTC-USDT-SWAP".to_string(),
            leverage: 20,
            source: Box::new(GatewayError::ExchangeRejected {
                operation: "set leverage".to_string(),
                code: "59000".to_string(),
                message: "open orders exist".to_string(),
            }),
        };
        assert_eq!(err.exchange_code(), Some("59000"));
        assert!(err.to_string().contains("20x"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_no_position_message() {
        let err = GatewayError::NoPositionFound {
            symbol: "ETH-USDT-SWAP".to_string(),
            side: Direction::Long,
        };
        assert_eq!(err.to_string(), "No long position found for ETH-USDT-SWAP");
    }
}
