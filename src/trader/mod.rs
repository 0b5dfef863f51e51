//! Trader module - the gateway's trading primitives
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Order lifecycle (orders.rs)                                │
//! │    open / close / stop-loss / take-profit / cancel-all      │
//! └───────────┬──────────────────┬──────────────────┬───────────┘
//!             │                  │                  │
//!             ▼                  ▼                  ▼
//! ┌───────────────────┐ ┌─────────────────┐ ┌─────────────────────┐
//! │ LeverageController│ │ Precision       │ │ Cached account state│
//! │ (leverage.rs)     │ │ (precision.rs)  │ │ (account.rs)        │
//! │ compare + cooldown│ │ lot size → dp   │ │ balance / positions │
//! └─────────┬─────────┘ └────────┬────────┘ │ TtlCache (cache.rs) │
//!           │                    │          └──────────┬──────────┘
//!           ▼                    ▼                     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ExchangeApi (OkxRestClient or a test double)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation is one-shot: nothing is retried and nothing is rolled
//! back. A leverage change that succeeded stays applied even if the order
//! placed after it fails. Cached entries expire by TTL only; successful
//! mutations do not invalidate them.
//!
//! Position mode (long/short vs. net) is an account setting the gateway
//! assumes is already configured for long/short; it is not enforced here.

mod account;
mod cache;
mod leverage;
mod market;
mod orders;
mod precision;

use std::sync::Arc;

use crate::common::errors::Result;
use crate::common::traits::ExchangeApi;
use crate::common::types::{AccountBalance, MarginMode, Position};
use crate::config::types::{AppConfig, GatewaySettings};
use crate::okx::OkxRestClient;

pub use cache::{CacheEntry, TtlCache};
pub use leverage::LeverageState;
pub use precision::{format_with_precision, precision_from_lot_size, DEFAULT_QUANTITY_PRECISION};

use leverage::LeverageController;

/// Default instrument type for metadata lookups
pub const DEFAULT_INSTRUMENT_TYPE: &str = "FUTURES";

/// Trading gateway over a single exchange account
///
/// Cheap to share: wrap it in an `Arc` and call from as many tasks as
/// needed. The balance and positions caches each have their own lock.
pub struct Trader {
    api: Arc<dyn ExchangeApi>,
    balance: TtlCache<AccountBalance>,
    positions: TtlCache<Vec<Position>>,
    leverage: LeverageController,
    instrument_type: String,
    margin_mode: MarginMode,
}

impl Trader {
    /// Create a trader with default settings
    pub fn new(api: Arc<dyn ExchangeApi>) -> Self {
        Self::with_settings(api, &GatewaySettings::default())
    }

    /// Create a trader with custom cache TTL and leverage cooldown
    pub fn with_settings(api: Arc<dyn ExchangeApi>, settings: &GatewaySettings) -> Self {
        Self {
            api,
            balance: TtlCache::new("balance", settings.cache_ttl()),
            positions: TtlCache::new("positions", settings.cache_ttl()),
            leverage: LeverageController::new(settings.leverage_cooldown()),
            instrument_type: DEFAULT_INSTRUMENT_TYPE.to_string(),
            margin_mode: MarginMode::Cross,
        }
    }

    /// Build a trader talking to OKX over REST
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = OkxRestClient::from_config(&config.okx, &config.settings)?;
        Ok(Self::with_settings(Arc::new(client), &config.settings)
            .with_instrument_type(&config.okx.instrument_type))
    }

    /// Override the instrument type used for metadata lookups
    pub fn with_instrument_type(mut self, instrument_type: &str) -> Self {
        self.instrument_type = instrument_type.to_string();
        self
    }

    pub fn instrument_type(&self) -> &str {
        &self.instrument_type
    }

    /// Margin mode used for every trading call
    pub fn margin_mode(&self) -> MarginMode {
        self.margin_mode
    }
}
