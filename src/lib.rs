//! OKX Gateway Library
//!
//! A trading gateway for OKX derivatives: cached account state,
//! idempotent leverage control and compound order operations.

pub mod common;
pub mod config;
pub mod okx;
pub mod trader;

// Re-export commonly used types
pub use common::errors::{GatewayError, Result};
pub use common::traits::ExchangeApi;
pub use common::types::{
    AccountBalance, CleanupStage, CleanupWarning, CloseResult, Direction, InstrumentMetadata,
    MarginMode, OrderResult, OrderSide, Position, PositionSide,
};
pub use config::loader::{load_config, load_from_env};
pub use config::types::{AppConfig, GatewaySettings, OkxConfig};
pub use okx::OkxRestClient;
pub use trader::{LeverageState, Trader};
