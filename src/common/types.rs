//! Domain types returned to callers of the gateway

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side as sent to the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Position side as reported by the exchange
///
/// `Net` only appears for accounts in one-way mode; the gateway never
/// sends it, but keeps it so a snapshot mirrors the venue faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
    Net,
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
            PositionSide::Net => write!(f, "net"),
        }
    }
}

impl std::str::FromStr for PositionSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" => Ok(PositionSide::Long),
            "short" => Ok(PositionSide::Short),
            "net" => Ok(PositionSide::Net),
            other => Err(format!("unknown position side: {}", other)),
        }
    }
}

/// Direction of a position the caller wants to open, close or protect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Order side that opens a position in this direction
    pub fn open_side(self) -> OrderSide {
        match self {
            Direction::Long => OrderSide::Buy,
            Direction::Short => OrderSide::Sell,
        }
    }

    /// Order side that reduces a position in this direction
    pub fn close_side(self) -> OrderSide {
        match self {
            Direction::Long => OrderSide::Sell,
            Direction::Short => OrderSide::Buy,
        }
    }

    pub fn position_side(self) -> PositionSide {
        match self {
            Direction::Long => PositionSide::Long,
            Direction::Short => PositionSide::Short,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.position_side().fmt(f)
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" => Ok(Direction::Long),
            "short" => Ok(Direction::Short),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// Margin mode for trading calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginMode {
    Cross,
    Isolated,
}

impl std::fmt::Display for MarginMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarginMode::Cross => write!(f, "cross"),
            MarginMode::Isolated => write!(f, "isolated"),
        }
    }
}

/// Account-level balance snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Total equity in USD
    pub total_equity: Decimal,
    /// Equity available for new positions
    pub available_balance: Decimal,
    /// Unrealized profit and loss across all positions
    pub unrealized_pnl: Decimal,
}

/// An open position with non-zero quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument ID, e.g. `BTC-USDT-SWAP`
    pub symbol: String,
    /// Quantity as reported by the exchange (negative for net shorts)
    pub quantity: Decimal,
    pub entry_price: Decimal,
    /// Missing while the exchange has no mark for the instrument
    pub mark_price: Option<Decimal>,
    pub unrealized_pnl: Decimal,
    pub leverage: Decimal,
    /// Missing when the exchange cannot compute one (e.g. fully hedged)
    pub liquidation_price: Option<Decimal>,
    /// Side reported by the exchange, never inferred from the quantity sign
    pub side: PositionSide,
}

impl Position {
    /// Size to close this position completely
    pub fn close_quantity(&self) -> Decimal {
        self.quantity.abs()
    }
}

/// Instrument metadata relevant to order sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentMetadata {
    pub symbol: String,
    /// Minimum quantity increment
    pub lot_size: Decimal,
    /// Number of fractional digits implied by `lot_size`
    pub precision: u32,
    /// Contract multiplier, if the instrument is a derivative
    pub contract_value: Option<Decimal>,
}

/// Which best-effort cleanup step produced a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupStage {
    /// Cancelling stale orders before opening a position
    PreOpen,
    /// Cancelling orphaned stop-loss/take-profit orders after a close
    PostClose,
}

/// A non-fatal failure of a cleanup step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupWarning {
    pub stage: CleanupStage,
    pub message: String,
}

/// Result of a successfully placed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: String,
    pub symbol: String,
    /// Per-order status code returned by the exchange
    pub status_code: String,
    /// Quantity formatted to the instrument precision
    pub quantity: String,
    #[serde(default)]
    pub warnings: Vec<CleanupWarning>,
}

/// Result of a successful position close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseResult {
    pub symbol: String,
    pub side: Direction,
    pub status_code: String,
    /// Quantity formatted to the instrument precision
    pub quantity: String,
    #[serde(default)]
    pub warnings: Vec<CleanupWarning>,
}
