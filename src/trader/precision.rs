//! Quantity precision derived from instrument lot size

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, instrument, warn};

use super::Trader;
use crate::common::errors::{GatewayError, Result};

/// Precision used when the instrument's lot size cannot be resolved
pub const DEFAULT_QUANTITY_PRECISION: u32 = 3;

/// Fractional digits implied by a lot size string
///
/// `"0.001"` → 3, `"0.10"` → 1, `"1"` → 0. Returns `None` for anything
/// that is not a positive decimal.
pub fn precision_from_lot_size(lot_size: &str) -> Option<u32> {
    let step: Decimal = lot_size.trim().parse().ok()?;
    if step <= Decimal::ZERO {
        return None;
    }
    Some(step.normalize().scale())
}

/// Round half away from zero and render with exactly `precision` decimals
pub fn format_with_precision(quantity: Decimal, precision: u32) -> String {
    let mut rounded =
        quantity.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(precision);
    rounded.to_string()
}

impl Trader {
    /// Quantity precision for `symbol`, re-queried on every call
    #[instrument(skip(self))]
    pub async fn symbol_precision(&self, symbol: &str) -> Result<u32> {
        let instrument = self.get_instrument(symbol).await.map_err(|e| {
            GatewayError::PrecisionUnavailable {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            }
        })?;

        debug!(
            symbol,
            precision = instrument.precision,
            lot_size = %instrument.lot_size,
            "resolved quantity precision"
        );
        Ok(instrument.precision)
    }

    /// Format `quantity` to the instrument precision
    ///
    /// Never fails: an unresolvable precision degrades to
    /// [`DEFAULT_QUANTITY_PRECISION`].
    pub async fn format_quantity(&self, symbol: &str, quantity: Decimal) -> String {
        let precision = match self.symbol_precision(symbol).await {
            Ok(precision) => precision,
            Err(e) => {
                warn!(
                    symbol,
                    error = %e,
                    default = DEFAULT_QUANTITY_PRECISION,
                    "using default quantity precision"
                );
                DEFAULT_QUANTITY_PRECISION
            }
        };
        format_with_precision(quantity, precision)
    }
}
