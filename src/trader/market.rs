//! Instrument metadata and market price lookups

use rust_decimal::Decimal;
use tracing::instrument;

use super::precision::precision_from_lot_size;
use super::Trader;
use crate::common::errors::{GatewayError, Result};
use crate::common::types::InstrumentMetadata;

impl Trader {
    /// Metadata for `symbol` under the configured instrument type
    #[instrument(skip(self))]
    pub async fn get_instrument(&self, symbol: &str) -> Result<InstrumentMetadata> {
        let response = self
            .api
            .get_instruments(&self.instrument_type, symbol)
            .await?;
        response.ensure_success("get instruments")?;

        let instrument = response
            .data
            .iter()
            .find(|i| i.inst_id == symbol)
            .ok_or_else(|| {
                GatewayError::InvalidResponse(format!(
                    "instrument {} not listed under {}",
                    symbol, self.instrument_type
                ))
            })?;

        let precision = precision_from_lot_size(&instrument.lot_sz).ok_or_else(|| {
            GatewayError::InvalidResponse(format!(
                "invalid lot size '{}' for {}",
                instrument.lot_sz, symbol
            ))
        })?;
        let lot_size: Decimal = instrument.lot_sz.trim().parse().map_err(|e| {
            GatewayError::InvalidResponse(format!("invalid lot size: {}", e))
        })?;

        Ok(InstrumentMetadata {
            symbol: instrument.inst_id.clone(),
            lot_size,
            precision,
            contract_value: instrument.ct_val.trim().parse().ok(),
        })
    }

    /// Last traded price
    #[instrument(skip(self))]
    pub async fn get_market_price(&self, symbol: &str) -> Result<Decimal> {
        let response = self.api.get_ticker(symbol).await?;
        response.ensure_success("get ticker")?;

        let ticker = response
            .data
            .iter()
            .find(|t| t.inst_id == symbol)
            .ok_or_else(|| GatewayError::InvalidResponse(format!("no ticker for {}", symbol)))?;

        ticker
            .last
            .trim()
            .parse()
            .map_err(|e| GatewayError::InvalidResponse(format!("Invalid price: {}", e)))
    }
}
