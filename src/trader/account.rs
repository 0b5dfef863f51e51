//! Cached account state: balance and positions

use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use super::cache::CacheEntry;
use super::Trader;
use crate::common::errors::{GatewayError, Result};
use crate::common::types::{AccountBalance, Position, PositionSide};
use crate::okx::messages::{BalanceDetail, PositionDetail};

impl Trader {
    /// Account balance, served from cache while younger than the TTL
    #[instrument(skip(self))]
    pub async fn get_balance(&self) -> Result<AccountBalance> {
        let entry = self.balance.get_or_refresh(|| self.fetch_balance()).await?;
        Ok(entry.value)
    }

    /// Open positions, served from cache while younger than the TTL
    #[instrument(skip(self))]
    pub async fn get_positions(&self) -> Result<Vec<Position>> {
        Ok(self.positions_snapshot().await?.value)
    }

    /// Positions together with the instant they were fetched
    pub(crate) async fn positions_snapshot(&self) -> Result<CacheEntry<Vec<Position>>> {
        self.positions
            .get_or_refresh(|| self.fetch_positions())
            .await
    }

    async fn fetch_balance(&self) -> Result<AccountBalance> {
        let response = self.api.get_balance().await?;
        response.ensure_success("get balance")?;

        let detail = response.data.first().ok_or_else(|| {
            GatewayError::InvalidResponse("balance response has no account entry".to_string())
        })?;
        let balance = parse_balance(detail)?;

        info!(
            total_equity = %balance.total_equity,
            available = %balance.available_balance,
            unrealized_pnl = %balance.unrealized_pnl,
            "refreshed account balance"
        );
        Ok(balance)
    }

    async fn fetch_positions(&self) -> Result<Vec<Position>> {
        let response = self.api.get_positions().await?;
        response.ensure_success("get positions")?;

        let mut positions = Vec::with_capacity(response.data.len());
        for detail in &response.data {
            if let Some(position) = parse_position(detail)? {
                positions.push(position);
            }
        }

        debug!(
            reported = response.data.len(),
            open = positions.len(),
            "refreshed positions"
        );
        Ok(positions)
    }
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal> {
    value
        .trim()
        .parse()
        .map_err(|e| GatewayError::InvalidResponse(format!("Invalid {} '{}': {}", field, value, e)))
}

/// Empty means the exchange has no value yet
fn parse_optional_decimal(field: &str, value: &str) -> Result<Option<Decimal>> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_decimal(field, value).map(Some)
    }
}

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(GatewayError::InvalidResponse(format!("missing {}", field))),
    }
}

fn parse_balance(detail: &BalanceDetail) -> Result<AccountBalance> {
    Ok(AccountBalance {
        total_equity: parse_decimal("totalEq", required("totalEq", detail.total_eq.as_deref())?)?,
        available_balance: parse_decimal(
            "availEq",
            required("availEq", detail.avail_eq.as_deref())?,
        )?,
        unrealized_pnl: parse_decimal("upl", required("upl", detail.upl.as_deref())?)?,
    })
}

/// Convert one reported position; `None` for zero quantity
///
/// `avgPx`, `upl` and `lever` must be present on an open position; a blank
/// one fails the whole refresh. `markPx` and `liqPx` may be blank.
fn parse_position(detail: &PositionDetail) -> Result<Option<Position>> {
    let quantity = if detail.pos.trim().is_empty() {
        Decimal::ZERO
    } else {
        parse_decimal("pos", &detail.pos)?
    };
    if quantity.is_zero() {
        return Ok(None);
    }

    let side: PositionSide = detail
        .pos_side
        .parse()
        .map_err(GatewayError::InvalidResponse)?;

    Ok(Some(Position {
        symbol: detail.inst_id.clone(),
        quantity,
        entry_price: parse_decimal("avgPx", &detail.avg_px)?,
        mark_price: parse_optional_decimal("markPx", &detail.mark_px)?,
        unrealized_pnl: parse_decimal("upl", &detail.upl)?,
        leverage: parse_decimal("lever", &detail.lever)?,
        liquidation_price: parse_optional_decimal("liqPx", &detail.liq_px)?,
        side,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{position, trader};
    use super::*;
    use crate::common::traits::MockExchangeApi;
    use crate::okx::messages::ApiResponse;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn balance_detail() -> BalanceDetail {
        BalanceDetail {
            total_eq: Some("10500.25".to_string()),
            avail_eq: Some("8000".to_string()),
            upl: Some("-12.5".to_string()),
        }
    }

    #[test]
    fn test_parse_balance() {
        let balance = parse_balance(&balance_detail()).unwrap();
        assert_eq!(
            balance,
            AccountBalance {
                total_equity: dec!(10500.25),
                available_balance: dec!(8000),
                unrealized_pnl: dec!(-12.5),
            }
        );
    }

    #[test]
    fn test_parse_balance_missing_field() {
        let detail = BalanceDetail {
            avail_eq: Some(String::new()),
            ..balance_detail()
        };
        let err = parse_balance(&detail).unwrap_err();
        assert!(err.to_string().contains("availEq"));
    }

    #[test]
    fn test_parse_position_keeps_reported_side() {
        // A short reported with a positive quantity stays short
        let detail = position("BTC-USDT-SWAP", "3", "short", "10");
        let parsed = parse_position(&detail).unwrap().unwrap();
        assert_eq!(parsed.side, PositionSide::Short);
        assert_eq!(parsed.quantity, dec!(3));
        assert_eq!(parsed.leverage, dec!(10));
        assert_eq!(parsed.liquidation_price, Some(dec!(45000)));
    }

    #[test]
    fn test_parse_position_filters_zero() {
        assert!(parse_position(&position("BTC-USDT-SWAP", "0", "long", "10"))
            .unwrap()
            .is_none());
        assert!(parse_position(&position("BTC-USDT-SWAP", "", "long", "10"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_parse_position_empty_liquidation_price() {
        let mut detail = position("ETH-USDT-SWAP", "-1.5", "net", "5");
        detail.liq_px = String::new();
        let parsed = parse_position(&detail).unwrap().unwrap();
        assert_eq!(parsed.liquidation_price, None);
        assert_eq!(parsed.side, PositionSide::Net);
    }

    #[test]
    fn test_parse_position_blank_mark_price() {
        let mut detail = position("BTC-USDT-SWAP", "1", "long", "10");
        detail.mark_px = String::new();
        let parsed = parse_position(&detail).unwrap().unwrap();
        assert_eq!(parsed.mark_price, None);
        assert_eq!(parsed.entry_price, dec!(60000));

        detail.avg_px = String::new();
        assert!(matches!(
            parse_position(&detail),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_position_unknown_side() {
        let detail = position("ETH-USDT-SWAP", "1", "sideways", "5");
        assert!(matches!(
            parse_position(&detail),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_balance_cached_within_ttl() {
        let mut mock = MockExchangeApi::new();
        mock.expect_get_balance()
            .times(1)
            .returning(|| Ok(ApiResponse::ok(vec![balance_detail()])));
        let trader = trader(mock);

        let first = trader.get_balance().await.unwrap();
        tokio::time::advance(Duration::from_secs(14)).await;
        let second = trader.get_balance().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_balance_refreshes_at_ttl() {
        let mut mock = MockExchangeApi::new();
        mock.expect_get_balance()
            .times(2)
            .returning(|| Ok(ApiResponse::ok(vec![balance_detail()])));
        let trader = trader(mock);

        trader.get_balance().await.unwrap();
        tokio::time::advance(Duration::from_secs(15)).await;
        trader.get_balance().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_retries_on_next_read() {
        let mut mock = MockExchangeApi::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_get_balance()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(ApiResponse::ok(vec![balance_detail()])));
        mock.expect_get_balance()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|| Ok(ApiResponse::error("50001", "Service temporarily unavailable")));
        let trader = trader(mock);

        trader.get_balance().await.unwrap();
        tokio::time::advance(Duration::from_secs(15)).await;

        let err = trader.get_balance().await.unwrap_err();
        assert_eq!(err.exchange_code(), Some("50001"));
        assert!(trader.get_balance().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_balance_is_error() {
        let mut mock = MockExchangeApi::new();
        mock.expect_get_balance()
            .returning(|| Ok(ApiResponse::ok(Vec::new())));
        let trader = trader(mock);

        assert!(matches!(
            trader.get_balance().await,
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_positions_filtered_and_cached() {
        let mut mock = MockExchangeApi::new();
        mock.expect_get_positions().times(1).returning(|| {
            Ok(ApiResponse::ok(vec![
                position("BTC-USDT-SWAP", "2", "long", "10"),
                position("ETH-USDT-SWAP", "0", "long", "3"),
                position("SOL-USDT-SWAP", "-4", "short", "5"),
            ]))
        });
        let trader = trader(mock);

        let positions = trader.get_positions().await.unwrap();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].symbol, "BTC-USDT-SWAP");
        assert_eq!(positions[1].side, PositionSide::Short);

        let again = trader.get_positions().await.unwrap();
        assert_eq!(positions, again);
    }
}
