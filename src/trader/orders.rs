//! Compound order lifecycle operations

use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use super::Trader;
use crate::common::errors::{GatewayError, Result};
use crate::common::types::{
    CleanupStage, CleanupWarning, CloseResult, Direction, MarginMode, OrderResult, Position,
};
use crate::okx::messages::{
    AttachAlgoOrder, CancelAlgoRequest, ClosePositionRequest, OrderAck, OrderType,
    PlaceOrderRequest, TriggerPriceType, SUCCESS_CODE,
};

/// OKX accepts at most this many algo orders per cancel request
const MAX_CANCEL_BATCH: usize = 10;

#[derive(Debug, Clone, Copy)]
enum Protection {
    StopLoss,
    TakeProfit,
}

impl Protection {
    fn operation(self) -> &'static str {
        match self {
            Protection::StopLoss => "set stop loss",
            Protection::TakeProfit => "set take profit",
        }
    }

    fn attach(self, price: Decimal, quantity: String) -> AttachAlgoOrder {
        match self {
            Protection::StopLoss => AttachAlgoOrder {
                sl_trigger_px: Some(price),
                sl_ord_px: Some(price),
                sl_trigger_px_type: Some(TriggerPriceType::Last),
                sz: quantity,
                ..Default::default()
            },
            Protection::TakeProfit => AttachAlgoOrder {
                tp_trigger_px: Some(price),
                tp_ord_px: Some(price),
                tp_trigger_px_type: Some(TriggerPriceType::Last),
                sz: quantity,
                ..Default::default()
            },
        }
    }
}

impl Trader {
    /// Open (or add to) a position at market
    ///
    /// Cancels the symbol's pending orders (best effort), ensures leverage,
    /// then places the order. A failure after the leverage step leaves the
    /// new leverage in place.
    #[instrument(skip(self))]
    pub async fn open_position(
        &self,
        symbol: &str,
        quantity: Decimal,
        leverage: u32,
        direction: Direction,
    ) -> Result<OrderResult> {
        let mut warnings = Vec::new();
        if let Err(e) = self.cancel_all_orders(symbol).await {
            warnings.push(cleanup_warning(CleanupStage::PreOpen, symbol, &e));
        }

        self.ensure_leverage(symbol, leverage).await?;

        let quantity_str = self.format_quantity(symbol, quantity).await;

        let request = PlaceOrderRequest {
            inst_id: symbol.to_string(),
            td_mode: self.margin_mode,
            side: direction.open_side(),
            pos_side: direction.position_side(),
            ord_type: OrderType::Market,
            sz: quantity,
            attach_algo_ords: Vec::new(),
        };
        let operation = format!("open {}", direction);
        let ack = self.submit_order(&operation, &request).await?;

        info!(
            symbol,
            %direction,
            quantity = %quantity_str,
            order_id = %ack.ord_id,
            "position opened"
        );

        Ok(OrderResult {
            order_id: ack.ord_id,
            symbol: symbol.to_string(),
            status_code: ack.s_code,
            quantity: quantity_str,
            warnings,
        })
    }

    pub async fn open_long(
        &self,
        symbol: &str,
        quantity: Decimal,
        leverage: u32,
    ) -> Result<OrderResult> {
        self.open_position(symbol, quantity, leverage, Direction::Long)
            .await
    }

    pub async fn open_short(
        &self,
        symbol: &str,
        quantity: Decimal,
        leverage: u32,
    ) -> Result<OrderResult> {
        self.open_position(symbol, quantity, leverage, Direction::Short)
            .await
    }

    /// Close a position with the venue's native close
    ///
    /// A zero `quantity` means "whatever is open": the size is taken from
    /// the positions snapshot and `NoPositionFound` is returned if there is
    /// none. Pending orders for the symbol are cancelled afterwards (best
    /// effort).
    #[instrument(skip(self))]
    pub async fn close_position(
        &self,
        symbol: &str,
        quantity: Decimal,
        direction: Direction,
    ) -> Result<CloseResult> {
        let quantity = if quantity.is_zero() {
            self.open_quantity(symbol, direction).await?
        } else {
            quantity
        };

        let quantity_str = self.format_quantity(symbol, quantity).await;

        let request = ClosePositionRequest {
            inst_id: symbol.to_string(),
            mgn_mode: self.margin_mode,
            pos_side: direction.position_side(),
        };
        let operation = format!("close {}", direction);
        let response = self.api.close_position(&request).await?;
        response.ensure_success(&operation)?;

        info!(symbol, %direction, quantity = %quantity_str, "position closed");

        let mut warnings = Vec::new();
        if let Err(e) = self.cancel_all_orders(symbol).await {
            warnings.push(cleanup_warning(CleanupStage::PostClose, symbol, &e));
        }

        Ok(CloseResult {
            symbol: symbol.to_string(),
            side: direction,
            status_code: response.code,
            quantity: quantity_str,
            warnings,
        })
    }

    pub async fn close_long(&self, symbol: &str, quantity: Decimal) -> Result<CloseResult> {
        self.close_position(symbol, quantity, Direction::Long).await
    }

    pub async fn close_short(&self, symbol: &str, quantity: Decimal) -> Result<CloseResult> {
        self.close_position(symbol, quantity, Direction::Short).await
    }

    /// Attach a stop-loss to a position
    #[instrument(skip(self))]
    pub async fn set_stop_loss(
        &self,
        symbol: &str,
        direction: Direction,
        quantity: Decimal,
        stop_price: Decimal,
    ) -> Result<OrderResult> {
        self.place_protection(symbol, direction, quantity, stop_price, Protection::StopLoss)
            .await
    }

    /// Attach a take-profit to a position
    #[instrument(skip(self))]
    pub async fn set_take_profit(
        &self,
        symbol: &str,
        direction: Direction,
        quantity: Decimal,
        take_profit_price: Decimal,
    ) -> Result<OrderResult> {
        self.place_protection(
            symbol,
            direction,
            quantity,
            take_profit_price,
            Protection::TakeProfit,
        )
        .await
    }

    /// Cancel every pending conditional order for `symbol`
    ///
    /// Returns how many were cancelled; zero means nothing was pending and
    /// no cancel request was sent.
    #[instrument(skip(self))]
    pub async fn cancel_all_orders(&self, symbol: &str) -> Result<usize> {
        let response = self.api.get_algo_orders(symbol).await?;
        response.ensure_success("list algo orders")?;

        let batch: Vec<CancelAlgoRequest> = response
            .data
            .into_iter()
            .filter(|order| order.inst_id == symbol)
            .map(|order| CancelAlgoRequest {
                inst_id: order.inst_id,
                algo_id: order.algo_id,
            })
            .collect();

        if batch.is_empty() {
            debug!(symbol, "no pending orders to cancel");
            return Ok(0);
        }

        for chunk in batch.chunks(MAX_CANCEL_BATCH) {
            let response = self.api.cancel_algo_orders(chunk).await?;
            response.ensure_success("cancel algo orders")?;
        }

        info!(symbol, count = batch.len(), "cancelled all pending orders");
        Ok(batch.len())
    }

    /// Margin mode is applied per order on this venue and fixed to cross
    ///
    /// Kept so callers can state their precondition explicitly; `Isolated`
    /// is refused rather than silently ignored.
    pub async fn set_margin_mode(&self, symbol: &str, mode: MarginMode) -> Result<()> {
        if mode != self.margin_mode {
            return Err(GatewayError::Configuration(format!(
                "{} margin is not supported for {}, trader uses {}",
                mode, symbol, self.margin_mode
            )));
        }
        info!(symbol, %mode, "margin mode confirmed");
        Ok(())
    }

    async fn open_quantity(&self, symbol: &str, direction: Direction) -> Result<Decimal> {
        let positions = self.get_positions().await?;
        positions
            .iter()
            .find(|p| p.symbol == symbol && p.side == direction.position_side())
            .map(Position::close_quantity)
            .ok_or_else(|| GatewayError::NoPositionFound {
                symbol: symbol.to_string(),
                side: direction,
            })
    }

    async fn place_protection(
        &self,
        symbol: &str,
        direction: Direction,
        quantity: Decimal,
        price: Decimal,
        protection: Protection,
    ) -> Result<OrderResult> {
        let quantity_str = self.format_quantity(symbol, quantity).await;

        let request = PlaceOrderRequest {
            inst_id: symbol.to_string(),
            td_mode: self.margin_mode,
            side: direction.close_side(),
            pos_side: direction.position_side(),
            ord_type: OrderType::Market,
            sz: quantity,
            attach_algo_ords: vec![protection.attach(price, quantity_str.clone())],
        };
        let ack = self.submit_order(protection.operation(), &request).await?;

        info!(symbol, %direction, %price, "{} placed", protection.operation());

        Ok(OrderResult {
            order_id: ack.ord_id,
            symbol: symbol.to_string(),
            status_code: ack.s_code,
            quantity: quantity_str,
            warnings: Vec::new(),
        })
    }

    /// Place an order and insist on both envelope and per-order success
    async fn submit_order(&self, operation: &str, request: &PlaceOrderRequest) -> Result<OrderAck> {
        let response = self.api.place_order(request).await?;

        let ack = response.data.first();
        let rejected_ack = ack.filter(|a| !a.s_code.is_empty() && a.s_code != SUCCESS_CODE);

        if let Some(a) = rejected_ack {
            return Err(GatewayError::ExchangeRejected {
                operation: operation.to_string(),
                code: a.s_code.clone(),
                message: a.s_msg.clone(),
            });
        }
        response.ensure_success(operation)?;

        response.data.into_iter().next().ok_or_else(|| {
            GatewayError::InvalidResponse(format!("{}: no order acknowledgement", operation))
        })
    }
}

fn cleanup_warning(stage: CleanupStage, symbol: &str, error: &GatewayError) -> CleanupWarning {
    warn!(symbol, ?stage, error = %error, "order cleanup failed");
    CleanupWarning {
        stage,
        message: error.to_string(),
    }
}
