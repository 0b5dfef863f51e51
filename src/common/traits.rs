//! Trait definitions for exchange access

use async_trait::async_trait;

use super::errors::Result;
use crate::okx::messages::{
    AlgoOrder, ApiResponse, BalanceDetail, CancelAlgoAck, CancelAlgoRequest, ClosePositionAck,
    ClosePositionRequest, Instrument, LeverageAck, OrderAck, PlaceOrderRequest, PositionDetail,
    SetLeverageRequest, Ticker,
};

/// Raw exchange access used by the trader
///
/// Implementations perform one signed request per call and return the
/// decoded envelope untouched. They never interpret the envelope `code`;
/// that is the trader's job. An `Err` means the exchange could not be
/// reached or did not answer with a decodable body.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Account-level balance
    async fn get_balance(&self) -> Result<ApiResponse<BalanceDetail>>;

    /// All open positions
    async fn get_positions(&self) -> Result<ApiResponse<PositionDetail>>;

    /// Change leverage for an instrument and margin mode
    async fn set_leverage(&self, request: &SetLeverageRequest) -> Result<ApiResponse<LeverageAck>>;

    /// Place a single order, optionally with attached TP/SL legs
    async fn place_order(&self, request: &PlaceOrderRequest) -> Result<ApiResponse<OrderAck>>;

    /// Close a whole position at market
    async fn close_position(
        &self,
        request: &ClosePositionRequest,
    ) -> Result<ApiResponse<ClosePositionAck>>;

    /// Instrument metadata
    ///
    /// # Arguments
    /// * `inst_type` - Instrument type, e.g. `SWAP` or `FUTURES`
    /// * `inst_id` - Instrument ID to filter on
    async fn get_instruments(
        &self,
        inst_type: &str,
        inst_id: &str,
    ) -> Result<ApiResponse<Instrument>>;

    /// Pending conditional/algo orders for an instrument
    async fn get_algo_orders(&self, inst_id: &str) -> Result<ApiResponse<AlgoOrder>>;

    /// Cancel a batch of algo orders
    async fn cancel_algo_orders(
        &self,
        requests: &[CancelAlgoRequest],
    ) -> Result<ApiResponse<CancelAlgoAck>>;

    /// Latest ticker for an instrument
    async fn get_ticker(&self, inst_id: &str) -> Result<ApiResponse<Ticker>>;
}
