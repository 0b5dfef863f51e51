//! OKX v5 REST wire types
//!
//! Numeric fields arrive as decimal strings and are kept as strings here;
//! the trader layer is responsible for parsing them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::errors::{GatewayError, Result};
use crate::common::types::{MarginMode, OrderSide, PositionSide};

/// Code OKX uses for success in the response envelope
pub const SUCCESS_CODE: &str = "0";

/// Standard OKX response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Vec<T>,
}

impl<T> ApiResponse<T> {
    /// Successful envelope wrapping `data`
    pub fn ok(data: Vec<T>) -> Self {
        Self {
            code: SUCCESS_CODE.to_string(),
            msg: String::new(),
            data,
        }
    }

    /// Failed envelope with an error code
    pub fn error(code: &str, msg: &str) -> Self {
        Self {
            code: code.to_string(),
            msg: msg.to_string(),
            data: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Turn a non-success code into `ExchangeRejected`
    pub fn ensure_success(&self, operation: &str) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(GatewayError::ExchangeRejected {
                operation: operation.to_string(),
                code: self.code.clone(),
                message: self.msg.clone(),
            })
        }
    }
}

// ============================================================================
// Account
// ============================================================================

/// Account-level entry of `GET /api/v5/account/balance`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDetail {
    #[serde(default)]
    pub total_eq: Option<String>,
    #[serde(default)]
    pub avail_eq: Option<String>,
    #[serde(default)]
    pub upl: Option<String>,
}

/// Entry of `GET /api/v5/account/positions`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDetail {
    pub inst_id: String,
    #[serde(default)]
    pub inst_type: String,
    #[serde(default)]
    pub mgn_mode: String,
    pub pos: String,
    pub pos_side: String,
    #[serde(default)]
    pub avg_px: String,
    #[serde(default)]
    pub mark_px: String,
    #[serde(default)]
    pub upl: String,
    #[serde(default)]
    pub lever: String,
    #[serde(default)]
    pub liq_px: String,
}

/// Body of `POST /api/v5/account/set-leverage`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLeverageRequest {
    pub inst_id: String,
    pub lever: String,
    pub mgn_mode: MarginMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageAck {
    #[serde(default)]
    pub inst_id: String,
    #[serde(default)]
    pub lever: String,
    #[serde(default)]
    pub mgn_mode: String,
}

// ============================================================================
// Trade
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

/// Price reference for conditional triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerPriceType {
    Last,
    Index,
    Mark,
}

/// Take-profit / stop-loss leg attached to an order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachAlgoOrder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tp_trigger_px: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tp_ord_px: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tp_trigger_px_type: Option<TriggerPriceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sl_trigger_px: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sl_ord_px: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sl_trigger_px_type: Option<TriggerPriceType>,
    /// Pre-formatted quantity
    pub sz: String,
}

/// Body of `POST /api/v5/trade/order`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub inst_id: String,
    pub td_mode: MarginMode,
    pub side: OrderSide,
    pub pos_side: PositionSide,
    pub ord_type: OrderType,
    pub sz: Decimal,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attach_algo_ords: Vec<AttachAlgoOrder>,
}

/// Per-order acknowledgement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    #[serde(default)]
    pub ord_id: String,
    #[serde(default)]
    pub cl_ord_id: String,
    #[serde(default)]
    pub s_code: String,
    #[serde(default)]
    pub s_msg: String,
}

/// Body of `POST /api/v5/trade/close-position`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePositionRequest {
    pub inst_id: String,
    pub mgn_mode: MarginMode,
    pub pos_side: PositionSide,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePositionAck {
    #[serde(default)]
    pub inst_id: String,
    #[serde(default)]
    pub pos_side: String,
}

/// Entry of `GET /api/v5/trade/orders-algo-pending`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgoOrder {
    pub inst_id: String,
    pub algo_id: String,
    #[serde(default)]
    pub ord_type: String,
}

/// Element of the `POST /api/v5/trade/cancel-algos` batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAlgoRequest {
    pub inst_id: String,
    pub algo_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAlgoAck {
    #[serde(default)]
    pub algo_id: String,
    #[serde(default)]
    pub s_code: String,
    #[serde(default)]
    pub s_msg: String,
}

// ============================================================================
// Public data
// ============================================================================

/// Entry of `GET /api/v5/public/instruments`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub inst_id: String,
    #[serde(default)]
    pub inst_type: String,
    #[serde(default)]
    pub lot_sz: String,
    #[serde(default)]
    pub ct_val: String,
}

/// Entry of `GET /api/v5/market/ticker`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub inst_id: String,
    pub last: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_positions_envelope() {
        let json = r#"{
            "code": "0",
            "msg": "",
            "data": [{
                "instId": "BTC-USDT-SWAP",
                "instType": "SWAP",
                "mgnMode": "cross",
                "pos": "2",
                "posSide": "long",
                "avgPx": "60000.5",
                "markPx": "60100",
                "upl": "200.1",
                "lever": "10",
                "liqPx": ""
            }]
        }"#;

        let resp: ApiResponse<PositionDetail> = serde_json::from_str(json).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.data[0].inst_id, "BTC-USDT-SWAP");
        assert_eq!(resp.data[0].pos_side, "long");
        assert_eq!(resp.data[0].liq_px, "");
    }

    fn decode<T: serde::de::DeserializeOwned>(json: &str) -> ApiResponse<T> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_envelope_decodes_payload_without_default() {
        #[derive(Debug, Deserialize)]
        struct Fill {
            px: String,
        }

        let resp: ApiResponse<Fill> = decode(r#"{"code": "0", "data": [{"px": "101.5"}]}"#);
        assert_eq!(resp.data[0].px, "101.5");

        let empty: ApiResponse<Fill> = decode(r#"{"code": "51000", "msg": "Parameter error"}"#);
        assert!(empty.data.is_empty());
    }

    #[test]
    fn test_error_envelope_without_data() {
        let json = r#"{"code": "50011", "msg": "Too Many Requests"}"#;
        let resp: ApiResponse<BalanceDetail> = serde_json::from_str(json).unwrap();
        assert!(!resp.is_success());

        let err = resp.ensure_success("get balance").unwrap_err();
        assert_eq!(err.exchange_code(), Some("50011"));
    }

    #[test]
    fn test_place_order_serialization() {
        let request = PlaceOrderRequest {
            inst_id: "BTC-USDT-SWAP".to_string(),
            td_mode: MarginMode::Cross,
            side: OrderSide::Sell,
            pos_side: PositionSide::Long,
            ord_type: OrderType::Market,
            sz: dec!(1.5),
            attach_algo_ords: vec![AttachAlgoOrder {
                sl_trigger_px: Some(dec!(58000)),
                sl_ord_px: Some(dec!(58000)),
                sl_trigger_px_type: Some(TriggerPriceType::Last),
                sz: "1.50".to_string(),
                ..Default::default()
            }],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["instId"], "BTC-USDT-SWAP");
        assert_eq!(value["tdMode"], "cross");
        assert_eq!(value["side"], "sell");
        assert_eq!(value["posSide"], "long");
        assert_eq!(value["ordType"], "market");
        assert_eq!(value["sz"], "1.5");
        assert_eq!(value["attachAlgoOrds"][0]["slTriggerPx"], "58000");
        assert_eq!(value["attachAlgoOrds"][0]["slTriggerPxType"], "last");
        assert!(value["attachAlgoOrds"][0].get("tpTriggerPx").is_none());
    }

    #[test]
    fn test_plain_order_omits_attachments() {
        let request = PlaceOrderRequest {
            inst_id: "ETH-USDT-SWAP".to_string(),
            td_mode: MarginMode::Cross,
            side: OrderSide::Buy,
            pos_side: PositionSide::Long,
            ord_type: OrderType::Market,
            sz: dec!(3),
            attach_algo_ords: Vec::new(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("attachAlgoOrds").is_none());
    }
}
