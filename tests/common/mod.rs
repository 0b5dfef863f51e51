//! Common test utilities and fixtures

#![allow(dead_code)]

use std::sync::Arc;

use okx_gateway::config::types::ApiCredentials;
use okx_gateway::{GatewaySettings, OkxRestClient, Trader};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";
pub const API_SECRET: &str = "test-api-secret";
pub const API_PASSPHRASE: &str = "test-passphrase";

/// Authenticated client pointed at the mock server
pub fn rest_client(server: &MockServer) -> OkxRestClient {
    OkxRestClient::new(&server.uri())
        .expect("Failed to create REST client")
        .with_credentials(ApiCredentials::new(
            API_KEY.to_string(),
            API_SECRET.to_string(),
            API_PASSPHRASE.to_string(),
        ))
}

/// Settings with no leverage cooldown so flows run at wall-clock speed
pub fn fast_settings() -> GatewaySettings {
    GatewaySettings {
        leverage_cooldown_seconds: 0,
        ..GatewaySettings::default()
    }
}

/// Trader backed by the mock server
pub fn trader(server: &MockServer) -> Trader {
    Trader::with_settings(Arc::new(rest_client(server)), &fast_settings())
        .with_instrument_type("SWAP")
}

/// Successful OKX envelope
pub fn ok(data: Value) -> Value {
    json!({ "code": "0", "msg": "", "data": data })
}

/// Failed OKX envelope
pub fn rejected(code: &str, msg: &str) -> Value {
    json!({ "code": code, "msg": msg, "data": [] })
}

pub fn balance() -> Value {
    ok(json!([{
        "totalEq": "10250.5",
        "availEq": "9000.25",
        "upl": "42.1",
        "details": []
    }]))
}

pub fn position(inst_id: &str, pos: &str, pos_side: &str, lever: &str) -> Value {
    json!({
        "instId": inst_id,
        "instType": "SWAP",
        "mgnMode": "cross",
        "pos": pos,
        "posSide": pos_side,
        "avgPx": "60000",
        "markPx": "60250.5",
        "upl": "25.05",
        "lever": lever,
        "liqPx": "48000"
    })
}

pub fn instrument(inst_id: &str, lot_sz: &str) -> Value {
    ok(json!([{
        "instId": inst_id,
        "instType": "SWAP",
        "lotSz": lot_sz,
        "ctVal": "0.01",
        "state": "live"
    }]))
}

pub fn order_ack(ord_id: &str) -> Value {
    ok(json!([{ "ordId": ord_id, "clOrdId": "", "sCode": "0", "sMsg": "" }]))
}

pub fn algo_order(inst_id: &str, algo_id: &str) -> Value {
    json!({ "instId": inst_id, "algoId": algo_id, "ordType": "conditional" })
}
