//! REST API client for OKX v5

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::auth::generate_auth_headers;
use super::messages::*;
use crate::common::errors::{GatewayError, Result};
use crate::common::traits::ExchangeApi;
use crate::config::types::{ApiCredentials, GatewaySettings, OkxConfig};

const BALANCE_PATH: &str = "/api/v5/account/balance";
const POSITIONS_PATH: &str = "/api/v5/account/positions";
const SET_LEVERAGE_PATH: &str = "/api/v5/account/set-leverage";
const PLACE_ORDER_PATH: &str = "/api/v5/trade/order";
const CLOSE_POSITION_PATH: &str = "/api/v5/trade/close-position";
const ALGO_PENDING_PATH: &str = "/api/v5/trade/orders-algo-pending";
const CANCEL_ALGOS_PATH: &str = "/api/v5/trade/cancel-algos";
const INSTRUMENTS_PATH: &str = "/api/v5/public/instruments";
const TICKER_PATH: &str = "/api/v5/market/ticker";

/// Algo order types that carry stop-loss/take-profit protection
const PROTECTIVE_ALGO_TYPES: &str = "conditional,oco";

/// REST API client for OKX
#[derive(Debug, Clone)]
pub struct OkxRestClient {
    /// HTTP client
    client: Client,
    /// Base URL, e.g. `https://www.okx.com`
    base_url: String,
    /// Optional API credentials for private endpoints
    credentials: Option<ApiCredentials>,
    /// Send `x-simulated-trading: 1` (demo trading)
    simulated: bool,
}

impl OkxRestClient {
    /// Create a new REST client (unauthenticated)
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
            simulated: false,
        })
    }

    /// Build a client from configuration, attaching credentials when present
    pub fn from_config(okx: &OkxConfig, settings: &GatewaySettings) -> Result<Self> {
        let client =
            Self::with_timeout(&okx.rest_url, settings.request_timeout())?.simulated(okx.simulated);

        Ok(match okx.credentials() {
            Some(creds) => client.with_credentials(creds),
            None => client,
        })
    }

    /// Set API credentials for authenticated requests
    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Toggle demo trading
    pub fn simulated(mut self, simulated: bool) -> Self {
        self.simulated = simulated;
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    /// Path plus encoded query string; this exact string is signed
    fn request_path(path: &str, query: &[(&str, &str)]) -> String {
        if query.is_empty() {
            return path.to_string();
        }
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query)
            .finish();
        format!("{}?{}", path, encoded)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        signed: bool,
    ) -> Result<ApiResponse<T>> {
        let request_path = Self::request_path(path, query);
        self.send(Method::GET, &request_path, String::new(), signed)
            .await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>> {
        let body = serde_json::to_string(body)?;
        self.send(Method::POST, path, body, true).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        request_path: &str,
        body: String,
        signed: bool,
    ) -> Result<ApiResponse<T>> {
        let url = format!("{}{}", self.base_url, request_path);
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("Content-Type", "application/json");

        if self.simulated {
            request = request.header("x-simulated-trading", "1");
        }

        if signed {
            let creds = self.credentials.as_ref().ok_or_else(|| {
                GatewayError::Authentication(format!(
                    "credentials required for {}",
                    request_path
                ))
            })?;
            let headers = generate_auth_headers(creds, method.as_str(), request_path, &body)?;
            request = headers.apply_to_request(request);
        }

        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<ApiResponse<T>> {
        let status = response.status();

        if status.is_success() {
            let text = response.text().await?;
            return Ok(serde_json::from_str(&text)?);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_seconds = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::RateLimit {
                message: body,
                retry_after_seconds,
            });
        }

        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Authentication(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }

        // OKX reports many business errors with a 4xx status and a normal envelope
        if let Ok(envelope) = serde_json::from_str::<ApiResponse<T>>(&body) {
            if !envelope.is_success() {
                warn!(status = %status, code = %envelope.code, "exchange returned error envelope");
                return Ok(envelope);
            }
        }

        Err(GatewayError::HttpStatus {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ExchangeApi for OkxRestClient {
    #[instrument(skip(self))]
    async fn get_balance(&self) -> Result<ApiResponse<BalanceDetail>> {
        self.get(BALANCE_PATH, &[], true).await
    }

    #[instrument(skip(self))]
    async fn get_positions(&self) -> Result<ApiResponse<PositionDetail>> {
        self.get(POSITIONS_PATH, &[], true).await
    }

    #[instrument(skip(self, request), fields(inst_id = %request.inst_id, lever = %request.lever))]
    async fn set_leverage(&self, request: &SetLeverageRequest) -> Result<ApiResponse<LeverageAck>> {
        self.post(SET_LEVERAGE_PATH, request).await
    }

    #[instrument(skip(self, request), fields(inst_id = %request.inst_id, side = %request.side))]
    async fn place_order(&self, request: &PlaceOrderRequest) -> Result<ApiResponse<OrderAck>> {
        self.post(PLACE_ORDER_PATH, request).await
    }

    #[instrument(skip(self, request), fields(inst_id = %request.inst_id, pos_side = %request.pos_side))]
    async fn close_position(
        &self,
        request: &ClosePositionRequest,
    ) -> Result<ApiResponse<ClosePositionAck>> {
        self.post(CLOSE_POSITION_PATH, request).await
    }

    #[instrument(skip(self))]
    async fn get_instruments(
        &self,
        inst_type: &str,
        inst_id: &str,
    ) -> Result<ApiResponse<Instrument>> {
        self.get(
            INSTRUMENTS_PATH,
            &[("instType", inst_type), ("instId", inst_id)],
            false,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_algo_orders(&self, inst_id: &str) -> Result<ApiResponse<AlgoOrder>> {
        self.get(
            ALGO_PENDING_PATH,
            &[("ordType", PROTECTIVE_ALGO_TYPES), ("instId", inst_id)],
            true,
        )
        .await
    }

    #[instrument(skip(self, requests), fields(count = requests.len()))]
    async fn cancel_algo_orders(
        &self,
        requests: &[CancelAlgoRequest],
    ) -> Result<ApiResponse<CancelAlgoAck>> {
        self.post(CANCEL_ALGOS_PATH, requests).await
    }

    #[instrument(skip(self))]
    async fn get_ticker(&self, inst_id: &str) -> Result<ApiResponse<Ticker>> {
        self.get(TICKER_PATH, &[("instId", inst_id)], false).await
    }
}
