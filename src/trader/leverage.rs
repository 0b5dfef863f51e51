//! Leverage controller: change leverage only when it differs, then cool down

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use super::cache::CacheEntry;
use super::Trader;
use crate::common::errors::{GatewayError, Result};
use crate::common::types::Position;
use crate::okx::messages::SetLeverageRequest;

/// Comparison of observed against desired leverage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeverageState {
    /// No observation for the symbol
    Unknown,
    /// Observed equals desired; nothing to do
    Matches,
    /// Observed differs from desired
    Mismatched,
}

impl LeverageState {
    pub fn evaluate(observed: Option<Decimal>, desired: u32) -> Self {
        match observed {
            None => LeverageState::Unknown,
            Some(current) if desired > 0 && current == Decimal::from(desired) => {
                LeverageState::Matches
            }
            Some(_) => LeverageState::Mismatched,
        }
    }
}

/// A leverage change confirmed by the exchange
#[derive(Debug, Clone, Copy)]
struct AppliedLeverage {
    leverage: u32,
    applied_at: Instant,
}

/// Tracks confirmed changes and the post-change cooldown
///
/// The positions snapshot may predate a change this controller just made;
/// a confirmed change newer than the snapshot supersedes the snapshot's
/// leverage for that symbol.
#[derive(Debug)]
pub(crate) struct LeverageController {
    cooldown: Duration,
    /// Latest confirmed change per symbol; never pruned, bounded by the symbols traded
    applied: RwLock<HashMap<String, AppliedLeverage>>,
}

impl LeverageController {
    pub(crate) fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            applied: RwLock::new(HashMap::new()),
        }
    }

    /// Leverage to compare against, or `None` when nothing is known
    ///
    /// Without a snapshot (failed positions read) nothing is known. A
    /// recorded change only counts while it is newer than the snapshot.
    async fn observe(
        &self,
        symbol: &str,
        snapshot: Option<&CacheEntry<Vec<Position>>>,
    ) -> Option<Decimal> {
        let entry = snapshot?;
        let applied = self
            .applied
            .read()
            .await
            .get(symbol)
            .copied()
            .filter(|change| change.applied_at >= entry.fetched_at);

        if let Some(change) = applied {
            return Some(Decimal::from(change.leverage));
        }

        entry
            .value
            .iter()
            .find(|p| p.symbol == symbol)
            .map(|p| p.leverage)
    }

    async fn record(&self, symbol: &str, leverage: u32) {
        self.applied.write().await.insert(
            symbol.to_string(),
            AppliedLeverage {
                leverage,
                applied_at: Instant::now(),
            },
        );
    }
}

impl Trader {
    /// Make sure `symbol` trades at `leverage` under the trader's margin mode
    ///
    /// Returns the state observed before acting. On anything but
    /// `Matches` a change is issued and, once confirmed, the call blocks for
    /// the cooldown. Failures are not retried.
    #[instrument(skip(self))]
    pub async fn ensure_leverage(&self, symbol: &str, leverage: u32) -> Result<LeverageState> {
        let snapshot = match self.positions_snapshot().await {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(symbol, error = %e, "could not read positions, leverage unknown");
                None
            }
        };

        let observed = self.leverage.observe(symbol, snapshot.as_ref()).await;
        let state = LeverageState::evaluate(observed, leverage);

        if state == LeverageState::Matches {
            info!(symbol, leverage, "leverage already set");
            return Ok(state);
        }

        let request = SetLeverageRequest {
            inst_id: symbol.to_string(),
            lever: leverage.to_string(),
            mgn_mode: self.margin_mode,
        };

        let outcome = match self.api.set_leverage(&request).await {
            Ok(response) => response.ensure_success("set leverage"),
            Err(e) => Err(e),
        };
        outcome.map_err(|source| GatewayError::LeverageChangeFailed {
            symbol: symbol.to_string(),
            leverage,
            source: Box::new(source),
        })?;

        self.leverage.record(symbol, leverage).await;
        info!(symbol, leverage, ?observed, "leverage changed");

        info!(cooldown_secs = self.leverage.cooldown.as_secs(), "waiting out leverage cooldown");
        tokio::time::sleep(self.leverage.cooldown).await;

        Ok(state)
    }
}
