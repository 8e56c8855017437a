//! Signal sources sampled by every scan cycle.
//!
//! A source reduces one external provider to a single number. Whatever goes
//! wrong inside it (network error, malformed response, missing credential, no
//! data, timeout) comes out as [`Score::Unavailable`], which the aggregator
//! reads as `0.0`. Nothing crosses this boundary as an error.

pub mod liquidity;
pub mod onchain;
pub mod sentiment;
pub mod telegram;
pub mod x_search;

use crate::utils::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Result of sampling one source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    /// Successfully computed, always finite
    Valid(f64),
    /// Source failed or had no data
    Unavailable,
}

impl Score {
    /// Wrap a raw value; NaN and infinities become `Unavailable`.
    pub fn from_value(value: f64) -> Self {
        if value.is_finite() {
            Score::Valid(value)
        } else {
            Score::Unavailable
        }
    }

    /// Value used by the aggregator: unavailable counts as `0.0`.
    pub fn value(self) -> f64 {
        match self {
            | Score::Valid(v) => v,
            | Score::Unavailable => 0.0,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, Score::Valid(_))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            | Score::Valid(v) => write!(f, "{}", v),
            | Score::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Identifies the scanned asset to every source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetRef {
    /// CoinGecko id, used as the social search query
    pub coingecko_id: String,
    /// Token mint / contract address, if configured
    pub token_address: Option<String>,
}

impl AssetRef {
    pub fn new(coingecko_id: impl Into<String>, token_address: Option<String>) -> Self {
        Self { coingecko_id: coingecko_id.into(), token_address }
    }
}

/// One external data provider reduced to a score.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Short label for logs and metrics
    fn name(&self) -> &'static str;

    /// Query the provider. "No data" is an error here too.
    async fn try_fetch(&self, asset: &AssetRef) -> Result<f64>;

    /// Fault-isolated sample bounded by `timeout`. Never fails.
    async fn fetch(&self, asset: &AssetRef, timeout: Duration) -> Score {
        match tokio::time::timeout(timeout, self.try_fetch(asset)).await {
            | Ok(Ok(value)) => {
                let score = Score::from_value(value);
                if !score.is_valid() {
                    log::warn!("{} returned a non-finite value ({})", self.name(), value);
                }
                score
            }
            | Ok(Err(e)) => {
                log::debug!("{} unavailable: {}", self.name(), e);
                Score::Unavailable
            }
            | Err(_) => {
                log::warn!("{} timed out after {:?}", self.name(), timeout);
                Score::Unavailable
            }
        }
    }
}
