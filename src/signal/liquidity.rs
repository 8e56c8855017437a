//! Static liquidity score.
//!
//! Not fetched live: read once from configuration at startup and held for the
//! process lifetime.

use super::{AssetRef, SignalSource};
use crate::utils::error::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy)]
pub struct StaticLiquidity {
    value: f64,
}

impl StaticLiquidity {
    /// Non-finite values are stored as `0.0`.
    pub fn new(value: f64) -> Self {
        Self { value: if value.is_finite() { value } else { 0.0 } }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[async_trait]
impl SignalSource for StaticLiquidity {
    fn name(&self) -> &'static str {
        "liquidity"
    }

    async fn try_fetch(&self, _asset: &AssetRef) -> Result<f64> {
        Ok(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Score;
    use std::time::Duration;

    #[tokio::test]
    async fn test_constant_value() {
        let source = StaticLiquidity::new(0.8);
        for _ in 0..3 {
            let score = source.fetch(&AssetRef::default(), Duration::from_secs(1)).await;
            assert_eq!(score, Score::Valid(0.8));
        }
    }

    #[test]
    fn test_non_finite_is_zero() {
        assert_eq!(StaticLiquidity::new(f64::NAN).value(), 0.0);
    }
}
