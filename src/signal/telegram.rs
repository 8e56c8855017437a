//! Inbound Telegram messages as a social sentiment source.

use super::sentiment::{mean_polarity, PolarityScorer};
use super::{AssetRef, SignalSource};
use crate::telegram::{message_texts, TelegramClient};
use crate::utils::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub struct TelegramSentimentSource {
    client: Option<Arc<TelegramClient>>,
    limit: u32,
    scorer: Arc<dyn PolarityScorer>,
}

impl TelegramSentimentSource {
    /// `client` is `None` when no bot token is configured.
    pub fn new(client: Option<Arc<TelegramClient>>, limit: u32, scorer: Arc<dyn PolarityScorer>) -> Self {
        Self { client, limit, scorer }
    }
}

#[async_trait]
impl SignalSource for TelegramSentimentSource {
    fn name(&self) -> &'static str {
        "telegram_sentiment"
    }

    async fn try_fetch(&self, _asset: &AssetRef) -> Result<f64> {
        let client =
            self.client.as_ref().ok_or_else(|| Error::SourceError("no bot token configured".into()))?;
        let updates = client.get_updates(self.limit).await?;
        mean_polarity(self.scorer.as_ref(), message_texts(&updates))
            .ok_or_else(|| Error::SourceError("no inbound messages".into()))
    }
}
