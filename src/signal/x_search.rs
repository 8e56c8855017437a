//! X (Twitter) recent-search sentiment source.
//!
//! Searches recent public posts mentioning the asset, keeps one language,
//! and averages per-post polarity. Without a bearer token the source is
//! always unavailable.

use super::sentiment::{mean_polarity, PolarityScorer};
use super::{AssetRef, SignalSource};
use crate::config::SourcesConfig;
use crate::utils::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const SEARCH_PATH: &str = "/2/tweets/search/recent";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    text: String,
    lang: Option<String>,
}

pub struct XSentimentSource {
    client: Client,
    api_base: String,
    bearer_token: Option<String>,
    max_results: u32,
    lang: String,
    scorer: Arc<dyn PolarityScorer>,
}

impl XSentimentSource {
    pub fn new(
        api_base: impl Into<String>, bearer_token: Option<String>, scorer: Arc<dyn PolarityScorer>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into(),
            bearer_token: bearer_token.filter(|t| !t.trim().is_empty()),
            max_results: 100,
            lang: "en".to_string(),
            scorer,
        })
    }

    pub fn from_config(cfg: &SourcesConfig, scorer: Arc<dyn PolarityScorer>) -> Result<Self> {
        let mut source = Self::new(
            cfg.twitter_api_base.clone(),
            cfg.twitter_bearer_token.clone(),
            scorer,
            Duration::from_secs(cfg.timeout_secs),
        )?;
        // The v2 search endpoint accepts 10..=100.
        source.max_results = cfg.search_max_results.clamp(10, 100);
        source.lang = cfg.search_lang.clone();
        Ok(source)
    }

    async fn search(&self, bearer: &str, query: &str) -> Result<Vec<Post>> {
        let url = format!("{}{}", self.api_base.trim_end_matches('/'), SEARCH_PATH);
        let max_results = self.max_results.to_string();
        let resp = self
            .client
            .get(url)
            .bearer_auth(bearer)
            .query(&[
                ("query", query),
                ("max_results", max_results.as_str()),
                ("tweet.fields", "text,lang"),
            ])
            .send()
            .await?
            .error_for_status()?;
        let body: SearchResponse = resp.json().await?;
        Ok(body.data)
    }
}

#[async_trait]
impl SignalSource for XSentimentSource {
    fn name(&self) -> &'static str {
        "x_sentiment"
    }

    async fn try_fetch(&self, asset: &AssetRef) -> Result<f64> {
        let bearer = self
            .bearer_token
            .as_deref()
            .ok_or_else(|| Error::SourceError("no X bearer token configured".into()))?;
        if asset.coingecko_id.trim().is_empty() {
            return Err(Error::SourceError("no search query (coingecko id) configured".into()));
        }

        let posts = self.search(bearer, asset.coingecko_id.trim()).await?;
        let texts = posts
            .iter()
            .filter(|p| p.lang.as_deref() == Some(self.lang.as_str()))
            .map(|p| p.text.as_str());

        mean_polarity(self.scorer.as_ref(), texts)
            .ok_or_else(|| Error::SourceError(format!("no matching '{}' posts", self.lang)))
    }
}
