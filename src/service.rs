//! Startup wiring: one `Config` in, the shared clients, sources, scan cycle,
//! scheduler and welcome responder out.
//!
//! Every external client is constructed here exactly once and handed to its
//! users by `Arc`.

use crate::alert::{AlertDispatcher, LogDispatcher, TelegramDispatcher};
use crate::bot::WelcomeResponder;
use crate::config::Config;
use crate::scan::{DispatchPolicy, ScanCycle, SignalSet};
use crate::schedule::{ScanScheduler, ScheduleEntry};
use crate::signal::liquidity::StaticLiquidity;
use crate::signal::onchain::OnchainFlowSource;
use crate::signal::sentiment::{LexiconScorer, PolarityScorer};
use crate::signal::telegram::TelegramSentimentSource;
use crate::signal::x_search::XSentimentSource;
use crate::signal::AssetRef;
use crate::telegram::TelegramClient;
use crate::utils::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct Service {
    cycle: Arc<ScanCycle>,
    entries: Vec<ScheduleEntry>,
    welcome: Option<WelcomeResponder>,
}

impl Service {
    /// Build everything with the default lexicon scorer.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::with_scorer(cfg, Arc::new(LexiconScorer::new()))
    }

    /// Build everything around an injected polarity scorer.
    pub fn with_scorer(cfg: &Config, scorer: Arc<dyn PolarityScorer>) -> Result<Self> {
        cfg.validate()?;
        let timeout = Duration::from_secs(cfg.sources.timeout_secs);

        let token = cfg
            .telegram
            .bot_token
            .clone()
            .ok_or_else(|| Error::ConfigError("telegram.bot_token must be set".into()))?;
        let chat_id = cfg
            .telegram
            .chat_id
            .ok_or_else(|| Error::ConfigError("telegram.chat_id must be set".into()))?;
        let client = Arc::new(TelegramClient::new(cfg.telegram.api_base.clone(), token, timeout)?);

        let sources = SignalSet {
            ta: Arc::new(XSentimentSource::from_config(&cfg.sources, Arc::clone(&scorer))?),
            social: Arc::new(TelegramSentimentSource::new(
                Some(Arc::clone(&client)),
                cfg.telegram.updates_limit,
                scorer,
            )),
            flow: Arc::new(OnchainFlowSource::from_config(&cfg.onchain)),
            liquidity: Arc::new(StaticLiquidity::new(cfg.asset.liquidity_score)),
        };

        let dispatcher: Arc<dyn AlertDispatcher> = if cfg.service.dry_run {
            log::warn!("DRY RUN: alerts are logged, not sent");
            Arc::new(LogDispatcher)
        } else {
            Arc::new(TelegramDispatcher::new(Arc::clone(&client), chat_id))
        };

        if cfg.asset.coingecko_id.trim().is_empty() {
            log::warn!("asset.coingecko_id is empty; social search will be unavailable");
        }
        let asset = AssetRef::new(cfg.asset.coingecko_id.trim(), cfg.asset.token_address.clone());
        let policy = DispatchPolicy {
            attempts: cfg.schedule.dispatch_attempts,
            backoff: Duration::from_millis(cfg.schedule.dispatch_backoff_ms),
        };
        let cycle = Arc::new(ScanCycle::new(asset, sources, dispatcher, timeout).with_dispatch_policy(policy));

        let welcome = cfg.service.welcome_enabled.then(|| {
            WelcomeResponder::new(
                Arc::clone(&client),
                cfg.telegram.updates_limit,
                Duration::from_secs(cfg.service.welcome_poll_secs.max(1)),
            )
        });

        Ok(Self { cycle, entries: ScheduleEntry::from_config(&cfg.schedule)?, welcome })
    }

    pub fn cycle(&self) -> Arc<ScanCycle> {
        Arc::clone(&self.cycle)
    }

    pub fn scheduler(&self) -> ScanScheduler {
        ScanScheduler::new(self.entries.clone(), self.cycle())
    }

    /// Start the scheduler triggers and the welcome responder.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        let mut handles = self.scheduler().start();
        if let Some(welcome) = self.welcome {
            handles.push(tokio::spawn(welcome.run()));
        }
        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut cfg = Config::default();
        cfg.telegram.bot_token = Some("1:test".into());
        cfg.telegram.chat_id = Some(99);
        cfg.asset.coingecko_id = "solana".into();
        cfg
    }

    #[test]
    fn test_builds_from_valid_config() {
        let service = Service::from_config(&config()).unwrap();
        assert_eq!(service.cycle().asset().coingecko_id, "solana");
        assert_eq!(service.scheduler().entries().len(), 2);
        assert!(service.welcome.is_some());
    }

    #[test]
    fn test_missing_destination_is_fatal() {
        let mut cfg = config();
        cfg.telegram.chat_id = None;
        assert!(matches!(Service::from_config(&cfg), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_missing_optional_credentials_still_builds() {
        let mut cfg = config();
        cfg.sources.twitter_bearer_token = None;
        cfg.onchain.chain = "ethereum".into();
        cfg.onchain.eth_rpc_url = None;
        cfg.service.welcome_enabled = false;
        let service = Service::from_config(&cfg).unwrap();
        assert!(service.welcome.is_none());
    }
}
