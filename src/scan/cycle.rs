//! One scan: sample all sources, fuse, format, dispatch.
//!
//! The four sources run as separate tasks and are joined before fusion, so
//! the aggregator never sees partial input. A source that errors, times out
//! or panics contributes `Score::Unavailable`. Cycles share nothing mutable:
//! overlapping cycles (interval and daily firing together, or a slow cycle
//! still running when the next interval fires) are fully independent.

use super::{AlertMessage, ScanResult, TriggerKind};
use crate::alert::AlertDispatcher;
use crate::signal::{AssetRef, Score, SignalSource};
use chrono::Utc;
use metrics::{gauge, histogram, increment_counter};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// The four sources of one asset.
#[derive(Clone)]
pub struct SignalSet {
    pub ta: Arc<dyn SignalSource>,
    pub social: Arc<dyn SignalSource>,
    pub flow: Arc<dyn SignalSource>,
    pub liquidity: Arc<dyn SignalSource>,
}

/// Bounded retry around a single-shot dispatcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchPolicy {
    /// Total attempts, including the first (at least 1)
    pub attempts: u32,
    /// Wait before retry `n` is `backoff * n`
    pub backoff: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self { attempts: 3, backoff: Duration::from_secs(2) }
    }
}

impl DispatchPolicy {
    /// One attempt, no retry.
    pub fn once() -> Self {
        Self { attempts: 1, backoff: Duration::ZERO }
    }
}

/// What a finished cycle reports back to its trigger.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub trigger: TriggerKind,
    pub result: ScanResult,
    pub message: AlertMessage,
    pub delivered: bool,
}

impl ScanOutcome {
    pub fn confluence(&self) -> f64 {
        self.result.confluence()
    }
}

pub struct ScanCycle {
    asset: AssetRef,
    sources: SignalSet,
    dispatcher: Arc<dyn AlertDispatcher>,
    source_timeout: Duration,
    policy: DispatchPolicy,
}

impl ScanCycle {
    pub fn new(
        asset: AssetRef, sources: SignalSet, dispatcher: Arc<dyn AlertDispatcher>,
        source_timeout: Duration,
    ) -> Self {
        Self { asset, sources, dispatcher, source_timeout, policy: DispatchPolicy::default() }
    }

    pub fn with_dispatch_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = DispatchPolicy { attempts: policy.attempts.max(1), ..policy };
        self
    }

    pub fn asset(&self) -> &AssetRef {
        &self.asset
    }

    /// Fan out to all four sources and fan back in.
    pub async fn sample(&self) -> ScanResult {
        let ta = self.spawn_fetch(&self.sources.ta);
        let social = self.spawn_fetch(&self.sources.social);
        let flow = self.spawn_fetch(&self.sources.flow);
        let liquidity = self.spawn_fetch(&self.sources.liquidity);

        let (ta, social, flow, liquidity) = tokio::join!(ta, social, flow, liquidity);

        ScanResult::new(
            settle(self.sources.ta.name(), ta),
            settle(self.sources.social.name(), social),
            settle(self.sources.flow.name(), flow),
            settle(self.sources.liquidity.name(), liquidity),
            Utc::now(),
        )
    }

    fn spawn_fetch(&self, source: &Arc<dyn SignalSource>) -> JoinHandle<Score> {
        let source = Arc::clone(source);
        let asset = self.asset.clone();
        let timeout = self.source_timeout;
        tokio::spawn(async move { source.fetch(&asset, timeout).await })
    }

    /// Run one full cycle. Always yields an outcome; dispatch failure only
    /// clears `delivered`.
    pub async fn run(&self, trigger: TriggerKind) -> ScanOutcome {
        let started = Instant::now();
        increment_counter!("scan_cycles_total", "trigger" => trigger.as_str());

        let result = self.sample().await;
        let message = AlertMessage::from_result(&result);
        gauge!("confluence_score", result.confluence());
        log::info!(
            "[{}] {} ({} of 4 sources available)",
            trigger,
            message,
            result.valid_count()
        );

        let delivered = self.dispatch(message.as_str()).await;
        let outcome = if delivered { "delivered" } else { "failed" };
        increment_counter!("alert_dispatch_total", "outcome" => outcome);
        histogram!("scan_cycle_ms", started.elapsed().as_millis() as f64);

        ScanOutcome { trigger, result, message, delivered }
    }

    /// Send `text` under the dispatch policy. `false` once every attempt failed.
    pub async fn dispatch(&self, text: &str) -> bool {
        for attempt in 1..=self.policy.attempts {
            if self.dispatcher.send(text).await {
                return true;
            }
            if attempt < self.policy.attempts {
                let wait = self.policy.backoff * attempt;
                log::warn!(
                    "alert attempt {}/{} failed, retrying in {:?}",
                    attempt,
                    self.policy.attempts,
                    wait
                );
                tokio::time::sleep(wait).await;
            }
        }
        log::error!("alert dropped after {} attempts: {}", self.policy.attempts, text);
        false
    }
}

fn settle(name: &'static str, joined: Result<Score, tokio::task::JoinError>) -> Score {
    let score = match joined {
        | Ok(score) => score,
        | Err(e) => {
            log::error!("{} task failed: {}", name, e);
            Score::Unavailable
        }
    };
    if !score.is_valid() {
        increment_counter!("signal_unavailable_total", "source" => name);
    }
    score
}
