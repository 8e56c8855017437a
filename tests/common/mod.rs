//! Fakes shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use mercator::alert::AlertDispatcher;
use mercator::scan::SignalSet;
use mercator::signal::{AssetRef, SignalSource};
use mercator::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Returns a fixed value and counts calls.
pub struct Fixed {
    pub name: &'static str,
    pub value: f64,
    pub calls: AtomicUsize,
}

impl Fixed {
    pub fn new(name: &'static str, value: f64) -> Arc<Self> {
        Arc::new(Self { name, value, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalSource for Fixed {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn try_fetch(&self, _asset: &AssetRef) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.value)
    }
}

/// Always errors, like a provider that is down or has no data.
pub struct Down(pub &'static str);

#[async_trait]
impl SignalSource for Down {
    fn name(&self) -> &'static str {
        self.0
    }

    async fn try_fetch(&self, _asset: &AssetRef) -> Result<f64> {
        Err(Error::SourceError(format!("{} has no data", self.0)))
    }
}

/// Never answers within any sane bound.
pub struct Hung(pub &'static str);

#[async_trait]
impl SignalSource for Hung {
    fn name(&self) -> &'static str {
        self.0
    }

    async fn try_fetch(&self, _asset: &AssetRef) -> Result<f64> {
        tokio::time::sleep(Duration::from_secs(3_600)).await;
        Ok(1_000_000.0)
    }
}

/// Records every message; reports `delivered` as configured.
pub struct Recording {
    pub delivered: bool,
    pub delay: Duration,
    pub sent: Mutex<Vec<String>>,
}

impl Recording {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self { delivered: true, delay: Duration::ZERO, sent: Mutex::new(Vec::new()) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { delivered: false, delay: Duration::ZERO, sent: Mutex::new(Vec::new()) })
    }

    /// Accepts immediately but takes `delay` to report.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delivered: true, delay, sent: Mutex::new(Vec::new()) })
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertDispatcher for Recording {
    async fn send(&self, message: &str) -> bool {
        self.sent.lock().unwrap().push(message.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.delivered
    }
}

pub fn sources(
    ta: Arc<dyn SignalSource>, social: Arc<dyn SignalSource>, flow: Arc<dyn SignalSource>,
    liquidity: Arc<dyn SignalSource>,
) -> SignalSet {
    SignalSet { ta, social, flow, liquidity }
}

pub fn asset() -> AssetRef {
    AssetRef::new("solana", Some("So11111111111111111111111111111111111111112".to_string()))
}
