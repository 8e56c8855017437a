//! # Mercator Signals
//! Confluence scanner for one tradable asset.
//!
//! Four independent signal sources (X sentiment, Telegram sentiment, on-chain
//! transfer flow, static liquidity) are sampled in parallel, fused into one
//! weighted confluence score and sent to a single Telegram chat, on a fixed
//! interval and once every weekday morning.
//!
//! ```text
//! ScanScheduler ──fires──> ScanCycle ──fan-out──> SignalSource x4
//!                              │  <──fan-in (timeout-bounded)──┘
//!                              ├── fusion::confluence
//!                              └── AlertDispatcher (bounded retry)
//! ```

pub use crate::utils::error::{Error, Result};

pub mod alert;
pub mod bot;
pub mod config;
pub mod metrics;
pub mod scan;
pub mod schedule;
pub mod service;
pub mod signal;
pub mod telegram;
pub mod utils;
