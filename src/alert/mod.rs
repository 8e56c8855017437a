//! Alert delivery to the single configured destination.
//!
//! A dispatcher makes exactly one outbound attempt per call and reports the
//! outcome as a boolean. Retrying is the caller's decision (see
//! [`crate::scan::DispatchPolicy`]). Identical consecutive messages are sent
//! every time; there is no queueing or deduplication.

use crate::telegram::TelegramClient;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    /// Deliver `message`. Never fails across this boundary.
    async fn send(&self, message: &str) -> bool;
}

/// Sends alerts to one Telegram chat.
pub struct TelegramDispatcher {
    client: Arc<TelegramClient>,
    chat_id: i64,
}

impl TelegramDispatcher {
    pub fn new(client: Arc<TelegramClient>, chat_id: i64) -> Self {
        Self { client, chat_id }
    }
}

#[async_trait]
impl AlertDispatcher for TelegramDispatcher {
    async fn send(&self, message: &str) -> bool {
        match self.client.send_message(self.chat_id, message).await {
            | Ok(()) => true,
            | Err(e) => {
                log::warn!("alert to chat {} not delivered: {}", self.chat_id, e);
                false
            }
        }
    }
}

/// Dry-run dispatcher: logs the alert and reports it delivered.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

#[async_trait]
impl AlertDispatcher for LogDispatcher {
    async fn send(&self, message: &str) -> bool {
        log::info!("[dry-run] {}", message);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_log_dispatcher_always_delivers() {
        assert!(LogDispatcher.send("Signal: 0.0 (TA 0.0, Soc 0.0, Flow 0, Liq 0.0)").await);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_false() {
        // Port 9 (discard) on loopback is closed in test environments.
        let client =
            TelegramClient::new("http://127.0.0.1:9", "1:token", Duration::from_millis(500)).unwrap();
        let dispatcher = TelegramDispatcher::new(Arc::new(client), 42);
        assert!(!dispatcher.send("hello").await);
    }
}
