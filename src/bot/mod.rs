//! Welcome responder: answers `/start` with a static informational text.
//!
//! Polls the same recent-updates window the Telegram sentiment source reads.
//! The highest `update_id` seen on the first poll becomes the watermark, so
//! the backlog present at startup is never answered.

use crate::telegram::{TelegramClient, Update};
use crate::utils::error::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

/// Sent with Markdown parse mode.
pub const WELCOME_TEXT: &str = "Welcome to MahlerSignalsBot! Every weekday at 7:30 AM EST you'll \
    get our top market pick, plus opportunistic alerts. *Not financial advice.*";

lazy_static! {
    static ref START_RE: Regex = Regex::new(r"(?i)^\s*/?start(@\w+)?\s*$").unwrap();
}

pub fn is_start(text: &str) -> bool {
    START_RE.is_match(text)
}

/// Chats whose `/start` arrived after update `after`.
pub fn replies(updates: &[Update], after: i64) -> Vec<i64> {
    updates
        .iter()
        .filter(|u| u.update_id > after)
        .filter_map(|u| u.message.as_ref())
        .filter(|m| m.text.as_deref().map_or(false, is_start))
        .map(|m| m.chat.id)
        .collect()
}

pub struct WelcomeResponder {
    client: Arc<TelegramClient>,
    limit: u32,
    poll: Duration,
    watermark: Option<i64>,
}

impl WelcomeResponder {
    pub fn new(client: Arc<TelegramClient>, limit: u32, poll: Duration) -> Self {
        Self { client, limit, poll, watermark: None }
    }

    /// One poll. Returns how many welcome replies were sent.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let updates = self.client.get_updates(self.limit).await?;
        let newest = updates.iter().map(|u| u.update_id).max();
        let Some(after) = self.watermark else {
            // First poll only sets the watermark.
            self.watermark = Some(newest.unwrap_or(0));
            return Ok(0);
        };
        let chats = replies(&updates, after);
        self.watermark = Some(newest.map_or(after, |n| n.max(after)));

        let mut sent = 0;
        for chat in chats {
            match self.client.send_markdown(chat, WELCOME_TEXT).await {
                | Ok(()) => sent += 1,
                | Err(e) => log::warn!("welcome to chat {} failed: {}", chat, e),
            }
        }
        Ok(sent)
    }

    /// Poll forever. Errors are logged and the next poll proceeds.
    pub async fn run(mut self) {
        log::info!("👋 Welcome responder polling every {:?}", self.poll);
        let mut ticker = tokio::time::interval(self.poll);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.poll_once().await {
                | Ok(0) => {}
                | Ok(n) => log::info!("sent {} welcome message(s)", n),
                | Err(e) => log::debug!("welcome poll failed: {}", e),
            }
        }
    }
}
