//! Minimal Telegram Bot API client.
//!
//! One instance is built at startup and shared (behind an `Arc`) by the alert
//! dispatcher, the inbound-sentiment source and the welcome responder. Calls
//! carry no client-side state between them.

use crate::utils::error::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Bot API client bound to one bot token.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// One inbound update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl TelegramClient {
    /// Create a client. `timeout` bounds every request.
    pub fn new(api_base: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_base: api_base.into(), token: token.into() })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base.trim_end_matches('/'), self.token, method)
    }

    /// `sendMessage` as plain text. Any transport failure, non-2xx status or
    /// `ok: false` body is a `DispatchError`.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send(chat_id, text, None).await
    }

    /// `sendMessage` with `parse_mode=Markdown`.
    pub async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send(chat_id, text, Some("Markdown")).await
    }

    async fn send(&self, chat_id: i64, text: &str, parse_mode: Option<&str>) -> Result<()> {
        let chat = chat_id.to_string();
        let mut form = vec![("chat_id", chat.as_str()), ("text", text)];
        if let Some(mode) = parse_mode {
            form.push(("parse_mode", mode));
        }
        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                Error::DispatchError(format!("sendMessage request failed: {}", e.without_url()))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::DispatchError(format!("sendMessage http {}: {}", status, body)));
        }

        // A 2xx without a parseable body still counts as delivered.
        if let Ok(body) = resp.json::<ApiResponse<serde_json::Value>>().await {
            if !body.ok {
                return Err(Error::DispatchError(format!(
                    "sendMessage rejected: {}",
                    body.description.unwrap_or_default()
                )));
            }
        }
        Ok(())
    }

    /// `getUpdates` for the last `limit` updates. The negative offset keeps the
    /// window sliding forward; nothing inside it is ever acknowledged, so every
    /// caller sees the same recent messages.
    pub async fn get_updates(&self, limit: u32) -> Result<Vec<Update>> {
        let offset = -i64::from(limit);
        let resp = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[("offset", offset), ("limit", i64::from(limit))])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(redact)?;

        let body: ApiResponse<Vec<Update>> = resp.json().await.map_err(redact)?;
        if !body.ok {
            return Err(Error::DataError(format!(
                "getUpdates rejected: {}",
                body.description.unwrap_or_default()
            )));
        }
        Ok(body.result.unwrap_or_default())
    }
}

/// The request URL embeds the bot token; drop it before the error is logged.
fn redact(e: reqwest::Error) -> Error {
    Error::ReqwestError(e.without_url())
}

/// Text of every update that carries a text message.
pub fn message_texts(updates: &[Update]) -> Vec<&str> {
    updates
        .iter()
        .filter_map(|u| u.message.as_ref())
        .filter_map(|m| m.text.as_deref())
        .collect()
}
