//! Configuration module for the scanner.
//!
//! Read once at startup (TOML file, then environment overrides) and shared
//! immutably for the life of the process.

use crate::utils::error::{Error, Result};
use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration file version
    pub version: String,

    /// Telegram bot used for alerts, inbound sentiment and the welcome reply
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Off-chain data source settings
    #[serde(default)]
    pub sources: SourcesConfig,

    /// The asset being scanned
    #[serde(default)]
    pub asset: AssetConfig,

    /// Chain selection and RPC endpoints
    #[serde(default)]
    pub onchain: OnchainConfig,

    /// Interval and daily triggers
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Process-level settings
    #[serde(default)]
    pub service: ServiceConfig,
}

/// Telegram Bot API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token (required)
    pub bot_token: Option<String>,

    /// Destination chat for alerts (required)
    pub chat_id: Option<i64>,

    /// Bot API base URL
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    /// Max inbound updates read per sentiment sample
    #[serde(default = "default_updates_limit")]
    pub updates_limit: u32,
}

/// Off-chain source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// X (Twitter) API v2 bearer token; the X source is unavailable without it
    pub twitter_bearer_token: Option<String>,

    /// X API base URL
    #[serde(default = "default_twitter_api_base")]
    pub twitter_api_base: String,

    /// Max posts requested per search (the API caps this at 100)
    #[serde(default = "default_search_max_results")]
    pub search_max_results: u32,

    /// Language kept from search results
    #[serde(default = "default_search_lang")]
    pub search_lang: String,

    /// Per-source fetch bound in seconds
    #[serde(default = "default_source_timeout_secs")]
    pub timeout_secs: u64,
}

/// Asset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// CoinGecko id, used as the social search query
    #[serde(default)]
    pub coingecko_id: String,

    /// Token mint (Solana) or contract (Ethereum) address
    pub token_address: Option<String>,

    /// Static liquidity score, held constant for the process lifetime
    #[serde(default)]
    pub liquidity_score: f64,
}

/// On-chain flow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnchainConfig {
    /// `solana` or `ethereum` (alias `eth`)
    #[serde(default = "default_chain")]
    pub chain: String,

    /// Solana RPC endpoint URL
    #[serde(default = "default_solana_rpc_url")]
    pub solana_rpc_url: String,

    /// Ethereum JSON-RPC endpoint URL; flow is unavailable on Ethereum without it
    pub eth_rpc_url: Option<String>,

    /// Cap on signatures sampled per Solana query
    #[serde(default = "default_signature_limit")]
    pub signature_limit: usize,

    /// Trailing block window for Ethereum transfer logs (~24h)
    #[serde(default = "default_eth_block_window")]
    pub eth_block_window: u64,

    /// Decimals assumed when the token's `decimals()` call fails
    #[serde(default = "default_token_decimals")]
    pub default_decimals: u8,
}

/// Scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Opportunistic scan interval in seconds (first scan fires immediately)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Wall-clock time of the daily top pick, `HH:MM`
    #[serde(default = "default_daily_time")]
    pub daily_time: String,

    /// Weekdays on which the daily scan fires
    #[serde(default = "default_weekdays")]
    pub weekdays: Vec<String>,

    /// IANA timezone of `daily_time`
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Delivery attempts per alert, including the first
    #[serde(default = "default_dispatch_attempts")]
    pub dispatch_attempts: u32,

    /// Backoff step between delivery attempts, multiplied by the attempt number
    #[serde(default = "default_dispatch_backoff_ms")]
    pub dispatch_backoff_ms: u64,
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Bind address for `/healthz` and `/metrics`
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Log alerts instead of sending them
    #[serde(default)]
    pub dry_run: bool,

    /// Answer `/start` with the welcome text
    #[serde(default = "default_true")]
    pub welcome_enabled: bool,

    /// Poll period of the welcome responder in seconds
    #[serde(default = "default_welcome_poll_secs")]
    pub welcome_poll_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            telegram: TelegramConfig::default(),
            sources: SourcesConfig::default(),
            asset: AssetConfig::default(),
            onchain: OnchainConfig::default(),
            schedule: ScheduleConfig::default(),
            service: ServiceConfig::default(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: default_telegram_api_base(),
            updates_limit: default_updates_limit(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            twitter_bearer_token: None,
            twitter_api_base: default_twitter_api_base(),
            search_max_results: default_search_max_results(),
            search_lang: default_search_lang(),
            timeout_secs: default_source_timeout_secs(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self { coingecko_id: String::new(), token_address: None, liquidity_score: 0.0 }
    }
}

impl Default for OnchainConfig {
    fn default() -> Self {
        Self {
            chain: default_chain(),
            solana_rpc_url: default_solana_rpc_url(),
            eth_rpc_url: None,
            signature_limit: default_signature_limit(),
            eth_block_window: default_eth_block_window(),
            default_decimals: default_token_decimals(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            daily_time: default_daily_time(),
            weekdays: default_weekdays(),
            timezone: default_timezone(),
            dispatch_attempts: default_dispatch_attempts(),
            dispatch_backoff_ms: default_dispatch_backoff_ms(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            http_addr: default_http_addr(),
            dry_run: false,
            welcome_enabled: true,
            welcome_poll_secs: default_welcome_poll_secs(),
        }
    }
}

// --------- Helper default functions for serde ---------
fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}
fn default_updates_limit() -> u32 {
    100
}
fn default_twitter_api_base() -> String {
    "https://api.twitter.com".to_string()
}
fn default_search_max_results() -> u32 {
    100
}
fn default_search_lang() -> String {
    "en".to_string()
}
fn default_source_timeout_secs() -> u64 {
    5
}
fn default_chain() -> String {
    "solana".to_string()
}
fn default_solana_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}
fn default_signature_limit() -> usize {
    500
}
fn default_eth_block_window() -> u64 {
    6_500
}
fn default_token_decimals() -> u8 {
    18
}
fn default_interval_secs() -> u64 {
    900
}
fn default_daily_time() -> String {
    "07:30".to_string()
}
fn default_weekdays() -> Vec<String> {
    ["Mon", "Tue", "Wed", "Thu", "Fri"].iter().map(|d| d.to_string()).collect()
}
fn default_timezone() -> String {
    "America/New_York".to_string()
}
fn default_dispatch_attempts() -> u32 {
    3
}
fn default_dispatch_backoff_ms() -> u64 {
    2_000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_http_addr() -> String {
    "127.0.0.1:8888".to_string()
}
fn default_true() -> bool {
    true
}
fn default_welcome_poll_secs() -> u64 {
    5
}

/// Read an env var, treating empty values as unset.
fn env_nonempty(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ScheduleConfig {
    /// Parsed `daily_time`
    pub fn parse_daily_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(self.daily_time.trim(), "%H:%M").map_err(|e| {
            Error::ConfigError(format!("schedule.daily_time '{}': {}", self.daily_time, e))
        })
    }

    /// Parsed `weekdays`
    pub fn parse_weekdays(&self) -> Result<Vec<Weekday>> {
        self.weekdays
            .iter()
            .map(|d| {
                d.trim().parse::<Weekday>().map_err(|_| {
                    Error::ConfigError(format!("schedule.weekdays: unknown weekday '{}'", d))
                })
            })
            .collect()
    }

    /// Parsed `timezone`
    pub fn parse_timezone(&self) -> Result<Tz> {
        self.timezone.trim().parse::<Tz>().map_err(|e| {
            Error::ConfigError(format!("schedule.timezone '{}': {}", self.timezone, e))
        })
    }
}

impl Config {
    /// Serialize default config to TOML string
    pub fn default_toml() -> String {
        // A struct of plain fields always serializes.
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Load configuration from a specific file path, then apply env overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {:?}: {}", path.as_ref(), e))
        })?;
        let mut cfg: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;
        cfg.merge_env()?;
        Ok(cfg)
    }

    /// Save the configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::ConfigError(format!("Failed to create directory {:?}: {}", parent, e))
                })?;
            }
        }
        std::fs::write(path, content).map_err(|e| {
            Error::ConfigError(format!("Failed to write config file {:?}: {}", path, e))
        })?;
        Ok(())
    }

    /// Load from `path` if it exists, else the user config dir, else defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::from_file(path);
        }

        if let Some(mut user_path) = dirs::config_dir() {
            user_path.push("mercator");
            user_path.push("config.toml");
            if user_path.exists() {
                return Self::from_file(user_path);
            }
        }

        log::warn!("No configuration file found at {:?} – using defaults", path.as_ref());
        let mut config = Self::default();
        config.merge_env()?;
        Ok(config)
    }

    /// Merge environment variables into the configuration
    pub fn merge_env(&mut self) -> Result<()> {
        if let Some(token) = env_nonempty("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }

        if let Some(raw) = env_nonempty("CHAT_ID").or_else(|| env_nonempty("TELEGRAM_CHAT_ID")) {
            let chat_id = raw
                .parse::<i64>()
                .map_err(|e| Error::ConfigError(format!("CHAT_ID '{}': {}", raw, e)))?;
            self.telegram.chat_id = Some(chat_id);
        }

        if let Some(bearer) = env_nonempty("TWITTER_BEARER_TOKEN") {
            self.sources.twitter_bearer_token = Some(bearer);
        }

        if let Some(rpc_url) = env_nonempty("SOLANA_RPC_URL") {
            self.onchain.solana_rpc_url = rpc_url;
        }

        if let Some(rpc_url) = env_nonempty("ETH_RPC_URL") {
            self.onchain.eth_rpc_url = Some(rpc_url);
        }

        if let Some(chain) = env_nonempty("CHAIN") {
            self.onchain.chain = chain;
        }

        if let Some(id) = env_nonempty("COINGECKO_ID") {
            self.asset.coingecko_id = id;
        }

        if let Some(address) = env_nonempty("TOKEN_ADDRESS") {
            self.asset.token_address = Some(address);
        }

        // Present but empty or unparsable means 0.0, not an error.
        if let Ok(raw) = env::var("LIQUIDITY_SCORE") {
            self.asset.liquidity_score = raw.trim().parse::<f64>().unwrap_or(0.0);
        }

        if let Some(tz) = env_nonempty("TZ") {
            self.schedule.timezone = tz;
        }

        if let Some(flag) = env_nonempty("DRY_RUN") {
            self.service.dry_run = flag.eq_ignore_ascii_case("true") || flag == "1";
        }

        Ok(())
    }

    /// Validate the configuration for required fields and reasonable values.
    /// Optional data-source credentials are never required.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(Error::ConfigError("Config version must be set (e.g., '0.1.0')".into()));
        }
        if self.telegram.bot_token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(Error::ConfigError(
                "telegram.bot_token (TELEGRAM_BOT_TOKEN) must be set".into(),
            ));
        }
        if self.telegram.chat_id.is_none() {
            return Err(Error::ConfigError("telegram.chat_id (CHAT_ID) must be set".into()));
        }
        if self.sources.timeout_secs == 0 {
            return Err(Error::ConfigError("sources.timeout_secs must be > 0".into()));
        }
        if self.schedule.interval_secs == 0 {
            return Err(Error::ConfigError("schedule.interval_secs must be > 0".into()));
        }
        if self.schedule.dispatch_attempts == 0 {
            return Err(Error::ConfigError("schedule.dispatch_attempts must be > 0".into()));
        }
        if !self.asset.liquidity_score.is_finite() {
            return Err(Error::ConfigError("asset.liquidity_score must be finite".into()));
        }
        self.schedule.parse_daily_time()?;
        self.schedule.parse_timezone()?;
        if self.schedule.parse_weekdays()?.is_empty() {
            return Err(Error::ConfigError("schedule.weekdays must not be empty".into()));
        }
        Ok(())
    }
}
