//! On-chain transfer-flow source.
//!
//! Two chains are supported:
//! - Solana: number of signatures referencing the token address inside the
//!   trailing 24h, sampled from at most `signature_limit` recent signatures.
//! - Ethereum: sum of ERC-20 `Transfer` values over the trailing
//!   `eth_block_window` blocks, scaled by the token's `decimals()` (falling
//!   back to `default_decimals`), rounded to 2 decimals.
//!
//! Values are raw magnitudes and are not normalised before weighting.

use super::{AssetRef, SignalSource};
use crate::config::OnchainConfig;
use crate::utils::error::{Error, Result};
use crate::utils::round_to;
use async_trait::async_trait;
use hex_literal::hex;
use solana_client::nonblocking::rpc_client::RpcClient as AsyncRpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use web3::transports::Http;
use web3::types::{Address, BlockNumber, Bytes, CallRequest, FilterBuilder, H256, U256, U64};
use web3::Web3;

/// keccak256("Transfer(address,address,uint256)")
const TRANSFER_TOPIC: [u8; 32] =
    hex!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

/// Selector of `decimals()`
const DECIMALS_SELECTOR: [u8; 4] = hex!("313ce567");

const SOLANA_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Supported chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    Solana,
    Ethereum,
}

impl FromStr for Chain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            | "solana" | "sol" => Ok(Chain::Solana),
            | "ethereum" | "eth" => Ok(Chain::Ethereum),
            | other => Err(Error::InvalidArgument(format!("unsupported chain '{}'", other))),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            | Chain::Solana => write!(f, "solana"),
            | Chain::Ethereum => write!(f, "ethereum"),
        }
    }
}

/// Solana signature counter.
pub struct SolanaFlow {
    rpc: Arc<AsyncRpcClient>,
    limit: usize,
}

impl SolanaFlow {
    pub fn new(rpc_url: impl Into<String>, limit: usize) -> Self {
        let rpc = AsyncRpcClient::new_with_commitment(rpc_url.into(), CommitmentConfig::confirmed());
        Self { rpc: Arc::new(rpc), limit }
    }

    async fn flow(&self, address: &str) -> Result<f64> {
        let pubkey = Pubkey::from_str(address.trim())
            .map_err(|e| Error::InvalidArgument(format!("invalid Solana address: {}", e)))?;
        let config = GetConfirmedSignaturesForAddress2Config {
            before: None,
            until: None,
            limit: Some(self.limit),
            commitment: None,
        };
        let signatures = self.rpc.get_signatures_for_address_with_config(&pubkey, config).await?;
        let cutoff = chrono::Utc::now().timestamp() - SOLANA_WINDOW_SECS;
        let count = count_within_window(signatures.iter().map(|s| s.block_time), cutoff);
        Ok(count as f64)
    }
}

/// Entries without a block time are still pending and counted.
pub fn count_within_window<I>(block_times: I, cutoff: i64) -> usize
where
    I: IntoIterator<Item = Option<i64>>,
{
    block_times.into_iter().filter(|t| t.map_or(true, |t| t >= cutoff)).count()
}

/// ERC-20 transfer volume reader.
pub struct EthereumFlow {
    web3: Web3<Http>,
    block_window: u64,
    default_decimals: u8,
}

impl EthereumFlow {
    pub fn new(rpc_url: &str, block_window: u64, default_decimals: u8) -> Result<Self> {
        let transport = Http::new(rpc_url)?;
        Ok(Self { web3: Web3::new(transport), block_window, default_decimals })
    }

    async fn flow(&self, address: &str) -> Result<f64> {
        let contract = parse_evm_address(address)?;
        let latest = self.web3.eth().block_number().await?.as_u64();
        let from = latest.saturating_sub(self.block_window);

        let filter = FilterBuilder::default()
            .address(vec![contract])
            .topics(Some(vec![H256::from(TRANSFER_TOPIC)]), None, None, None)
            .from_block(BlockNumber::Number(U64::from(from)))
            .to_block(BlockNumber::Number(U64::from(latest)))
            .build();
        let logs = self.web3.eth().logs(filter).await?;
        log::debug!("{} Transfer logs for {} in blocks {}..={}", logs.len(), address, from, latest);

        let total = sum_transfer_values(logs.iter().map(|l| l.data.0.as_slice()));
        let decimals = self.decimals(contract).await;
        Ok(scale_amount(total, decimals))
    }

    async fn decimals(&self, contract: Address) -> u8 {
        let call = CallRequest {
            to: Some(contract),
            data: Some(Bytes(DECIMALS_SELECTOR.to_vec())),
            ..Default::default()
        };
        match self.web3.eth().call(call, None).await {
            | Ok(bytes) => decode_decimals(&bytes.0).unwrap_or(self.default_decimals),
            | Err(e) => {
                log::debug!("decimals() failed for {:?}: {} – using {}", contract, e, self.default_decimals);
                self.default_decimals
            }
        }
    }
}

fn parse_evm_address(address: &str) -> Result<Address> {
    let trimmed = address.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    Address::from_str(hex_part)
        .map_err(|e| Error::InvalidArgument(format!("invalid EVM address '{}': {}", address, e)))
}

/// Sum the uint256 `value` word of each log's data, saturating.
pub fn sum_transfer_values<'a, I>(data: I) -> U256
where
    I: IntoIterator<Item = &'a [u8]>,
{
    data.into_iter()
        .filter(|d| d.len() >= 32)
        .map(|d| U256::from_big_endian(&d[..32]))
        .fold(U256::zero(), |acc, v| acc.saturating_add(v))
}

/// Scale a raw token amount by `decimals`, rounded to 2 places.
pub fn scale_amount(total: U256, decimals: u8) -> f64 {
    let raw = total.to_string().parse::<f64>().unwrap_or(0.0);
    round_to(raw / 10_f64.powi(i32::from(decimals)), 2)
}

/// Decode an ABI-encoded uint8 return word.
fn decode_decimals(word: &[u8]) -> Option<u8> {
    if word.len() < 32 {
        return None;
    }
    let value = U256::from_big_endian(&word[..32]);
    if value > U256::from(u8::MAX) {
        None
    } else {
        Some(value.low_u32() as u8)
    }
}

enum FlowBackend {
    Solana(SolanaFlow),
    Ethereum(EthereumFlow),
    /// Always unavailable, with the reason
    Disabled(String),
}

/// The on-chain flow signal source for one configured chain.
pub struct OnchainFlowSource {
    backend: FlowBackend,
}

impl OnchainFlowSource {
    pub fn solana(flow: SolanaFlow) -> Self {
        Self { backend: FlowBackend::Solana(flow) }
    }

    pub fn ethereum(flow: EthereumFlow) -> Self {
        Self { backend: FlowBackend::Ethereum(flow) }
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self { backend: FlowBackend::Disabled(reason.into()) }
    }

    /// Build from config. Never fails: an unknown chain or a missing
    /// endpoint yields an always-unavailable source.
    pub fn from_config(cfg: &OnchainConfig) -> Self {
        match cfg.chain.parse::<Chain>() {
            | Ok(Chain::Solana) => {
                Self::solana(SolanaFlow::new(cfg.solana_rpc_url.clone(), cfg.signature_limit))
            }
            | Ok(Chain::Ethereum) => match cfg.eth_rpc_url.as_deref() {
                | Some(url) => {
                    match EthereumFlow::new(url, cfg.eth_block_window, cfg.default_decimals) {
                        | Ok(flow) => Self::ethereum(flow),
                        | Err(e) => {
                            log::warn!("Ethereum flow disabled: {}", e);
                            Self::disabled(format!("bad ETH RPC endpoint: {}", e))
                        }
                    }
                }
                | None => Self::disabled("no ETH RPC URL configured"),
            },
            | Err(e) => {
                log::warn!("On-chain flow disabled: {}", e);
                Self::disabled(e.to_string())
            }
        }
    }
}

#[async_trait]
impl SignalSource for OnchainFlowSource {
    fn name(&self) -> &'static str {
        "onchain_flow"
    }

    async fn try_fetch(&self, asset: &AssetRef) -> Result<f64> {
        if let FlowBackend::Disabled(reason) = &self.backend {
            return Err(Error::SourceError(reason.clone()));
        }
        let address = asset
            .token_address
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| Error::SourceError("no token address configured".into()))?;

        match &self.backend {
            | FlowBackend::Solana(flow) => flow.flow(address).await,
            | FlowBackend::Ethereum(flow) => flow.flow(address).await,
            | FlowBackend::Disabled(reason) => Err(Error::SourceError(reason.clone())),
        }
    }
}
