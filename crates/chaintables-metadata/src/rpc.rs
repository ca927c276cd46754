//! `RpcMetadataSource`: token and pool metadata via JSON-RPC `eth_call`.
//!
//! ## Feature flag
//! Only compiled with the `rpc` feature.
//!
//! Calls go through a blocking `reqwest` client and are paced by a
//! [`RateLimiter`]. A JSON-RPC error (typically a revert) fails only the
//! field being fetched; a transport failure fails the whole lookup.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use chaintables_core::{
    LookupError, MetadataSource, PoolTokenPair, TokenMetadata, DEFAULT_DECIMALS, UNKNOWN_SYMBOL,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::rate_limiter::{RateLimiter, RateLimiterConfig};

/// `symbol()`
pub const SYMBOL_SELECTOR: &str = "0x95d89b41";
/// `decimals()`
pub const DECIMALS_SELECTOR: &str = "0x313ce567";
/// `token0()`
pub const TOKEN0_SELECTOR: &str = "0x0dfe1681";
/// `token1()`
pub const TOKEN1_SELECTOR: &str = "0xd21220a7";

/// Configuration for the RPC metadata source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcSourceConfig {
    /// HTTP JSON-RPC endpoint, e.g. "https://eth-mainnet.g.alchemy.com/v2/..."
    pub rpc_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub rate_limit: RateLimiterConfig,
}

fn default_request_timeout_ms() -> u64 { 30_000 }

impl RpcSourceConfig {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            request_timeout_ms: default_request_timeout_ms(),
            rate_limit: RateLimiterConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

pub struct RpcMetadataSource {
    client: reqwest::blocking::Client,
    url: String,
    limiter: RateLimiter,
    next_id: AtomicU64,
}

impl RpcMetadataSource {
    pub fn new(config: RpcSourceConfig) -> Result<Self, LookupError> {
        let limiter = RateLimiter::new(config.rate_limit)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| LookupError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: config.rpc_url,
            limiter,
            next_id: AtomicU64::new(1),
        })
    }

    /// `eth_call` at the latest block; returns the raw return data.
    fn eth_call(&self, to: &str, selector: &str) -> Result<Vec<u8>, LookupError> {
        self.limiter.acquire();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "eth_call",
            "params": [{ "to": to, "data": selector }, "latest"],
        });

        let resp: RpcResponse = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        if let Some(err) = resp.error {
            return Err(LookupError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        let result = resp.result.ok_or_else(|| LookupError::BadResult {
            method: selector.to_string(),
            reason: "missing result".into(),
        })?;
        let hex_str = result.strip_prefix("0x").unwrap_or(&result);
        hex::decode(hex_str).map_err(|e| LookupError::BadResult {
            method: selector.to_string(),
            reason: e.to_string(),
        })
    }

    /// Run one field call; JSON-RPC and decode errors become `None`,
    /// transport errors propagate.
    fn field<T>(
        &self,
        to: &str,
        selector: &str,
        decode: impl FnOnce(&[u8]) -> Option<T>,
    ) -> Result<Option<T>, LookupError> {
        match self.eth_call(to, selector) {
            Ok(bytes) => Ok(decode(&bytes)),
            Err(e @ LookupError::Transport(_)) => Err(e),
            Err(e) => {
                debug!(to, selector, error = %e, "eth_call failed");
                Ok(None)
            }
        }
    }
}

impl MetadataSource for RpcMetadataSource {
    fn name(&self) -> &str {
        "rpc"
    }

    fn fetch_token(&self, address: &str) -> Result<TokenMetadata, LookupError> {
        let symbol = self.field(address, SYMBOL_SELECTOR, decode_symbol)?;
        let decimals = self.field(address, DECIMALS_SELECTOR, decode_decimals)?;

        match (symbol, decimals) {
            (None, None) => Err(LookupError::BadResult {
                method: "symbol/decimals".into(),
                reason: format!("{address} answered neither call"),
            }),
            (symbol, decimals) => {
                if symbol.is_none() || decimals.is_none() {
                    warn!(address, "partial token metadata, defaulting the missing field");
                }
                Ok(TokenMetadata::new(
                    address,
                    symbol.unwrap_or_else(|| UNKNOWN_SYMBOL.to_string()),
                    decimals.unwrap_or(DEFAULT_DECIMALS),
                ))
            }
        }
    }

    fn fetch_pool(&self, address: &str) -> Result<PoolTokenPair, LookupError> {
        let token0 = self.field(address, TOKEN0_SELECTOR, decode_address)?;
        let token1 = self.field(address, TOKEN1_SELECTOR, decode_address)?;
        match (token0, token1) {
            (Some(t0), Some(t1)) => Ok(PoolTokenPair::new(address, &t0, &t1)),
            _ => Err(LookupError::BadResult {
                method: "token0/token1".into(),
                reason: format!("{address} is not a two-token pool"),
            }),
        }
    }
}

/// ABI `string`, falling back to a NUL-padded `bytes32` (as older tokens
/// such as MKR return).
pub fn decode_symbol(bytes: &[u8]) -> Option<String> {
    if let Ok(DynSolValue::String(s)) = DynSolType::String.abi_decode(bytes) {
        let s = s.trim().to_string();
        if !s.is_empty() {
            return Some(s);
        }
    }
    if bytes.len() == 32 {
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(32);
        let s = std::str::from_utf8(&bytes[..end]).ok()?.trim().to_string();
        if !s.is_empty() {
            return Some(s);
        }
    }
    None
}

/// A uint word whose value fits in `u8`.
pub fn decode_decimals(bytes: &[u8]) -> Option<u8> {
    let word = bytes.get(..32)?;
    if word[..31].iter().all(|b| *b == 0) {
        Some(word[31])
    } else {
        None
    }
}

/// An ABI-encoded address, checksummed.
pub fn decode_address(bytes: &[u8]) -> Option<String> {
    match DynSolType::Address.abi_decode(bytes) {
        Ok(DynSolValue::Address(a)) => Some(a.to_checksum(None)),
        _ => None,
    }
}
