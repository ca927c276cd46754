//! Token and pool metadata types, plus the three seams around them:
//!
//! - [`MetadataProvider`]: what decoders call. Infallible; always answers.
//! - [`MetadataSource`]: where fresh metadata comes from (RPC node, static table).
//! - [`MetadataStore`]: the append-only persisted record of successful lookups.

use std::str::FromStr;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{LookupError, StoreError};

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

pub const UNKNOWN_SYMBOL: &str = "UNK";
pub const DEFAULT_DECIMALS: u8 = 18;

/// Lowercased, trimmed form used as a cache/store key.
pub fn address_key(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// EIP-55 checksum form of a hex address, or `None` if it does not parse.
pub fn checksum_address(address: &str) -> Option<String> {
    Address::from_str(address.trim())
        .ok()
        .map(|a| a.to_checksum(None))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Lowercased token address.
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMetadata {
    pub fn new(address: &str, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address: address_key(address),
            symbol: symbol.into(),
            decimals,
        }
    }

    /// The safe default used whenever a lookup fails.
    pub fn unknown(address: &str) -> Self {
        Self::new(address, UNKNOWN_SYMBOL, DEFAULT_DECIMALS)
    }

    /// `"{symbol}.{chain_suffix}"`, e.g. `USDC.ETH`.
    pub fn alias(&self, chain_suffix: &str) -> String {
        format!("{}.{}", self.symbol, chain_suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTokenPair {
    /// Lowercased pool address.
    pub pool_address: String,
    /// Checksummed token0 address.
    pub token0: String,
    /// Checksummed token1 address.
    pub token1: String,
}

impl PoolTokenPair {
    pub fn new(pool_address: &str, token0: &str, token1: &str) -> Self {
        Self {
            pool_address: address_key(pool_address),
            token0: checksum_address(token0).unwrap_or_else(|| ZERO_ADDRESS.to_string()),
            token1: checksum_address(token1).unwrap_or_else(|| ZERO_ADDRESS.to_string()),
        }
    }

    /// The zero-address pair used whenever a pool lookup fails.
    pub fn unresolved(pool_address: &str) -> Self {
        Self {
            pool_address: address_key(pool_address),
            token0: ZERO_ADDRESS.to_string(),
            token1: ZERO_ADDRESS.to_string(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !(is_zero_address(&self.token0) && is_zero_address(&self.token1))
    }
}

pub fn is_zero_address(address: &str) -> bool {
    address_key(address) == ZERO_ADDRESS
}

/// Metadata as seen by decoders. Never fails: a miss that cannot be
/// resolved yields the safe default.
pub trait MetadataProvider: Send + Sync {
    fn token(&self, address: &str) -> TokenMetadata;

    fn pool(&self, address: &str) -> PoolTokenPair;
}

/// An external origin of token and pool metadata.
pub trait MetadataSource: Send + Sync {
    /// Short identifier used in logs (e.g. `"rpc"`, `"static"`).
    fn name(&self) -> &str;

    fn fetch_token(&self, address: &str) -> Result<TokenMetadata, LookupError>;

    fn fetch_pool(&self, address: &str) -> Result<PoolTokenPair, LookupError>;
}

/// Append-only persisted metadata. Appending a key that already exists must
/// leave the stored value unchanged.
pub trait MetadataStore: Send + Sync {
    fn load_tokens(&self) -> Result<Vec<TokenMetadata>, StoreError>;

    fn load_pools(&self) -> Result<Vec<PoolTokenPair>, StoreError>;

    fn append_tokens(&self, tokens: &[TokenMetadata]) -> Result<(), StoreError>;

    fn append_pools(&self, pools: &[PoolTokenPair]) -> Result<(), StoreError>;
}
