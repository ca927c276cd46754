//! `StaticMetadataSource`: an in-memory table of known tokens and pools.
//!
//! Used for offline runs and tests. Unknown addresses fail with
//! `LookupError::NotFound`, so the cache falls back to its defaults.

use std::collections::HashMap;

use chaintables_core::{address_key, LookupError, MetadataSource, PoolTokenPair, TokenMetadata};

#[derive(Debug, Clone, Default)]
pub struct StaticMetadataSource {
    tokens: HashMap<String, TokenMetadata>,
    pools: HashMap<String, PoolTokenPair>,
}

/// Well-known Ethereum mainnet tokens.
const MAINNET_TOKENS: &[(&str, &str, u8)] = &[
    ("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", "USDC", 6),
    ("0xdac17f958d2ee523a2206206994597c13d831ec7", "USDT", 6),
    ("0x6b175474e89094c44da98b954eedeac495271d0f", "DAI", 18),
    ("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", "WETH", 18),
    ("0x2260fac5e5542a773aa44fbcfedf7c193bc2c599", "WBTC", 8),
];

impl StaticMetadataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded with USDC, USDT, DAI, WETH and WBTC.
    pub fn mainnet() -> Self {
        MAINNET_TOKENS
            .iter()
            .fold(Self::new(), |s, (addr, sym, dec)| s.with_token(addr, sym, *dec))
    }

    pub fn with_token(mut self, address: &str, symbol: &str, decimals: u8) -> Self {
        self.tokens
            .insert(address_key(address), TokenMetadata::new(address, symbol, decimals));
        self
    }

    pub fn with_pool(mut self, pool: &str, token0: &str, token1: &str) -> Self {
        self.pools
            .insert(address_key(pool), PoolTokenPair::new(pool, token0, token1));
        self
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

impl MetadataSource for StaticMetadataSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch_token(&self, address: &str) -> Result<TokenMetadata, LookupError> {
        self.tokens
            .get(&address_key(address))
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                address: address.to_string(),
            })
    }

    fn fetch_pool(&self, address: &str) -> Result<PoolTokenPair, LookupError> {
        self.pools
            .get(&address_key(address))
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                address: address.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_seed() {
        let s = StaticMetadataSource::mainnet();
        assert_eq!(s.token_count(), 5);
        let wbtc = s
            .fetch_token("0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599")
            .unwrap();
        assert_eq!((wbtc.symbol.as_str(), wbtc.decimals), ("WBTC", 8));
    }

    #[test]
    fn unknown_is_not_found() {
        let s = StaticMetadataSource::new();
        assert!(matches!(
            s.fetch_pool("0xabc"),
            Err(LookupError::NotFound { .. })
        ));
    }

    #[test]
    fn pool_tokens_are_checksummed() {
        let s = StaticMetadataSource::new().with_pool(
            "0xB4E16D0168E52D35CACD2C6185B44281EC28C9DC",
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
        );
        let p = s.fetch_pool("0xb4e16d0168e52d35cacd2c6185b44281ec28c9dc").unwrap();
        assert_eq!(p.token0, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        assert_eq!(p.token1, "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
    }
}
