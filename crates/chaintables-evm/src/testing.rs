//! In-memory metadata provider for unit tests.

use std::collections::HashMap;

use chaintables_core::{address_key, MetadataProvider, PoolTokenPair, TokenMetadata};

#[derive(Debug, Default)]
pub struct FixedMetadata {
    tokens: HashMap<String, TokenMetadata>,
    pools: HashMap<String, PoolTokenPair>,
}

impl FixedMetadata {
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
}

impl MetadataProvider for FixedMetadata {
    fn token(&self, address: &str) -> TokenMetadata {
        self.tokens
            .get(&address_key(address))
            .cloned()
            .unwrap_or_else(|| TokenMetadata::unknown(address))
    }

    fn pool(&self, address: &str) -> PoolTokenPair {
        self.pools
            .get(&address_key(address))
            .cloned()
            .unwrap_or_else(|| PoolTokenPair::unresolved(address))
    }
}
