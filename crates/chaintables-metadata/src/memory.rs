//! In-memory `MetadataStore`. Contents are lost when the process exits.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chaintables_core::{address_key, MetadataStore, PoolTokenPair, StoreError, TokenMetadata};

/// Thread-safe, append-only store backed by ordered maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tokens: RwLock<BTreeMap<String, TokenMetadata>>,
    pools: RwLock<BTreeMap<String, PoolTokenPair>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for MemoryStore {
    fn load_tokens(&self) -> Result<Vec<TokenMetadata>, StoreError> {
        let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
        Ok(tokens.values().cloned().collect())
    }

    fn load_pools(&self) -> Result<Vec<PoolTokenPair>, StoreError> {
        let pools = self.pools.read().unwrap_or_else(|e| e.into_inner());
        Ok(pools.values().cloned().collect())
    }

    fn append_tokens(&self, tokens: &[TokenMetadata]) -> Result<(), StoreError> {
        let mut map = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        for t in tokens {
            map.entry(address_key(&t.address)).or_insert_with(|| t.clone());
        }
        Ok(())
    }

    fn append_pools(&self, pools: &[PoolTokenPair]) -> Result<(), StoreError> {
        let mut map = self.pools.write().unwrap_or_else(|e| e.into_inner());
        for p in pools {
            map.entry(address_key(&p.pool_address)).or_insert_with(|| p.clone());
        }
        Ok(())
    }
}
