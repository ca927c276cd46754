//! `MetadataCache`: single-flight memoization of token and pool lookups.
//!
//! Each key maps to an `Arc<OnceLock<_>>` cell in a `DashMap`. The first
//! caller for a key runs the lookup inside `OnceLock::get_or_init`; every
//! concurrent caller for the same key blocks on that cell and receives the
//! same value. Resolved keys are answered from a shard read lock, so readers
//! never wait on one another.
//!
//! Successful lookups are buffered and handed to the `MetadataStore` on
//! [`MetadataCache::flush`]. Failed lookups resolve to the safe default,
//! which is cached for the run but never persisted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use chaintables_core::{
    address_key, is_zero_address, MetadataProvider, MetadataSource, MetadataStore, PoolTokenPair,
    StoreError, TokenMetadata,
};
use dashmap::DashMap;
use tracing::{debug, info, warn};

type Cell<T> = Arc<OnceLock<T>>;

/// Counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered from an already-resolved cell.
    pub hits: u64,
    /// External lookups issued (tokens + pools).
    pub lookups: u64,
    /// Lookups that failed and fell back to the default.
    pub failures: u64,
    pub tokens_cached: usize,
    pub pools_cached: usize,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    lookups: AtomicU64,
    failures: AtomicU64,
}

pub struct MetadataCache {
    source: Arc<dyn MetadataSource>,
    store: Option<Arc<dyn MetadataStore>>,
    tokens: DashMap<String, Cell<TokenMetadata>>,
    pools: DashMap<String, Cell<PoolTokenPair>>,
    pending_tokens: Mutex<Vec<TokenMetadata>>,
    pending_pools: Mutex<Vec<PoolTokenPair>>,
    counters: Counters,
}

impl MetadataCache {
    /// A cache with no persistence.
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            store: None,
            tokens: DashMap::new(),
            pools: DashMap::new(),
            pending_tokens: Mutex::new(Vec::new()),
            pending_pools: Mutex::new(Vec::new()),
            counters: Counters::default(),
        }
    }

    /// A cache warmed from `store`, flushing new lookups back to it.
    pub fn with_store(
        source: Arc<dyn MetadataSource>,
        store: Arc<dyn MetadataStore>,
    ) -> Result<Self, StoreError> {
        let mut cache = Self::new(source);
        let tokens = store.load_tokens()?;
        let pools = store.load_pools()?;
        info!(
            tokens = tokens.len(),
            pools = pools.len(),
            "warming metadata cache from store"
        );
        for t in tokens {
            cache.tokens.insert(address_key(&t.address), resolved(t));
        }
        for p in pools {
            cache.pools.insert(address_key(&p.pool_address), resolved(p));
        }
        cache.store = Some(store);
        Ok(cache)
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Persist buffered lookups. Returns how many entries were written.
    ///
    /// A buffer is cleared only after the store accepted it, so entries from
    /// a failed append are retried by the next flush.
    pub fn flush(&self) -> Result<usize, StoreError> {
        let Some(store) = &self.store else {
            lock(&self.pending_tokens).clear();
            lock(&self.pending_pools).clear();
            return Ok(0);
        };

        let tokens = {
            let mut pending = lock(&self.pending_tokens);
            if !pending.is_empty() {
                store.append_tokens(&pending)?;
            }
            std::mem::take(&mut *pending).len()
        };
        let pools = {
            let mut pending = lock(&self.pending_pools);
            if !pending.is_empty() {
                store.append_pools(&pending)?;
            }
            std::mem::take(&mut *pending).len()
        };

        if tokens + pools > 0 {
            info!(tokens, pools, "flushed metadata to store");
        }
        Ok(tokens + pools)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            lookups: self.counters.lookups.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            tokens_cached: self.tokens.len(),
            pools_cached: self.pools.len(),
        }
    }

    fn lookup_token(&self, key: &str) -> TokenMetadata {
        self.counters.lookups.fetch_add(1, Ordering::Relaxed);
        match self.source.fetch_token(key) {
            Ok(mut meta) => {
                meta.address = key.to_string();
                debug!(
                    address = key,
                    symbol = %meta.symbol,
                    decimals = meta.decimals,
                    source = self.source.name(),
                    "token lookup"
                );
                lock(&self.pending_tokens).push(meta.clone());
                meta
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(address = key, error = %e, "token lookup failed, using default");
                TokenMetadata::unknown(key)
            }
        }
    }

    fn lookup_pool(&self, key: &str) -> PoolTokenPair {
        self.counters.lookups.fetch_add(1, Ordering::Relaxed);
        match self.source.fetch_pool(key) {
            Ok(mut pair) => {
                pair.pool_address = key.to_string();
                debug!(
                    pool = key,
                    token0 = %pair.token0,
                    token1 = %pair.token1,
                    source = self.source.name(),
                    "pool lookup"
                );
                lock(&self.pending_pools).push(pair.clone());
                pair
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(pool = key, error = %e, "pool lookup failed, using zero-address pair");
                PoolTokenPair::unresolved(key)
            }
        }
    }

    fn cell<T>(map: &DashMap<String, Cell<T>>, key: &str) -> Cell<T> {
        if let Some(cell) = map.get(key) {
            return Arc::clone(cell.value());
        }
        Arc::clone(
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceLock::new()))
                .value(),
        )
    }

    fn count_hit(&self, cell_was_set: bool) {
        if cell_was_set {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl MetadataProvider for MetadataCache {
    fn token(&self, address: &str) -> TokenMetadata {
        let key = address_key(address);
        if key.is_empty() || is_zero_address(&key) {
            return TokenMetadata::unknown(&key);
        }
        let cell = Self::cell(&self.tokens, &key);
        self.count_hit(cell.get().is_some());
        cell.get_or_init(|| self.lookup_token(&key)).clone()
    }

    fn pool(&self, address: &str) -> PoolTokenPair {
        let key = address_key(address);
        if key.is_empty() || is_zero_address(&key) {
            return PoolTokenPair::unresolved(&key);
        }
        let cell = Self::cell(&self.pools, &key);
        self.count_hit(cell.get().is_some());
        cell.get_or_init(|| self.lookup_pool(&key)).clone()
    }
}

fn resolved<T>(value: T) -> Cell<T> {
    let cell = OnceLock::new();
    let _ = cell.set(value);
    Arc::new(cell)
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
