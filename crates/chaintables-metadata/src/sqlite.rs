//! SQLite-backed `MetadataStore`.
//!
//! ## Feature flag
//! This module is only compiled when the `sqlite` feature is enabled:
//! ```toml
//! chaintables-metadata = { version = "...", features = ["sqlite"] }
//! ```
//!
//! ## Schema
//! ```sql
//! CREATE TABLE ct_tokens (
//!     address  TEXT    PRIMARY KEY,   -- lowercased
//!     symbol   TEXT    NOT NULL,
//!     decimals INTEGER NOT NULL
//! );
//! CREATE TABLE ct_pools (
//!     pool_address TEXT PRIMARY KEY,  -- lowercased
//!     token0       TEXT NOT NULL,     -- checksummed
//!     token1       TEXT NOT NULL
//! );
//! ```
//!
//! Rows are written with `INSERT OR IGNORE`, so a persisted key keeps its
//! first value forever.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chaintables_core::{address_key, MetadataStore, PoolTokenPair, StoreError, TokenMetadata};
use rusqlite::{params, Connection};

/// Thread-safe via an internal `Arc<Mutex<Connection>>`. WAL mode is enabled.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a metadata database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref()).map_err(sqlite_err)?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(sqlite_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS ct_tokens (
                address  TEXT    PRIMARY KEY,
                symbol   TEXT    NOT NULL,
                decimals INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS ct_pools (
                pool_address TEXT PRIMARY KEY,
                token0       TEXT NOT NULL,
                token1       TEXT NOT NULL
            );",
        )
        .map_err(sqlite_err)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (useful for tests).
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:")
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MetadataStore for SqliteStore {
    fn load_tokens(&self) -> Result<Vec<TokenMetadata>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT address, symbol, decimals FROM ct_tokens ORDER BY address")
            .map_err(sqlite_err)?;
        let rows = stmt
            .query_map([], |row| {
                let address: String = row.get(0)?;
                let symbol: String = row.get(1)?;
                let decimals: i64 = row.get(2)?;
                Ok((address, symbol, decimals))
            })
            .map_err(sqlite_err)?;

        let mut out = Vec::new();
        for row in rows {
            let (address, symbol, decimals) = row.map_err(sqlite_err)?;
            let decimals = u8::try_from(decimals).map_err(|_| {
                StoreError::Database(format!("decimals {decimals} out of range for {address}"))
            })?;
            out.push(TokenMetadata::new(&address, symbol, decimals));
        }
        Ok(out)
    }

    fn load_pools(&self) -> Result<Vec<PoolTokenPair>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT pool_address, token0, token1 FROM ct_pools ORDER BY pool_address")
            .map_err(sqlite_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PoolTokenPair {
                    pool_address: row.get(0)?,
                    token0: row.get(1)?,
                    token1: row.get(2)?,
                })
            })
            .map_err(sqlite_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
    }

    fn append_tokens(&self, tokens: &[TokenMetadata]) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction().map_err(sqlite_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR IGNORE INTO ct_tokens (address, symbol, decimals) VALUES (?1, ?2, ?3)",
                )
                .map_err(sqlite_err)?;
            for t in tokens {
                stmt.execute(params![address_key(&t.address), &t.symbol, t.decimals as i64])
                    .map_err(sqlite_err)?;
            }
        }
        tx.commit().map_err(sqlite_err)
    }

    fn append_pools(&self, pools: &[PoolTokenPair]) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction().map_err(sqlite_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR IGNORE INTO ct_pools (pool_address, token0, token1) VALUES (?1, ?2, ?3)",
                )
                .map_err(sqlite_err)?;
            for p in pools {
                stmt.execute(params![address_key(&p.pool_address), &p.token0, &p.token1])
                    .map_err(sqlite_err)?;
            }
        }
        tx.commit().map_err(sqlite_err)
    }
}

fn sqlite_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_tokens_and_pools() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .append_tokens(&[TokenMetadata::new(
                "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
                "USDC",
                6,
            )])
            .unwrap();
        store
            .append_pools(&[PoolTokenPair::new(
                "0xB4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc",
                "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
                "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
            )])
            .unwrap();

        let tokens = store.load_tokens().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].address, "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        let pools = store.load_pools().unwrap();
        assert_eq!(pools[0].token1, "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
    }

    #[test]
    fn insert_or_ignore_keeps_first_value() {
        let store = SqliteStore::in_memory().unwrap();
        store.append_tokens(&[TokenMetadata::new("0xaa", "FIRST", 6)]).unwrap();
        store.append_tokens(&[TokenMetadata::new("0xAA", "SECOND", 8)]).unwrap();
        let tokens = store.load_tokens().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!((tokens[0].symbol.as_str(), tokens[0].decimals), ("FIRST", 6));
    }
}
