//! CSV-backed `MetadataStore`: two append-only files in one directory.
//!
//! - `token_meta.csv`: `address,symbol,decimals`
//! - `pool_tokens.csv`: `pool,token0,token1`
//!
//! The header is written when a file is first created. If a key appears more
//! than once on disk, the first row wins.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chaintables_core::{address_key, MetadataStore, PoolTokenPair, StoreError, TokenMetadata};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub const TOKEN_FILE: &str = "token_meta.csv";
pub const POOL_FILE: &str = "pool_tokens.csv";

#[derive(Debug, Serialize, Deserialize)]
struct TokenRow {
    address: String,
    symbol: String,
    decimals: u8,
}

#[derive(Debug, Serialize, Deserialize)]
struct PoolRow {
    pool: String,
    token0: String,
    token1: String,
}

pub struct CsvStore {
    dir: PathBuf,
    /// Keys already on disk, so appends never duplicate them.
    known_tokens: Mutex<HashSet<String>>,
    known_pools: Mutex<HashSet<String>>,
}

impl CsvStore {
    /// Use `dir` for both files, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let store = Self {
            dir,
            known_tokens: Mutex::new(HashSet::new()),
            known_pools: Mutex::new(HashSet::new()),
        };
        let tokens: HashSet<String> = store
            .read_tokens()?
            .into_iter()
            .map(|t| t.address)
            .collect();
        let pools: HashSet<String> = store
            .read_pools()?
            .into_iter()
            .map(|p| p.pool_address)
            .collect();
        *lock(&store.known_tokens) = tokens;
        *lock(&store.known_pools) = pools;
        Ok(store)
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    fn pool_path(&self) -> PathBuf {
        self.dir.join(POOL_FILE)
    }

    fn read_tokens(&self) -> Result<Vec<TokenMetadata>, StoreError> {
        let rows: Vec<TokenRow> = read_rows(&self.token_path())?;
        let mut seen = HashSet::new();
        Ok(rows
            .into_iter()
            .filter(|r| seen.insert(address_key(&r.address)))
            .map(|r| TokenMetadata::new(&r.address, r.symbol, r.decimals))
            .collect())
    }

    fn read_pools(&self) -> Result<Vec<PoolTokenPair>, StoreError> {
        let rows: Vec<PoolRow> = read_rows(&self.pool_path())?;
        let mut seen = HashSet::new();
        Ok(rows
            .into_iter()
            .filter(|r| seen.insert(address_key(&r.pool)))
            .map(|r| PoolTokenPair::new(&r.pool, &r.token0, &r.token1))
            .collect())
    }
}

impl MetadataStore for CsvStore {
    fn load_tokens(&self) -> Result<Vec<TokenMetadata>, StoreError> {
        self.read_tokens()
    }

    fn load_pools(&self) -> Result<Vec<PoolTokenPair>, StoreError> {
        self.read_pools()
    }

    fn append_tokens(&self, tokens: &[TokenMetadata]) -> Result<(), StoreError> {
        let mut known = lock(&self.known_tokens);
        let rows: Vec<TokenRow> = tokens
            .iter()
            .filter(|t| known.insert(address_key(&t.address)))
            .map(|t| TokenRow {
                address: address_key(&t.address),
                symbol: t.symbol.clone(),
                decimals: t.decimals,
            })
            .collect();
        append_rows(&self.token_path(), &rows)
    }

    fn append_pools(&self, pools: &[PoolTokenPair]) -> Result<(), StoreError> {
        let mut known = lock(&self.known_pools);
        let rows: Vec<PoolRow> = pools
            .iter()
            .filter(|p| known.insert(address_key(&p.pool_address)))
            .map(|p| PoolRow {
                pool: address_key(&p.pool_address),
                token0: p.token0.clone(),
                token1: p.token1.clone(),
            })
            .collect();
        append_rows(&self.pool_path(), &rows)
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path).map_err(|e| format_err(path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| format_err(path, e))
}

fn append_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), StoreError> {
    if rows.is_empty() {
        return Ok(());
    }
    let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(is_new)
        .from_writer(file);
    for row in rows {
        writer.serialize(row).map_err(|e| format_err(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

fn format_err(path: &Path, e: csv::Error) -> StoreError {
    StoreError::Format {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("chaintables-csv-{tag}-{}", std::process::id()));
        fs::remove_dir_all(&dir).ok();
        dir
    }

    #[test]
    fn appends_then_reloads() {
        let dir = temp_dir("reload");
        {
            let store = CsvStore::open(&dir).unwrap();
            store.append_tokens(&[TokenMetadata::new("0xAA", "AAA", 6)]).unwrap();
            store.append_tokens(&[TokenMetadata::new("0xbb", "BBB", 18)]).unwrap();
            store
                .append_pools(&[PoolTokenPair::new(
                    "0xPOOL",
                    "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
                    "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
                )])
                .unwrap();
        }
        let text = fs::read_to_string(dir.join(TOKEN_FILE)).unwrap();
        assert_eq!(text, "address,symbol,decimals\n0xaa,AAA,6\n0xbb,BBB,18\n");

        let store = CsvStore::open(&dir).unwrap();
        assert_eq!(store.load_tokens().unwrap().len(), 2);
        assert_eq!(store.load_pools().unwrap()[0].pool_address, "0xpool");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn known_keys_are_not_rewritten() {
        let dir = temp_dir("dedupe");
        let store = CsvStore::open(&dir).unwrap();
        store.append_tokens(&[TokenMetadata::new("0xaa", "FIRST", 6)]).unwrap();
        store.append_tokens(&[TokenMetadata::new("0xAA", "SECOND", 8)]).unwrap();
        let tokens = store.load_tokens().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].symbol, "FIRST");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_files_load_empty() {
        let dir = temp_dir("empty");
        let store = CsvStore::open(&dir).unwrap();
        assert!(store.load_tokens().unwrap().is_empty());
        assert!(store.load_pools().unwrap().is_empty());
        fs::remove_dir_all(&dir).ok();
    }
}
