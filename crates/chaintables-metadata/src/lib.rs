//! # chaintables-metadata
//!
//! Token (symbol, decimals) and pool (token0, token1) metadata for the
//! ChainTables decoders.
//!
//! - [`MetadataCache`]: the `MetadataProvider` decoders use. Single-flight
//!   per key, warmed from a store at construction, flushed at the end of a run.
//! - Sources: [`StaticMetadataSource`] always; `RpcMetadataSource` with the
//!   `rpc` feature.
//! - Stores: [`MemoryStore`] and [`CsvStore`] always; `SqliteStore` with the
//!   `sqlite` feature.

pub mod cache;
pub mod csv_store;
pub mod memory;
pub mod rate_limiter;
pub mod static_source;

#[cfg(feature = "rpc")]
pub mod rpc;

#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
pub mod sqlite;

pub use cache::{CacheStats, MetadataCache};
pub use csv_store::CsvStore;
pub use memory::MemoryStore;
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
pub use static_source::StaticMetadataSource;

#[cfg(feature = "rpc")]
pub use rpc::{RpcMetadataSource, RpcSourceConfig};

#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
pub use sqlite::SqliteStore;
