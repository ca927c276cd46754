//! # chaintables-batch
//!
//! Batch decoding of exported log tables into transfer, swap and bridge
//! message tables.
//!
//! ## Features
//! - Memory-bounded chunking (default 10,000 rows per chunk)
//! - CPU-parallel decoding via Rayon, input order preserved
//! - Deduplication on (tx_hash, log_index), last decode wins
//! - Bridge messages enriched from same-transaction inbound transfers
//!
//! ## Usage
//! ```no_run
//! use std::sync::Arc;
//! use chaintables_batch::BatchEngine;
//! use chaintables_core::EngineConfig;
//! use chaintables_metadata::{MetadataCache, StaticMetadataSource};
//!
//! let engine = BatchEngine::from_config(&EngineConfig::default()).unwrap();
//! let cache = MetadataCache::new(Arc::new(StaticMetadataSource::mainnet()));
//! let out = engine.decode_files(&["logs_1.csv"], &cache).unwrap();
//! println!("{} transfers", out.transfers.len());
//! ```

pub mod emitter;
pub mod engine;
pub mod stats;

pub use emitter::RecordEmitter;
pub use engine::{BatchEngine, BatchOutput, DEFAULT_CHUNK_SIZE};
pub use stats::DecodeStats;
