//! # chaintables-core
//!
//! Core types shared across all ChainTables crates: the raw log row as it
//! arrives from a tabular export, the topic normalizer that turns it into a
//! canonical [`RawLogRecord`], the signature dispatch table, the typed output
//! records, and the metadata seams that decoders resolve token/pool details
//! through.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod log;
pub mod metadata;
pub mod record;
pub mod topics;

pub use config::{DecodeContext, EngineConfig};
pub use dispatch::{keccak256_signature, EventKind, SignatureMap};
pub use error::{ConfigError, DecodeError, LookupError, StoreError};
pub use log::{has_wide_number, RawLogRecord, RawLogRow, TopicValue, TopicsField};
pub use metadata::{
    address_key, checksum_address, is_zero_address, MetadataProvider, MetadataSource,
    MetadataStore, PoolTokenPair, TokenMetadata, DEFAULT_DECIMALS, UNKNOWN_SYMBOL, ZERO_ADDRESS,
};
pub use record::{
    BridgeFields, BridgeMessage, DecodedRecord, Dex, RecordKey, SwapEvent, TransferEvent,
};
pub use topics::{normalize_field, normalize_topics};
