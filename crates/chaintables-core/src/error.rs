//! Error enums, one per failure domain: per-log decode, config, metadata lookup and store.

use thiserror::Error;

/// Errors that can occur while decoding a single log.
///
/// None of these are fatal to a batch: the engine counts them per event kind
/// and moves on to the next log.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("ABI decode failed: {reason}")]
    AbiDecodeFailed { reason: String },

    #[error("Invalid raw log: {reason}")]
    InvalidRawEvent { reason: String },

    #[error("Malformed payload: {reason}")]
    Malformed { reason: String },
}

/// Errors raised while building engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Signature {signature} is bound to both {first} and {second}")]
    DuplicateSignature {
        signature: String,
        first: String,
        second: String,
    },

    #[error("Invalid signature hash for {kind}: {value}")]
    InvalidSignature { kind: String, value: String },

    #[error("Unknown event kind '{name}'")]
    UnknownEventKind { name: String },

    #[error("Invalid rate limit: {reason}")]
    InvalidRateLimit { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors from an external metadata source (RPC node, static table, ...).
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Unexpected call result for {method}: {reason}")]
    BadResult { method: String, reason: String },

    #[error("No metadata for {address}")]
    NotFound { address: String },

    #[error("Source config: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the persisted metadata store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Malformed store file {path}: {reason}")]
    Format { path: String, reason: String },
}
