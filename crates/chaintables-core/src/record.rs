//! Typed output records.

use std::cmp::Ordering;
use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::dispatch::EventKind;

/// Output records are unique on (tx_hash, log_index) and sort by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub tx_hash: String,
    pub log_index: i64,
}

impl RecordKey {
    pub fn new(tx_hash: impl Into<String>, log_index: i64) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            log_index,
        }
    }
}

impl Ord for RecordKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tx_hash
            .cmp(&other.tx_hash)
            .then(self.log_index.cmp(&other.log_index))
    }
}

impl PartialOrd for RecordKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub tx_hash: String,
    pub log_index: i64,
    /// Checksummed token contract address.
    pub token_address: String,
    pub symbol: String,
    pub decimals: u8,
    /// Lowercased sender, empty when topic[1] is missing.
    pub from: String,
    /// Lowercased recipient, empty when topic[2] is missing.
    pub to: String,
    #[serde(with = "u256_decimal")]
    pub amount_raw: U256,
    pub amount_norm: f64,
    pub token_alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dex {
    #[serde(rename = "UNI-V2")]
    V2,
    #[serde(rename = "UNI-V3")]
    V3,
}

impl Dex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dex::V2 => "UNI-V2",
            Dex::V3 => "UNI-V3",
        }
    }
}

impl fmt::Display for Dex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub tx_hash: String,
    pub log_index: i64,
    pub dex: Dex,
    /// Checksummed pair (V2) or pool (V3) address.
    pub pair_or_pool: String,
    /// `SYM.<suffix>` alias of the input token.
    pub token_in: String,
    pub token_out: String,
    pub amount_in: f64,
    /// Normalized output amount. Signed for V3, as reported by the pool.
    pub amount_out: f64,
    pub token_in_address: String,
    pub token_out_address: String,
    /// Decimal string of the unscaled input amount.
    pub amount_in_raw: String,
    pub amount_out_raw: String,
}

/// Structured payload of a bridge message. Serialized compactly into the
/// `fields` column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeFields {
    pub sequence: Option<u64>,
    pub nonce: Option<u32>,
    pub sender: Option<String>,
    pub emitter: String,
    /// Leading hex of the data payload, set only when the header failed to decode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeMessage {
    pub tx_hash: String,
    pub log_index: i64,
    pub bridge_id: String,
    pub fields: BridgeFields,
    pub token_in: Option<String>,
    pub amount_in: Option<f64>,
}

/// One decoded log, tagged by shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecodedRecord {
    Transfer(TransferEvent),
    Swap(SwapEvent),
    Bridge(BridgeMessage),
}

impl DecodedRecord {
    pub fn key(&self) -> RecordKey {
        match self {
            DecodedRecord::Transfer(t) => RecordKey::new(t.tx_hash.clone(), t.log_index),
            DecodedRecord::Swap(s) => RecordKey::new(s.tx_hash.clone(), s.log_index),
            DecodedRecord::Bridge(b) => RecordKey::new(b.tx_hash.clone(), b.log_index),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            DecodedRecord::Transfer(_) => EventKind::Erc20Transfer,
            DecodedRecord::Swap(s) => match s.dex {
                Dex::V2 => EventKind::AmmSwapV2,
                Dex::V3 => EventKind::AmmSwapV3,
            },
            DecodedRecord::Bridge(_) => EventKind::BridgeMessage,
        }
    }
}

/// U256 as a base-10 string, so raw amounts survive JSON without precision loss.
pub mod u256_decimal {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(serde::de::Error::custom)
    }
}
