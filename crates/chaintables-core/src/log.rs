//! Raw log types: the loosely-typed tabular row and the canonical record.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::record::RecordKey;
use crate::topics;

/// A single element of a structured topics sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicValue {
    Text(String),
    Integer(U256),
    Bytes(Vec<u8>),
    /// Anything else (null, float, nested container). Dropped on normalization.
    Other,
}

impl TopicValue {
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => TopicValue::Text(s.clone()),
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(u) => TopicValue::Integer(U256::from(u)),
                None => TopicValue::Other,
            },
            _ => TopicValue::Other,
        }
    }
}

/// True when `value` holds a number serde_json could not keep exactly: an
/// integer above `u64::MAX` arrives as an `f64`. Such a value has to be
/// rebuilt from its source text with [`TopicsField::from_json_text`].
pub fn has_wide_number(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Number(n) => n.as_u64().is_none() && n.as_i64().is_none(),
        serde_json::Value::Array(items) => items.iter().any(has_wide_number),
        _ => false,
    }
}

/// The topics field of a raw row, in whatever shape the exporter produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TopicsField {
    #[default]
    Absent,
    /// Already a native sequence (JSONL array, in-memory producer).
    Sequence(Vec<TopicValue>),
    /// A string cell: JSON/literal list, comma-separated hex, or a single topic.
    Text(String),
    Integer(U256),
    Bytes(Vec<u8>),
}

impl TopicsField {
    /// Build from a canonical list of topic strings.
    pub fn from_strings<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TopicsField::Sequence(
            topics
                .into_iter()
                .map(|t| TopicValue::Text(t.into()))
                .collect(),
        )
    }

    /// Build from the source text of a JSON topics value. A bare integer of
    /// any width becomes [`TopicsField::Integer`]; an array holding wide
    /// integers stays text so the literal grammar can read each element.
    pub fn from_json_text(raw: &str) -> Self {
        let raw = raw.trim();
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(v) = U256::from_str_radix(raw, 10) {
                return TopicsField::Integer(v);
            }
        }
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value) if !has_wide_number(&value) => TopicsField::from(&value),
            _ => TopicsField::Text(raw.to_string()),
        }
    }
}

impl From<&serde_json::Value> for TopicsField {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => TopicsField::Absent,
            serde_json::Value::Array(items) => {
                TopicsField::Sequence(items.iter().map(TopicValue::from_json).collect())
            }
            serde_json::Value::String(s) => TopicsField::Text(s.clone()),
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(u) => TopicsField::Integer(U256::from(u)),
                None => TopicsField::Text(n.to_string()),
            },
            other => TopicsField::Text(other.to_string()),
        }
    }
}

/// A log row as read from a tabular source, before topic normalization.
///
/// Missing columns default to empty strings, `log_index` to -1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLogRow {
    pub block_number: Option<u64>,
    pub transaction_hash: String,
    pub log_index: i64,
    pub address: String,
    pub data: String,
    pub topics: TopicsField,
    /// Discrete `topic0..topic3` columns, used when `topics` yields nothing.
    pub topic_columns: [Option<String>; 4],
}

impl Default for RawLogRow {
    fn default() -> Self {
        Self {
            block_number: None,
            transaction_hash: String::new(),
            log_index: -1,
            address: String::new(),
            data: String::new(),
            topics: TopicsField::Absent,
            topic_columns: [None, None, None, None],
        }
    }
}

impl RawLogRow {
    /// Normalize the topics and produce the canonical record.
    pub fn into_record(self) -> RawLogRecord {
        let topics = topics::normalize_topics(&self.topics, &self.topic_columns);
        RawLogRecord {
            block_number: self.block_number,
            tx_hash: self.transaction_hash,
            log_index: self.log_index,
            contract_address: self.address.trim().to_string(),
            topics,
            data: self.data,
        }
    }
}

/// A raw, undecoded log with canonical topics. This is the input to every decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLogRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub tx_hash: String,
    pub log_index: i64,
    pub contract_address: String,
    /// topics[0] is the event signature hash; topics[1..] are indexed params.
    pub topics: Vec<String>,
    /// Hex-encoded non-indexed params, with or without `0x`.
    pub data: String,
}

impl RawLogRecord {
    /// Returns topics[0], if present.
    pub fn topic0(&self) -> Option<&str> {
        self.topics.first().map(|s| s.as_str())
    }

    pub fn topic(&self, index: usize) -> Option<&str> {
        self.topics.get(index).map(|s| s.as_str())
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.tx_hash.clone(), self.log_index)
    }

    /// The data payload with surrounding whitespace and any `0x` prefix removed.
    pub fn data_hex(&self) -> &str {
        let s = self.data.trim();
        s.strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s)
    }

    /// Decode the data payload into bytes. Empty data yields an empty vector.
    pub fn data_bytes(&self) -> Result<Vec<u8>, DecodeError> {
        hex::decode(self.data_hex()).map_err(|e| DecodeError::InvalidRawEvent {
            reason: format!("invalid data hex: {e}"),
        })
    }
}
