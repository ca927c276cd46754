//! ABI helpers shared by the decoders.

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{I256, U256};
use chaintables_core::{checksum_address, DecodeError, RawLogRecord};

/// Decode the data payload as a tuple of `types`.
pub fn decode_data(
    raw: &RawLogRecord,
    types: Vec<DynSolType>,
) -> Result<Vec<DynSolValue>, DecodeError> {
    let bytes = raw.data_bytes()?;
    let expected = types.len();
    let decoded = DynSolType::Tuple(types)
        .abi_decode(&bytes)
        .map_err(|e| DecodeError::AbiDecodeFailed {
            reason: e.to_string(),
        })?;

    let values = match decoded {
        DynSolValue::Tuple(vals) => vals,
        other => vec![other],
    };
    if values.len() != expected {
        return Err(DecodeError::AbiDecodeFailed {
            reason: format!("expected {expected} values, got {}", values.len()),
        });
    }
    Ok(values)
}

pub fn as_uint(value: &DynSolValue) -> Result<U256, DecodeError> {
    match value {
        DynSolValue::Uint(u, _) => Ok(*u),
        other => Err(DecodeError::AbiDecodeFailed {
            reason: format!("expected uint, got {other:?}"),
        }),
    }
}

pub fn as_int(value: &DynSolValue) -> Result<I256, DecodeError> {
    match value {
        DynSolValue::Int(i, _) => Ok(*i),
        other => Err(DecodeError::AbiDecodeFailed {
            reason: format!("expected int, got {other:?}"),
        }),
    }
}

/// Last 20 bytes of a 32-byte indexed address topic, lowercased.
/// Returns an empty string when the topic is missing or too short.
pub fn topic_address(raw: &RawLogRecord, index: usize) -> String {
    match raw.topic(index) {
        Some(topic) if topic.len() >= 42 && topic.is_char_boundary(topic.len() - 40) => {
            format!("0x{}", topic[topic.len() - 40..].to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

/// Checksummed contract address of the log.
pub fn contract_checksum(raw: &RawLogRecord) -> Result<String, DecodeError> {
    checksum_address(&raw.contract_address).ok_or_else(|| DecodeError::InvalidRawEvent {
        reason: format!("invalid contract address '{}'", raw.contract_address),
    })
}
