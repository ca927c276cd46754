//! Bridge message logs (`LogMessagePublished`).
//!
//! A matched bridge log always produces a record. When the packed
//! `(uint64 sequence, uint32 nonce)` header cannot be read, both are null and
//! the leading hex of the payload is kept in `raw_prefix` instead.

use std::collections::{HashMap, HashSet};

use chaintables_core::{
    BridgeFields, BridgeMessage, DecodeContext, DecodeError, RawLogRecord, TransferEvent,
};

use crate::abi::topic_address;

/// Packed header width: 8 bytes of sequence, 4 bytes of nonce.
const HEADER_LEN: usize = 12;
/// Hex characters of payload kept when the header is unreadable.
const RAW_PREFIX_CHARS: usize = 64;

pub fn decode(raw: &RawLogRecord, ctx: &DecodeContext) -> Result<BridgeMessage, DecodeError> {
    let sender = match topic_address(raw, 1) {
        s if s.is_empty() => None,
        s => Some(s),
    };
    let mut fields = BridgeFields {
        sequence: None,
        nonce: None,
        sender,
        emitter: raw.contract_address.trim().to_ascii_lowercase(),
        raw_prefix: None,
    };

    match read_header(raw) {
        Some((sequence, nonce)) => {
            fields.sequence = Some(sequence);
            fields.nonce = Some(nonce);
        }
        None => {
            fields.raw_prefix = Some(raw.data_hex().chars().take(RAW_PREFIX_CHARS).collect());
        }
    }

    Ok(BridgeMessage {
        tx_hash: raw.tx_hash.clone(),
        log_index: raw.log_index,
        bridge_id: ctx.bridge_id.clone(),
        fields,
        token_in: None,
        amount_in: None,
    })
}

fn read_header(raw: &RawLogRecord) -> Option<(u64, u32)> {
    let bytes = raw.data_bytes().ok()?;
    if bytes.len() < HEADER_LEN {
        return None;
    }
    let sequence = u64::from_be_bytes(bytes[0..8].try_into().ok()?);
    let nonce = u32::from_be_bytes(bytes[8..12].try_into().ok()?);
    Some((sequence, nonce))
}

/// Attach inbound-transfer details to bridge messages.
///
/// For each transaction, the transfer with the lowest log index whose
/// recipient is one of `bridges` supplies `token_in`/`amount_in` to every
/// bridge message of that transaction. Ties keep the earlier slice entry.
/// Messages already carrying a `token_in` are left alone. Returns the number
/// of messages enriched.
pub fn correlate_transfers(
    messages: &mut [BridgeMessage],
    transfers: &[TransferEvent],
    bridges: &HashSet<String>,
) -> usize {
    if messages.is_empty() || bridges.is_empty() {
        return 0;
    }

    let mut first_inbound: HashMap<&str, &TransferEvent> = HashMap::new();
    for t in transfers {
        if !bridges.contains(&t.to) {
            continue;
        }
        let slot = first_inbound.entry(t.tx_hash.as_str()).or_insert(t);
        if t.log_index < slot.log_index {
            *slot = t;
        }
    }

    let mut enriched = 0;
    for msg in messages.iter_mut().filter(|m| m.token_in.is_none()) {
        if let Some(t) = first_inbound.get(msg.tx_hash.as_str()) {
            msg.token_in = Some(t.token_alias.clone());
            msg.amount_in = Some(t.amount_norm);
            enriched += 1;
        }
    }
    enriched
}
