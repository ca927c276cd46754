//! `RecordEmitter`: collects decoded records into the three output tables.

use std::collections::BTreeMap;

use chaintables_core::{BridgeMessage, DecodedRecord, RecordKey, SwapEvent, TransferEvent};

/// Keyed on (tx_hash, log_index): a later record replaces an earlier one with
/// the same key, and tables come out sorted by that key.
#[derive(Debug, Default)]
pub struct RecordEmitter {
    transfers: BTreeMap<RecordKey, TransferEvent>,
    swaps: BTreeMap<RecordKey, SwapEvent>,
    bridges: BTreeMap<RecordKey, BridgeMessage>,
}

impl RecordEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the record replaced one already held.
    pub fn push(&mut self, record: DecodedRecord) -> bool {
        let key = record.key();
        match record {
            DecodedRecord::Transfer(t) => self.transfers.insert(key, t).is_some(),
            DecodedRecord::Swap(s) => self.swaps.insert(key, s).is_some(),
            DecodedRecord::Bridge(b) => self.bridges.insert(key, b).is_some(),
        }
    }

    pub fn len(&self) -> usize {
        self.transfers.len() + self.swaps.len() + self.bridges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn finish(self) -> (Vec<TransferEvent>, Vec<SwapEvent>, Vec<BridgeMessage>) {
        (
            self.transfers.into_values().collect(),
            self.swaps.into_values().collect(),
            self.bridges.into_values().collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaintables_core::BridgeFields;

    fn bridge(tx: &str, log_index: i64, sequence: u64) -> DecodedRecord {
        DecodedRecord::Bridge(BridgeMessage {
            tx_hash: tx.into(),
            log_index,
            bridge_id: "wormhole".into(),
            fields: BridgeFields {
                sequence: Some(sequence),
                ..Default::default()
            },
            token_in: None,
            amount_in: None,
        })
    }

    #[test]
    fn last_record_wins() {
        let mut e = RecordEmitter::new();
        assert!(!e.push(bridge("0xaa", 1, 10)));
        assert!(e.push(bridge("0xaa", 1, 11)));
        assert_eq!(e.len(), 1);
        let (_, _, bridges) = e.finish();
        assert_eq!(bridges.len(), 1);
        assert_eq!(bridges[0].fields.sequence, Some(11));
    }

    #[test]
    fn output_is_sorted_by_key() {
        let mut e = RecordEmitter::new();
        e.push(bridge("0xbb", 0, 1));
        e.push(bridge("0xaa", 5, 2));
        e.push(bridge("0xaa", -1, 3));
        let (_, _, bridges) = e.finish();
        let keys: Vec<(&str, i64)> =
            bridges.iter().map(|b| (b.tx_hash.as_str(), b.log_index)).collect();
        assert_eq!(keys, vec![("0xaa", -1), ("0xaa", 5), ("0xbb", 0)]);
    }

    #[test]
    fn empty_emitter_finishes_empty() {
        let e = RecordEmitter::new();
        assert!(e.is_empty());
        let (t, s, b) = e.finish();
        assert!(t.is_empty() && s.is_empty() && b.is_empty());
    }
}
