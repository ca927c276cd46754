//! Run counters returned alongside the decoded tables.

use std::collections::BTreeMap;

use chaintables_core::EventKind;
use serde::Serialize;

/// Counters for one decode run (or one input file of it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    pub rows_read: u64,
    /// Rows whose topics normalized to nothing.
    pub skipped_no_topics: u64,
    /// Rows whose topic0 is not in the signature map.
    pub skipped_unmatched: u64,
    pub decoded: BTreeMap<EventKind, u64>,
    pub failed: BTreeMap<EventKind, u64>,
    /// Records replaced by a later decode of the same (tx_hash, log_index).
    pub duplicates: u64,
    /// Bridge messages given token_in/amount_in from a same-transaction transfer.
    pub bridges_enriched: u64,
}

impl DecodeStats {
    pub fn decoded_of(&self, kind: EventKind) -> u64 {
        self.decoded.get(&kind).copied().unwrap_or(0)
    }

    pub fn failed_of(&self, kind: EventKind) -> u64 {
        self.failed.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_decoded(&self) -> u64 {
        self.decoded.values().sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.failed.values().sum()
    }

    /// Rows that reached a decoder, successfully or not.
    pub fn matched(&self) -> u64 {
        self.total_decoded() + self.total_failed()
    }

    pub(crate) fn note_decoded(&mut self, kind: EventKind) {
        *self.decoded.entry(kind).or_default() += 1;
    }

    pub(crate) fn note_failed(&mut self, kind: EventKind) {
        *self.failed.entry(kind).or_default() += 1;
    }

    /// Fold another set of counters into this one.
    pub fn merge(&mut self, other: &DecodeStats) {
        self.rows_read += other.rows_read;
        self.skipped_no_topics += other.skipped_no_topics;
        self.skipped_unmatched += other.skipped_unmatched;
        for (k, v) in &other.decoded {
            *self.decoded.entry(*k).or_default() += v;
        }
        for (k, v) in &other.failed {
            *self.failed.entry(*k).or_default() += v;
        }
        self.duplicates += other.duplicates;
        self.bridges_enriched += other.bridges_enriched;
    }
}
