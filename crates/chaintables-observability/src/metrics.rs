//! ChainTables pipeline metrics.
//!
//! All instruments use OpenTelemetry conventions. Without an installed meter
//! provider the global meter is a no-op, so recording is always safe.

use chaintables_core::EventKind;
use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Central metrics handle for a decode run.
#[derive(Clone)]
pub struct PipelineMetrics {
    pub logs_seen: Counter<u64>,
    pub events_decoded: Counter<u64>,
    pub events_skipped: Counter<u64>,
    pub decode_errors: Counter<u64>,
    pub metadata_lookups: Counter<u64>,
    pub metadata_cache_hits: Counter<u64>,
    pub batch_size: Histogram<u64>,
    pub batch_latency_ms: Histogram<f64>,
}

impl PipelineMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            logs_seen: meter
                .u64_counter("chaintables.logs_seen")
                .with_description("Raw log rows read")
                .build(),
            events_decoded: meter
                .u64_counter("chaintables.events_decoded")
                .with_description("Logs decoded into a typed record")
                .build(),
            events_skipped: meter
                .u64_counter("chaintables.events_skipped")
                .with_description("Logs with no topics or an unknown signature")
                .build(),
            decode_errors: meter
                .u64_counter("chaintables.decode_errors")
                .with_description("Matched logs whose payload failed to decode")
                .build(),
            metadata_lookups: meter
                .u64_counter("chaintables.metadata_lookups")
                .with_description("External token/pool metadata lookups")
                .build(),
            metadata_cache_hits: meter
                .u64_counter("chaintables.metadata_cache_hits")
                .with_description("Metadata requests served from cache")
                .build(),
            batch_size: meter
                .u64_histogram("chaintables.batch_size")
                .with_description("Rows per decode chunk")
                .build(),
            batch_latency_ms: meter
                .f64_histogram("chaintables.batch_latency_ms")
                .with_description("Wall time to decode one chunk in milliseconds")
                .build(),
        }
    }

    /// Instruments on the global meter named `chaintables`.
    pub fn global() -> Self {
        Self::new(&opentelemetry::global::meter("chaintables"))
    }

    pub fn record_decoded(&self, kind: EventKind, count: u64) {
        if count > 0 {
            self.events_decoded
                .add(count, &[KeyValue::new("kind", kind.as_str())]);
        }
    }

    pub fn record_errors(&self, kind: EventKind, count: u64) {
        if count > 0 {
            self.decode_errors
                .add(count, &[KeyValue::new("kind", kind.as_str())]);
        }
    }

    /// `reason` is `"no_topics"` or `"unmatched"`.
    pub fn record_skipped(&self, reason: &'static str, count: u64) {
        if count > 0 {
            self.events_skipped
                .add(count, &[KeyValue::new("reason", reason)]);
        }
    }

    pub fn record_metadata(&self, lookups: u64, hits: u64) {
        self.metadata_lookups.add(lookups, &[]);
        self.metadata_cache_hits.add(hits, &[]);
    }

    pub fn record_chunk(&self, rows: u64, ms: f64) {
        self.logs_seen.add(rows, &[]);
        self.batch_size.record(rows, &[]);
        self.batch_latency_ms.record(ms, &[]);
    }
}
