//! `BatchEngine`: chunked, parallel decoding of exported log tables.

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use chaintables_core::{
    BridgeMessage, ConfigError, EngineConfig, EventKind, MetadataProvider, RawLogRecord,
    RawLogRow, SwapEvent, TransferEvent,
};
use chaintables_evm::{correlate_transfers, EvmDecoder, Outcome};
use chaintables_io::{open_rows, IoError};
use chaintables_observability::PipelineMetrics;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::emitter::RecordEmitter;
use crate::stats::DecodeStats;

pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// The decoded tables and counters of one run.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub transfers: Vec<TransferEvent>,
    pub swaps: Vec<SwapEvent>,
    pub bridges: Vec<BridgeMessage>,
    pub stats: DecodeStats,
}

/// Batch decode engine.
pub struct BatchEngine {
    decoder: EvmDecoder,
    bridges: HashSet<String>,
    chunk_size: usize,
    metrics: Option<PipelineMetrics>,
}

impl BatchEngine {
    pub fn new(decoder: EvmDecoder) -> Self {
        Self {
            decoder,
            bridges: HashSet::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            metrics: None,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(EvmDecoder::from_config(config)?)
            .with_bridges(config.bridge_set())
            .chunk_size(config.chunk_size))
    }

    /// Lowercased bridge contract addresses used for transfer correlation.
    pub fn with_bridges(mut self, bridges: HashSet<String>) -> Self {
        self.bridges = bridges;
        self
    }

    /// Max rows held in memory per decode chunk. Zero falls back to the default.
    pub fn chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = if n == 0 { DEFAULT_CHUNK_SIZE } else { n };
        self
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn decoder(&self) -> &EvmDecoder {
        &self.decoder
    }

    /// Decode already-canonical records in one go.
    pub fn decode_records(
        &self,
        records: &[RawLogRecord],
        metadata: &dyn MetadataProvider,
    ) -> BatchOutput {
        let mut emitter = RecordEmitter::new();
        let mut stats = DecodeStats::default();
        for chunk in records.chunks(self.chunk_size) {
            self.decode_chunk(chunk, metadata, &mut emitter, &mut stats);
        }
        self.finish(emitter, stats)
    }

    /// Decode a stream of raw rows, buffering at most one chunk at a time.
    /// Stops at the first I/O error.
    pub fn decode_rows<I>(
        &self,
        rows: I,
        metadata: &dyn MetadataProvider,
    ) -> Result<BatchOutput, IoError>
    where
        I: IntoIterator<Item = Result<RawLogRow, IoError>>,
    {
        let mut emitter = RecordEmitter::new();
        let mut stats = DecodeStats::default();
        self.feed(rows, metadata, &mut emitter, &mut stats)?;
        Ok(self.finish(emitter, stats))
    }

    /// Decode several exports into one set of tables. Records from later
    /// files replace same-keyed records from earlier ones.
    pub fn decode_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        metadata: &dyn MetadataProvider,
    ) -> Result<BatchOutput, IoError> {
        let mut emitter = RecordEmitter::new();
        let mut total = DecodeStats::default();

        for path in paths {
            let path = path.as_ref();
            let mut file_stats = DecodeStats::default();
            let started = Instant::now();
            self.feed(open_rows(path)?, metadata, &mut emitter, &mut file_stats)?;
            info!(
                file = %path.display(),
                rows = file_stats.rows_read,
                transfers = file_stats.decoded_of(EventKind::Erc20Transfer),
                swaps_v2 = file_stats.decoded_of(EventKind::AmmSwapV2),
                swaps_v3 = file_stats.decoded_of(EventKind::AmmSwapV3),
                bridges = file_stats.decoded_of(EventKind::BridgeMessage),
                failed = file_stats.total_failed(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "decoded file"
            );
            total.merge(&file_stats);
        }

        Ok(self.finish(emitter, total))
    }

    fn feed<I>(
        &self,
        rows: I,
        metadata: &dyn MetadataProvider,
        emitter: &mut RecordEmitter,
        stats: &mut DecodeStats,
    ) -> Result<(), IoError>
    where
        I: IntoIterator<Item = Result<RawLogRow, IoError>>,
    {
        let mut chunk: Vec<RawLogRecord> = Vec::with_capacity(self.chunk_size);
        for row in rows {
            chunk.push(row?.into_record());
            if chunk.len() >= self.chunk_size {
                self.decode_chunk(&chunk, metadata, emitter, stats);
                chunk.clear();
            }
        }
        if !chunk.is_empty() {
            self.decode_chunk(&chunk, metadata, emitter, stats);
        }
        Ok(())
    }

    fn decode_chunk(
        &self,
        chunk: &[RawLogRecord],
        metadata: &dyn MetadataProvider,
        emitter: &mut RecordEmitter,
        stats: &mut DecodeStats,
    ) {
        let started = Instant::now();
        let outcomes: Vec<Outcome> = chunk
            .par_iter()
            .map(|raw| self.decoder.decode(raw, metadata))
            .collect();

        let before = self.metrics.as_ref().map(|_| stats.clone());
        stats.rows_read += chunk.len() as u64;
        for (raw, outcome) in chunk.iter().zip(outcomes) {
            match outcome {
                Outcome::Skipped if raw.topics.is_empty() => stats.skipped_no_topics += 1,
                Outcome::Skipped => stats.skipped_unmatched += 1,
                Outcome::Decoded(record) => {
                    stats.note_decoded(record.kind());
                    if emitter.push(record) {
                        stats.duplicates += 1;
                    }
                }
                Outcome::Failed { kind, error } => {
                    debug!(
                        tx_hash = %raw.tx_hash,
                        log_index = raw.log_index,
                        kind = %kind,
                        error = %error,
                        "decode failed"
                    );
                    stats.note_failed(kind);
                }
            }
        }

        if let (Some(m), Some(before)) = (&self.metrics, before) {
            m.record_chunk(chunk.len() as u64, started.elapsed().as_secs_f64() * 1000.0);
            for kind in EventKind::ALL {
                m.record_decoded(kind, stats.decoded_of(kind) - before.decoded_of(kind));
                m.record_errors(kind, stats.failed_of(kind) - before.failed_of(kind));
            }
            m.record_skipped("no_topics", stats.skipped_no_topics - before.skipped_no_topics);
            m.record_skipped("unmatched", stats.skipped_unmatched - before.skipped_unmatched);
        }
    }

    fn finish(&self, emitter: RecordEmitter, mut stats: DecodeStats) -> BatchOutput {
        let (transfers, swaps, mut bridges) = emitter.finish();
        stats.bridges_enriched =
            correlate_transfers(&mut bridges, &transfers, &self.bridges) as u64;

        info!(
            rows = stats.rows_read,
            matched = stats.matched(),
            transfers = transfers.len(),
            swaps = swaps.len(),
            swaps_v2 = stats.decoded_of(EventKind::AmmSwapV2),
            swaps_v3 = stats.decoded_of(EventKind::AmmSwapV3),
            bridges = bridges.len(),
            failed = stats.total_failed(),
            duplicates = stats.duplicates,
            "batch complete"
        );

        BatchOutput {
            transfers,
            swaps,
            bridges,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chaintables_core::TopicsField;
    use chaintables_metadata::{MetadataCache, StaticMetadataSource};

    const TRANSFER: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
    const V2_SWAP: &str = "0xd78ad95fa46c994b6551d0da85fc275fe613ce37657fb8d5e3d130840159d822";
    const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

    fn cache() -> MetadataCache {
        MetadataCache::new(Arc::new(StaticMetadataSource::mainnet()))
    }

    fn word(v: u64) -> String {
        format!("{v:064x}")
    }

    fn transfer_row(tx: &str, log_index: i64, amount: u64) -> RawLogRow {
        RawLogRow {
            transaction_hash: tx.into(),
            log_index,
            address: USDC.into(),
            data: format!("0x{}", word(amount)),
            topics: TopicsField::from_strings([
                TRANSFER.to_string(),
                format!("0x{}", word(1)),
                format!("0x{}", word(2)),
            ]),
            ..Default::default()
        }
    }

    fn rows(rs: Vec<RawLogRow>) -> Vec<Result<RawLogRow, IoError>> {
        rs.into_iter().map(Ok).collect()
    }

    #[test]
    fn empty_input_gives_empty_tables() {
        let engine = BatchEngine::new(EvmDecoder::default());
        let out = engine.decode_rows(Vec::<Result<RawLogRow, IoError>>::new(), &cache()).unwrap();
        assert!(out.transfers.is_empty() && out.swaps.is_empty() && out.bridges.is_empty());
        assert_eq!(out.stats, DecodeStats::default());
    }

    #[test]
    fn duplicate_key_keeps_last_decode() {
        let engine = BatchEngine::new(EvmDecoder::default());
        let input = rows(vec![
            transfer_row("0xaa", 0, 1_000_000),
            transfer_row("0xaa", 0, 2_000_000),
        ]);
        let out = engine.decode_rows(input, &cache()).unwrap();
        assert_eq!(out.transfers.len(), 1);
        assert_eq!(out.transfers[0].amount_norm, 2.0);
        assert_eq!(out.stats.duplicates, 1);
        assert_eq!(out.stats.decoded_of(EventKind::Erc20Transfer), 2);
    }

    #[test]
    fn chunking_preserves_last_wins_across_chunks() {
        let engine = BatchEngine::new(EvmDecoder::default()).chunk_size(1);
        let input = rows(vec![
            transfer_row("0xbb", 3, 5_000_000),
            transfer_row("0xaa", 1, 1_000_000),
            transfer_row("0xbb", 3, 7_000_000),
        ]);
        let out = engine.decode_rows(input, &cache()).unwrap();
        let got: Vec<(&str, f64)> = out
            .transfers
            .iter()
            .map(|t| (t.tx_hash.as_str(), t.amount_norm))
            .collect();
        assert_eq!(got, vec![("0xaa", 1.0), ("0xbb", 7.0)]);
        assert_eq!(out.stats.rows_read, 3);
    }

    #[test]
    fn skips_and_failures_are_counted() {
        let engine = BatchEngine::new(EvmDecoder::default());
        let unmatched = RawLogRow {
            transaction_hash: "0x01".into(),
            log_index: 0,
            topics: TopicsField::Text("0x1234".into()),
            ..Default::default()
        };
        let no_topics = RawLogRow {
            transaction_hash: "0x02".into(),
            log_index: 0,
            topics: TopicsField::Text("[]".into()),
            ..Default::default()
        };
        let bad_swap = RawLogRow {
            transaction_hash: "0x03".into(),
            log_index: 0,
            address: "0xb4e16d0168e52d35cacd2c6185b44281ec28c9dc".into(),
            data: "0x00".into(),
            topics: TopicsField::from_strings([V2_SWAP]),
            ..Default::default()
        };
        let input = rows(vec![unmatched, no_topics, bad_swap, transfer_row("0x04", 0, 1)]);
        let out = engine.decode_rows(input, &cache()).unwrap();

        assert_eq!(out.stats.skipped_unmatched, 1);
        assert_eq!(out.stats.skipped_no_topics, 1);
        assert_eq!(out.stats.failed_of(EventKind::AmmSwapV2), 1);
        assert_eq!(out.transfers.len(), 1);
        assert!(out.swaps.is_empty());
    }

    #[test]
    fn io_error_stops_the_run() {
        let engine = BatchEngine::new(EvmDecoder::default());
        let input = vec![
            Ok(transfer_row("0xaa", 0, 1)),
            Err(IoError::UnsupportedFormat { path: "x".into() }),
        ];
        assert!(engine.decode_rows(input, &cache()).is_err());
    }

    #[test]
    fn zero_chunk_size_uses_default() {
        let engine = BatchEngine::new(EvmDecoder::default()).chunk_size(0);
        assert_eq!(engine.chunk_size, DEFAULT_CHUNK_SIZE);
    }
}
