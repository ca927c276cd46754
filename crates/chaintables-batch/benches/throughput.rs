//! Batch decode throughput benchmarks.
//!
//! # Running
//! ```bash
//! cargo bench --package chaintables-batch
//! ```

use std::sync::Arc;

use chaintables_batch::BatchEngine;
use chaintables_core::{normalize_field, RawLogRecord, TopicsField};
use chaintables_evm::EvmDecoder;
use chaintables_metadata::{MetadataCache, StaticMetadataSource};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const TRANSFER: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
const TOKENS: [&str; 3] = [
    "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
    "0xdac17f958d2ee523a2206206994597c13d831ec7",
    "0x6b175474e89094c44da98b954eedeac495271d0f",
];

fn make_transfer(i: u64) -> RawLogRecord {
    RawLogRecord {
        block_number: Some(19_000_000 + i / 100),
        tx_hash: format!("0x{:064x}", i / 4),
        log_index: (i % 4) as i64,
        contract_address: TOKENS[(i % 3) as usize].to_string(),
        topics: vec![
            TRANSFER.to_string(),
            format!("0x{:064x}", i & 0xff),
            format!("0x{:064x}", (i + 1) & 0xff),
        ],
        data: format!("0x{:064x}", 1_000_000 + i),
    }
}

fn make_batch(n: usize) -> Vec<RawLogRecord> {
    (0..n as u64).map(make_transfer).collect()
}

fn bench_batch_decode(c: &mut Criterion) {
    let engine = BatchEngine::new(EvmDecoder::default());
    let cache = MetadataCache::new(Arc::new(StaticMetadataSource::mainnet()));

    let mut group = c.benchmark_group("batch_decode_transfers");
    for batch_size in [1_000, 10_000, 100_000] {
        let batch = make_batch(batch_size);
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &batch, |b, batch| {
            b.iter(|| engine.decode_records(batch, &cache));
        });
    }
    group.finish();
}

fn bench_topic_normalize(c: &mut Criterion) {
    let json = TopicsField::Text(format!("[\"{TRANSFER}\", \"0x{:064x}\", \"0x{:064x}\"]", 1, 2));
    let literal = TopicsField::Text(format!("['{TRANSFER}', '0x{:064x}', '0x{:064x}']", 1, 2));
    let comma = TopicsField::Text(format!("{TRANSFER},0x{:064x},0x{:064x}", 1, 2));

    let mut group = c.benchmark_group("normalize_topics");
    group.bench_function("json_list", |b| b.iter(|| normalize_field(&json)));
    group.bench_function("literal_list", |b| b.iter(|| normalize_field(&literal)));
    group.bench_function("comma_separated", |b| b.iter(|| normalize_field(&comma)));
    group.finish();
}

criterion_group!(benches, bench_batch_decode, bench_topic_normalize);
criterion_main!(benches);
