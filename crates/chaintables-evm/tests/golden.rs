//! Golden fixture integration tests.
//!
//! Each fixture under `fixtures/evm/` holds one raw log, the metadata the
//! decoder may look up, and the exact record the decoder must produce.

use std::sync::Arc;

use chaintables_core::{DecodedRecord, RawLogRecord};
use chaintables_evm::{EvmDecoder, Outcome};
use chaintables_metadata::{MetadataCache, StaticMetadataSource};

/// The fixtures live two levels above the crate root.
fn fixture_path(name: &str) -> std::path::PathBuf {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../fixtures/evm");
    p.push(name);
    p
}

fn load(name: &str) -> serde_json::Value {
    let text = std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|e| panic!("fixture {name} not found: {e}"));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("fixture {name} is not JSON: {e}"))
}

fn source_from_fixture(f: &serde_json::Value) -> StaticMetadataSource {
    let mut source = StaticMetadataSource::new();
    for t in f["metadata"]["tokens"].as_array().into_iter().flatten() {
        source = source.with_token(
            t["address"].as_str().unwrap(),
            t["symbol"].as_str().unwrap(),
            t["decimals"].as_u64().unwrap() as u8,
        );
    }
    for p in f["metadata"]["pools"].as_array().into_iter().flatten() {
        source = source.with_pool(
            p["pool_address"].as_str().unwrap(),
            p["token0"].as_str().unwrap(),
            p["token1"].as_str().unwrap(),
        );
    }
    source
}

fn decode_fixture(name: &str) -> (DecodedRecord, serde_json::Value) {
    let f = load(name);
    let raw: RawLogRecord = serde_json::from_value(f["log"].clone()).unwrap();
    let cache = MetadataCache::new(Arc::new(source_from_fixture(&f)));
    let decoder = EvmDecoder::default();

    match decoder.decode(&raw, &cache) {
        Outcome::Decoded(record) => (record, f["expected"].clone()),
        other => panic!("{name}: expected a decoded record, got {other:?}"),
    }
}

fn assert_golden(name: &str) {
    let (record, expected) = decode_fixture(name);
    let got = serde_json::to_value(&record).unwrap();
    assert_eq!(got, expected, "{name}: decoded record differs from fixture");
}

// ─── ERC-20 Transfer ──────────────────────────────────────────────────────────

#[test]
fn erc20_transfer_golden() {
    assert_golden("erc20-transfer.json");
}

#[test]
fn erc20_transfer_amount_matches_decimals() {
    let (record, _) = decode_fixture("erc20-transfer.json");
    let DecodedRecord::Transfer(t) = record else {
        panic!("not a transfer");
    };
    let raw: f64 = t.amount_raw.to_string().parse().unwrap();
    let want = raw / 10f64.powi(t.decimals as i32);
    assert!(((t.amount_norm - want) / want).abs() < 1e-12);
}

// ─── Swaps ────────────────────────────────────────────────────────────────────

#[test]
fn uniswap_v2_swap_golden() {
    assert_golden("uniswap-v2-swap.json");
}

#[test]
fn uniswap_v3_swap_golden() {
    assert_golden("uniswap-v3-swap.json");
}

// ─── Bridge messages ──────────────────────────────────────────────────────────

#[test]
fn wormhole_message_golden() {
    assert_golden("wormhole-message.json");
}

#[test]
fn wormhole_truncated_payload_still_emits() {
    assert_golden("wormhole-truncated.json");
}
