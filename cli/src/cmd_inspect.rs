//! `chaintables signatures` and `chaintables inspect`.

use anyhow::Result;
use chaintables_core::{normalize_field, EngineConfig, RawLogRecord, TopicsField};
use chaintables_evm::EvmDecoder;

pub fn signatures(config: &EngineConfig) -> Result<()> {
    let decoder = EvmDecoder::from_config(config)?;
    for (kind, hash) in decoder.signatures().entries() {
        println!("{:16} {}  {}", kind.as_str(), hash, kind.canonical_signature());
    }
    Ok(())
}

pub fn inspect(value: &str, config: &EngineConfig) -> Result<()> {
    let decoder = EvmDecoder::from_config(config)?;
    let topics = normalize_field(&TopicsField::Text(value.to_string())).unwrap_or_default();

    if topics.is_empty() {
        println!("Topics:   (none, row would be skipped)");
        return Ok(());
    }
    println!("Topics:");
    for (i, t) in topics.iter().enumerate() {
        println!("  [{i}] {t}");
    }

    let record = RawLogRecord {
        block_number: None,
        tx_hash: String::new(),
        log_index: -1,
        contract_address: String::new(),
        topics,
        data: String::new(),
    };
    match decoder.classify(&record) {
        Some(kind) => println!("Event:    {kind} ({})", kind.canonical_signature()),
        None => println!("Event:    unmatched, row would be skipped"),
    }
    Ok(())
}
