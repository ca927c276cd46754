//! Reads the sample exports under `fixtures/logs/` end to end.

use std::path::PathBuf;

use chaintables_core::RawLogRecord;
use chaintables_io::open_rows;

const TRANSFER: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
const SWAP_V2: &str = "0xd78ad95fa46c994b6551d0da85fc275fe613ce37657fb8d5e3d130840159d822";
const WORMHOLE: &str = "0x6eb224fb001ed210e379b335e35efe88672a8ce935d981a6896b27ff90522b2b";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/logs").join(name)
}

fn records(name: &str) -> Vec<RawLogRecord> {
    open_rows(fixture(name))
        .unwrap()
        .map(|row| row.unwrap().into_record())
        .collect()
}

#[test]
fn csv_export_topic_encodings_converge() {
    let recs = records("logs_1.csv");
    assert_eq!(recs.len(), 5);

    // JSON list and comma-separated spellings of the same topics.
    assert_eq!(recs[0].topics, recs[4].topics);
    assert_eq!(recs[0].topic0(), Some(TRANSFER));
    assert_eq!(recs[0].topics.len(), 3);

    // Python literal list with uppercase hex.
    assert_eq!(recs[1].topic0(), Some(SWAP_V2));
    assert_eq!(recs[1].log_index, 7);
    assert_eq!(recs[1].block_number, Some(19_000_001));

    assert!(recs[3].topics.is_empty());
}

#[test]
fn jsonl_export_with_topic_columns() {
    let recs = records("logs_2.jsonl");
    assert_eq!(recs.len(), 3);
    assert_eq!(recs[0].log_index, 112);
    assert_eq!(recs[1].topic0(), Some(WORMHOLE));
    assert_eq!(recs[1].topics.len(), 2);
    assert_eq!(recs[2].data, "0xabababababababababab");
}
