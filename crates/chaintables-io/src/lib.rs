//! # chaintables-io
//!
//! Reading exported log tables and writing the decoded output tables.
//!
//! - [`open_rows`] streams [`RawLogRow`](chaintables_core::RawLogRow)s from
//!   `.csv` or `.jsonl` exports, tolerating missing or renamed columns.
//! - [`TableWriter`] writes `transfers.csv`, `dex_swaps.csv` and
//!   `bridge_messages.csv` with fixed headers.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::IoError;
pub use reader::{open_rows, read_csv, read_jsonl, InputFormat, RowIter};
pub use writer::{
    format_amount, write_bridges, write_swaps, write_transfers, TableWriter, WrittenTables,
    BRIDGES_FILE, BRIDGE_COLUMNS, SWAPS_FILE, SWAP_COLUMNS, TRANSFERS_FILE, TRANSFER_COLUMNS,
};
