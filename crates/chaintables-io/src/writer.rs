//! CSV output tables.
//!
//! Every table is written with its header, even when empty. Optional values
//! become empty cells and bridge `fields` are serialized as compact JSON.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chaintables_core::{BridgeMessage, SwapEvent, TransferEvent};
use tracing::info;

use crate::error::IoError;

pub const TRANSFERS_FILE: &str = "transfers.csv";
pub const SWAPS_FILE: &str = "dex_swaps.csv";
pub const BRIDGES_FILE: &str = "bridge_messages.csv";

pub const TRANSFER_COLUMNS: [&str; 10] = [
    "tx_hash",
    "log_index",
    "token_address",
    "symbol",
    "decimals",
    "from",
    "to",
    "amount_raw",
    "amount_norm",
    "token_alias",
];

pub const SWAP_COLUMNS: [&str; 8] = [
    "tx_hash",
    "log_index",
    "dex",
    "pair_or_pool",
    "token_in",
    "token_out",
    "amount_in",
    "amount_out",
];

pub const BRIDGE_COLUMNS: [&str; 6] = [
    "tx_hash",
    "log_index",
    "bridge_id",
    "fields",
    "token_in",
    "amount_in",
];

/// Render a float the way the tables display amounts: shortest round-trip
/// digits, always with a fractional part, scientific outside `[1e-4, 1e16)`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return format!("{value:e}");
    }
    let s = value.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

fn csv_error(path: &str) -> impl Fn(csv::Error) -> IoError + '_ {
    move |source| IoError::Csv {
        path: path.to_string(),
        source,
    }
}

pub fn write_transfers<W: Write>(
    out: W,
    label: &str,
    rows: &[TransferEvent],
) -> Result<(), IoError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(TRANSFER_COLUMNS).map_err(csv_error(label))?;
    for t in rows {
        w.write_record([
            t.tx_hash.clone(),
            t.log_index.to_string(),
            t.token_address.clone(),
            t.symbol.clone(),
            t.decimals.to_string(),
            t.from.clone(),
            t.to.clone(),
            t.amount_raw.to_string(),
            format_amount(t.amount_norm),
            t.token_alias.clone(),
        ])
        .map_err(csv_error(label))?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_swaps<W: Write>(out: W, label: &str, rows: &[SwapEvent]) -> Result<(), IoError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(SWAP_COLUMNS).map_err(csv_error(label))?;
    for s in rows {
        w.write_record([
            s.tx_hash.clone(),
            s.log_index.to_string(),
            s.dex.to_string(),
            s.pair_or_pool.clone(),
            s.token_in.clone(),
            s.token_out.clone(),
            format_amount(s.amount_in),
            format_amount(s.amount_out),
        ])
        .map_err(csv_error(label))?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_bridges<W: Write>(out: W, label: &str, rows: &[BridgeMessage]) -> Result<(), IoError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(BRIDGE_COLUMNS).map_err(csv_error(label))?;
    for (i, b) in rows.iter().enumerate() {
        let fields = serde_json::to_string(&b.fields).map_err(|source| IoError::Json {
            path: label.to_string(),
            line: i + 2,
            source,
        })?;
        w.write_record([
            b.tx_hash.clone(),
            b.log_index.to_string(),
            b.bridge_id.clone(),
            fields,
            b.token_in.clone().unwrap_or_default(),
            b.amount_in.map(format_amount).unwrap_or_default(),
        ])
        .map_err(csv_error(label))?;
    }
    w.flush()?;
    Ok(())
}

/// Paths of the three tables written by [`TableWriter::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTables {
    pub transfers: PathBuf,
    pub swaps: PathBuf,
    pub bridges: PathBuf,
}

/// Writes the three output tables into one directory.
#[derive(Debug, Clone)]
pub struct TableWriter {
    dir: PathBuf,
}

impl TableWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if needed and (over)write all three tables.
    pub fn write(
        &self,
        transfers: &[TransferEvent],
        swaps: &[SwapEvent],
        bridges: &[BridgeMessage],
    ) -> Result<WrittenTables, IoError> {
        fs::create_dir_all(&self.dir)?;
        let tables = WrittenTables {
            transfers: self.dir.join(TRANSFERS_FILE),
            swaps: self.dir.join(SWAPS_FILE),
            bridges: self.dir.join(BRIDGES_FILE),
        };

        let label = tables.transfers.display().to_string();
        write_transfers(File::create(&tables.transfers)?, &label, transfers)?;
        info!(path = %label, rows = transfers.len(), "wrote transfers");

        let label = tables.swaps.display().to_string();
        write_swaps(File::create(&tables.swaps)?, &label, swaps)?;
        info!(path = %label, rows = swaps.len(), "wrote swaps");

        let label = tables.bridges.display().to_string();
        write_bridges(File::create(&tables.bridges)?, &label, bridges)?;
        info!(path = %label, rows = bridges.len(), "wrote bridge messages");

        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use chaintables_core::{BridgeFields, Dex};

    fn render<F: FnOnce(&mut Vec<u8>)>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn amounts_keep_a_fraction() {
        assert_eq!(format_amount(3000.0), "3000.0");
        assert_eq!(format_amount(1234.5), "1234.5");
        assert_eq!(format_amount(-48.0), "-48.0");
        assert_eq!(format_amount(0.0), "0.0");
        assert_eq!(format_amount(1e-7), "1e-7");
        assert_eq!(format_amount(f64::NAN), "");
    }

    #[test]
    fn empty_tables_have_headers() {
        let t = render(|b| write_transfers(b, "t", &[]).unwrap());
        assert_eq!(
            t,
            "tx_hash,log_index,token_address,symbol,decimals,from,to,amount_raw,amount_norm,token_alias\n"
        );
        let s = render(|b| write_swaps(b, "s", &[]).unwrap());
        assert_eq!(
            s,
            "tx_hash,log_index,dex,pair_or_pool,token_in,token_out,amount_in,amount_out\n"
        );
        let m = render(|b| write_bridges(b, "m", &[]).unwrap());
        assert_eq!(m, "tx_hash,log_index,bridge_id,fields,token_in,amount_in\n");
    }

    #[test]
    fn transfer_row_cells() {
        let row = TransferEvent {
            tx_hash: "0xaa".into(),
            log_index: 4,
            token_address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".into(),
            symbol: "USDC".into(),
            decimals: 6,
            from: "0x01".into(),
            to: "0x02".into(),
            amount_raw: U256::from(1_500_000u64),
            amount_norm: 1.5,
            token_alias: "USDC.ETH".into(),
        };
        let out = render(|b| write_transfers(b, "t", &[row]).unwrap());
        let line = out.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "0xaa,4,0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48,USDC,6,0x01,0x02,1500000,1.5,USDC.ETH"
        );
    }

    #[test]
    fn swap_row_uses_dex_label() {
        let row = SwapEvent {
            tx_hash: "0xbb".into(),
            log_index: 1,
            dex: Dex::V3,
            pair_or_pool: "0xpool".into(),
            token_in: "USDC.ETH".into(),
            token_out: "WETH.ETH".into(),
            amount_in: 50.0,
            amount_out: 0.02,
            token_in_address: String::new(),
            token_out_address: String::new(),
            amount_in_raw: "50000000".into(),
            amount_out_raw: "20000000000000000".into(),
        };
        let out = render(|b| write_swaps(b, "s", &[row]).unwrap());
        assert_eq!(out.lines().nth(1), Some("0xbb,1,UNI-V3,0xpool,USDC.ETH,WETH.ETH,50.0,0.02"));
    }

    #[test]
    fn bridge_nulls_are_empty_cells() {
        let row = BridgeMessage {
            tx_hash: "0xcc".into(),
            log_index: 9,
            bridge_id: "wormhole".into(),
            fields: BridgeFields {
                sequence: None,
                nonce: None,
                sender: None,
                emitter: "0xe".into(),
                raw_prefix: Some("00".into()),
            },
            token_in: None,
            amount_in: None,
        };
        let out = render(|b| write_bridges(b, "m", &[row]).unwrap());
        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let rec = reader.records().next().unwrap().unwrap();
        assert_eq!(&rec[2], "wormhole");
        assert_eq!(
            &rec[3],
            r#"{"sequence":null,"nonce":null,"sender":null,"emitter":"0xe","raw_prefix":"00"}"#
        );
        assert_eq!(&rec[4], "");
        assert_eq!(&rec[5], "");
    }

    #[test]
    fn table_writer_creates_directory() {
        let dir = std::env::temp_dir().join(format!("chaintables-io-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let tables = TableWriter::new(dir.join("out")).write(&[], &[], &[]).unwrap();
        assert!(tables.transfers.ends_with(TRANSFERS_FILE));
        assert!(fs::read_to_string(&tables.bridges).unwrap().starts_with("tx_hash,"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
