//! Streaming readers for exported log tables.
//!
//! Both readers are schema tolerant: column names are matched
//! case-insensitively (with a few aliases), missing columns fall back to
//! `RawLogRow` defaults and a cell that does not parse becomes the default
//! rather than an error. Only unreadable files and malformed CSV/JSON
//! framing are reported.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use std::collections::HashMap;

use chaintables_core::{has_wide_number, RawLogRow, TopicsField};
use serde_json::value::RawValue;
use serde_json::{Map, Value};

use crate::error::IoError;

/// Boxed row stream returned by every reader.
pub type RowIter = Box<dyn Iterator<Item = Result<RawLogRow, IoError>> + Send>;

const TX_HASH: &[&str] = &["transaction_hash", "tx_hash", "transactionhash"];
const LOG_INDEX: &[&str] = &["log_index", "logindex"];
const BLOCK_NUMBER: &[&str] = &["block_number", "blocknumber"];
const ADDRESS: &[&str] = &["address", "contract_address"];
const DATA: &[&str] = &["data"];
const TOPICS: &[&str] = &["topics"];
const TOPIC_COLUMNS: [&str; 4] = ["topic0", "topic1", "topic2", "topic3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    /// One JSON object per line.
    Jsonl,
}

impl InputFormat {
    /// Picks the format from the file extension: `.csv`, or `.jsonl` /
    /// `.ndjson` / `.json` for line-delimited JSON.
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(InputFormat::Csv),
            Some("jsonl") | Some("ndjson") | Some("json") => Ok(InputFormat::Jsonl),
            _ => Err(IoError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

/// Open a log table and stream its rows.
pub fn open_rows(path: impl AsRef<Path>) -> Result<RowIter, IoError> {
    let path = path.as_ref();
    let format = InputFormat::from_path(path)?;
    let file = File::open(path)?;
    let label = path.display().to_string();
    match format {
        InputFormat::Csv => read_csv(file, label),
        InputFormat::Jsonl => Ok(read_jsonl(BufReader::new(file), label)),
    }
}

/// Column positions resolved once from the CSV header.
#[derive(Debug, Default)]
struct CsvColumns {
    block_number: Option<usize>,
    tx_hash: Option<usize>,
    log_index: Option<usize>,
    address: Option<usize>,
    data: Option<usize>,
    topics: Option<usize>,
    topic_columns: [Option<usize>; 4],
}

impl CsvColumns {
    fn resolve(headers: &csv::StringRecord) -> Self {
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase())
            .collect();
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));
        Self {
            block_number: find(BLOCK_NUMBER),
            tx_hash: find(TX_HASH),
            log_index: find(LOG_INDEX),
            address: find(ADDRESS),
            data: find(DATA),
            topics: find(TOPICS),
            topic_columns: TOPIC_COLUMNS.map(|c| find(&[c][..])),
        }
    }

    fn row(&self, record: &csv::StringRecord) -> RawLogRow {
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i));
        let text = |idx: Option<usize>| cell(idx).unwrap_or_default().trim().to_string();

        RawLogRow {
            block_number: cell(self.block_number).and_then(parse_block_number),
            transaction_hash: text(self.tx_hash),
            log_index: cell(self.log_index).map(parse_log_index).unwrap_or(-1),
            address: text(self.address),
            data: text(self.data),
            topics: cell(self.topics)
                .map(|t| TopicsField::Text(t.to_string()))
                .unwrap_or_default(),
            topic_columns: self.topic_columns.map(|idx| non_empty(cell(idx))),
        }
    }
}

/// Stream rows from CSV. A header row is required; rows may be ragged.
pub fn read_csv<R: Read + Send + 'static>(
    reader: R,
    label: impl Into<String>,
) -> Result<RowIter, IoError> {
    let label = label.into();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let columns = CsvColumns::resolve(reader.headers().map_err(|source| IoError::Csv {
        path: label.clone(),
        source,
    })?);

    let rows = reader.into_records().map(move |record| {
        record
            .map(|r| columns.row(&r))
            .map_err(|source| IoError::Csv {
                path: label.clone(),
                source,
            })
    });
    Ok(Box::new(rows))
}

/// Stream rows from line-delimited JSON. Blank lines are ignored.
pub fn read_jsonl<R: BufRead + Send + 'static>(reader: R, label: impl Into<String>) -> RowIter {
    let label = label.into();
    let rows = reader
        .lines()
        .enumerate()
        .filter_map(move |(i, line)| match line {
            Err(e) => Some(Err(IoError::Io(e))),
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(
                serde_json::from_str::<Map<String, Value>>(&line)
                    .map(|obj| json_row(&obj, &line))
                    .map_err(|source| IoError::Json {
                        path: label.clone(),
                        line: i + 1,
                        source,
                    }),
            ),
        });
    Box::new(rows)
}

fn json_row(obj: &Map<String, Value>, line: &str) -> RawLogRow {
    let text = |aliases: &[&str]| json_field(obj, aliases).map(json_text).unwrap_or_default();

    RawLogRow {
        block_number: json_field(obj, BLOCK_NUMBER).and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => parse_block_number(s),
            _ => None,
        }),
        transaction_hash: text(TX_HASH),
        log_index: json_field(obj, LOG_INDEX)
            .map(|v| match v {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
                    .unwrap_or(-1),
                Value::String(s) => parse_log_index(s),
                _ => -1,
            })
            .unwrap_or(-1),
        address: text(ADDRESS),
        data: text(DATA),
        topics: json_topics(obj, line),
        topic_columns: TOPIC_COLUMNS.map(|c| {
            let value = json_field(obj, &[c]).map(json_text);
            non_empty(value.as_deref())
        }),
    }
}

/// Topics from a parsed JSONL object. Integers wider than u64 were rounded
/// by the parse, so those values are rebuilt from the line's source text.
fn json_topics(obj: &Map<String, Value>, line: &str) -> TopicsField {
    match json_field(obj, TOPICS) {
        None => TopicsField::Absent,
        Some(value) if has_wide_number(value) => raw_json_field(line, TOPICS)
            .map(|raw| TopicsField::from_json_text(raw.get()))
            .unwrap_or_else(|| TopicsField::from(value)),
        Some(value) => TopicsField::from(value),
    }
}

fn raw_json_field(line: &str, aliases: &[&str]) -> Option<Box<RawValue>> {
    let fields: HashMap<String, Box<RawValue>> = serde_json::from_str(line).ok()?;
    fields
        .into_iter()
        .find(|(k, _)| aliases.contains(&k.to_ascii_lowercase().as_str()))
        .map(|(_, v)| v)
}

fn json_field<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    obj.iter()
        .find(|(k, _)| aliases.contains(&k.to_ascii_lowercase().as_str()))
        .map(|(_, v)| v)
}

fn json_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn non_empty(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Integer log index; float-formatted exports (`"7.0"`) are accepted.
fn parse_log_index(cell: &str) -> i64 {
    let cell = cell.trim();
    cell.parse::<i64>()
        .ok()
        .or_else(|| {
            cell.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f as i64)
        })
        .unwrap_or(-1)
}

fn parse_block_number(cell: &str) -> Option<u64> {
    let cell = cell.trim();
    if let Some(hex) = cell.strip_prefix("0x") {
        return u64::from_str_radix(hex, 16).ok();
    }
    cell.parse::<u64>().ok().or_else(|| {
        cell.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f as u64)
    })
}
