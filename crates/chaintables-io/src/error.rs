use thiserror::Error;

/// Fatal input/output errors. Row-level schema gaps are not errors; they
/// fall back to column defaults.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error in {path} line {line}: {source}")]
    Json {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported input format for {path} (expected .csv or .jsonl)")]
    UnsupportedFormat { path: String },
}
