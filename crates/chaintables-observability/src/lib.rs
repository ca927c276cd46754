//! # chaintables-observability
//!
//! Metrics and structured logging for ChainTables.
//!
//! ## Built-in metrics
//! - `chaintables.logs_seen`           counter
//! - `chaintables.events_decoded`      counter, tagged with event kind
//! - `chaintables.events_skipped`      counter, tagged with reason
//! - `chaintables.decode_errors`       counter, tagged with event kind
//! - `chaintables.metadata_lookups`    counter
//! - `chaintables.metadata_cache_hits` counter
//! - `chaintables.batch_size`          histogram
//! - `chaintables.batch_latency_ms`    histogram
//!
//! ## Structured logging
//! Human-readable or JSON logs on stderr via `tracing-subscriber`, with
//! per-component level overrides.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::PipelineMetrics;
pub use tracing_setup::{build_filter, init_tracing, LogConfig};
