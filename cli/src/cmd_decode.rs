//! `chaintables decode`: run the batch engine over exports and write the tables.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chaintables_batch::BatchEngine;
use chaintables_core::{EngineConfig, MetadataSource, MetadataStore};
use chaintables_io::TableWriter;
use chaintables_metadata::{
    CsvStore, MetadataCache, RpcMetadataSource, RpcSourceConfig, SqliteStore, StaticMetadataSource,
};
use chaintables_observability::PipelineMetrics;
use tracing::{info, warn};

use crate::is_sqlite_path;

pub struct DecodeArgs {
    pub inputs: Vec<PathBuf>,
    pub out: PathBuf,
    pub config: EngineConfig,
    pub cache: Option<PathBuf>,
    /// `None` when offline or no endpoint is configured.
    pub rpc: Option<String>,
    pub summary_json: bool,
}

fn metadata_source(rpc: Option<&str>) -> Result<Arc<dyn MetadataSource>> {
    match rpc {
        Some(url) => {
            let source = RpcMetadataSource::new(RpcSourceConfig::new(url))
                .context("build RPC metadata source")?;
            Ok(Arc::new(source))
        }
        None => {
            warn!("no RPC endpoint, unknown tokens and pools resolve to defaults");
            Ok(Arc::new(StaticMetadataSource::mainnet()))
        }
    }
}

fn metadata_store(path: &Path) -> Result<Arc<dyn MetadataStore>> {
    if is_sqlite_path(path) {
        let store = SqliteStore::open(path)
            .with_context(|| format!("open sqlite cache '{}'", path.display()))?;
        Ok(Arc::new(store))
    } else {
        let store = CsvStore::open(path)
            .with_context(|| format!("open CSV cache '{}'", path.display()))?;
        Ok(Arc::new(store))
    }
}

pub fn run(args: DecodeArgs) -> Result<()> {
    let started = Instant::now();
    let source = metadata_source(args.rpc.as_deref())?;
    let cache = match &args.cache {
        Some(path) => MetadataCache::with_store(source, metadata_store(path)?)
            .context("warm metadata cache")?,
        None => MetadataCache::new(source),
    };

    let metrics = PipelineMetrics::global();
    let engine = BatchEngine::from_config(&args.config)
        .context("build decoder from config")?
        .with_metrics(metrics.clone());

    info!(
        files = args.inputs.len(),
        source = cache.source_name(),
        signatures = engine.decoder().signatures().len(),
        "decoding"
    );
    let output = engine
        .decode_files(args.inputs.as_slice(), &cache)
        .context("decode inputs")?;

    let flushed = cache.flush().context("flush metadata cache")?;
    let cache_stats = cache.stats();
    metrics.record_metadata(cache_stats.lookups, cache_stats.hits);

    let tables = TableWriter::new(&args.out)
        .write(&output.transfers, &output.swaps, &output.bridges)
        .with_context(|| format!("write tables to '{}'", args.out.display()))?;

    if args.summary_json {
        let summary = serde_json::json!({
            "stats": output.stats,
            "metadata": {
                "lookups": cache_stats.lookups,
                "hits": cache_stats.hits,
                "failures": cache_stats.failures,
                "persisted": flushed,
            },
            "tables": {
                "transfers": tables.transfers,
                "swaps": tables.swaps,
                "bridges": tables.bridges,
            },
            "elapsed_ms": started.elapsed().as_millis() as u64,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let s = &output.stats;
        println!("Rows read:       {}", s.rows_read);
        println!("Matched:         {} ({} failed)", s.matched(), s.total_failed());
        println!(
            "Skipped:         {} unmatched, {} without topics",
            s.skipped_unmatched, s.skipped_no_topics
        );
        println!("Transfers:       {}  -> {}", output.transfers.len(), tables.transfers.display());
        println!("Swaps:           {}  -> {}", output.swaps.len(), tables.swaps.display());
        println!("Bridge messages: {}  -> {}", output.bridges.len(), tables.bridges.display());
        println!(
            "Metadata:        {} lookups, {} cache hits, {} persisted",
            cache_stats.lookups, cache_stats.hits, flushed
        );
        println!("Duration:        {:.3}s", started.elapsed().as_secs_f64());
    }
    Ok(())
}
