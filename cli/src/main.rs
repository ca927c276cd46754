//! ChainTables CLI: turn exported EVM log tables into analysis tables.
//!
//! # Commands
//! ```text
//! chaintables decode     <logs_*.csv|jsonl>... --out <dir> [--topics f] [--addresses f]
//!                        [--cache <dir|file.db>] [--rpc <url> | --offline]
//! chaintables signatures [--topics f]
//! chaintables inspect    <topics value> [--topics f]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chaintables_core::EngineConfig;
use chaintables_observability::{init_tracing, LogConfig};
use clap::{Parser, Subcommand};

mod cmd_decode;
mod cmd_inspect;

#[derive(Parser)]
#[command(
    name = "chaintables",
    about = "Decode exported EVM logs into transfer, swap and bridge tables",
    long_about = "
ChainTables CLI: decode ERC-20 transfers, Uniswap V2/V3 swaps and Wormhole
bridge messages from CSV or JSONL log exports.

ENVIRONMENT VARIABLES:
  CHAINTABLES_RPC_URL   JSON-RPC endpoint for token/pool metadata lookups
  RUST_LOG              Log filter, overrides --verbose
",
    version
)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Config files shared by every command.
#[derive(clap::Args, Debug, Clone)]
struct ConfigArgs {
    /// Full engine config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Event name -> topic0 hash map (JSON)
    #[arg(long)]
    topics: Option<PathBuf>,
    /// Bridge contract addresses, `{"bridges": [...]}` (JSON)
    #[arg(long)]
    addresses: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_file(path)
                .with_context(|| format!("read config '{}'", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(path) = &self.topics {
            config = config
                .with_topics_file(path)
                .with_context(|| format!("read topics '{}'", path.display()))?;
        }
        if let Some(path) = &self.addresses {
            config = config
                .with_addresses_file(path)
                .with_context(|| format!("read addresses '{}'", path.display()))?;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Decode log exports and write transfers.csv, dex_swaps.csv and bridge_messages.csv
    Decode {
        /// Input exports (.csv, .jsonl)
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        /// Output directory
        #[arg(long, default_value = "out")]
        out: PathBuf,
        #[command(flatten)]
        config: ConfigArgs,
        /// Metadata cache: a directory of CSV files, or a `.db` / `.sqlite` file
        #[arg(long)]
        cache: Option<PathBuf>,
        /// JSON-RPC endpoint for metadata lookups
        #[arg(long, env = "CHAINTABLES_RPC_URL")]
        rpc: Option<String>,
        /// Never call out; resolve metadata from the cache and built-in tokens only
        #[arg(long)]
        offline: bool,
        /// Print the run summary as JSON on stdout
        #[arg(long)]
        summary_json: bool,
    },

    /// Print the active event signature map
    Signatures {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Show how a topics value normalizes and which event it dispatches to
    Inspect {
        /// Raw topics cell, e.g. "['0xddf2...', '0x...']"
        value: String,
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&LogConfig {
        level: if cli.verbose { "debug" } else { "info" }.to_string(),
        json: cli.json,
        ..Default::default()
    });

    match cli.command {
        Commands::Decode { inputs, out, config, cache, rpc, offline, summary_json } => {
            let engine_config = config.load()?;
            cmd_decode::run(cmd_decode::DecodeArgs {
                inputs,
                out,
                config: engine_config,
                cache,
                rpc: if offline { None } else { rpc },
                summary_json,
            })
        }
        Commands::Signatures { config } => cmd_inspect::signatures(&config.load()?),
        Commands::Inspect { value, config } => cmd_inspect::inspect(&value, &config.load()?),
    }
}

/// `.db`, `.sqlite` and `.sqlite3` paths are SQLite stores; anything else is a CSV directory.
fn is_sqlite_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("db") | Some("sqlite") | Some("sqlite3")
    )
}
