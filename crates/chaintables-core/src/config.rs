//! Engine configuration.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dispatch::SignatureMap;
use crate::error::ConfigError;
use crate::metadata::address_key;

/// Top-level decode configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Event name → signature hash overrides (empty = canonical hashes).
    /// Accepts legacy names such as `univ2_swap`.
    #[serde(default)]
    pub signatures: BTreeMap<String, String>,
    /// Bridge contract addresses used to correlate inbound transfers.
    #[serde(default)]
    pub bridge_addresses: Vec<String>,
    /// Suffix appended to token symbols in aliases, e.g. `USDC.ETH`.
    #[serde(default = "default_chain_suffix")]
    pub chain_suffix: String,
    #[serde(default = "default_bridge_id")]
    pub bridge_id: String,
    /// Rows decoded per parallel chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chain_suffix() -> String { "ETH".into() }
fn default_bridge_id() -> String { "wormhole".into() }
fn default_chunk_size() -> usize { 10_000 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            signatures: BTreeMap::new(),
            bridge_addresses: vec![],
            chain_suffix: default_chain_suffix(),
            bridge_id: default_bridge_id(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// `{"bridges": [...]}`, the shape of an addresses file.
#[derive(Debug, Deserialize)]
struct AddressesFile {
    #[serde(default)]
    bridges: Vec<String>,
}

impl EngineConfig {
    /// Load a full engine config from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Replace the signature overrides with the contents of a `topics.json`
    /// file (a flat name → hash object).
    pub fn with_topics_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        self.signatures = serde_json::from_str(&text)?;
        Ok(self)
    }

    /// Replace the bridge addresses with the `bridges` list of an addresses file.
    pub fn with_addresses_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let file: AddressesFile = serde_json::from_str(&text)?;
        self.bridge_addresses = file.bridges;
        Ok(self)
    }

    /// Build the validated dispatch table.
    pub fn signature_map(&self) -> Result<SignatureMap, ConfigError> {
        SignatureMap::from_named(&self.signatures)
    }

    /// Lowercased bridge address set.
    pub fn bridge_set(&self) -> HashSet<String> {
        self.bridge_addresses
            .iter()
            .map(|a| address_key(a))
            .filter(|a| !a.is_empty())
            .collect()
    }

    pub fn decode_context(&self) -> DecodeContext {
        DecodeContext {
            chain_suffix: self.chain_suffix.clone(),
            bridge_id: self.bridge_id.clone(),
        }
    }
}

/// Per-run values every decoder needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeContext {
    pub chain_suffix: String,
    pub bridge_id: String,
}

impl Default for DecodeContext {
    fn default() -> Self {
        EngineConfig::default().decode_context()
    }
}
