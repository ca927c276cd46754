//! Signature dispatch: leading topic → event kind.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

use crate::error::ConfigError;
use crate::log::RawLogRecord;

/// The fixed set of event shapes the engine decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "erc20_transfer")]
    Erc20Transfer,
    #[serde(rename = "amm_swap_v2", alias = "univ2_swap")]
    AmmSwapV2,
    #[serde(rename = "amm_swap_v3", alias = "univ3_swap")]
    AmmSwapV3,
    #[serde(rename = "bridge_message", alias = "wormhole_log")]
    BridgeMessage,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Erc20Transfer,
        EventKind::AmmSwapV2,
        EventKind::AmmSwapV3,
        EventKind::BridgeMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Erc20Transfer => "erc20_transfer",
            EventKind::AmmSwapV2 => "amm_swap_v2",
            EventKind::AmmSwapV3 => "amm_swap_v3",
            EventKind::BridgeMessage => "bridge_message",
        }
    }

    /// Canonical Solidity event signature whose keccak256 is topic0.
    pub fn canonical_signature(&self) -> &'static str {
        match self {
            EventKind::Erc20Transfer => "Transfer(address,address,uint256)",
            EventKind::AmmSwapV2 => "Swap(address,uint256,uint256,uint256,uint256,address)",
            EventKind::AmmSwapV3 => "Swap(address,address,int256,int256,uint160,uint128,int24)",
            EventKind::BridgeMessage => "LogMessagePublished(address,uint64,uint32,bytes,uint8)",
        }
    }

    pub fn default_hash(&self) -> String {
        keccak256_signature(self.canonical_signature())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "erc20_transfer" => Ok(EventKind::Erc20Transfer),
            "amm_swap_v2" | "univ2_swap" => Ok(EventKind::AmmSwapV2),
            "amm_swap_v3" | "univ3_swap" => Ok(EventKind::AmmSwapV3),
            "bridge_message" | "wormhole_log" => Ok(EventKind::BridgeMessage),
            other => Err(ConfigError::UnknownEventKind {
                name: other.to_string(),
            }),
        }
    }
}

/// Compute the `0x`-prefixed keccak256 of an event signature.
pub fn keccak256_signature(signature: &str) -> String {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(signature.as_bytes());
    hasher.finalize(&mut output);
    format!("0x{}", hex::encode(output))
}

/// Lowercase signature hash → event kind.
///
/// Construction rejects a hash bound to two different kinds, so topic0 always
/// determines at most one decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMap {
    by_hash: HashMap<String, EventKind>,
}

impl Default for SignatureMap {
    fn default() -> Self {
        let by_hash = EventKind::ALL
            .iter()
            .map(|k| (k.default_hash(), *k))
            .collect();
        Self { by_hash }
    }
}

impl SignatureMap {
    /// Build from explicit (kind, hash) bindings.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (EventKind, S)>,
        S: AsRef<str>,
    {
        let mut by_hash: HashMap<String, EventKind> = HashMap::new();
        for (kind, hash) in entries {
            let hash = validate_hash(kind, hash.as_ref())?;
            match by_hash.get(&hash) {
                Some(existing) if *existing != kind => {
                    return Err(ConfigError::DuplicateSignature {
                        signature: hash,
                        first: existing.to_string(),
                        second: kind.to_string(),
                    });
                }
                _ => {
                    by_hash.insert(hash, kind);
                }
            }
        }
        Ok(Self { by_hash })
    }

    /// Build from an event-name → hash map (the `topics.json` shape).
    ///
    /// Kinds not named keep their canonical hash. Legacy names are accepted.
    pub fn from_named(named: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut per_kind: BTreeMap<EventKind, String> = EventKind::ALL
            .iter()
            .map(|k| (*k, k.default_hash()))
            .collect();
        for (name, hash) in named {
            let kind: EventKind = name.parse()?;
            per_kind.insert(kind, hash.clone());
        }
        Self::from_entries(per_kind)
    }

    /// Look up the kind for a leading topic. Case-insensitive, exact.
    pub fn lookup(&self, topic0: &str) -> Option<EventKind> {
        let topic0 = topic0.trim();
        if topic0.bytes().any(|b| b.is_ascii_uppercase()) {
            self.by_hash.get(&topic0.to_ascii_lowercase()).copied()
        } else {
            self.by_hash.get(topic0).copied()
        }
    }

    /// Dispatch a record by its first canonical topic. `None` means "skip".
    pub fn dispatch(&self, record: &RawLogRecord) -> Option<EventKind> {
        record.topic0().and_then(|t| self.lookup(t))
    }

    /// The hash currently bound to `kind`, if any.
    pub fn hash_for(&self, kind: EventKind) -> Option<&str> {
        self.by_hash
            .iter()
            .find(|(_, k)| **k == kind)
            .map(|(h, _)| h.as_str())
    }

    /// All bindings, ordered by kind.
    pub fn entries(&self) -> Vec<(EventKind, &str)> {
        let mut out: Vec<(EventKind, &str)> =
            self.by_hash.iter().map(|(h, k)| (*k, h.as_str())).collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }
}

fn validate_hash(kind: EventKind, raw: &str) -> Result<String, ConfigError> {
    let hash = raw.trim().to_ascii_lowercase();
    let valid = hash
        .strip_prefix("0x")
        .map(|h| h.len() == 64 && h.bytes().all(|b| b.is_ascii_hexdigit()))
        .unwrap_or(false);
    if valid {
        Ok(hash)
    } else {
        Err(ConfigError::InvalidSignature {
            kind: kind.to_string(),
            value: raw.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSFER: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
    const SWAP_V2: &str = "0xd78ad95fa46c994b6551d0da85fc275fe613ce37657fb8d5e3d130840159d822";
    const SWAP_V3: &str = "0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67";
    const WORMHOLE: &str = "0x6eb224fb001ed210e379b335e35efe88672a8ce935d981a6896b27ff90522b2b";

    #[test]
    fn default_hashes_match_known_topics() {
        assert_eq!(EventKind::Erc20Transfer.default_hash(), TRANSFER);
        assert_eq!(EventKind::AmmSwapV2.default_hash(), SWAP_V2);
        assert_eq!(EventKind::AmmSwapV3.default_hash(), SWAP_V3);
        assert_eq!(EventKind::BridgeMessage.default_hash(), WORMHOLE);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let map = SignatureMap::default();
        assert_eq!(
            map.lookup(&TRANSFER.to_uppercase().replace("0X", "0x")),
            Some(EventKind::Erc20Transfer)
        );
        assert_eq!(map.lookup(SWAP_V3), Some(EventKind::AmmSwapV3));
    }

    #[test]
    fn unknown_and_empty_skip() {
        let map = SignatureMap::default();
        assert_eq!(map.lookup(""), None);
        assert_eq!(map.lookup("0xdeadbeef"), None);
        let record = RawLogRecord {
            block_number: None,
            tx_hash: "0x01".into(),
            log_index: 0,
            contract_address: String::new(),
            topics: vec![],
            data: String::new(),
        };
        assert_eq!(map.dispatch(&record), None);
    }

    #[test]
    fn duplicate_signature_rejected() {
        let err = SignatureMap::from_entries([
            (EventKind::Erc20Transfer, TRANSFER),
            (EventKind::BridgeMessage, TRANSFER),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSignature { .. }));
    }

    #[test]
    fn invalid_hash_rejected() {
        let err = SignatureMap::from_entries([(EventKind::Erc20Transfer, "0x1234")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSignature { .. }));
    }

    #[test]
    fn named_config_accepts_legacy_keys() {
        let mut named = BTreeMap::new();
        named.insert("univ2_swap".to_string(), SWAP_V2.to_uppercase().replace("0X", "0x"));
        named.insert("wormhole_log".to_string(), WORMHOLE.to_string());
        let map = SignatureMap::from_named(&named).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map.lookup(SWAP_V2), Some(EventKind::AmmSwapV2));
        assert_eq!(map.hash_for(EventKind::BridgeMessage), Some(WORMHOLE));
    }

    #[test]
    fn named_config_rejects_unknown_key() {
        let mut named = BTreeMap::new();
        named.insert("nft_mint".to_string(), TRANSFER.to_string());
        assert!(matches!(
            SignatureMap::from_named(&named),
            Err(ConfigError::UnknownEventKind { .. })
        ));
    }

    #[test]
    fn serde_accepts_legacy_names() {
        let kind: EventKind = serde_json::from_str("\"univ3_swap\"").unwrap();
        assert_eq!(kind, EventKind::AmmSwapV3);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"amm_swap_v3\"");
    }
}
