//! `EvmDecoder`: dispatch a canonical log to its decoder.

use chaintables_core::{
    DecodeContext, DecodeError, DecodedRecord, EngineConfig, ConfigError, EventKind,
    MetadataProvider, RawLogRecord, SignatureMap,
};

use crate::{bridge, swap_v2, swap_v3, transfer};

/// Result of pushing one log through dispatch and decode.
#[derive(Debug)]
pub enum Outcome {
    /// No topics, or topic0 is not a known signature.
    Skipped,
    Decoded(DecodedRecord),
    Failed { kind: EventKind, error: DecodeError },
}

/// Decode a log whose kind is already known.
pub fn decode_kind(
    kind: EventKind,
    raw: &RawLogRecord,
    metadata: &dyn MetadataProvider,
    ctx: &DecodeContext,
) -> Result<DecodedRecord, DecodeError> {
    match kind {
        EventKind::Erc20Transfer => {
            transfer::decode(raw, metadata, ctx).map(DecodedRecord::Transfer)
        }
        EventKind::AmmSwapV2 => swap_v2::decode(raw, metadata, ctx).map(DecodedRecord::Swap),
        EventKind::AmmSwapV3 => swap_v3::decode(raw, metadata, ctx).map(DecodedRecord::Swap),
        EventKind::BridgeMessage => bridge::decode(raw, ctx).map(DecodedRecord::Bridge),
    }
}

/// Signature table plus per-run context. Thread-safe, shared by reference
/// across the decode workers.
#[derive(Debug, Clone)]
pub struct EvmDecoder {
    signatures: SignatureMap,
    ctx: DecodeContext,
}

impl Default for EvmDecoder {
    fn default() -> Self {
        Self::new(SignatureMap::default(), DecodeContext::default())
    }
}

impl EvmDecoder {
    pub fn new(signatures: SignatureMap, ctx: DecodeContext) -> Self {
        Self { signatures, ctx }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.signature_map()?, config.decode_context()))
    }

    pub fn signatures(&self) -> &SignatureMap {
        &self.signatures
    }

    pub fn context(&self) -> &DecodeContext {
        &self.ctx
    }

    pub fn classify(&self, raw: &RawLogRecord) -> Option<EventKind> {
        self.signatures.dispatch(raw)
    }

    pub fn decode(&self, raw: &RawLogRecord, metadata: &dyn MetadataProvider) -> Outcome {
        let Some(kind) = self.classify(raw) else {
            return Outcome::Skipped;
        };
        match decode_kind(kind, raw, metadata, &self.ctx) {
            Ok(record) => Outcome::Decoded(record),
            Err(error) => Outcome::Failed { kind, error },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedMetadata;
    use alloy_primitives::U256;

    fn log(topic0: &str, data: &str) -> RawLogRecord {
        RawLogRecord {
            block_number: None,
            tx_hash: "0x01".into(),
            log_index: 0,
            contract_address: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".into(),
            topics: vec![topic0.into()],
            data: data.into(),
        }
    }

    #[test]
    fn unknown_topic_is_skipped() {
        let dec = EvmDecoder::default();
        let out = dec.decode(&log("0x1234", "0x"), &FixedMetadata::default());
        assert!(matches!(out, Outcome::Skipped));
    }

    #[test]
    fn transfer_is_decoded() {
        let dec = EvmDecoder::default();
        let out = dec.decode(
            &log(&EventKind::Erc20Transfer.default_hash(), "0x05"),
            &FixedMetadata::default(),
        );
        match out {
            Outcome::Decoded(DecodedRecord::Transfer(t)) => {
                assert_eq!(t.amount_raw, U256::from(5u8))
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn malformed_swap_is_failed_with_kind() {
        let dec = EvmDecoder::default();
        let out = dec.decode(
            &log(&EventKind::AmmSwapV2.default_hash(), "0x00"),
            &FixedMetadata::default(),
        );
        assert!(matches!(out, Outcome::Failed { kind: EventKind::AmmSwapV2, .. }));
    }
}
