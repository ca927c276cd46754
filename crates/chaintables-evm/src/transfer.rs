//! ERC-20 `Transfer(address indexed from, address indexed to, uint256 value)`.

use chaintables_core::{DecodeContext, DecodeError, MetadataProvider, RawLogRecord, TransferEvent};

use crate::abi::{contract_checksum, topic_address};
use crate::normalizer::{parse_u256_hex, scale_unsigned};

/// Decode a transfer log. Only an unparseable contract address is an error;
/// a missing or garbled amount decodes as zero.
pub fn decode(
    raw: &RawLogRecord,
    metadata: &dyn MetadataProvider,
    ctx: &DecodeContext,
) -> Result<TransferEvent, DecodeError> {
    let token_address = contract_checksum(raw)?;
    let amount_raw = parse_u256_hex(raw.data_hex());
    let token = metadata.token(&raw.contract_address);

    Ok(TransferEvent {
        tx_hash: raw.tx_hash.clone(),
        log_index: raw.log_index,
        token_address,
        from: topic_address(raw, 1),
        to: topic_address(raw, 2),
        amount_norm: scale_unsigned(&amount_raw, token.decimals),
        amount_raw,
        token_alias: token.alias(&ctx.chain_suffix),
        symbol: token.symbol,
        decimals: token.decimals,
    })
}
