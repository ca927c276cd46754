//! Concentrated-liquidity pool swaps:
//! `Swap(address indexed sender, address indexed recipient, int256 amount0, int256 amount1,
//! uint160 sqrtPriceX96, uint128 liquidity, int24 tick)`.
//!
//! Only the two signed deltas are used. The negative leg is taken as the
//! input; the other leg is reported with its sign as the pool logged it.

use alloy_core::dyn_abi::DynSolType;
use alloy_primitives::{I256, U256};
use chaintables_core::{DecodeContext, DecodeError, Dex, MetadataProvider, RawLogRecord, SwapEvent};

use crate::abi::{as_int, contract_checksum, decode_data};
use crate::normalizer::{scale_signed, scale_unsigned};

pub fn decode_amounts(raw: &RawLogRecord) -> Result<(I256, I256), DecodeError> {
    let vals = decode_data(
        raw,
        vec![
            DynSolType::Int(256),
            DynSolType::Int(256),
            DynSolType::Uint(160),
            DynSolType::Uint(128),
            DynSolType::Int(24),
        ],
    )?;
    Ok((as_int(&vals[0])?, as_int(&vals[1])?))
}

pub fn decode(
    raw: &RawLogRecord,
    metadata: &dyn MetadataProvider,
    ctx: &DecodeContext,
) -> Result<SwapEvent, DecodeError> {
    let pair_or_pool = contract_checksum(raw)?;
    let (amount0, amount1) = decode_amounts(raw)?;

    let pool = metadata.pool(&raw.contract_address);
    let (token_in_address, token_out_address, amount_in, amount_out): (String, String, U256, I256) =
        if amount0.is_negative() {
            (pool.token0, pool.token1, amount0.unsigned_abs(), amount1)
        } else {
            (pool.token1, pool.token0, amount1.unsigned_abs(), amount0)
        };
    let token_in = metadata.token(&token_in_address);
    let token_out = metadata.token(&token_out_address);

    Ok(SwapEvent {
        tx_hash: raw.tx_hash.clone(),
        log_index: raw.log_index,
        dex: Dex::V3,
        pair_or_pool,
        token_in: token_in.alias(&ctx.chain_suffix),
        token_out: token_out.alias(&ctx.chain_suffix),
        amount_in: scale_unsigned(&amount_in, token_in.decimals),
        amount_out: scale_signed(&amount_out, token_out.decimals),
        token_in_address,
        token_out_address,
        amount_in_raw: amount_in.to_string(),
        amount_out_raw: amount_out.to_string(),
    })
}
