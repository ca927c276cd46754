//! Constant-product pool swaps:
//! `Swap(address indexed sender, uint amount0In, uint amount1In,
//!       uint amount0Out, uint amount1Out, address indexed to)`.

use alloy_core::dyn_abi::DynSolType;
use alloy_primitives::U256;
use chaintables_core::{DecodeContext, DecodeError, Dex, MetadataProvider, RawLogRecord, SwapEvent};

use crate::abi::{as_uint, contract_checksum, decode_data};
use crate::normalizer::scale_unsigned;

/// The four data words, in log order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct V2Amounts {
    pub amount0_in: U256,
    pub amount1_in: U256,
    pub amount0_out: U256,
    pub amount1_out: U256,
}

/// Which side of the pair was sold into the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ZeroForOne,
    OneForZero,
}

impl V2Amounts {
    pub fn decode(raw: &RawLogRecord) -> Result<Self, DecodeError> {
        let vals = decode_data(raw, vec![DynSolType::Uint(256); 4])?;
        Ok(Self {
            amount0_in: as_uint(&vals[0])?,
            amount1_in: as_uint(&vals[1])?,
            amount0_out: as_uint(&vals[2])?,
            amount1_out: as_uint(&vals[3])?,
        })
    }

    /// Exactly one in-leg must be positive.
    pub fn direction(&self) -> Result<Direction, DecodeError> {
        match (self.amount0_in > U256::ZERO, self.amount1_in > U256::ZERO) {
            (true, false) => Ok(Direction::ZeroForOne),
            (false, true) => Ok(Direction::OneForZero),
            (true, true) => Err(DecodeError::Malformed {
                reason: "both input legs are positive".into(),
            }),
            (false, false) => Err(DecodeError::Malformed {
                reason: "no positive input leg".into(),
            }),
        }
    }
}

pub fn decode(
    raw: &RawLogRecord,
    metadata: &dyn MetadataProvider,
    ctx: &DecodeContext,
) -> Result<SwapEvent, DecodeError> {
    let pair_or_pool = contract_checksum(raw)?;
    let amounts = V2Amounts::decode(raw)?;
    let direction = amounts.direction()?;

    let pair = metadata.pool(&raw.contract_address);
    let (token_in_address, token_out_address, amount_in, amount_out) = match direction {
        Direction::ZeroForOne => {
            (pair.token0, pair.token1, amounts.amount0_in, amounts.amount1_out)
        }
        Direction::OneForZero => {
            (pair.token1, pair.token0, amounts.amount1_in, amounts.amount0_out)
        }
    };
    let token_in = metadata.token(&token_in_address);
    let token_out = metadata.token(&token_out_address);

    Ok(SwapEvent {
        tx_hash: raw.tx_hash.clone(),
        log_index: raw.log_index,
        dex: Dex::V2,
        pair_or_pool,
        token_in: token_in.alias(&ctx.chain_suffix),
        token_out: token_out.alias(&ctx.chain_suffix),
        amount_in: scale_unsigned(&amount_in, token_in.decimals),
        amount_out: scale_unsigned(&amount_out, token_out.decimals),
        token_in_address,
        token_out_address,
        amount_in_raw: amount_in.to_string(),
        amount_out_raw: amount_out.to_string(),
    })
}
