//! # chaintables-evm
//!
//! Decoders for the four EVM log shapes ChainTables understands: ERC-20
//! transfers, constant-product (V2) swaps, concentrated-liquidity (V3) swaps
//! and bridge messages.
//!
//! ## Implementation notes
//! - Uses `alloy-core` dyn-abi for data decoding
//! - topics[0] selects the decoder through [`chaintables_core::SignatureMap`]
//! - topics[1..] carry indexed addresses (last 20 bytes of each word)
//! - Decoders are pure: metadata comes in through a `MetadataProvider`

pub mod abi;
pub mod bridge;
pub mod decoder;
pub mod normalizer;
pub mod swap_v2;
pub mod swap_v3;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use bridge::correlate_transfers;
pub use decoder::{decode_kind, EvmDecoder, Outcome};
