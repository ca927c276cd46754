//! Scaling raw integer amounts by token decimals.
//!
//! The division is done by handing `"{raw}e-{decimals}"` to the float parser,
//! which yields the float nearest to the exact decimal quotient.

use alloy_primitives::{I256, U256};

pub fn scale_unsigned(raw: &U256, decimals: u8) -> f64 {
    parse_scaled(&raw.to_string(), decimals)
}

pub fn scale_signed(raw: &I256, decimals: u8) -> f64 {
    parse_scaled(&raw.to_string(), decimals)
}

fn parse_scaled(digits: &str, decimals: u8) -> f64 {
    format!("{digits}e-{decimals}").parse::<f64>().unwrap_or(0.0)
}

/// Parse the whole data field as one big-endian unsigned integer.
/// Empty, non-hex or wider-than-256-bit input yields zero.
pub fn parse_u256_hex(hex: &str) -> U256 {
    if hex.is_empty() {
        return U256::ZERO;
    }
    U256::from_str_radix(hex, 16).unwrap_or(U256::ZERO)
}
