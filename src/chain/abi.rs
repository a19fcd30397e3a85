//! Minimal Solidity ABI encoding for the two calls this service makes.
//!
//! Only static `uint256`/`address` words and a single trailing dynamic
//! `bytes` argument are supported.

use sha3::{Digest, Keccak256};

use super::types::{Address, Uint256};

/// Compute Keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// First four bytes of `keccak256(signature)`, e.g. `mintHat(uint256,address)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn encode_uint256(value: &Uint256) -> [u8; 32] {
    value.0
}

pub fn encode_address(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&address.0);
    word
}

/// Calldata for `mintHat(uint256 hatId, address wearer)`.
pub fn encode_mint_hat(hat_id: &Uint256, wearer: &Address) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 64);
    out.extend_from_slice(&selector("mintHat(uint256,address)"));
    out.extend_from_slice(&encode_uint256(hat_id));
    out.extend_from_slice(&encode_address(wearer));
    out
}

/// Calldata for a `(uint256, bytes)` function such as the gatekeeper's join call.
pub fn encode_uint256_and_bytes(signature: &str, value: &Uint256, data: &[u8]) -> Vec<u8> {
    let padded_len = data.len().div_ceil(32) * 32;
    let mut out = Vec::with_capacity(4 + 32 * 3 + padded_len);

    out.extend_from_slice(&selector(signature));
    out.extend_from_slice(&encode_uint256(value));
    // Offset of the dynamic tail, measured from the start of the arguments.
    out.extend_from_slice(&encode_uint256(&Uint256::from_u64(64)));
    out.extend_from_slice(&encode_uint256(&Uint256::from_u64(data.len() as u64)));
    out.extend_from_slice(data);
    out.resize(4 + 32 * 3 + padded_len, 0);
    out
}

pub fn to_hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
