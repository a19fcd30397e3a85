//! Value types shared by the chain adapters and request validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 20-byte EVM account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s
            .trim()
            .strip_prefix("0x")
            .or_else(|| s.trim().strip_prefix("0X"))
            .ok_or_else(|| "address must start with 0x".to_string())?;

        if hex_part.len() != 40 {
            return Err(format!(
                "address must have 40 hex digits, got {}",
                hex_part.len()
            ));
        }

        let bytes = hex::decode(hex_part).map_err(|e| format!("invalid hex: {}", e))?;
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Address(out))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// 256-bit unsigned integer kept as a big-endian word.
///
/// Only parsing, formatting and ABI encoding are needed, so no arithmetic is
/// exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uint256(pub [u8; 32]);

impl Uint256 {
    pub fn from_u64(value: u64) -> Self {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&value.to_be_bytes());
        Uint256(word)
    }

    fn from_decimal(digits: &str) -> Result<Self, String> {
        let mut word = [0u8; 32];
        for c in digits.chars() {
            let digit = c
                .to_digit(10)
                .ok_or_else(|| format!("invalid decimal digit '{}'", c))?;

            // word = word * 10 + digit
            let mut carry = digit;
            for byte in word.iter_mut().rev() {
                let v = (*byte as u32) * 10 + carry;
                *byte = (v & 0xff) as u8;
                carry = v >> 8;
            }
            if carry != 0 {
                return Err("value does not fit in 256 bits".to_string());
            }
        }
        Ok(Uint256(word))
    }

    fn from_hex(digits: &str) -> Result<Self, String> {
        if digits.len() > 64 {
            return Err("value does not fit in 256 bits".to_string());
        }
        let padded = format!("{:0>64}", digits);
        let bytes = hex::decode(padded).map_err(|e| format!("invalid hex: {}", e))?;
        let mut word = [0u8; 32];
        word.copy_from_slice(&bytes);
        Ok(Uint256(word))
    }
}

impl FromStr for Uint256 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty value".to_string());
        }
        match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some("") => Err("empty hex value".to_string()),
            Some(hex_part) => Self::from_hex(hex_part),
            None => Self::from_decimal(s),
        }
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Result of a single on-chain write as reported by an adapter.
///
/// `succeeded == false` with `Ok(..)` means the transaction was accepted by
/// the node but reverted on execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainOutcome {
    pub succeeded: bool,
    pub reference: String,
}

impl ChainOutcome {
    pub fn success(reference: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            reference: reference.into(),
        }
    }

    pub fn failure(reference: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            reference: reference.into(),
        }
    }
}

/// A call that passed simulation and is ready to be submitted unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedCall {
    pub from: String,
    pub to: String,
    pub data: String,
}
