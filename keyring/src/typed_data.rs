// Copyright (c) 2024 The Botho Foundation

//! Legacy (pre-EIP-712) typed-data hashing.
//!
//! The legacy scheme hashes two tightly packed buffers and then hashes
//! their concatenation:
//!
//! ```text
//! keccak256(keccak256(pack("type name", ...)) || keccak256(pack(value, ...)))
//! ```
//!
//! Packing follows Solidity's `abi.encodePacked` rules: strings and
//! dynamic bytes contribute their raw bytes, numbers their big-endian
//! two's-complement representation at declared width.

use alloy::primitives::{keccak256, Address, B256, U256};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// One `{ type, name, value }` entry of a legacy typed-data payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct TypedEntry {
    /// Solidity type tag, e.g. `string` or `uint32`
    #[serde(rename = "type")]
    pub kind: String,

    /// Field name shown to the user
    pub name: String,

    /// Field value
    pub value: Value,
}

/// Compute the legacy typed-data signing hash over the given entries.
pub(crate) fn typed_signature_hash(entries: &[TypedEntry]) -> Result<B256> {
    if entries.is_empty() {
        return Err(Error::InvalidParameters(
            "typed data must be a non-empty array".to_string(),
        ));
    }

    let mut schema = Vec::new();
    let mut data = Vec::new();
    for entry in entries {
        pack_value(&entry.kind, &entry.value, &mut data)?;
        schema.extend_from_slice(entry.kind.as_bytes());
        schema.push(b' ');
        schema.extend_from_slice(entry.name.as_bytes());
    }

    let mut outer = Vec::with_capacity(64);
    outer.extend_from_slice(keccak256(&schema).as_slice());
    outer.extend_from_slice(keccak256(&data).as_slice());
    Ok(keccak256(&outer))
}

/// Append the packed encoding of one value to `out`.
fn pack_value(kind: &str, value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match kind {
        "string" => {
            let s = value
                .as_str()
                .ok_or_else(|| type_mismatch(kind, value))?;
            out.extend_from_slice(s.as_bytes());
        }
        "bytes" => {
            out.extend_from_slice(&hex_bytes(kind, value)?);
        }
        "address" => {
            let s = value
                .as_str()
                .ok_or_else(|| type_mismatch(kind, value))?;
            let address: Address = s
                .parse()
                .map_err(|_| type_mismatch(kind, value))?;
            out.extend_from_slice(address.as_slice());
        }
        "bool" => {
            let b = value
                .as_bool()
                .ok_or_else(|| type_mismatch(kind, value))?;
            out.push(b as u8);
        }
        _ => {
            if let Some(width) = fixed_bytes_width(kind) {
                let bytes = hex_bytes(kind, value)?;
                if bytes.len() != width {
                    return Err(Error::InvalidParameters(format!(
                        "{} expects {} bytes, got {}",
                        kind,
                        width,
                        bytes.len()
                    )));
                }
                out.extend_from_slice(&bytes);
            } else if let Some(bits) = integer_width(kind, "uint") {
                pack_uint(kind, value, bits, out)?;
            } else if let Some(bits) = integer_width(kind, "int") {
                pack_int(kind, value, bits, out)?;
            } else {
                return Err(Error::InvalidParameters(format!(
                    "unsupported typed-data type: {}",
                    kind
                )));
            }
        }
    }
    Ok(())
}

/// Parse `bytesN` widths; `bytes1` through `bytes32`.
fn fixed_bytes_width(kind: &str) -> Option<usize> {
    let digits = kind.strip_prefix("bytes")?;
    let width: usize = digits.parse().ok()?;
    (1..=32).contains(&width).then_some(width)
}

/// Parse `uintN`/`intN` widths; bare `uint`/`int` mean 256 bits.
fn integer_width(kind: &str, prefix: &str) -> Option<usize> {
    let digits = kind.strip_prefix(prefix)?;
    if digits.is_empty() {
        return Some(256);
    }
    let bits: usize = digits.parse().ok()?;
    (bits % 8 == 0 && (8..=256).contains(&bits)).then_some(bits)
}

fn pack_uint(kind: &str, value: &Value, bits: usize, out: &mut Vec<u8>) -> Result<()> {
    let magnitude = parse_magnitude(kind, value)?;
    if bits < 256 && magnitude >= U256::from(1u8) << bits {
        return Err(Error::InvalidParameters(format!(
            "value out of range for {}",
            kind
        )));
    }
    let bytes = magnitude.to_be_bytes::<32>();
    out.extend_from_slice(&bytes[32 - bits / 8..]);
    Ok(())
}

fn pack_int(kind: &str, value: &Value, bits: usize, out: &mut Vec<u8>) -> Result<()> {
    let (negative, magnitude) = parse_signed_magnitude(kind, value)?;
    let bound = U256::from(1u8) << (bits - 1);
    let in_range = if negative {
        magnitude <= bound
    } else {
        magnitude < bound
    };
    if !in_range {
        return Err(Error::InvalidParameters(format!(
            "value out of range for {}",
            kind
        )));
    }

    // Two's complement over 256 bits, truncated to the declared width.
    let encoded = if negative {
        (!magnitude).wrapping_add(U256::from(1u8))
    } else {
        magnitude
    };
    let bytes = encoded.to_be_bytes::<32>();
    out.extend_from_slice(&bytes[32 - bits / 8..]);
    Ok(())
}

/// Parse an unsigned numeric value given as a JSON number, a decimal
/// string, or a `0x` hex string.
fn parse_magnitude(kind: &str, value: &Value) -> Result<U256> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| type_mismatch(kind, value)),
        Value::String(s) => {
            let s = s.trim();
            let parsed = match s.strip_prefix("0x") {
                Some(hex_digits) => U256::from_str_radix(hex_digits, 16),
                None => U256::from_str_radix(s, 10),
            };
            parsed.map_err(|_| type_mismatch(kind, value))
        }
        _ => Err(type_mismatch(kind, value)),
    }
}

/// Parse a signed numeric value into a sign flag and magnitude.
fn parse_signed_magnitude(kind: &str, value: &Value) -> Result<(bool, U256)> {
    match value {
        Value::Number(n) => {
            let i = n.as_i64().ok_or_else(|| type_mismatch(kind, value))?;
            Ok((i < 0, U256::from(i.unsigned_abs())))
        }
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix('-') {
                Some(rest) => Ok((true, parse_magnitude(kind, &Value::String(rest.to_string()))?)),
                None => Ok((false, parse_magnitude(kind, value)?)),
            }
        }
        _ => Err(type_mismatch(kind, value)),
    }
}

/// Decode a hex string value, with an optional `0x` prefix.
fn hex_bytes(kind: &str, value: &Value) -> Result<Vec<u8>> {
    let s = value
        .as_str()
        .ok_or_else(|| type_mismatch(kind, value))?;
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).map_err(|_| type_mismatch(kind, value))
}

fn type_mismatch(kind: &str, value: &Value) -> Error {
    Error::InvalidParameters(format!("value {} does not match type {}", value, kind))
}
