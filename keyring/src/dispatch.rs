// Copyright (c) 2024 The Botho Foundation

//! The signing dispatcher.
//!
//! Given a method name and parameters, resolves the wallet, validates
//! the parameter shape, and performs the requested cryptographic
//! operation. The dispatcher is a pure function of its inputs and the
//! wallet map; persistence and event delivery belong to the caller.

use alloy::{
    consensus::{SignableTransaction, TxEip1559, TxLegacy},
    eips::eip2930::AccessList,
    primitives::{hex as alloy_hex, Address, Bytes, PrimitiveSignature, TxKind, B256, U256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use alloy_dyn_abi::TypedData;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::{
    account::EthMethod,
    error::{Error, Result},
    state::Wallet,
    typed_data::{typed_signature_hash, TypedEntry},
};

/// Resolve and execute one signing request against the wallet map.
pub(crate) fn handle_signing_request(
    wallets: &BTreeMap<String, Wallet>,
    method: &str,
    params: &Value,
) -> Result<Value> {
    let method: EthMethod = method
        .parse()
        .map_err(|_| Error::UnsupportedMethod(method.to_string()))?;

    match method {
        EthMethod::PersonalSign => personal_sign(wallets, params),
        EthMethod::Sign => sign_digest(wallets, params),
        EthMethod::SignTransaction => sign_transaction(wallets, params),
        EthMethod::SignTypedDataV1 => sign_typed_data_v1(wallets, params),
        // V3 payloads are a strict subset of V4 (no arrays or recursive
        // structures), so both route through the same EIP-712 encoder.
        EthMethod::SignTypedDataV3 | EthMethod::SignTypedDataV4 => {
            sign_typed_data(wallets, params)
        }
    }
}

/// `personal_sign(message, address)` with post-signing self-verification.
fn personal_sign(wallets: &BTreeMap<String, Wallet>, params: &Value) -> Result<Value> {
    let message = hex_data(param_str(params, 0, "personal_sign")?)?;
    let address = parse_address(param_str(params, 1, "personal_sign")?)?;

    let wallet = wallet_by_address(wallets, &address)?;
    let signer = signer_for(wallet)?;

    let signature = signer
        .sign_message_sync(&message)
        .map_err(signing_failure)?;

    // Recover the signer from the fresh signature: a mismatch means the
    // signing backend or our encoding is broken, so refuse to return it.
    let recovered = signature
        .recover_address_from_msg(&message)
        .map_err(signing_failure)?;
    if recovered != address {
        return Err(Error::SignatureVerificationFailed {
            expected: address.to_checksum(None),
            recovered: recovered.to_checksum(None),
        });
    }

    Ok(Value::String(encode_signature(&signature)))
}

/// `eth_sign(address, digest)`: sign a caller-supplied 32-byte digest.
fn sign_digest(wallets: &BTreeMap<String, Wallet>, params: &Value) -> Result<Value> {
    let address = parse_address(param_str(params, 0, "eth_sign")?)?;
    let data = hex_data(param_str(params, 1, "eth_sign")?)?;
    let digest = B256::try_from(data.as_slice()).map_err(|_| {
        Error::InvalidParameters(format!(
            "eth_sign expects a 32-byte digest, got {} bytes",
            data.len()
        ))
    })?;

    let wallet = wallet_by_address(wallets, &address)?;
    let signer = signer_for(wallet)?;
    let signature = signer.sign_hash_sync(&digest).map_err(signing_failure)?;

    Ok(Value::String(encode_signature(&signature)))
}

/// `eth_signTypedData_v3` / `_v4` via the EIP-712 encoder.
fn sign_typed_data(wallets: &BTreeMap<String, Wallet>, params: &Value) -> Result<Value> {
    let address = parse_address(param_str(params, 0, "eth_signTypedData")?)?;
    let data = param(params, 1, "eth_signTypedData")?;

    // Hosts deliver typed data either as an object or as JSON text.
    let data = match data {
        Value::String(text) => serde_json::from_str::<Value>(text)
            .map_err(|e| Error::InvalidParameters(format!("typed data: {}", e)))?,
        other => other.clone(),
    };

    let typed: TypedData = serde_json::from_value(data)
        .map_err(|e| Error::InvalidParameters(format!("typed data: {}", e)))?;
    let digest = typed
        .eip712_signing_hash()
        .map_err(|e| Error::InvalidParameters(format!("typed data: {}", e)))?;

    let wallet = wallet_by_address(wallets, &address)?;
    let signer = signer_for(wallet)?;
    let signature = signer.sign_hash_sync(&digest).map_err(signing_failure)?;

    Ok(Value::String(encode_signature(&signature)))
}

/// `eth_signTypedData_v1`: the legacy packed typed-data scheme.
fn sign_typed_data_v1(wallets: &BTreeMap<String, Wallet>, params: &Value) -> Result<Value> {
    let address = parse_address(param_str(params, 0, "eth_signTypedData_v1")?)?;
    let entries: Vec<TypedEntry> =
        serde_json::from_value(param(params, 1, "eth_signTypedData_v1")?.clone())
            .map_err(|e| Error::InvalidParameters(format!("typed data: {}", e)))?;
    let digest = typed_signature_hash(&entries)?;

    let wallet = wallet_by_address(wallets, &address)?;
    let signer = signer_for(wallet)?;
    let signature = signer.sign_hash_sync(&digest).map_err(signing_failure)?;

    Ok(Value::String(encode_signature(&signature)))
}

/// The transaction fields the dispatcher understands. Quantities arrive
/// as `0x` hex strings or JSON numbers; unknown fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionParams {
    from: String,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    nonce: Option<Value>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default, alias = "input")]
    data: Option<String>,
    #[serde(default, alias = "gas")]
    gas_limit: Option<Value>,
    #[serde(default)]
    gas_price: Option<Value>,
    #[serde(default)]
    max_fee_per_gas: Option<Value>,
    #[serde(default)]
    max_priority_fee_per_gas: Option<Value>,
    chain_id: Value,
    #[serde(default)]
    access_list: Option<AccessList>,
}

/// `eth_signTransaction([tx])`.
fn sign_transaction(wallets: &BTreeMap<String, Wallet>, params: &Value) -> Result<Value> {
    let tx_value = param(params, 0, "eth_signTransaction")?;
    let tx: TransactionParams = serde_json::from_value(tx_value.clone())
        .map_err(|e| Error::InvalidParameters(format!("transaction: {}", e)))?;

    // Accept decimal chain ids, but sign over the canonical numeric form.
    let chain_id = normalize_chain_id(&tx.chain_id)?;

    let from = parse_address(&tx.from)?;
    let wallet = wallet_by_address(wallets, &from)?;
    let signer = signer_for(wallet)?;

    let to = match &tx.to {
        Some(recipient) => TxKind::Call(parse_address(recipient)?),
        None => TxKind::Create,
    };
    let nonce = opt_quantity_u64(&tx.nonce, "nonce")?;
    let value = opt_quantity(&tx.value, "value")?;
    let gas_limit = opt_quantity_u64(&tx.gas_limit, "gasLimit")?;
    let input: Bytes = match &tx.data {
        Some(data) => hex_data(data)?.into(),
        None => Bytes::new(),
    };

    // EIP-1559 when fee-market fields are present, legacy otherwise.
    if tx.max_fee_per_gas.is_some() || tx.max_priority_fee_per_gas.is_some() {
        let max_fee_per_gas = opt_quantity_u128(&tx.max_fee_per_gas, "maxFeePerGas")?;
        let max_priority_fee_per_gas =
            opt_quantity_u128(&tx.max_priority_fee_per_gas, "maxPriorityFeePerGas")?;
        let access_list = tx.access_list.unwrap_or_default();

        let typed_tx = TxEip1559 {
            chain_id,
            nonce,
            gas_limit,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            to,
            value,
            access_list: access_list.clone(),
            input: input.clone(),
        };
        let signature = signer
            .sign_hash_sync(&typed_tx.signature_hash())
            .map_err(signing_failure)?;

        Ok(json!({
            "type": "0x2",
            "chainId": hex_u64(chain_id),
            "nonce": hex_u64(nonce),
            "maxPriorityFeePerGas": hex_u128(max_priority_fee_per_gas),
            "maxFeePerGas": hex_u128(max_fee_per_gas),
            "gasLimit": hex_u64(gas_limit),
            "to": to_json(&to),
            "value": hex_u256(value),
            "data": alloy_hex::encode_prefixed(&input),
            "accessList": serde_json::to_value(&access_list)
                .map_err(|e| Error::Signing(e.to_string()))?,
            "v": hex_u64(parity(&signature)),
            "r": hex_u256(signature.r()),
            "s": hex_u256(signature.s()),
        }))
    } else {
        let gas_price = opt_quantity_u128(&tx.gas_price, "gasPrice")?;

        let legacy_tx = TxLegacy {
            chain_id: Some(chain_id),
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            input: input.clone(),
        };
        let signature = signer
            .sign_hash_sync(&legacy_tx.signature_hash())
            .map_err(signing_failure)?;

        // EIP-155 recovery id.
        let v = 35 + 2 * chain_id + parity(&signature);

        Ok(json!({
            "type": "0x0",
            "chainId": hex_u64(chain_id),
            "nonce": hex_u64(nonce),
            "gasPrice": hex_u128(gas_price),
            "gasLimit": hex_u64(gas_limit),
            "to": to_json(&to),
            "value": hex_u256(value),
            "data": alloy_hex::encode_prefixed(&input),
            "v": hex_u64(v),
            "r": hex_u256(signature.r()),
            "s": hex_u256(signature.s()),
        }))
    }
}

/// Find the wallet holding the given address, comparing parsed addresses
/// so case differences never matter.
fn wallet_by_address<'a>(
    wallets: &'a BTreeMap<String, Wallet>,
    address: &Address,
) -> Result<&'a Wallet> {
    wallets
        .values()
        .find(|wallet| {
            wallet
                .account
                .address
                .parse::<Address>()
                .map(|candidate| candidate == *address)
                .unwrap_or(false)
        })
        .ok_or_else(|| Error::NotFound(format!("account '{}'", address.to_checksum(None))))
}

/// Build a one-shot signer from the wallet's key material.
///
/// Stored keys were validated at import; a parse failure here means the
/// state blob was corrupted out from under us.
fn signer_for(wallet: &Wallet) -> Result<PrivateKeySigner> {
    wallet
        .private_key
        .parse()
        .map_err(|_| Error::InvalidKey(bth_evm_account_keys::Error::InvalidScalar))
}

/// The positional parameter at `index`, or `InvalidParameters`.
fn param<'a>(params: &'a Value, index: usize, method: &str) -> Result<&'a Value> {
    params
        .as_array()
        .and_then(|array| array.get(index))
        .ok_or_else(|| {
            Error::InvalidParameters(format!(
                "{} expects at least {} parameters",
                method,
                index + 1
            ))
        })
}

/// The positional string parameter at `index`, or `InvalidParameters`.
fn param_str<'a>(params: &'a Value, index: usize, method: &str) -> Result<&'a str> {
    param(params, index, method)?.as_str().ok_or_else(|| {
        Error::InvalidParameters(format!("{} parameter {} must be a string", method, index))
    })
}

fn parse_address(s: &str) -> Result<Address> {
    s.parse()
        .map_err(|_| Error::InvalidParameters(format!("invalid address: {}", s)))
}

/// Decode hex data with an optional `0x` prefix.
fn hex_data(s: &str) -> Result<Vec<u8>> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).map_err(|_| Error::InvalidParameters(format!("invalid hex data: {}", s)))
}

/// Normalize a chain id given as a hex string, decimal string, or number.
fn normalize_chain_id(value: &Value) -> Result<u64> {
    let invalid = || Error::InvalidParameters(format!("invalid chainId: {}", value));
    match value {
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex_digits) => u64::from_str_radix(hex_digits, 16).map_err(|_| invalid()),
            None => s.parse::<u64>().map_err(|_| invalid()),
        },
        Value::Number(n) => n.as_u64().ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Parse a quantity given as a `0x` hex string, decimal string, or number.
fn parse_quantity(value: &Value, field: &str) -> Result<U256> {
    let invalid = || Error::InvalidParameters(format!("invalid {}: {}", field, value));
    match value {
        Value::String(s) => {
            let s = s.trim();
            let parsed = match s.strip_prefix("0x") {
                Some(hex_digits) => U256::from_str_radix(hex_digits, 16),
                None => U256::from_str_radix(s, 10),
            };
            parsed.map_err(|_| invalid())
        }
        Value::Number(n) => n.as_u64().map(U256::from).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn opt_quantity(value: &Option<Value>, field: &str) -> Result<U256> {
    match value {
        Some(v) => parse_quantity(v, field),
        None => Ok(U256::ZERO),
    }
}

fn opt_quantity_u64(value: &Option<Value>, field: &str) -> Result<u64> {
    u64::try_from(opt_quantity(value, field)?)
        .map_err(|_| Error::InvalidParameters(format!("{} out of range", field)))
}

fn opt_quantity_u128(value: &Option<Value>, field: &str) -> Result<u128> {
    u128::try_from(opt_quantity(value, field)?)
        .map_err(|_| Error::InvalidParameters(format!("{} out of range", field)))
}

/// The signature as 65 bytes of `0x` hex: `r || s || v`, v in {27, 28}.
fn encode_signature(signature: &PrimitiveSignature) -> String {
    alloy_hex::encode_prefixed(signature.as_bytes())
}

/// The recovery parity bit of a fresh signature, 0 or 1.
fn parity(signature: &PrimitiveSignature) -> u64 {
    // as_bytes renders v as 27 or 28.
    (signature.as_bytes()[64] - 27) as u64
}

fn hex_u64(value: u64) -> String {
    format!("{:#x}", value)
}

fn hex_u128(value: u128) -> String {
    format!("{:#x}", value)
}

fn hex_u256(value: U256) -> String {
    format!("{:#x}", value)
}

fn to_json(to: &TxKind) -> Value {
    match to {
        TxKind::Call(address) => Value::String(address.to_checksum(None)),
        TxKind::Create => Value::Null,
    }
}

fn signing_failure(e: impl std::fmt::Display) -> Error {
    Error::Signing(e.to_string())
}
