#![deny(missing_docs)]
#![deny(unsafe_code)]

//! This crate defines the key material for externally-owned EVM accounts:
//! a secp256k1 private scalar paired with its keccak-derived address.
//!
//! Each account key is independent; there is no derivation hierarchy.
//! Signing itself happens in the keyring engine, which borrows the
//! wrapped signing key for the duration of a single operation.

mod account_keys;
mod error;

pub use crate::{
    account_keys::{AccountKey, PRIVATE_KEY_LEN},
    error::{Error, Result},
};
