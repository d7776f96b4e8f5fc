// Copyright (c) 2024 The Botho Foundation

//! Keyring engine errors.

use thiserror::Error;

use crate::storage::StorageError;

/// An error produced by a keyring engine operation.
///
/// Everything except [`Error::Persistence`] and [`Error::Notification`]
/// is a caller-input or data error and is surfaced without retry.
#[derive(Debug, Error)]
pub enum Error {
    /// An account or request id, or a signer address, did not resolve.
    #[error("{0} not found")]
    NotFound(String),

    /// An account with the same address already exists.
    #[error("account address already in use: {0}")]
    DuplicateAddress(String),

    /// A supplied private key was malformed.
    #[error("invalid private key: {0}")]
    InvalidKey(#[from] bth_evm_account_keys::Error),

    /// The parameters of a signing request had the wrong shape.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The signing method is not one the engine dispatches.
    #[error("signing method not supported: {0}")]
    UnsupportedMethod(String),

    /// The personal-sign self-check recovered a different signer.
    #[error("signature verification failed: expected {expected}, recovered {recovered}")]
    SignatureVerificationFailed {
        /// The address the caller asked to sign with
        expected: String,
        /// The address recovered from the produced signature
        recovered: String,
    },

    /// The signing backend failed to produce or recover a signature.
    #[error("signing backend failure: {0}")]
    Signing(String),

    /// The state store failed; the operation was aborted unacknowledged.
    #[error("state persistence failed: {0}")]
    Persistence(#[from] StorageError),

    /// An event sink failed; the persisted state change stands.
    #[error("event notification failed: {0}")]
    Notification(String),
}

/// A [`core::result::Result`] specialized to engine [`Error`]s.
pub type Result<T> = core::result::Result<T, Error>;
