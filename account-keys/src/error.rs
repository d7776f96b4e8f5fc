// Copyright (c) 2024 The Botho Foundation

//! Errors which can occur when handling account keys.

use displaydoc::Display;

/// An error which can occur when constructing an [`AccountKey`](crate::AccountKey).
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Error {
    /// Private key must be 32 bytes, got {0}
    InvalidLength(usize),

    /// Not a valid secp256k1 private scalar
    InvalidScalar,

    /// Invalid hex encoding: {0}
    InvalidHex(hex::FromHexError),
}

impl From<hex::FromHexError> for Error {
    fn from(src: hex::FromHexError) -> Self {
        Self::InvalidHex(src)
    }
}

impl std::error::Error for Error {}

/// A [`core::result::Result`] specialized to this crate's [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
