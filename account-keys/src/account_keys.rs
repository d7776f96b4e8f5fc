// Copyright (c) 2024 The Botho Foundation

//! EVM account keys.
//!
//! An externally-owned EVM account is controlled by a single secp256k1
//! private scalar. The account's address is the last twenty bytes of the
//! Keccak-256 hash of the uncompressed public key, rendered in EIP-55
//! mixed-case form when displayed to users.

use alloy_primitives::Address;
use core::fmt;
use k256::{
    ecdsa::{SigningKey, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
};
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Length of a secp256k1 private key, in bytes.
pub const PRIVATE_KEY_LEN: usize = 32;

/// A secp256k1 account key controlling one externally-owned EVM account.
///
/// The wrapped signing key zeroizes its scalar when dropped.
#[derive(Clone)]
pub struct AccountKey {
    /// The secp256k1 signing key.
    signing_key: SigningKey,
}

impl AccountKey {
    /// Generate a fresh account key from the given randomness source.
    pub fn from_random<T: RngCore + CryptoRng>(rng: &mut T) -> Self {
        Self {
            signing_key: SigningKey::random(rng),
        }
    }

    /// Construct an account key from a raw 32-byte private scalar.
    ///
    /// Rejects byte strings of the wrong length, the zero scalar, and
    /// values at or above the secp256k1 group order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(Error::InvalidLength(bytes.len()));
        }

        let signing_key = SigningKey::from_slice(bytes).map_err(|_| Error::InvalidScalar)?;
        Ok(Self { signing_key })
    }

    /// Construct an account key from a hex-encoded private scalar.
    ///
    /// A leading `0x` prefix is accepted and ignored.
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let stripped = encoded.strip_prefix("0x").unwrap_or(encoded);
        let bytes = Zeroizing::new(hex::decode(stripped)?);
        Self::from_bytes(&bytes)
    }

    /// The private scalar as lowercase hex, without a `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// The public key corresponding to this account key.
    pub fn public_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// The account's address, derived from the uncompressed public key.
    pub fn address(&self) -> Address {
        let point = self.public_key().to_encoded_point(false);
        // Skip the SEC1 0x04 tag; the remaining 64 bytes are x || y.
        Address::from_raw_public_key(&point.as_bytes()[1..])
    }

    /// The account's address in EIP-55 checksummed form.
    pub fn checksummed_address(&self) -> String {
        self.address().to_checksum(None)
    }

    /// Borrow the underlying signing key for a signing operation.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl PartialEq for AccountKey {
    fn eq(&self, other: &Self) -> bool {
        self.signing_key.to_bytes() == other.signing_key.to_bytes()
    }
}

impl Eq for AccountKey {}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the scalar.
        write!(f, "AccountKey({})", self.checksummed_address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_from_random_yields_distinct_keys() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = AccountKey::from_random(&mut rng);
        let b = AccountKey::from_random(&mut rng);

        assert_ne!(a, b);
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn test_hex_round_trip() {
        let mut rng = StdRng::seed_from_u64(8);
        let key = AccountKey::from_random(&mut rng);

        let restored = AccountKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key, restored);
        assert_eq!(key.address(), restored.address());
    }

    #[test]
    fn test_hex_prefix_is_optional() {
        let mut rng = StdRng::seed_from_u64(9);
        let key = AccountKey::from_random(&mut rng);

        let prefixed = format!("0x{}", key.to_hex());
        assert_eq!(AccountKey::from_hex(&prefixed).unwrap(), key);
    }

    #[test]
    fn test_invalid_length_rejected() {
        assert_eq!(
            AccountKey::from_bytes(&[1u8; 31]),
            Err(Error::InvalidLength(31))
        );
        assert_eq!(
            AccountKey::from_bytes(&[1u8; 33]),
            Err(Error::InvalidLength(33))
        );
    }

    #[test]
    fn test_zero_scalar_rejected() {
        assert_eq!(
            AccountKey::from_bytes(&[0u8; 32]),
            Err(Error::InvalidScalar)
        );
    }

    #[test]
    fn test_scalar_above_group_order_rejected() {
        // The group order n is below 2^256 - 1, so the all-ones scalar is
        // out of range.
        assert_eq!(
            AccountKey::from_bytes(&[0xff; 32]),
            Err(Error::InvalidScalar)
        );
    }

    #[test]
    fn test_bad_hex_rejected() {
        assert!(matches!(
            AccountKey::from_hex("not hex"),
            Err(Error::InvalidHex(_))
        ));
    }

    #[test]
    fn test_checksummed_address_shape() {
        let mut rng = StdRng::seed_from_u64(10);
        let key = AccountKey::from_random(&mut rng);
        let checksummed = key.checksummed_address();

        assert_eq!(checksummed.len(), 42);
        assert!(checksummed.starts_with("0x"));

        // Checksumming only changes letter case.
        let reparsed: Address = checksummed.to_lowercase().parse().unwrap();
        assert_eq!(reparsed, key.address());
    }

    #[test]
    fn test_address_is_stable() {
        let mut rng = StdRng::seed_from_u64(11);
        let key = AccountKey::from_random(&mut rng);

        assert_eq!(key.address(), key.address());
        assert_eq!(
            AccountKey::from_hex(&key.to_hex()).unwrap().address(),
            key.address()
        );
    }
}
