// Copyright (c) 2024 The Botho Foundation

//! The engine's persisted state aggregate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{account::KeyringAccount, request::KeyringRequest};

/// Internal pairing of an account record with its private key.
///
/// Wallets are owned exclusively by the keyring; the key material leaves
/// only inside a signing operation or through an explicit export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// The public account record
    pub account: KeyringAccount,

    /// Private scalar as lowercase hex, without a `0x` prefix
    pub private_key: String,
}

/// The full engine state: the unit of persistence.
///
/// Loaded once at engine construction and saved after every mutating
/// operation, before that operation reports success. The ordered maps
/// give listings a stable iteration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyringState {
    /// All wallets, keyed by account id
    pub wallets: BTreeMap<String, Wallet>,

    /// All pending signing requests, keyed by request id
    pub pending_requests: BTreeMap<String, KeyringRequest>,

    /// Whether submissions resolve inline instead of queueing
    pub use_sync_approvals: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state_deserializes_from_empty_object() {
        let state: KeyringState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, KeyringState::default());
        assert!(!state.use_sync_approvals);
    }

    #[test]
    fn test_state_round_trip_is_stable() {
        let state: KeyringState = serde_json::from_value(serde_json::json!({
            "wallets": {},
            "pendingRequests": {},
            "useSyncApprovals": true,
        }))
        .unwrap();

        let first = serde_json::to_string(&state).unwrap();
        let second = serde_json::to_string(&serde_json::from_str::<KeyringState>(&first).unwrap())
            .unwrap();
        assert_eq!(first, second);
    }
}
