//! Integration tests for the EVM keyring engine
//!
//! These tests verify end-to-end engine behavior including:
//! - Account lifecycle (create, update, delete, export)
//! - Request queue flows in both approval modes
//! - Persistence through the JSON file store
//! - Event ordering relative to persistence

use alloy::primitives::{hex, Address, PrimitiveSignature};
use bth_evm_keyring::{
    EventSink, JsonFileStore, Keyring, KeyringEvent, KeyringRequest, SigningRequest, StateStore,
    SubmitOutcome,
};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::{json, Map};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// An event sink that records everything it is handed.
#[derive(Clone, Default)]
struct RecordingSink {
    events: Arc<Mutex<Vec<KeyringEvent>>>,
}

impl RecordingSink {
    fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.kind())
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn notify(&self, event: KeyringEvent) -> Result<(), bth_evm_keyring::Error> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

fn request(id: &str, method: &str, params: serde_json::Value) -> KeyringRequest {
    KeyringRequest {
        id: id.to_string(),
        origin: Some("https://dapp.example".to_string()),
        request: SigningRequest {
            method: method.to_string(),
            params,
        },
    }
}

// ============================================================================
// Account Lifecycle Tests
// ============================================================================

mod account_lifecycle {
    use super::*;

    #[test]
    fn test_full_account_lifecycle() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("state.json"));
        let sink = RecordingSink::default();
        let mut keyring =
            Keyring::load(store, sink.clone(), StdRng::seed_from_u64(1)).unwrap();

        // 1. Create an account with a generated key
        let account = keyring.create_account(Map::new()).unwrap();
        assert!(account.address.starts_with("0x"));
        assert_eq!(account.address.len(), 42);
        // The address is stored in checksummed form
        let parsed: Address = account.address.parse().unwrap();
        assert_eq!(account.address, parsed.to_checksum(None));

        // 2. Look it up
        let fetched = keyring.get_account(&account.id).unwrap();
        assert_eq!(fetched.address, account.address);

        // 3. Rename it
        let mut patch = account.clone();
        patch.name = Some("Treasury".to_string());
        keyring.update_account(patch).unwrap();
        assert_eq!(
            keyring.get_account(&account.id).unwrap().name.as_deref(),
            Some("Treasury")
        );

        // 4. Delete it
        keyring.delete_account(&account.id).unwrap();
        assert!(keyring.get_account(&account.id).is_none());

        assert_eq!(
            sink.kinds(),
            vec!["accountCreated", "accountUpdated", "accountDeleted"]
        );
    }

    #[test]
    fn test_accounts_survive_restart() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");

        let account = {
            let mut keyring = Keyring::load(
                JsonFileStore::new(&path),
                RecordingSink::default(),
                StdRng::seed_from_u64(2),
            )
            .unwrap();
            keyring.create_account(Map::new()).unwrap()
        };

        // A fresh engine over the same store sees the same account.
        let keyring = Keyring::load(
            JsonFileStore::new(&path),
            RecordingSink::default(),
            StdRng::seed_from_u64(3),
        )
        .unwrap();
        let restored = keyring.get_account(&account.id).unwrap();
        assert_eq!(restored, &account);
        assert_eq!(keyring.export_account(&account.id).unwrap().len(), 64);
    }

    #[test]
    fn test_imported_account_can_sign_after_restart() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");

        let address = {
            let mut keyring = Keyring::load(
                JsonFileStore::new(&path),
                RecordingSink::default(),
                StdRng::seed_from_u64(4),
            )
            .unwrap();
            keyring.create_account(Map::new()).unwrap().address
        };

        let mut keyring = Keyring::load(
            JsonFileStore::new(&path),
            RecordingSink::default(),
            StdRng::seed_from_u64(5),
        )
        .unwrap();

        keyring
            .submit_request(request(
                "r-1",
                "personal_sign",
                json!([hex::encode_prefixed(b"still here"), address]),
            ))
            .unwrap();
        let result = keyring.approve_request("r-1").unwrap();

        let bytes = hex::decode(result.as_str().unwrap()).unwrap();
        let signature = PrimitiveSignature::try_from(bytes.as_slice()).unwrap();
        let recovered = signature
            .recover_address_from_msg(b"still here" as &[u8])
            .unwrap();
        assert_eq!(recovered, address.parse::<Address>().unwrap());
    }
}

// ============================================================================
// Approval Flow Tests
// ============================================================================

mod approval_flow {
    use super::*;

    #[test]
    fn test_async_submit_approve_flow() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("state.json"));
        let sink = RecordingSink::default();
        let mut keyring =
            Keyring::load(store, sink.clone(), StdRng::seed_from_u64(6)).unwrap();

        let account = keyring.create_account(Map::new()).unwrap();

        let outcome = keyring
            .submit_request(request(
                "r-1",
                "personal_sign",
                json!([hex::encode_prefixed(b"approve me"), account.address]),
            ))
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Pending);
        assert_eq!(keyring.list_requests().len(), 1);

        let result = keyring.approve_request("r-1").unwrap();
        assert!(result.as_str().unwrap().starts_with("0x"));

        // Consumed exactly once: gone from the queue, not re-approvable.
        assert!(keyring.list_requests().is_empty());
        assert!(matches!(
            keyring.approve_request("r-1"),
            Err(bth_evm_keyring::Error::NotFound(_))
        ));

        assert_eq!(sink.kinds(), vec!["accountCreated", "requestApproved"]);
    }

    #[test]
    fn test_sync_mode_resolves_inline() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("state.json"));
        let mut keyring = Keyring::load(
            store,
            RecordingSink::default(),
            StdRng::seed_from_u64(7),
        )
        .unwrap();

        let account = keyring.create_account(Map::new()).unwrap();
        keyring.toggle_sync_approvals().unwrap();

        let outcome = keyring
            .submit_request(request(
                "r-1",
                "personal_sign",
                json!([hex::encode_prefixed(b"inline"), account.address]),
            ))
            .unwrap();

        match outcome {
            SubmitOutcome::Complete(result) => {
                assert!(result.as_str().unwrap().starts_with("0x"));
            }
            SubmitOutcome::Pending => panic!("synchronous submit must resolve inline"),
        }

        // Never queued.
        assert!(keyring.list_requests().is_empty());
        assert!(keyring.get_request("r-1").is_none());
    }

    #[test]
    fn test_chain_id_normalized_at_approval_not_submission() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("state.json"));
        let mut keyring = Keyring::load(
            store,
            RecordingSink::default(),
            StdRng::seed_from_u64(8),
        )
        .unwrap();

        let account = keyring.create_account(Map::new()).unwrap();

        keyring
            .submit_request(request(
                "r-tx",
                "eth_signTransaction",
                json!([{
                    "from": account.address,
                    "to": "0x0000000000000000000000000000000000000001",
                    "value": "0x0",
                    "gasLimit": "0x5208",
                    "gasPrice": "0x3b9aca00",
                    "nonce": "0x0",
                    "chainId": "1",
                }]),
            ))
            .unwrap();

        // The stored request keeps the decimal form until approval.
        let stored = keyring.get_request("r-tx").unwrap();
        assert_eq!(stored.request.params[0]["chainId"], "1");

        let signed = keyring.approve_request("r-tx").unwrap();
        assert_eq!(signed["chainId"], "0x1");
        assert_eq!(signed["type"], "0x0");
        assert!(signed["r"].as_str().is_some());
        assert!(signed["s"].as_str().is_some());
    }

    #[test]
    fn test_rejected_request_is_gone() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("state.json"));
        let sink = RecordingSink::default();
        let mut keyring =
            Keyring::load(store, sink.clone(), StdRng::seed_from_u64(9)).unwrap();

        keyring
            .submit_request(request("r-1", "personal_sign", json!([])))
            .unwrap();
        keyring.reject_request("r-1").unwrap();

        assert!(matches!(
            keyring.approve_request("r-1"),
            Err(bth_evm_keyring::Error::NotFound(_))
        ));
        assert_eq!(sink.kinds(), vec!["requestRejected"]);
    }

    #[test]
    fn test_pending_requests_survive_restart() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");

        let address = {
            let mut keyring = Keyring::load(
                JsonFileStore::new(&path),
                RecordingSink::default(),
                StdRng::seed_from_u64(10),
            )
            .unwrap();
            let account = keyring.create_account(Map::new()).unwrap();
            keyring
                .submit_request(request(
                    "r-1",
                    "personal_sign",
                    json!([hex::encode_prefixed(b"patient"), account.address]),
                ))
                .unwrap();
            account.address
        };

        let mut keyring = Keyring::load(
            JsonFileStore::new(&path),
            RecordingSink::default(),
            StdRng::seed_from_u64(11),
        )
        .unwrap();

        assert_eq!(keyring.list_requests().len(), 1);
        let result = keyring.approve_request("r-1").unwrap();

        let bytes = hex::decode(result.as_str().unwrap()).unwrap();
        let signature = PrimitiveSignature::try_from(bytes.as_slice()).unwrap();
        let recovered = signature
            .recover_address_from_msg(b"patient" as &[u8])
            .unwrap();
        assert_eq!(recovered, address.parse::<Address>().unwrap());
    }
}

// ============================================================================
// Persistence Tests
// ============================================================================

mod persistence {
    use super::*;

    #[test]
    fn test_sync_flag_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");

        {
            let mut keyring = Keyring::load(
                JsonFileStore::new(&path),
                RecordingSink::default(),
                StdRng::seed_from_u64(12),
            )
            .unwrap();
            keyring.toggle_sync_approvals().unwrap();
        }

        let keyring = Keyring::load(
            JsonFileStore::new(&path),
            RecordingSink::default(),
            StdRng::seed_from_u64(13),
        )
        .unwrap();
        assert!(keyring.is_synchronous_mode());
    }

    #[test]
    fn test_save_load_round_trip_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");
        let store = JsonFileStore::new(&path);

        {
            let mut keyring = Keyring::load(
                JsonFileStore::new(&path),
                RecordingSink::default(),
                StdRng::seed_from_u64(14),
            )
            .unwrap();
            keyring.create_account(Map::new()).unwrap();
            keyring
                .submit_request(request("r-1", "personal_sign", json!([])))
                .unwrap();
        }

        let once = store.load().unwrap();
        store.save(&once).unwrap();
        let twice = store.load().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_set_state_replaces_and_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");

        {
            let mut keyring = Keyring::load(
                JsonFileStore::new(&path),
                RecordingSink::default(),
                StdRng::seed_from_u64(15),
            )
            .unwrap();
            keyring.create_account(Map::new()).unwrap();

            let mut replacement = keyring.state().clone();
            replacement.use_sync_approvals = true;
            replacement.wallets.clear();
            keyring.set_state(replacement).unwrap();
        }

        let keyring = Keyring::load(
            JsonFileStore::new(&path),
            RecordingSink::default(),
            StdRng::seed_from_u64(16),
        )
        .unwrap();
        assert!(keyring.list_accounts().is_empty());
        assert!(keyring.is_synchronous_mode());
    }
}
