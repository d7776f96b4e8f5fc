// Copyright (c) 2024 The Botho Foundation

//! The keyring engine.
//!
//! Owns the wallet registry and the pending-request queue, and wires
//! every mutation through the same discipline: mutate in memory, persist
//! the full state, then notify the host. Persistence failures abort the
//! operation before it is acknowledged; notification failures are logged
//! and do not roll anything back.

use rand_core::{CryptoRng, RngCore};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{
    account::{AccountType, EthMethod, KeyringAccount, EIP155_NAMESPACE},
    dispatch,
    error::{Error, Result},
    events::{EventSink, KeyringEvent},
    request::{KeyringRequest, SubmitOutcome},
    state::{KeyringState, Wallet},
    storage::StateStore,
};
use bth_evm_account_keys::AccountKey;

/// The account-custody and request-approval engine.
///
/// Mutating operations take `&mut self`, so a single engine value can
/// never see overlapping mutations; hosts that share one engine across
/// threads wrap it in a `Mutex`.
pub struct Keyring<S, E, R> {
    state: KeyringState,
    store: S,
    events: E,
    rng: R,
}

impl<S, E, R> Keyring<S, E, R>
where
    S: StateStore,
    E: EventSink,
    R: RngCore + CryptoRng,
{
    /// Construct an engine over previously loaded state.
    pub fn new(state: KeyringState, store: S, events: E, rng: R) -> Self {
        Self {
            state,
            store,
            events,
            rng,
        }
    }

    /// Construct an engine by loading state from the store.
    ///
    /// A store with nothing persisted yields the empty default state.
    pub fn load(store: S, events: E, rng: R) -> Result<Self> {
        let state = store.load()?;
        Ok(Self::new(state, store, events, rng))
    }

    // === Account registry ===

    /// All account records, in registry iteration order.
    pub fn list_accounts(&self) -> Vec<&KeyringAccount> {
        self.state.wallets.values().map(|w| &w.account).collect()
    }

    /// The account with the given id, if present.
    pub fn get_account(&self, id: &str) -> Option<&KeyringAccount> {
        self.state.wallets.get(id).map(|w| &w.account)
    }

    /// Create a new account.
    ///
    /// If the options bag supplies a `privateKey`, it is validated and
    /// imported (and stripped from the stored options, so key material
    /// never appears on the public record); otherwise a fresh key is
    /// drawn from the engine's randomness source.
    pub fn create_account(&mut self, mut options: Map<String, Value>) -> Result<KeyringAccount> {
        let key = match options.remove("privateKey") {
            Some(Value::String(encoded)) => AccountKey::from_hex(&encoded)?,
            Some(_) => {
                return Err(Error::InvalidParameters(
                    "options.privateKey must be a hex string".to_string(),
                ))
            }
            None => AccountKey::from_random(&mut self.rng),
        };

        let address = key.checksummed_address();
        if self.wallet_with_address(&address).is_some() {
            return Err(Error::DuplicateAddress(address));
        }

        let account = KeyringAccount {
            id: self.next_id(),
            name: None,
            address,
            options,
            methods: EthMethod::ALL.to_vec(),
            account_type: AccountType::Eoa,
        };

        self.state.wallets.insert(
            account.id.clone(),
            Wallet {
                account: account.clone(),
                private_key: key.to_hex(),
            },
        );
        self.persist()?;
        self.emit(KeyringEvent::AccountCreated {
            account: account.clone(),
        });

        Ok(account)
    }

    /// Update an account's mutable fields.
    ///
    /// Only the display name is applied from the patch; address,
    /// capability set, type and options are restored from the stored
    /// record regardless of what the patch carries.
    pub fn update_account(&mut self, patch: KeyringAccount) -> Result<()> {
        let wallet = self
            .state
            .wallets
            .get_mut(&patch.id)
            .ok_or_else(|| Error::NotFound(format!("account '{}'", patch.id)))?;

        wallet.account.name = patch.name;
        let account = wallet.account.clone();

        self.persist()?;
        self.emit(KeyringEvent::AccountUpdated { account });
        Ok(())
    }

    /// Delete an account and discard its key material.
    ///
    /// Deletion is idempotent: removing an unknown id succeeds silently,
    /// unlike [`Keyring::reject_request`].
    pub fn delete_account(&mut self, id: &str) -> Result<()> {
        self.state.wallets.remove(id);
        self.persist()?;
        self.emit(KeyringEvent::AccountDeleted { id: id.to_string() });
        Ok(())
    }

    /// Export an account's private key as hex.
    pub fn export_account(&self, id: &str) -> Result<String> {
        self.state
            .wallets
            .get(id)
            .map(|w| w.private_key.clone())
            .ok_or_else(|| Error::NotFound(format!("account '{}'", id)))
    }

    /// Filter a CAIP-2 chain list down to the chains the account
    /// supports. Accounts created here work on any EVM chain.
    pub fn filter_account_chains(&self, _id: &str, chains: Vec<String>) -> Vec<String> {
        chains
            .into_iter()
            .filter(|chain| chain.starts_with(EIP155_NAMESPACE))
            .collect()
    }

    // === Request queue ===

    /// All pending requests, in queue iteration order.
    pub fn list_requests(&self) -> Vec<&KeyringRequest> {
        self.state.pending_requests.values().collect()
    }

    /// The pending request with the given id, if present.
    pub fn get_request(&self, id: &str) -> Option<&KeyringRequest> {
        self.state.pending_requests.get(id)
    }

    /// Submit a signing request.
    ///
    /// In synchronous mode the request is resolved inline and never
    /// queued; in asynchronous mode it is stored until an explicit
    /// approve or reject consumes it.
    pub fn submit_request(&mut self, request: KeyringRequest) -> Result<SubmitOutcome> {
        if self.state.use_sync_approvals {
            self.submit_sync(request)
        } else {
            self.submit_async(request)
        }
    }

    /// Approve a pending request: sign, consume, persist, notify.
    ///
    /// A failed dispatch leaves the request pending so the caller may
    /// retry or reject it.
    pub fn approve_request(&mut self, id: &str) -> Result<Value> {
        let (method, params) = {
            let pending = self
                .state
                .pending_requests
                .get(id)
                .ok_or_else(|| Error::NotFound(format!("request '{}'", id)))?;
            (
                pending.request.method.clone(),
                pending.request.params.clone(),
            )
        };

        let result = dispatch::handle_signing_request(&self.state.wallets, &method, &params)?;

        self.state.pending_requests.remove(id);
        self.persist()?;
        self.emit(KeyringEvent::RequestApproved {
            id: id.to_string(),
            result: result.clone(),
        });

        Ok(result)
    }

    /// Reject a pending request without signing.
    pub fn reject_request(&mut self, id: &str) -> Result<()> {
        if self.state.pending_requests.remove(id).is_none() {
            return Err(Error::NotFound(format!("request '{}'", id)));
        }

        self.persist()?;
        self.emit(KeyringEvent::RequestRejected { id: id.to_string() });
        Ok(())
    }

    // === Engine state ===

    /// The full engine state.
    pub fn state(&self) -> &KeyringState {
        &self.state
    }

    /// Replace the full engine state and persist it.
    pub fn set_state(&mut self, state: KeyringState) -> Result<()> {
        self.state = state;
        self.persist()
    }

    /// Flip between synchronous and asynchronous approvals.
    ///
    /// The flag is part of the persisted state and survives restarts.
    pub fn toggle_sync_approvals(&mut self) -> Result<bool> {
        self.state.use_sync_approvals = !self.state.use_sync_approvals;
        self.persist()?;
        info!(
            "synchronous approvals: {}",
            self.state.use_sync_approvals
        );
        Ok(self.state.use_sync_approvals)
    }

    /// Whether submissions currently resolve inline.
    pub fn is_synchronous_mode(&self) -> bool {
        self.state.use_sync_approvals
    }

    // === Internals ===

    fn submit_sync(&mut self, request: KeyringRequest) -> Result<SubmitOutcome> {
        let result = dispatch::handle_signing_request(
            &self.state.wallets,
            &request.request.method,
            &request.request.params,
        )?;
        Ok(SubmitOutcome::Complete(result))
    }

    fn submit_async(&mut self, request: KeyringRequest) -> Result<SubmitOutcome> {
        // A pending id may not be reused while it is still in flight.
        if self.state.pending_requests.contains_key(&request.id) {
            return Err(Error::InvalidParameters(format!(
                "request id '{}' is already pending",
                request.id
            )));
        }

        self.state
            .pending_requests
            .insert(request.id.clone(), request);
        self.persist()?;
        Ok(SubmitOutcome::Pending)
    }

    fn wallet_with_address(&self, address: &str) -> Option<&Wallet> {
        self.state
            .wallets
            .values()
            .find(|w| w.account.address.eq_ignore_ascii_case(address))
    }

    /// Allocate a fresh account id from the engine's randomness source.
    fn next_id(&mut self) -> String {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string()
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.state)?;
        Ok(())
    }

    /// Best-effort notification, after the state change is durable.
    fn emit(&self, event: KeyringEvent) {
        let kind = event.kind();
        if let Err(e) = self.events.notify(event) {
            warn!("failed to notify host of {} event: {}", kind, e);
        }
    }
}
