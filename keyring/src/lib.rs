#![deny(missing_docs)]
#![deny(unsafe_code)]

//! EVM Keyring Engine
//!
//! An account-custody and request-approval engine for externally-owned
//! EVM accounts. The engine holds private keys, exposes account
//! lifecycle operations, and processes signing requests on behalf of a
//! host application.
//!
//! ## Security Model
//!
//! - Private keys never leave the engine except inside a signing
//!   operation or through the explicit export operation
//! - The host performs origin permissioning before calling in; the
//!   engine performs no authorization of its own
//! - Every mutation is persisted through the host-supplied state store
//!   before the operation reports success
//! - Host event notification is best-effort and never rolls back a
//!   persisted change

pub mod account;
pub mod error;
pub mod events;
pub mod request;
pub mod state;
pub mod storage;

mod dispatch;
mod keyring;
mod typed_data;

pub use crate::{
    account::{AccountType, EthMethod, KeyringAccount},
    error::{Error, Result},
    events::{EventSink, KeyringEvent, NullSink},
    keyring::Keyring,
    request::{KeyringRequest, SigningRequest, SubmitOutcome},
    state::{KeyringState, Wallet},
    storage::{JsonFileStore, MemoryStore, StateStore, StorageError},
};
