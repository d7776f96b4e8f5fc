// Copyright (c) 2024 The Botho Foundation

//! Host notification of keyring mutations.

use serde_json::Value;

use crate::{account::KeyringAccount, error::Error};

/// An event reported to the host after a mutation has been persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyringEvent {
    /// A new account was created
    AccountCreated {
        /// The created account record
        account: KeyringAccount,
    },

    /// An account's mutable fields were updated
    AccountUpdated {
        /// The account record after the update
        account: KeyringAccount,
    },

    /// An account and its key material were removed
    AccountDeleted {
        /// The removed account id
        id: String,
    },

    /// A pending request was approved and signed
    RequestApproved {
        /// The consumed request id
        id: String,
        /// The signing result delivered to the host
        result: Value,
    },

    /// A pending request was rejected without signing
    RequestRejected {
        /// The consumed request id
        id: String,
    },
}

impl KeyringEvent {
    /// The event kind, as the host-facing event name.
    pub fn kind(&self) -> &'static str {
        match self {
            KeyringEvent::AccountCreated { .. } => "accountCreated",
            KeyringEvent::AccountUpdated { .. } => "accountUpdated",
            KeyringEvent::AccountDeleted { .. } => "accountDeleted",
            KeyringEvent::RequestApproved { .. } => "requestApproved",
            KeyringEvent::RequestRejected { .. } => "requestRejected",
        }
    }
}

/// Host-side receiver for keyring events.
///
/// Delivery is best-effort: the engine logs a failed notification as a
/// warning and keeps the already-persisted state change.
pub trait EventSink {
    /// Deliver one event to the host.
    fn notify(&self, event: KeyringEvent) -> Result<(), Error>;
}

impl<T: EventSink> EventSink for &T {
    fn notify(&self, event: KeyringEvent) -> Result<(), Error> {
        <T as EventSink>::notify(self, event)
    }
}

/// An event sink that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&self, _event: KeyringEvent) -> Result<(), Error> {
        Ok(())
    }
}
