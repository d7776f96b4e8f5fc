//! CLI Commands
//!
//! Implementation of all keyring CLI commands.

pub mod accounts;
pub mod requests;
pub mod state;

use anyhow::Result;
use rand::rngs::OsRng;
use std::path::Path;
use tracing::info;

use bth_evm_keyring::{Error, EventSink, JsonFileStore, Keyring, KeyringEvent};

/// An event sink that surfaces engine events in the CLI log.
pub struct LogSink;

impl EventSink for LogSink {
    fn notify(&self, event: KeyringEvent) -> Result<(), Error> {
        match &event {
            KeyringEvent::AccountCreated { account } => {
                info!("account created: {} ({})", account.id, account.address);
            }
            KeyringEvent::AccountUpdated { account } => {
                info!("account updated: {}", account.id);
            }
            KeyringEvent::AccountDeleted { id } => {
                info!("account deleted: {}", id);
            }
            KeyringEvent::RequestApproved { id, .. } => {
                info!("request approved: {}", id);
            }
            KeyringEvent::RequestRejected { id } => {
                info!("request rejected: {}", id);
            }
        }
        Ok(())
    }
}

/// Open the engine over the state file at `path`.
pub fn open_keyring(path: &Path) -> Result<Keyring<JsonFileStore, LogSink, OsRng>> {
    Ok(Keyring::load(JsonFileStore::new(path), LogSink, OsRng)?)
}

/// Pretty-print a serializable value to stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
