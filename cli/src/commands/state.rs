//! Engine state commands

use anyhow::Result;
use std::path::Path;

use super::{open_keyring, print_json};

/// Flip the approval mode and report the new setting.
pub fn toggle_sync(state_path: &Path) -> Result<()> {
    let mut keyring = open_keyring(state_path)?;
    let synchronous = keyring.toggle_sync_approvals()?;
    println!(
        "approvals are now {}",
        if synchronous {
            "synchronous"
        } else {
            "asynchronous"
        }
    );
    Ok(())
}

/// Dump the full engine state, key material included.
pub fn show(state_path: &Path) -> Result<()> {
    let keyring = open_keyring(state_path)?;
    print_json(keyring.state())
}
