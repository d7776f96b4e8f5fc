//! Account management commands

use anyhow::{anyhow, Result};
use serde_json::{json, Map};
use std::path::Path;

use super::{open_keyring, print_json};

/// Create a new account, optionally importing a private key.
pub fn create(state_path: &Path, private_key: Option<String>, name: Option<String>) -> Result<()> {
    let mut keyring = open_keyring(state_path)?;

    let mut options = Map::new();
    if let Some(key) = private_key {
        options.insert("privateKey".to_string(), json!(key));
    }

    let mut account = keyring.create_account(options)?;
    if name.is_some() {
        account.name = name;
        keyring.update_account(account.clone())?;
    }

    print_json(&account)
}

/// List all accounts.
pub fn list(state_path: &Path) -> Result<()> {
    let keyring = open_keyring(state_path)?;
    print_json(&keyring.list_accounts())
}

/// Show one account.
pub fn get(state_path: &Path, id: &str) -> Result<()> {
    let keyring = open_keyring(state_path)?;
    let account = keyring
        .get_account(id)
        .ok_or_else(|| anyhow!("account '{}' not found", id))?;
    print_json(account)
}

/// Change an account's display name.
pub fn rename(state_path: &Path, id: &str, name: String) -> Result<()> {
    let mut keyring = open_keyring(state_path)?;
    let mut patch = keyring
        .get_account(id)
        .ok_or_else(|| anyhow!("account '{}' not found", id))?
        .clone();
    patch.name = Some(name);
    keyring.update_account(patch)?;

    print_json(keyring.get_account(id).expect("account just updated"))
}

/// Delete an account.
pub fn delete(state_path: &Path, id: &str) -> Result<()> {
    let mut keyring = open_keyring(state_path)?;
    keyring.delete_account(id)?;
    Ok(())
}

/// Print an account's private key.
pub fn export(state_path: &Path, id: &str) -> Result<()> {
    let keyring = open_keyring(state_path)?;
    let key = keyring.export_account(id)?;

    eprintln!("Warning: anyone with this key controls the account.");
    println!("{}", key);
    Ok(())
}
