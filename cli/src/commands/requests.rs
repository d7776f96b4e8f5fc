//! Request queue commands

use anyhow::{anyhow, Result};
use std::path::Path;

use bth_evm_keyring::{KeyringRequest, SigningRequest, SubmitOutcome};

use super::{open_keyring, print_json};

/// List pending signing requests.
pub fn list(state_path: &Path) -> Result<()> {
    let keyring = open_keyring(state_path)?;
    print_json(&keyring.list_requests())
}

/// Submit a signing request and report the outcome.
pub fn submit(
    state_path: &Path,
    id: String,
    method: String,
    params: &str,
    origin: Option<String>,
) -> Result<()> {
    let params =
        serde_json::from_str(params).map_err(|e| anyhow!("--params must be JSON: {}", e))?;

    let mut keyring = open_keyring(state_path)?;
    let outcome = keyring.submit_request(KeyringRequest {
        id,
        origin,
        request: SigningRequest { method, params },
    })?;

    match outcome {
        SubmitOutcome::Pending => {
            println!("pending");
            Ok(())
        }
        SubmitOutcome::Complete(result) => print_json(&result),
    }
}

/// Approve a pending request and print the signing result.
pub fn approve(state_path: &Path, id: &str) -> Result<()> {
    let mut keyring = open_keyring(state_path)?;
    let result = keyring.approve_request(id)?;
    print_json(&result)
}

/// Reject a pending request.
pub fn reject(state_path: &Path, id: &str) -> Result<()> {
    let mut keyring = open_keyring(state_path)?;
    keyring.reject_request(id)?;
    Ok(())
}
