// Copyright (c) 2024 The Botho Foundation

//! Durable storage for the engine state blob.
//!
//! The engine treats its store as authoritative: state is loaded once at
//! construction and saved after every mutation, before the mutating
//! operation reports success.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use thiserror::Error;

use crate::state::KeyringState;

/// An error raised by a state store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("state file io: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted blob could not be encoded or decoded.
    #[error("state encoding: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Durable key-value persistence of the engine's full state.
pub trait StateStore {
    /// Load the persisted state, or the empty default when none exists.
    fn load(&self) -> Result<KeyringState, StorageError>;

    /// Durably persist the given state.
    fn save(&self, state: &KeyringState) -> Result<(), StorageError>;
}

impl<T: StateStore> StateStore for &T {
    fn load(&self) -> Result<KeyringState, StorageError> {
        <T as StateStore>::load(self)
    }

    fn save(&self, state: &KeyringState) -> Result<(), StorageError> {
        <T as StateStore>::save(self, state)
    }
}

/// A state store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store over the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<KeyringState, StorageError> {
        if !self.path.exists() {
            return Ok(KeyringState::default());
        }

        let json = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn save(&self, state: &KeyringState) -> Result<(), StorageError> {
        // Create parent directory if needed
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(state)?;

        // Write with restricted permissions; the blob holds key material.
        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)?;
            file.write_all(json.as_bytes())?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, json)?;
        }

        Ok(())
    }
}

/// An in-memory store, for tests and hosts that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<KeyringState>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<KeyringState, StorageError> {
        // A poisoned lock only means a writer panicked; the data is a
        // plain clone-in, clone-out value and stays usable.
        let guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, state: &KeyringState) -> Result<(), StorageError> {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(state.clone());
        Ok(())
    }
}
