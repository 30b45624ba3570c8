//! Durable credential storage
//!
//! Credentials live in string-keyed slots, the way a browser keeps them in
//! `localStorage`. [`Credentials`] maps the fixed `token` / `refreshToken`
//! keys onto whichever [`CredentialStore`] backs the client.

use crate::types::TokenPair;
use catalog_core::AuthConfig;
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::collections::BTreeMap;
#[cfg(not(target_arch = "wasm32"))]
use std::sync::Mutex;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Credential storage failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt credential file: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// String-keyed durable storage
pub trait CredentialStore: Send + Sync {
    /// Read a slot
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a slot
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Clear a slot (clearing an empty slot is not an error)
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store, for tests and sessions that should not outlive the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a credential pair under the default keys
    pub fn with_tokens(pair: &TokenPair) -> Self {
        let defaults = AuthConfig::default();
        let store = Self::new();
        {
            let mut slots = store.slots.write().unwrap_or_else(PoisonError::into_inner);
            slots.insert(defaults.token_key, pair.token.clone());
            slots.insert(defaults.refresh_token_key, pair.refresh_token.clone());
        }
        store
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.remove(key);
        Ok(())
    }
}

/// JSON file store for native shells
///
/// The whole file is rewritten through a temporary sibling and renamed into
/// place, so a crash never leaves a half-written credential file.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileStore {
    path: std::path::PathBuf,
    lock: Mutex<()>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn read_slots(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_slots(&self, slots: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(slots)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut slots = self.read_slots()?;
        if f(&mut slots) {
            self.write_slots(&slots)?;
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_slots()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|slots| {
            slots.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|slots| slots.remove(key).is_some())
    }
}

/// Browser `localStorage`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl CredentialStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        use gloo::storage::{LocalStorage, Storage};
        LocalStorage::raw()
            .get_item(key)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        use gloo::storage::{LocalStorage, Storage};
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        use gloo::storage::{LocalStorage, Storage};
        LocalStorage::raw()
            .remove_item(key)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }
}

/// The credential pair slots of a [`CredentialStore`]
#[derive(Clone)]
pub struct Credentials {
    store: Arc<dyn CredentialStore>,
    token_key: String,
    refresh_token_key: String,
}

impl Credentials {
    pub fn new(store: Arc<dyn CredentialStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            token_key: config.token_key.clone(),
            refresh_token_key: config.refresh_token_key.clone(),
        }
    }

    pub fn access_token(&self) -> Result<Option<String>, StorageError> {
        self.store.get(&self.token_key)
    }

    pub fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        self.store.get(&self.refresh_token_key)
    }

    /// Persist a freshly issued pair
    pub fn save(&self, pair: &TokenPair) -> Result<(), StorageError> {
        self.store.set(&self.token_key, &pair.token)?;
        self.store.set(&self.refresh_token_key, &pair.refresh_token)
    }

    /// Persist an access token issued without a refresh token
    ///
    /// Any stale refresh token is dropped so it cannot be replayed against
    /// the new session.
    pub fn save_access_token(&self, token: &str) -> Result<(), StorageError> {
        self.store.set(&self.token_key, token)?;
        self.store.remove(&self.refresh_token_key)
    }

    /// Clear both slots
    pub fn clear(&self) -> Result<(), StorageError> {
        let access = self.store.remove(&self.token_key);
        let refresh = self.store.remove(&self.refresh_token_key);
        access.and(refresh)
    }

    /// Whether an access token is stored
    pub fn is_authenticated(&self) -> bool {
        matches!(self.access_token(), Ok(Some(_)))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token_key", &self.token_key)
            .field("refresh_token_key", &self.refresh_token_key)
            .finish_non_exhaustive()
    }
}
