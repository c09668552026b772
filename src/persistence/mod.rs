//! Key/value persistence
//!
//! Features:
//! - Small string values under fixed keys (LocalStorage layout on web)
//! - In-memory backend for tests and the native runner
//! - Best effort: callers log write failures and carry on

use std::collections::HashMap;

use thiserror::Error;

/// Storage keys
pub const HIGH_SCORE_KEY: &str = "snakeHighScore";
pub const SOUND_ENABLED_KEY: &str = "snakeSoundEnabled";
pub const MUSIC_ENABLED_KEY: &str = "snakeMusicEnabled";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is not available")]
    Unavailable,
    #[error("storage rejected write to {key}: {reason}")]
    WriteRejected { key: String, reason: String },
}

/// Persistent string storage
pub trait Storage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Volatile storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Read and decode a JSON value, treating missing or malformed data as absent
pub fn load_value<T: serde::de::DeserializeOwned>(storage: &impl Storage, key: &str) -> Option<T> {
    let raw = storage.get_item(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring malformed {}: {}", key, e);
            None
        }
    }
}

/// Encode and write a JSON value, logging failures
pub fn save_value<T: serde::Serialize>(storage: &mut impl Storage, key: &str, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to encode {}: {}", key, e);
            return;
        }
    };
    if let Err(e) = storage.set_item(key, &json) {
        log::error!("Failed to save {}: {}", key, e);
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = Self::storage().ok_or(StorageError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|e| StorageError::WriteRejected {
                key: key.to_owned(),
                reason: format!("{:?}", e),
            })
    }
}
