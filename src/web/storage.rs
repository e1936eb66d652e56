use web_sys::Storage;

use super::js_message;
use crate::storage::{KeyValueStore, StorageError};

/// `window.localStorage` 的句柄，克隆后指向同一个存储。
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable {
            message: "no global window".to_string(),
        })?;
        let storage = window
            .local_storage()
            .map_err(|error| StorageError::Unavailable {
                message: js_message(&error),
            })?
            .ok_or_else(|| StorageError::Unavailable {
                message: "localStorage is disabled".to_string(),
            })?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|error| StorageError::WriteFailed {
                key: key.to_string(),
                message: js_message(&error),
            })
    }
}
