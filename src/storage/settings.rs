use super::{KeyValueStore, StorageError};

pub const DARK_MODE_KEY: &str = "darkMode";

/// 界面偏好。
#[derive(Debug, Clone)]
pub struct Preferences<S> {
    store: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn dark_mode(&self) -> bool {
        self.store.get(DARK_MODE_KEY).as_deref() == Some("true")
    }

    pub fn set_dark_mode(&self, enabled: bool) -> Result<(), StorageError> {
        self.store
            .set(DARK_MODE_KEY, if enabled { "true" } else { "false" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn dark_mode_round_trips_through_store() {
        let store = MemoryStore::new();
        let preferences = Preferences::new(store.clone());
        assert!(!preferences.dark_mode());

        preferences.set_dark_mode(true).expect("enable dark mode");
        assert_eq!(store.get(DARK_MODE_KEY).as_deref(), Some("true"));
        assert!(preferences.dark_mode());

        preferences.set_dark_mode(false).expect("disable dark mode");
        assert!(!preferences.dark_mode());
    }
}
