//! 本地持久化层：分数计数、玩家会话与偏好设置。

pub mod player;
pub mod score;
pub mod settings;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use player::{PlayerMode, PlayerSession, PlayerSlot};
pub use score::{ScoreCounter, ScoreStore, ScoreSummary};
pub use settings::Preferences;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum StorageError {
    #[error("storage is unavailable: {message}")]
    Unavailable { message: String },
    #[error("failed to write `{key}`: {message}")]
    WriteFailed { key: String, message: String },
}

/// 字符串键值存储。浏览器中对应 `localStorage`，测试中使用 [`MemoryStore`]。
///
/// 实现需要是廉价可克隆的句柄，多个组件共享同一份底层数据。
pub trait KeyValueStore: Clone {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// 内存版存储，克隆后共享同一张表。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            entries: Rc::new(RefCell::new(map)),
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 读取十进制计数；缺失或损坏的值按 0 处理。
pub(crate) fn read_count<S: KeyValueStore>(store: &S, key: &str) -> u32 {
    match store.get(key) {
        None => 0,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            crate::console_warn!("ignoring corrupted counter `{key}` = {raw:?}");
            0
        }),
    }
}

pub(crate) fn write_count<S: KeyValueStore>(
    store: &S,
    key: &str,
    value: u32,
) -> Result<(), StorageError> {
    store.set(key, &value.to_string()).map_err(|error| {
        crate::console_error!("{error}");
        error
    })
}

/// 写入可按需失败的存储，用于覆盖写入出错的路径。
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct FailingStore {
    inner: MemoryStore,
    fail_on: Rc<RefCell<Option<String>>>,
}

#[cfg(test)]
impl FailingStore {
    pub(crate) fn wrap(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_on: Rc::new(RefCell::new(None)),
        }
    }

    /// 之后所有写入都失败。
    pub(crate) fn fail_all(&self) {
        *self.fail_on.borrow_mut() = Some(String::new());
    }

    /// 之后只有对 `key` 的写入失败。
    pub(crate) fn fail_key(&self, key: &str) {
        *self.fail_on.borrow_mut() = Some(key.to_string());
    }

    pub(crate) fn recover(&self) {
        *self.fail_on.borrow_mut() = None;
    }
}

#[cfg(test)]
impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self.fail_on.borrow().as_deref() {
            Some(failing) if failing.is_empty() || failing == key => {
                Err(StorageError::WriteFailed {
                    key: key.to_string(),
                    message: "quota exceeded".to_string(),
                })
            }
            _ => self.inner.set(key, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_store_rejects_selected_writes() {
        let store = FailingStore::wrap(MemoryStore::new());
        store.fail_key("mcq_total");
        assert!(store.set("mcq_total", "1").is_err());
        store.set("mcq_score", "1").expect("other keys still write");

        store.fail_all();
        assert!(store.set("mcq_score", "2").is_err());
        store.recover();
        store.set("mcq_total", "3").expect("writes recover");
        assert_eq!(store.get("mcq_total").as_deref(), Some("3"));
        assert_eq!(store.get("mcq_score").as_deref(), Some("1"));
    }

    #[test]
    fn clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("playerMode", "two").expect("memory write should succeed");
        assert_eq!(other.get("playerMode").as_deref(), Some("two"));
        assert!(other.contains("playerMode"));
    }

    #[test]
    fn corrupted_counters_read_as_zero() {
        let store = MemoryStore::with_entries([
            ("mcq_score", "abc"),
            ("mcq_total", "-3"),
            ("fillblank_total", " 7 "),
        ]);
        assert_eq!(read_count(&store, "mcq_score"), 0);
        assert_eq!(read_count(&store, "mcq_total"), 0);
        assert_eq!(read_count(&store, "fillblank_total"), 7);
        assert_eq!(read_count(&store, "missing"), 0);
    }
}
