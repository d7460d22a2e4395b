//! Key/value persistence port and the adapter the resolver talks through.
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Trait for abstracting key/value persistence.
/// Platform-specific implementations should provide this
pub trait StoragePort {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<Value>, Self::Error>;

    /// Store `value` under `key`; `None` clears the entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store rejects the write.
    fn set_item(&self, key: &str, value: Option<Value>) -> Result<(), Self::Error>;
}

/// Wraps a [`StoragePort`] so that storage failures never escape as control flow.
#[derive(Debug, Clone)]
pub struct PersistenceAdapter<S> {
    storage: S,
    key: String,
}

impl<S: StoragePort> PersistenceAdapter<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Read and decode the slot; absent, unreadable, or malformed data reads as `None`.
    pub fn read<T: DeserializeOwned>(&self) -> Option<T> {
        let raw = self.read_raw()?;
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("ignoring malformed data under {}: {err}", self.key);
                None
            }
        }
    }

    /// Like [`read`](Self::read), but clears the slot when its contents are
    /// malformed or rejected by `accept`.
    pub fn restore<T: DeserializeOwned>(&self, accept: impl FnOnce(&T) -> bool) -> Option<T> {
        let raw = self.read_raw()?;
        match serde_json::from_value::<T>(raw) {
            Ok(value) if accept(&value) => Some(value),
            Ok(_) => {
                log::warn!("discarding rejected data under {}", self.key);
                self.clear();
                None
            }
            Err(err) => {
                log::warn!("discarding malformed data under {}: {err}", self.key);
                self.clear();
                None
            }
        }
    }

    fn read_raw(&self) -> Option<Value> {
        match self.storage.get_item(&self.key) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("failed to read {}: {err}", self.key);
                None
            }
        }
    }

    /// Write the slot, or clear it with `None`. Failures are logged and dropped.
    pub fn write<T: Serialize>(&self, value: Option<&T>) {
        let encoded = match value.map(serde_json::to_value).transpose() {
            Ok(encoded) => encoded,
            Err(err) => {
                log::warn!("failed to encode {}: {err}", self.key);
                return;
            }
        };
        if let Err(err) = self.storage.set_item(&self.key, encoded) {
            log::warn!("failed to persist {}: {err}", self.key);
        }
    }

    pub fn clear(&self) {
        self.write::<Value>(None);
    }
}

/// In-process storage; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, Value>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl StoragePort for MemoryStorage {
    type Error = Infallible;

    fn get_item(&self, key: &str) -> Result<Option<Value>, Self::Error> {
        Ok(self.peek(key))
    }

    fn set_item(&self, key: &str, value: Option<Value>) -> Result<(), Self::Error> {
        let mut entries = self.entries.borrow_mut();
        match value {
            Some(value) => {
                entries.insert(key.to_string(), value);
            }
            None => {
                entries.remove(key);
            }
        }
        Ok(())
    }
}
