use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use viewport_badge_protocol::Settings;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read settings: {0}")]
    Read(String),
    #[error("failed to write settings: {0}")]
    Write(String),
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Asynchronous key-value persistence shared by every rendering context.
///
/// Implementations are single-threaded: futures need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    /// `Ok(None)` when nothing is stored under `key`.
    async fn read(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn write(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Turn a read outcome into usable settings. Failures and absence both
/// yield defaults; failures are logged and go no further.
pub fn settings_or_default(result: Result<Option<Value>, StoreError>) -> Settings {
    match result {
        Ok(stored) => Settings::from_stored(stored.as_ref()),
        Err(e) => {
            tracing::warn!(error = %e, "settings read failed, using defaults");
            Settings::default()
        }
    }
}

pub async fn load_settings<S: SettingsStore>(store: &S, key: &str) -> Settings {
    settings_or_default(store.read(key).await)
}

/// Read for a poll tick. A failed read yields `None` so the caller keeps
/// its current snapshot instead of flipping to defaults on a transient error.
pub async fn poll_settings<S: SettingsStore>(store: &S, key: &str) -> Option<Settings> {
    match store.read(key).await {
        Ok(stored) => Some(Settings::from_stored(stored.as_ref())),
        Err(e) => {
            tracing::warn!(error = %e, "settings poll failed, keeping current settings");
            None
        }
    }
}

/// Persist `settings` as a whole record, replacing whatever was stored.
pub async fn save_settings<S: SettingsStore>(
    store: &S,
    key: &str,
    settings: &Settings,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(settings)?;
    store.write(key, value).await
}

/// In-process store for native hosts and tests. Failures can be injected to
/// exercise the fallback paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<String, Value>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(key: &str, value: Value) -> Self {
        let store = Self::new();
        store.records.borrow_mut().insert(key.to_string(), value);
        store
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Raw stored record, bypassing failure injection.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.records.borrow().get(key).cloned()
    }

    /// Successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl SettingsStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if self.fail_reads.get() {
            return Err(StoreError::Read("injected read failure".into()));
        }
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Write("injected write failure".into()));
        }
        self.records.borrow_mut().insert(key.to_string(), value);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;
    use viewport_badge_protocol::{Position, STORAGE_KEY};

    #[test]
    fn absent_record_loads_defaults() {
        let store = MemoryStore::new();
        let settings = block_on(load_settings(&store, STORAGE_KEY));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn read_failure_loads_defaults() {
        let store = MemoryStore::with_record(STORAGE_KEY, json!({ "enabled": false }));
        store.set_fail_reads(true);
        let settings = block_on(load_settings(&store, STORAGE_KEY));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn poll_read_failure_keeps_snapshot() {
        let store = MemoryStore::new();
        assert_eq!(block_on(poll_settings(&store, STORAGE_KEY)), Some(Settings::default()));
        store.set_fail_reads(true);
        assert_eq!(block_on(poll_settings(&store, STORAGE_KEY)), None);
    }

    #[test]
    fn save_replaces_whole_record() {
        let store = MemoryStore::with_record(STORAGE_KEY, json!({ "legacyField": 1 }));
        let settings = Settings {
            position: Position::TopLeft,
            ..Settings::default()
        };
        block_on(save_settings(&store, STORAGE_KEY, &settings)).unwrap();
        let stored = store.get(STORAGE_KEY).unwrap();
        assert!(stored.get("legacyField").is_none());
        assert_eq!(stored["position"], "top-left");
        assert_eq!(block_on(load_settings(&store, STORAGE_KEY)), settings);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn write_failure_is_reported() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let result = block_on(save_settings(&store, STORAGE_KEY, &Settings::default()));
        assert!(matches!(result, Err(StoreError::Write(_))));
        assert!(store.get(STORAGE_KEY).is_none());
    }
}
