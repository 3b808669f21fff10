//! Persistence adapters for the store buckets.
//!
//! Each store serializes its state into a named bucket wrapped in a versioned
//! envelope (`{"version": 1, "state": ...}`). The adapter only moves strings;
//! versioning and (de)serialization live in [`load_bucket`] and [`save_bucket`].

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key/value backend used by the stores.
pub trait Persistence {
    /// Reads the raw value stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Replaces the value stored under `key`.
    fn store(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Deletes `key`; missing keys are not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    state: T,
}

/// Loads and decodes a bucket.
///
/// Missing buckets, version mismatches and corrupt payloads all yield `None`
/// so the caller starts from defaults; the latter two are logged.
pub fn load_bucket<T: DeserializeOwned>(
    persistence: &dyn Persistence,
    name: &str,
    version: u32,
) -> Option<T> {
    let raw = match persistence.load(name) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            log::warn!("Failed to read bucket '{name}': {err}");
            return None;
        }
    };
    match serde_json::from_str::<Envelope<T>>(&raw) {
        Ok(envelope) if envelope.version == version => Some(envelope.state),
        Ok(envelope) => {
            log::warn!(
                "Ignoring bucket '{name}': stored version {} does not match {version}",
                envelope.version
            );
            None
        }
        Err(err) => {
            log::warn!("Ignoring corrupt bucket '{name}': {err}");
            None
        }
    }
}

/// Encodes `state` into a versioned envelope and writes it.
pub fn save_bucket<T: Serialize>(
    persistence: &mut dyn Persistence,
    name: &str,
    version: u32,
    state: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(&Envelope { version, state })?;
    persistence.store(name, &json)
}

/// In-process storage, used by tests and as a fallback when no durable
/// backend is available.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    entries: HashMap<String, String>,
}

impl MemoryPersistence {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per bucket inside a data directory (native only).
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FilePersistence {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FilePersistence {
    /// Uses `dir` as the bucket directory; it is created on first write.
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> std::path::PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Persistence for FilePersistence {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Browser `localStorage` backend (wasm only).
#[cfg(target_arch = "wasm32")]
pub struct LocalStoragePersistence {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStoragePersistence {
    /// Opens the window's local storage, if the browser exposes one.
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl Persistence for LocalStoragePersistence {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|e| StoreError::Backend(format!("{e:?}")))
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StoreError::Backend(format!("{e:?}")))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StoreError::Backend(format!("{e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        page: String,
    }

    #[test]
    fn bucket_round_trips_through_envelope() {
        let mut store = MemoryPersistence::new();
        let prefs = Prefs { page: "acme".into() };
        save_bucket(&mut store, "prefs", 1, &prefs).unwrap();

        let raw = store.load("prefs").unwrap().unwrap();
        assert!(raw.contains("\"version\":1"));
        assert_eq!(load_bucket::<Prefs>(&store, "prefs", 1), Some(prefs));
    }

    #[test]
    fn version_mismatch_loads_nothing() {
        let mut store = MemoryPersistence::new();
        save_bucket(&mut store, "prefs", 1, &Prefs { page: "acme".into() }).unwrap();
        assert_eq!(load_bucket::<Prefs>(&store, "prefs", 2), None);
    }

    #[test]
    fn corrupt_bucket_loads_nothing() {
        let mut store = MemoryPersistence::new();
        store.store("prefs", "{not json").unwrap();
        assert_eq!(load_bucket::<Prefs>(&store, "prefs", 1), None);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn file_persistence_creates_directory_and_removes_missing_keys() {
        let dir = std::env::temp_dir().join(format!("sentiment-dashboard-{}", uuid::Uuid::new_v4()));
        let mut store = FilePersistence::new(&dir);
        assert_eq!(store.load("absent").unwrap(), None);

        store.store("bucket", "{}").unwrap();
        assert_eq!(store.load("bucket").unwrap().as_deref(), Some("{}"));

        store.remove("bucket").unwrap();
        store.remove("bucket").unwrap();
        assert_eq!(store.load("bucket").unwrap(), None);
        let _ = std::fs::remove_dir_all(dir);
    }
}
