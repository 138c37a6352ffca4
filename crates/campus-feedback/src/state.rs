//! Namespaced, versioned key/value persistence for client-side store state.
//!
//! Each namespace is stored as a JSON envelope `{ "version": n, "state": ... }`.
//! Stores register a migrate hook that upgrades older envelopes before they are
//! deserialized into the current shape.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Raw string storage keyed by namespace.
pub trait StateStorage: Send + Sync {
    fn read(&self, namespace: &str) -> Result<Option<String>, StateError>;
    fn write(&self, namespace: &str, payload: &str) -> Result<(), StateError>;
    fn remove(&self, namespace: &str) -> Result<(), StateError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("state storage io failure for '{namespace}': {source}")]
    Io {
        namespace: String,
        source: std::io::Error,
    },
    #[error("persisted state for '{namespace}' is malformed: {source}")]
    Malformed {
        namespace: String,
        source: serde_json::Error,
    },
    #[error("persisted state for '{namespace}' has version {found}, newer than supported {supported}")]
    UnsupportedVersion {
        namespace: String,
        found: u32,
        supported: u32,
    },
    #[error("migration of '{namespace}' failed: {reason}")]
    Migration { namespace: String, reason: String },
}

/// Stores one `<namespace>.json` file per namespace inside a directory.
#[derive(Debug, Clone)]
pub struct FileStateStorage {
    root: PathBuf,
}

impl FileStateStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, namespace: &str) -> PathBuf {
        self.root.join(format!("{namespace}.json"))
    }
}

impl StateStorage for FileStateStorage {
    fn read(&self, namespace: &str) -> Result<Option<String>, StateError> {
        match fs::read_to_string(self.path_for(namespace)) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StateError::Io {
                namespace: namespace.to_string(),
                source,
            }),
        }
    }

    fn write(&self, namespace: &str, payload: &str) -> Result<(), StateError> {
        let io_error = |source| StateError::Io {
            namespace: namespace.to_string(),
            source,
        };
        fs::create_dir_all(&self.root).map_err(io_error)?;
        let target = self.path_for(namespace);
        let staging = self.root.join(format!("{namespace}.json.part"));
        fs::write(&staging, payload).map_err(io_error)?;
        fs::rename(&staging, &target).map_err(io_error)
    }

    fn remove(&self, namespace: &str) -> Result<(), StateError> {
        match fs::remove_file(self.path_for(namespace)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StateError::Io {
                namespace: namespace.to_string(),
                source,
            }),
        }
    }
}

/// Process-local storage, shared between clones.
#[derive(Debug, Default, Clone)]
pub struct MemoryStateStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStateStorage {
    pub fn raw(&self, namespace: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("state mutex poisoned")
            .get(namespace)
            .cloned()
    }
}

impl StateStorage for MemoryStateStorage {
    fn read(&self, namespace: &str) -> Result<Option<String>, StateError> {
        Ok(self.raw(namespace))
    }

    fn write(&self, namespace: &str, payload: &str) -> Result<(), StateError> {
        self.entries
            .lock()
            .expect("state mutex poisoned")
            .insert(namespace.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&self, namespace: &str) -> Result<(), StateError> {
        self.entries
            .lock()
            .expect("state mutex poisoned")
            .remove(namespace);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    state: T,
}

/// Upgrades a raw state value from `from_version` to the current shape.
pub type MigrateFn = fn(from_version: u32, state: Value) -> Result<Value, String>;

pub fn save_versioned<S, T>(
    storage: &S,
    namespace: &str,
    version: u32,
    state: &T,
) -> Result<(), StateError>
where
    S: StateStorage + ?Sized,
    T: Serialize,
{
    let payload = serde_json::to_string(&Envelope { version, state }).map_err(|source| {
        StateError::Malformed {
            namespace: namespace.to_string(),
            source,
        }
    })?;
    storage.write(namespace, &payload)
}

/// Loads a namespace, running `migrate` when the stored version is older.
///
/// A payload without an envelope is treated as version 0.
pub fn load_versioned<S, T>(
    storage: &S,
    namespace: &str,
    current_version: u32,
    migrate: MigrateFn,
) -> Result<Option<T>, StateError>
where
    S: StateStorage + ?Sized,
    T: DeserializeOwned,
{
    let Some(payload) = storage.read(namespace)? else {
        return Ok(None);
    };

    let malformed = |source| StateError::Malformed {
        namespace: namespace.to_string(),
        source,
    };

    let raw: Value = serde_json::from_str(&payload).map_err(malformed)?;
    let (version, state) = split_envelope(raw);

    if version > current_version {
        return Err(StateError::UnsupportedVersion {
            namespace: namespace.to_string(),
            found: version,
            supported: current_version,
        });
    }

    let state = if version < current_version {
        info!(namespace, from = version, to = current_version, "migrating persisted state");
        migrate(version, state).map_err(|reason| StateError::Migration {
            namespace: namespace.to_string(),
            reason,
        })?
    } else {
        state
    };

    serde_json::from_value(state).map(Some).map_err(malformed)
}

fn split_envelope(raw: Value) -> (u32, Value) {
    match raw {
        Value::Object(mut map)
            if map.len() == 2 && map.contains_key("version") && map.contains_key("state") =>
        {
            let version = map
                .get("version")
                .and_then(Value::as_u64)
                .and_then(|value| u32::try_from(value).ok())
                .unwrap_or(0);
            let state = map.remove("state").unwrap_or(Value::Null);
            (version, state)
        }
        other => (0, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        count: u32,
        label: String,
    }

    fn add_label(from_version: u32, state: Value) -> Result<Value, String> {
        if from_version != 0 {
            return Err(format!("unknown version {from_version}"));
        }
        let count = state.get("count").cloned().unwrap_or(json!(0));
        Ok(json!({ "count": count, "label": "migrated" }))
    }

    #[test]
    fn round_trips_current_version() {
        let storage = MemoryStateStorage::default();
        let state = Counter {
            count: 3,
            label: "three".to_string(),
        };
        save_versioned(&storage, "counter", 1, &state).expect("saves");

        let loaded: Counter = load_versioned(&storage, "counter", 1, add_label)
            .expect("loads")
            .expect("present");
        assert_eq!(loaded, state);
    }

    #[test]
    fn bare_payload_is_migrated_from_version_zero() {
        let storage = MemoryStateStorage::default();
        storage
            .write("counter", r#"{"count": 7}"#)
            .expect("writes raw payload");

        let loaded: Counter = load_versioned(&storage, "counter", 1, add_label)
            .expect("migrates")
            .expect("present");
        assert_eq!(loaded.count, 7);
        assert_eq!(loaded.label, "migrated");
    }

    #[test]
    fn newer_versions_are_rejected() {
        let storage = MemoryStateStorage::default();
        storage
            .write("counter", r#"{"version": 4, "state": {"count": 1, "label": "x"}}"#)
            .expect("writes");

        let result: Result<Option<Counter>, _> = load_versioned(&storage, "counter", 1, add_label);
        assert!(matches!(
            result,
            Err(StateError::UnsupportedVersion { found: 4, supported: 1, .. })
        ));
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().expect("temp dir");
        let storage = FileStateStorage::new(dir.path().join("state"));
        assert!(storage.read("counter").expect("reads").is_none());

        save_versioned(
            &storage,
            "counter",
            1,
            &Counter {
                count: 9,
                label: "nine".to_string(),
            },
        )
        .expect("saves");

        let reopened = FileStateStorage::new(dir.path().join("state"));
        let loaded: Counter = load_versioned(&reopened, "counter", 1, add_label)
            .expect("loads")
            .expect("present");
        assert_eq!(loaded.count, 9);

        reopened.remove("counter").expect("removes");
        assert!(reopened.read("counter").expect("reads").is_none());
    }
}
