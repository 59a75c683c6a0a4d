#![forbid(unsafe_code)]

//! Registration stores: where applications and their function bodies are
//! persisted for the executing side.
//!
//! An application is keyed by name and `(major, minor)` version. Body ids
//! may be announced more than once; stores keep each id once.
//!
//! # File layout of [`JsonFileStore`]
//!
//! ```text
//! <root>/<name>-<major>.<minor>/app.json         application spec
//! <root>/<name>-<major>.<minor>/data.json        tracked body ids
//! <root>/<name>-<major>.<minor>/functions/<id>.json
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::reactive::{BodyId, FunctionEntry};

/// Identity of a registered application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppKey {
    pub name: String,
    pub major: u32,
    pub minor: u32,
}

impl AppKey {
    #[must_use]
    pub fn new(name: impl Into<String>, major: u32, minor: u32) -> Self {
        Self {
            name: name.into(),
            major,
            minor,
        }
    }
}

impl fmt::Display for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}.{}", self.name, self.major, self.minor)
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
    UnknownApp(AppKey),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "store I/O error: {e}"),
            Self::Json(e) => write!(f, "store encoding error: {e}"),
            Self::UnknownApp(key) => write!(f, "application '{key}' is not registered"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::UnknownApp(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Backing store for registered applications.
pub trait AppStore: Send + Sync {
    /// Create or overwrite the application's spec.
    fn register(&self, key: &AppKey, spec: &serde_json::Value) -> Result<(), StoreError>;

    /// Track body ids as belonging to the application. Idempotent.
    fn add_data(&self, key: &AppKey, ids: &[BodyId]) -> Result<(), StoreError>;

    /// Persist function table entries, replacing entries with the same id.
    fn save_functions(&self, key: &AppKey, entries: &[FunctionEntry]) -> Result<(), StoreError>;

    /// Forget body ids and their stored functions.
    fn remove_data(&self, key: &AppKey, ids: &[BodyId]) -> Result<(), StoreError>;

    /// Drop the application itself.
    fn unregister(&self, key: &AppKey) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct StoredApp {
    spec: serde_json::Value,
    data: Vec<BodyId>,
    functions: IndexMap<BodyId, FunctionEntry>,
}

/// In-process store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    apps: Mutex<HashMap<AppKey, StoredApp>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_app<T>(
        &self,
        key: &AppKey,
        f: impl FnOnce(&mut StoredApp) -> T,
    ) -> Result<T, StoreError> {
        let mut apps = self.apps.lock().unwrap_or_else(PoisonError::into_inner);
        apps.get_mut(key)
            .map(f)
            .ok_or_else(|| StoreError::UnknownApp(key.clone()))
    }

    #[must_use]
    pub fn contains(&self, key: &AppKey) -> bool {
        self.apps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Tracked body ids, in announcement order.
    #[must_use]
    pub fn data(&self, key: &AppKey) -> Vec<BodyId> {
        self.with_app(key, |app| app.data.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn spec(&self, key: &AppKey) -> Option<serde_json::Value> {
        self.with_app(key, |app| app.spec.clone()).ok()
    }

    #[must_use]
    pub fn functions(&self, key: &AppKey) -> Vec<FunctionEntry> {
        self.with_app(key, |app| app.functions.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl AppStore for MemoryStore {
    fn register(&self, key: &AppKey, spec: &serde_json::Value) -> Result<(), StoreError> {
        let mut apps = self.apps.lock().unwrap_or_else(PoisonError::into_inner);
        apps.entry(key.clone()).or_default().spec = spec.clone();
        Ok(())
    }

    fn add_data(&self, key: &AppKey, ids: &[BodyId]) -> Result<(), StoreError> {
        self.with_app(key, |app| {
            for id in ids {
                if !app.data.contains(id) {
                    app.data.push(id.clone());
                }
            }
        })
    }

    fn save_functions(&self, key: &AppKey, entries: &[FunctionEntry]) -> Result<(), StoreError> {
        self.with_app(key, |app| {
            for entry in entries {
                app.functions.insert(entry.body.clone(), entry.clone());
            }
        })
    }

    fn remove_data(&self, key: &AppKey, ids: &[BodyId]) -> Result<(), StoreError> {
        self.with_app(key, |app| {
            app.data.retain(|id| !ids.contains(id));
            app.functions.retain(|id, _| !ids.contains(id));
        })
    }

    fn unregister(&self, key: &AppKey) -> Result<(), StoreError> {
        let mut apps = self.apps.lock().unwrap_or_else(PoisonError::into_inner);
        apps.remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::UnknownApp(key.clone()))
    }
}

/// Store writing plain JSON files under a root directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one application.
    #[must_use]
    pub fn app_dir(&self, key: &AppKey) -> PathBuf {
        self.root.join(key.to_string())
    }

    fn function_path(&self, key: &AppKey, id: &BodyId) -> PathBuf {
        self.app_dir(key)
            .join("functions")
            .join(format!("{}.json", id.as_str()))
    }

    fn registered_dir(&self, key: &AppKey) -> Result<PathBuf, StoreError> {
        let dir = self.app_dir(key);
        if dir.join("app.json").is_file() {
            Ok(dir)
        } else {
            Err(StoreError::UnknownApp(key.clone()))
        }
    }

    /// Tracked body ids.
    pub fn data(&self, key: &AppKey) -> Result<Vec<BodyId>, StoreError> {
        let path = self.registered_dir(key)?.join("data.json");
        if !path.is_file() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// A stored function entry, if present.
    pub fn function(&self, key: &AppKey, id: &BodyId) -> Result<Option<FunctionEntry>, StoreError> {
        let path = self.function_path(key, id);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&fs::read_to_string(path)?)?))
    }

    fn write_data(&self, key: &AppKey, data: &[BodyId]) -> Result<(), StoreError> {
        let path = self.registered_dir(key)?.join("data.json");
        fs::write(path, serde_json::to_string_pretty(data)?)?;
        Ok(())
    }
}

impl AppStore for JsonFileStore {
    fn register(&self, key: &AppKey, spec: &serde_json::Value) -> Result<(), StoreError> {
        let dir = self.app_dir(key);
        fs::create_dir_all(dir.join("functions"))?;
        fs::write(dir.join("app.json"), serde_json::to_string_pretty(spec)?)?;
        tracing::debug!(app = %key, path = %dir.display(), "application registered");
        Ok(())
    }

    fn add_data(&self, key: &AppKey, ids: &[BodyId]) -> Result<(), StoreError> {
        let mut data = self.data(key)?;
        for id in ids {
            if !data.contains(id) {
                data.push(id.clone());
            }
        }
        self.write_data(key, &data)
    }

    fn save_functions(&self, key: &AppKey, entries: &[FunctionEntry]) -> Result<(), StoreError> {
        self.registered_dir(key)?;
        for entry in entries {
            fs::write(
                self.function_path(key, &entry.body),
                serde_json::to_string(entry)?,
            )?;
        }
        Ok(())
    }

    fn remove_data(&self, key: &AppKey, ids: &[BodyId]) -> Result<(), StoreError> {
        let mut data = self.data(key)?;
        data.retain(|id| !ids.contains(id));
        for id in ids {
            let path = self.function_path(key, id);
            if path.is_file() {
                fs::remove_file(path)?;
            }
        }
        self.write_data(key, &data)
    }

    fn unregister(&self, key: &AppKey) -> Result<(), StoreError> {
        let dir = self.registered_dir(key)?;
        fs::remove_dir_all(dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::TypeName;

    fn entry(id: &str) -> FunctionEntry {
        FunctionEntry {
            body: BodyId::new(id),
            parameters: vec![],
            result: TypeName::Int,
            ser_body: "eJwDAAAAAAE=".into(),
        }
    }

    fn exercise(store: &dyn AppStore, key: &AppKey) {
        assert!(matches!(
            store.add_data(key, &[BodyId::new("a")]),
            Err(StoreError::UnknownApp(_))
        ));
        store.register(key, &serde_json::json!({"name": key.name})).unwrap();
        store.add_data(key, &[BodyId::new("a"), BodyId::new("b")]).unwrap();
        store.add_data(key, &[BodyId::new("a")]).unwrap();
        store.save_functions(key, &[entry("a"), entry("b")]).unwrap();
        store.remove_data(key, &[BodyId::new("a")]).unwrap();
    }

    #[test]
    fn memory_store_dedupes_and_removes() {
        let store = MemoryStore::new();
        let key = AppKey::new("demo", 1, 0);
        exercise(&store, &key);
        assert_eq!(store.data(&key), vec![BodyId::new("b")]);
        assert_eq!(store.functions(&key), vec![entry("b")]);
        assert_eq!(store.spec(&key).unwrap()["name"], "demo");
        store.unregister(&key).unwrap();
        assert!(!store.contains(&key));
    }

    #[test]
    fn file_store_lays_out_one_file_per_body() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let key = AppKey::new("demo", 2, 1);
        exercise(&store, &key);

        let app_dir = dir.path().join("demo-2.1");
        assert!(app_dir.join("app.json").is_file());
        assert!(app_dir.join("functions/b.json").is_file());
        assert!(!app_dir.join("functions/a.json").exists());
        assert_eq!(store.data(&key).unwrap(), vec![BodyId::new("b")]);
        assert_eq!(store.function(&key, &BodyId::new("b")).unwrap(), Some(entry("b")));

        store.unregister(&key).unwrap();
        assert!(!app_dir.exists());
    }
}
