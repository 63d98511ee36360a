//! Local key-value storage for settings and session caching.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("storage io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("storage json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub trait KeyValueStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
  fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
  fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
  fn get(&self, key: &str) -> Result<Option<Value>, StoreError> { (**self).get(key) }
  fn set(&self, key: &str, value: Value) -> Result<(), StoreError> { (**self).set(key, value) }
  fn remove(&self, key: &str) -> Result<(), StoreError> { (**self).remove(key) }
}

/// Typed read. A missing key is `Ok(None)`.
pub fn load<T: DeserializeOwned>(store: &(impl KeyValueStore + ?Sized), key: &str) -> Result<Option<T>, StoreError> {
  match store.get(key)? {
    Some(v) => Ok(Some(serde_json::from_value(v)?)),
    None => Ok(None),
  }
}

pub fn save<T: Serialize>(store: &(impl KeyValueStore + ?Sized), key: &str, value: &T) -> Result<(), StoreError> {
  store.set(key, serde_json::to_value(value)?)
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
  m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-lifetime store; what the session scope amounts to in tests.
#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
    Ok(lock(&self.inner).get(key).cloned())
  }
  fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
    lock(&self.inner).insert(key.to_string(), value);
    Ok(())
  }
  fn remove(&self, key: &str) -> Result<(), StoreError> {
    lock(&self.inner).remove(key);
    Ok(())
  }
}

/// All keys in one JSON object file, rewritten on every change.
pub struct JsonFileStore {
  path: PathBuf,
  write_lock: Mutex<()>,
}

impl JsonFileStore {
  pub fn new(path: impl AsRef<Path>) -> Self {
    Self { path: path.as_ref().to_path_buf(), write_lock: Mutex::new(()) }
  }

  fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
    match std::fs::read_to_string(&self.path) {
      Ok(s) if s.trim().is_empty() => Ok(Map::new()),
      Ok(s) => Ok(serde_json::from_str(&s)?),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
      Err(e) => Err(e.into()),
    }
  }

  fn write_all(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
    std::fs::write(&self.path, serde_json::to_vec_pretty(map)?)?;
    Ok(())
  }
}

impl KeyValueStore for JsonFileStore {
  fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
    Ok(self.read_all()?.get(key).cloned())
  }
  fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
    let _guard = lock(&self.write_lock);
    let mut map = self.read_all()?;
    map.insert(key.to_string(), value);
    self.write_all(&map)
  }
  fn remove(&self, key: &str) -> Result<(), StoreError> {
    let _guard = lock(&self.write_lock);
    let mut map = self.read_all()?;
    if map.remove(key).is_some() {
      self.write_all(&map)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn memory_store_round_trip() {
    let store = MemoryStore::new();
    assert_eq!(load::<u32>(&store, "n").unwrap(), None);
    save(&store, "n", &7u32).unwrap();
    assert_eq!(load::<u32>(&store, "n").unwrap(), Some(7));
    store.remove("n").unwrap();
    assert!(store.get("n").unwrap().is_none());
  }

  #[test]
  fn file_store_persists_across_instances() {
    let path = std::env::temp_dir().join(format!("student-buddy-store-{}.json", uuid::Uuid::new_v4()));
    {
      let store = JsonFileStore::new(&path);
      store.set("apiUrl", json!("http://localhost:3000")).unwrap();
      store.set("sb_currentHintIndex", json!(2)).unwrap();
    }
    let reopened = JsonFileStore::new(&path);
    assert_eq!(reopened.get("apiUrl").unwrap(), Some(json!("http://localhost:3000")));
    assert_eq!(load::<usize>(&reopened, "sb_currentHintIndex").unwrap(), Some(2));
    reopened.remove("apiUrl").unwrap();
    assert!(reopened.get("apiUrl").unwrap().is_none());
    let _ = std::fs::remove_file(&path);
  }

  #[test]
  fn corrupt_file_is_an_error_not_a_panic() {
    let path = std::env::temp_dir().join(format!("student-buddy-store-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, "{not json").unwrap();
    let store = JsonFileStore::new(&path);
    assert!(matches!(store.get("x"), Err(StoreError::Json(_))));
    let _ = std::fs::remove_file(&path);
  }
}
