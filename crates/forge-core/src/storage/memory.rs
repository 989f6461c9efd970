//! Backend en memoria, global al proceso.
//!
//! Todas las instancias comparten el mismo mapa, de modo que dos handles de la
//! misma `StorageSpec` ven los mismos datos (igual que dos clientes de un bucket).

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use super::{FileSystem, StorageError};

static STORE: Lazy<DashMap<String, Vec<u8>>> = Lazy::new(DashMap::new);

#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem;

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self
    }

    pub fn from_args(_args: &Map<String, Value>) -> Result<Arc<dyn FileSystem>, StorageError> {
        Ok(Arc::new(Self))
    }

    /// Borra todo lo que cuelga de `prefix`. Devuelve cuántos objetos quitó.
    pub fn remove_prefix(prefix: &str) -> usize {
        let before = STORE.len();
        STORE.retain(|k, _| !k.starts_with(prefix));
        before.saturating_sub(STORE.len())
    }
}

impl FileSystem for MemoryFileSystem {
    fn protocol(&self) -> &'static str {
        "memory"
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        STORE.get(path)
             .map(|v| v.value().clone())
             .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        STORE.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(STORE.contains_key(path))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = STORE.iter()
                                         .filter(|e| e.key().starts_with(prefix))
                                         .map(|e| e.key().clone())
                                         .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instances_share_the_store() {
        let a = MemoryFileSystem::new();
        let b = MemoryFileSystem::new();
        a.write("memory://unit-share/x", b"hello").unwrap();
        assert_eq!(b.read("memory://unit-share/x").unwrap(), b"hello");
        assert_eq!(b.list("memory://unit-share/").unwrap(), vec!["memory://unit-share/x".to_string()]);
        assert_eq!(MemoryFileSystem::remove_prefix("memory://unit-share/"), 1);
        assert!(!a.exists("memory://unit-share/x").unwrap());
    }
}
