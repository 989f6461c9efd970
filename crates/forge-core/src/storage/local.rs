//! Backend local sobre `std::fs`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::{FileSystem, StorageError};

#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }

    /// No acepta argumentos; cualquier arg se ignora con un aviso.
    pub fn from_args(args: &Map<String, Value>) -> Result<Arc<dyn FileSystem>, StorageError> {
        if !args.is_empty() {
            log::warn!("LocalFileSystem ignores arguments: {:?}", args.keys().collect::<Vec<_>>());
        }
        Ok(Arc::new(Self))
    }

    fn to_path(path: &str) -> PathBuf {
        PathBuf::from(path.strip_prefix("file://").unwrap_or(path))
    }
}

fn collect_files(dir: &Path, out: &mut Vec<String>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path.to_string_lossy().into_owned());
        }
    }
    Ok(())
}

impl FileSystem for LocalFileSystem {
    fn protocol(&self) -> &'static str {
        "file"
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        fs::read(Self::to_path(path)).map_err(|e| StorageError::io(path, e))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let target = Self::to_path(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(path, e))?;
        }
        fs::write(&target, data).map_err(|e| StorageError::io(path, e))
    }

    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(Self::to_path(path).exists())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let root = Self::to_path(prefix);
        if !root.exists() {
            return Ok(Vec::new());
        }
        if root.is_file() {
            return Ok(vec![prefix.to_string()]);
        }
        let mut out = Vec::new();
        collect_files(&root, &mut out).map_err(|e| StorageError::io(prefix, e))?;
        out.sort();
        // Conserva la forma de la ruta pedida.
        if prefix.starts_with("file://") {
            out = out.into_iter().map(|p| format!("file://{p}")).collect();
        }
        Ok(out)
    }
}
