//! Registro nombre de clase -> constructor de filesystem.
//!
//! Los nombres con puntos (`fsspec.implementations.local.LocalFileSystem`) se
//! resuelven por su último segmento.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use super::{FileSystem, HttpFileSystem, LocalFileSystem, MemoryFileSystem, StorageError};

pub type FsFactory = fn(&Map<String, Value>) -> Result<Arc<dyn FileSystem>, StorageError>;

static REGISTRY: Lazy<HashMap<&'static str, FsFactory>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, FsFactory> = HashMap::new();
    m.insert("LocalFileSystem", LocalFileSystem::from_args);
    m.insert("local", LocalFileSystem::from_args);
    m.insert("file", LocalFileSystem::from_args);
    m.insert("MemoryFileSystem", MemoryFileSystem::from_args);
    m.insert("memory", MemoryFileSystem::from_args);
    m.insert("HTTPFileSystem", HttpFileSystem::from_args);
    m.insert("http", HttpFileSystem::from_args);
    m.insert("https", HttpFileSystem::from_args);
    m.insert("S3FileSystem", HttpFileSystem::s3_from_args);
    m.insert("s3", HttpFileSystem::s3_from_args);
    m
});

/// Último segmento de un nombre con puntos.
pub fn short_name(class: &str) -> &str {
    class.rsplit('.').next().unwrap_or(class)
}

pub fn lookup(class: &str) -> Option<FsFactory> {
    REGISTRY.get(short_name(class)).copied()
}

pub fn build(class: &str, args: &Map<String, Value>) -> Result<Arc<dyn FileSystem>, StorageError> {
    let factory = lookup(class).ok_or_else(|| StorageError::Unsupported(format!("unknown filesystem class {class}")))?;
    factory(args)
}

/// Nombres registrados, ordenados.
pub fn registered_classes() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = REGISTRY.keys().copied().collect();
    names.sort();
    names
}
