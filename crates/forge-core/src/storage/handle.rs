use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{registry, FileSystem, StorageError, StorageRole};

/// Tripleta declarativa de un rol de storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSpec {
    pub fsspec_class: String,
    #[serde(default)]
    pub fsspec_args: Map<String, Value>,
    #[serde(default)]
    pub root_path: String,
}

impl StorageSpec {
    pub fn new(fsspec_class: impl Into<String>, root_path: impl Into<String>) -> Self {
        Self { fsspec_class: fsspec_class.into(),
               fsspec_args: Map::new(),
               root_path: root_path.into() }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fsspec_args.insert(key.into(), value.into());
        self
    }
}

/// Une root y ruta relativa con una sola barra.
pub fn join_path(root: &str, rel: &str) -> String {
    let rel = rel.trim_start_matches('/');
    if rel.is_empty() {
        return root.to_string();
    }
    if root.is_empty() {
        return rel.to_string();
    }
    format!("{}/{}", root.trim_end_matches('/'), rel)
}

/// Handle de un rol. El backend se construye en el primer uso y queda
/// cacheado; serializar el handle envía sólo el spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageHandle {
    role: StorageRole,
    spec: StorageSpec,
    #[serde(skip)]
    fs: OnceCell<Arc<dyn FileSystem>>,
}

impl PartialEq for StorageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role && self.spec == other.spec
    }
}

impl StorageHandle {
    pub fn new(role: StorageRole, spec: StorageSpec) -> Self {
        Self { role,
               spec,
               fs: OnceCell::new() }
    }

    pub fn role(&self) -> StorageRole {
        self.role
    }

    pub fn spec(&self) -> &StorageSpec {
        &self.spec
    }

    pub fn root_path(&self) -> &str {
        &self.spec.root_path
    }

    /// Backend del rol. Una clase desconocida o args inválidos fallan aquí,
    /// no antes.
    pub fn filesystem(&self) -> Result<Arc<dyn FileSystem>, StorageError> {
        self.fs
            .get_or_try_init(|| {
                log::debug!("building {} backend {} for {}", self.role, self.spec.fsspec_class, self.spec.root_path);
                registry::build(&self.spec.fsspec_class, &self.spec.fsspec_args).map_err(|e| {
                    StorageError::Misconfigured { role: self.role.section_name().to_string(),
                                                  reason: format!("{}: {e}", self.spec.fsspec_class) }
                })
            })
            .cloned()
    }

    pub fn url(&self, rel: &str) -> String {
        join_path(&self.spec.root_path, rel)
    }

    pub fn read(&self, rel: &str) -> Result<Vec<u8>, StorageError> {
        self.filesystem()?.read(&self.url(rel))
    }

    pub fn write(&self, rel: &str, data: &[u8]) -> Result<(), StorageError> {
        self.filesystem()?.write(&self.url(rel), data)
    }

    pub fn exists(&self, rel: &str) -> Result<bool, StorageError> {
        self.filesystem()?.exists(&self.url(rel))
    }

    /// Objetos bajo `rel`, como rutas relativas al root.
    pub fn list(&self, rel: &str) -> Result<Vec<String>, StorageError> {
        let root = join_path(&self.spec.root_path, "");
        let root = root.trim_end_matches('/');
        let full = self.filesystem()?.list(&self.url(rel))?;
        Ok(full.into_iter()
               .map(|p| p.strip_prefix(root).map(|r| r.trim_start_matches('/').to_string()).unwrap_or(p))
               .collect())
    }
}
