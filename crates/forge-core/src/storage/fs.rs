use std::fmt::Debug;

use super::StorageError;

/// Backend de filesystem. Todas las rutas son completas (root incluido).
pub trait FileSystem: Send + Sync + Debug {
    fn protocol(&self) -> &'static str;

    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Crea o reemplaza el objeto en `path`.
    fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Rutas completas de los objetos bajo `prefix`, ordenadas.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}
