use thiserror::Error;

use crate::errors::RunnerError;

/// Errores de los backends de filesystem.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("http error on {url}: {reason}")]
    Http { url: String, reason: String },

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("invalid filesystem arguments: {0}")]
    InvalidArgs(String),

    /// Clase desconocida o args inválidos detectados al construir el backend
    /// de un rol.
    #[error("storage {role} is misconfigured: {reason}")]
    Misconfigured { role: String, reason: String },
}

impl StorageError {
    pub(crate) fn io(path: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(path.to_string())
        } else {
            StorageError::Io { path: path.to_string(),
                               reason: err.to_string() }
        }
    }
}

impl From<StorageError> for RunnerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Misconfigured { role, reason } => RunnerError::StorageMisconfigured { role, reason },
            other => RunnerError::Internal(other.to_string()),
        }
    }
}
