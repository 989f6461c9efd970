use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageRole {
    Target,
    InputCache,
    MetadataCache,
}

impl StorageRole {
    /// Nombre de la sección de configuración del rol.
    pub fn section_name(&self) -> &'static str {
        match self {
            StorageRole::Target => "TargetStorage",
            StorageRole::InputCache => "InputCacheStorage",
            StorageRole::MetadataCache => "MetadataCacheStorage",
        }
    }
}

impl fmt::Display for StorageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section_name())
    }
}
