//! Resolver de storage para los tres roles de un run.

use serde::{Deserialize, Serialize};

use super::{registry, StorageHandle, StorageRole, StorageSpec};
use crate::errors::RunnerError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub target: StorageHandle,
    pub input_cache: StorageHandle,
    pub metadata_cache: StorageHandle,
}

/// Spec local por defecto para un rol de cache: `<tmp>/forge-runner/<rol>`.
pub fn default_cache_spec(role: StorageRole) -> StorageSpec {
    let leaf = match role {
        StorageRole::MetadataCache => "metadata-cache",
        _ => "input-cache",
    };
    let root = std::env::temp_dir().join("forge-runner").join(leaf);
    StorageSpec::new("LocalFileSystem", root.to_string_lossy())
}

impl StorageConfig {
    /// Construye los handles. Sólo valida lo que no requiere tocar el
    /// backend: el Target es obligatorio, necesita `root_path` y su clase
    /// debe estar registrada. Los backends se construyen en su primer uso.
    pub fn resolve(target: Option<StorageSpec>,
                   input_cache: Option<StorageSpec>,
                   metadata_cache: Option<StorageSpec>)
                   -> Result<Self, RunnerError> {
        let role = StorageRole::Target;
        let target = target.ok_or_else(|| RunnerError::StorageMisconfigured { role: role.section_name().to_string(),
                                                                              reason: "no target storage configured".into() })?;
        if target.root_path.trim().is_empty() {
            return Err(RunnerError::StorageMisconfigured { role: role.section_name().to_string(),
                                                           reason: "root_path is empty".into() });
        }
        if target.fsspec_class.trim().is_empty() {
            return Err(RunnerError::StorageMisconfigured { role: role.section_name().to_string(),
                                                           reason: "fsspec_class is empty".into() });
        }
        if registry::lookup(&target.fsspec_class).is_none() {
            return Err(RunnerError::StorageMisconfigured { role: role.section_name().to_string(),
                                                           reason: format!("unknown filesystem class {}",
                                                                           target.fsspec_class) });
        }

        let cache = |spec: Option<StorageSpec>, role: StorageRole| {
            let spec = match spec {
                Some(s) if !s.root_path.trim().is_empty() => s,
                Some(_) => {
                    log::warn!("{role} has no root_path, using the local default");
                    default_cache_spec(role)
                }
                None => default_cache_spec(role),
            };
            StorageHandle::new(role, spec)
        };

        Ok(Self { target: StorageHandle::new(StorageRole::Target, target),
                  input_cache: cache(input_cache, StorageRole::InputCache),
                  metadata_cache: cache(metadata_cache, StorageRole::MetadataCache) })
    }

    pub fn handle(&self, role: StorageRole) -> &StorageHandle {
        match role {
            StorageRole::Target => &self.target,
            StorageRole::InputCache => &self.input_cache,
            StorageRole::MetadataCache => &self.metadata_cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_target_is_rejected() {
        let err = StorageConfig::resolve(None, None, None).unwrap_err();
        assert!(matches!(err, RunnerError::StorageMisconfigured { ref role, .. } if role == "TargetStorage"));
        let err = StorageConfig::resolve(Some(StorageSpec::new("memory", "  ")), None, None).unwrap_err();
        assert!(err.to_string().contains("root_path"));
    }

    #[test]
    fn unknown_target_class_is_rejected_up_front() {
        let err = StorageConfig::resolve(Some(StorageSpec::new("GhostFS", "s3://gpcp/target/")), None, None).unwrap_err();
        assert_eq!(err,
                   RunnerError::StorageMisconfigured { role: "TargetStorage".into(),
                                                       reason: "unknown filesystem class GhostFS".into() });
        assert!(StorageConfig::resolve(Some(StorageSpec::new("s3fs.S3FileSystem", "s3://gpcp/target/")), None, None).is_ok());
    }

    #[test]
    fn caches_default_to_local_temp() {
        let cfg = StorageConfig::resolve(Some(StorageSpec::new("memory", "s3://b/t")), None, None).unwrap();
        assert_eq!(cfg.input_cache.spec().fsspec_class, "LocalFileSystem");
        assert!(cfg.input_cache.root_path().ends_with("input-cache"));
        assert!(cfg.handle(StorageRole::MetadataCache).root_path().ends_with("metadata-cache"));
    }

    #[test]
    fn same_spec_twice_is_interchangeable() {
        let spec = StorageSpec::new("memory", "memory://resolve-twice/");
        let a = StorageConfig::resolve(Some(spec.clone()), None, None).unwrap();
        let b = StorageConfig::resolve(Some(spec), None, None).unwrap();
        assert_eq!(a, b);
        a.target.write("x", b"1").unwrap();
        assert_eq!(b.target.read("x").unwrap(), b"1");
    }

    #[test]
    fn bad_cache_class_does_not_abort_resolve() {
        let cfg = StorageConfig::resolve(Some(StorageSpec::new("memory", "memory://bad-cache/")),
                                         Some(StorageSpec::new("GhostFS", "/tmp/ghost")),
                                         None).unwrap();
        assert!(cfg.input_cache.filesystem().is_err());
        assert!(cfg.target.filesystem().is_ok());
    }
}
