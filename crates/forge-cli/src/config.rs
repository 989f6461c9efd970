//! Archivo de configuración del runner.
//!
//! Secciones: `Bake`, `TargetStorage`, `InputCacheStorage`,
//! `MetadataCacheStorage` y una sección libre por clase de bakery
//! (`LocalDirectBakery { num_workers }`, ...). El formato sale de la
//! extensión.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use forge_bakery::canonical_name;
use forge_core::{RunnerError, StorageSpec};

pub const DEFAULT_CONFIG_NAMES: [&str; 3] = ["forge_runner_config.json", "forge_runner_config.toml", "forge_runner_config.yaml"];
pub const DEFAULT_BAKERY: &str = "LocalDirectBakery";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BakeSection {
    pub recipe_id: Option<String>,
    pub job_name: Option<String>,
    pub bakery_class: Option<String>,
    pub prune: bool,
    pub prune_bound: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RunnerConfig {
    #[serde(rename = "Bake", default)]
    pub bake: BakeSection,
    #[serde(rename = "TargetStorage", default)]
    pub target_storage: Option<StorageSpec>,
    #[serde(rename = "InputCacheStorage", default)]
    pub input_cache_storage: Option<StorageSpec>,
    #[serde(rename = "MetadataCacheStorage", default)]
    pub metadata_cache_storage: Option<StorageSpec>,
    /// Secciones restantes (parámetros por clase de bakery).
    #[serde(flatten)]
    pub sections: Map<String, Value>,
}

impl RunnerConfig {
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let raw = std::fs::read_to_string(path).map_err(|e| RunnerError::Config(format!("{}: {e}", path.display())))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();
        let parsed: Result<Self, String> = match ext.as_str() {
            "json" => serde_json::from_str(&raw).map_err(|e| e.to_string()),
            "toml" => toml::from_str(&raw).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str(&raw).map_err(|e| e.to_string()),
            other => Err(format!("unsupported config format {other:?}")),
        };
        let cfg = parsed.map_err(|e| RunnerError::Config(format!("{}: {e}", path.display())))?;
        log::debug!("loaded config from {}", path.display());
        Ok(cfg)
    }

    /// Primer `forge_runner_config.*` existente en `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES.iter().map(|n| dir.join(n)).find(|p| p.is_file())
    }

    /// Carga `explicit` o, si no hay, el archivo por defecto de `dir`. Sin
    /// archivo devuelve los valores por defecto.
    pub fn load_or_default(explicit: Option<&Path>, dir: &Path) -> Result<Self, RunnerError> {
        match explicit.map(Path::to_path_buf).or_else(|| Self::discover(dir)) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn bakery_class(&self) -> &str {
        self.bake.bakery_class.as_deref().unwrap_or(DEFAULT_BAKERY)
    }

    /// Sección de parámetros de una clase: por nombre canónico, por el
    /// nombre tal cual o por su último segmento.
    pub fn bakery_section(&self, class: &str) -> Option<&Value> {
        let short = class.rsplit('.').next().unwrap_or(class);
        canonical_name(class).and_then(|c| self.sections.get(c))
                             .or_else(|| self.sections.get(class))
                             .or_else(|| self.sections.get(short))
    }
}
