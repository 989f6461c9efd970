use std::path::{Path, PathBuf};

use serde::Deserialize;

use forge_core::RunnerError;

/// Contenido de `meta.yaml`. Sólo `recipes` es obligatorio.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedstockMeta {
    #[serde(default)]
    pub title: Option<String>,
    pub recipes: Vec<RecipeEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecipeEntry {
    /// Una receta: `{ id, object: "module:attr" }`.
    Object { id: String, object: String },
    /// Varias recetas: `{ dict_object: "module:attr" }` con id -> receta.
    Dict { dict_object: String },
}

impl RecipeEntry {
    pub fn reference(&self) -> &str {
        match self {
            RecipeEntry::Object { object, .. } => object,
            RecipeEntry::Dict { dict_object } => dict_object,
        }
    }
}

/// Separa `module:attr`.
pub fn parse_reference(reference: &str) -> Result<(&str, &str), RunnerError> {
    match reference.split_once(':') {
        Some((module, attr)) if !module.trim().is_empty() && !attr.trim().is_empty() => Ok((module.trim(), attr.trim())),
        _ => Err(RunnerError::Config(format!("recipe reference {reference:?} must look like module:attr"))),
    }
}

/// Busca `feedstock/meta.yaml` y, si no está, `meta.yaml` en la raíz.
pub fn find_meta(checkout: &Path) -> Option<PathBuf> {
    [checkout.join("feedstock").join("meta.yaml"), checkout.join("meta.yaml")].into_iter()
                                                                              .find(|p| p.is_file())
}

impl FeedstockMeta {
    pub fn from_path(path: &Path) -> Result<Self, RunnerError> {
        let raw = std::fs::read_to_string(path).map_err(|e| RunnerError::Config(format!("{}: {e}", path.display())))?;
        serde_yaml::from_str(&raw).map_err(|e| RunnerError::Config(format!("{}: {e}", path.display())))
    }
}
