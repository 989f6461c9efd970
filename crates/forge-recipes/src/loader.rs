//! Carga del namespace declarativo de un feedstock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use forge_core::{NamespaceLoader, RecipeCatalog, RunnerError};

use crate::meta::{find_meta, parse_reference, FeedstockMeta, RecipeEntry};
use crate::recipe::{module_error, IndexedRecipe, RecipeDefinition};

const MODULE_EXTENSIONS: [&str; 4] = ["yaml", "yml", "json", "toml"];

#[derive(Debug, Clone, Default)]
pub struct DeclarativeNamespaceLoader;

impl DeclarativeNamespaceLoader {
    pub fn new() -> Self {
        Self
    }
}

/// Módulos ya parseados durante una carga.
struct ModuleCache {
    dir: PathBuf,
    loaded: HashMap<String, Value>,
}

impl ModuleCache {
    fn get(&mut self, module: &str) -> Result<&Value, RunnerError> {
        if !self.loaded.contains_key(module) {
            let doc = load_module(&self.dir, module)?;
            self.loaded.insert(module.to_string(), doc);
        }
        self.loaded
            .get(module)
            .ok_or_else(|| module_error(module, "module vanished from cache"))
    }
}

fn load_module(dir: &Path, module: &str) -> Result<Value, RunnerError> {
    if module.contains(['/', '\\']) || module.contains("..") {
        return Err(module_error(module, "module names must not contain path separators"));
    }
    let path = MODULE_EXTENSIONS.iter()
                                .map(|ext| dir.join(format!("{module}.{ext}")))
                                .find(|p| p.is_file())
                                .ok_or_else(|| module_error(module, format!("not found in {}", dir.display())))?;
    let raw = std::fs::read_to_string(&path).map_err(|e| module_error(module, e))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    log::debug!("loading recipe module {}", path.display());
    match ext {
        "json" => serde_json::from_str(&raw).map_err(|e| module_error(module, e)),
        "toml" => toml::from_str(&raw).map_err(|e| module_error(module, e)),
        _ => serde_yaml::from_str(&raw).map_err(|e| module_error(module, e)),
    }
}

fn build_recipe(module: &str, id: &str, raw: &Value, base: &Path) -> Result<IndexedRecipe, RunnerError> {
    let def: RecipeDefinition = serde_json::from_value(raw.clone()).map_err(|e| module_error(module, format!("recipe {id}: {e}")))?;
    IndexedRecipe::from_definition(id, def, base).map_err(|e| module_error(module, e))
}

impl NamespaceLoader for DeclarativeNamespaceLoader {
    fn load(&self, checkout: &Path) -> Result<RecipeCatalog, RunnerError> {
        let meta_path = find_meta(checkout).ok_or_else(|| {
                            RunnerError::Config(format!("no feedstock/meta.yaml or meta.yaml in {}", checkout.display()))
                        })?;
        let meta = FeedstockMeta::from_path(&meta_path)?;
        let base = meta_path.parent().map(Path::to_path_buf).unwrap_or_else(|| checkout.to_path_buf());
        let mut modules = ModuleCache { dir: base.clone(),
                                        loaded: HashMap::new() };
        let mut catalog = RecipeCatalog::new();

        for entry in &meta.recipes {
            let (module, attr) = parse_reference(entry.reference())?;
            let doc = modules.get(module)?;
            let value = doc.get(attr).ok_or_else(|| module_error(module, format!("has no attribute {attr}")))?;

            let recipes: Vec<(String, IndexedRecipe)> = match entry {
                RecipeEntry::Object { id, .. } => vec![(id.clone(), build_recipe(module, id, value, &base)?)],
                RecipeEntry::Dict { .. } => {
                    let map = value.as_object()
                                   .ok_or_else(|| module_error(module, format!("{attr} must be a mapping of recipe id to recipe")))?;
                    map.iter()
                       .map(|(id, raw)| Ok((id.clone(), build_recipe(module, id, raw, &base)?)))
                       .collect::<Result<_, RunnerError>>()?
                }
            };
            for (id, recipe) in recipes {
                catalog.insert(id, recipe.into()).map_err(|e| module_error(module, e))?;
            }
        }
        log::info!("discovered {} recipes in {}", catalog.len(), meta_path.display());
        Ok(catalog)
    }
}
