use std::path::Path;
use std::sync::Arc;

use super::RecipeCatalog;
use crate::errors::RunnerError;
use crate::graph::GraphRef;

/// Carga el namespace de definiciones de un feedstock ya descargado.
pub trait NamespaceLoader: Send + Sync {
    fn load(&self, checkout: &Path) -> Result<RecipeCatalog, RunnerError>;
}

/// Selecciona recetas del catálogo.
///
/// - `None`: todas, en orden de catálogo.
/// - `Some(id)` inexistente: `RecipeNotFound` con los ids válidos ordenados.
/// - `Some(id)` existente: sólo esa.
pub fn select_recipes(catalog: &RecipeCatalog, requested: Option<&str>) -> Result<Vec<(String, GraphRef)>, RunnerError> {
    match requested {
        None => Ok(catalog.iter().map(|(id, g)| (id.clone(), Arc::clone(g))).collect()),
        Some(id) => match catalog.get(id) {
            Some(g) => Ok(vec![(id.to_string(), Arc::clone(g))]),
            None => Err(RunnerError::RecipeNotFound { requested: id.to_string(),
                                                      available: catalog.sorted_ids() }),
        },
    }
}

/// Carga el catálogo del checkout y selecciona.
pub fn resolve_recipes(loader: &dyn NamespaceLoader,
                       checkout: &Path,
                       requested: Option<&str>)
                       -> Result<Vec<(String, GraphRef)>, RunnerError> {
    let catalog = loader.load(checkout)?;
    log::debug!("loaded {} recipes from {}", catalog.len(), checkout.display());
    select_recipes(&catalog, requested)
}
