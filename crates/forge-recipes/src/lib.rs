//! forge-recipes: recetas declarativas indexadas.
//!
//! Un feedstock declara sus recetas en `feedstock/meta.yaml`; cada entrada
//! apunta a un módulo (`feedstock/<module>.yaml|.yml|.json|.toml`) y a una
//! clave dentro de él. Una receta copia cada fuente a la cache de entrada y
//! escribe un registro por unidad en el target.

pub mod loader;
pub mod meta;
pub mod recipe;

pub use loader::DeclarativeNamespaceLoader;
pub use meta::{FeedstockMeta, RecipeEntry};
pub use recipe::{IndexedRecipe, KeyRange, RecipeDefinition};
