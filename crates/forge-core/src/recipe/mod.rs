//! Catálogo de recetas de un feedstock y su resolución.

mod catalog;
mod resolver;

pub use catalog::RecipeCatalog;
pub use resolver::{resolve_recipes, select_recipes, NamespaceLoader};
