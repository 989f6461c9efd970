use indexmap::IndexMap;

use crate::errors::RunnerError;
use crate::graph::GraphRef;

/// recipe-id -> grafo, en orden de descubrimiento. Se arma una vez por
/// checkout y no cambia después.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    entries: IndexMap<String, GraphRef>,
}

impl RecipeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserta una receta. Claves vacías o repetidas son un error.
    pub fn insert(&mut self, id: impl Into<String>, graph: GraphRef) -> Result<(), RunnerError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(RunnerError::InvalidPipeline("recipe id must not be empty".into()));
        }
        if self.entries.contains_key(&id) {
            return Err(RunnerError::InvalidPipeline(format!("duplicate recipe id {id}")));
        }
        self.entries.insert(id, graph);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&GraphRef> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &GraphRef)> {
        self.entries.iter()
    }

    /// Ids ordenados alfabéticamente (para mensajes de error).
    pub fn sorted_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }
}
