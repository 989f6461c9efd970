//! Plan de trabajo: unidades con dependencias explícitas.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::errors::RunnerError;
use crate::storage::StorageConfig;
use crate::unwind;

pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// Cuerpo de una unidad de trabajo. Recibe el storage del run.
pub type TaskFn = Arc<dyn Fn(&StorageConfig) -> Result<(), TaskError> + Send + Sync>;

#[derive(Clone)]
pub struct WorkItem {
    pub key: String,
    pub depends_on: Vec<String>,
    pub task: TaskFn,
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
         .field("key", &self.key)
         .field("depends_on", &self.depends_on)
         .finish()
    }
}

impl WorkItem {
    pub fn new<F>(key: impl Into<String>, task: F) -> Self
        where F: Fn(&StorageConfig) -> Result<(), TaskError> + Send + Sync + 'static
    {
        Self { key: key.into(),
               depends_on: Vec::new(),
               task: Arc::new(task) }
    }

    pub fn after(mut self, dep: impl Into<String>) -> Self {
        self.depends_on.push(dep.into());
        self
    }

    /// Ejecuta la unidad. Un pánico del cuerpo se devuelve como error de la
    /// unidad.
    pub fn run(&self, storage: &StorageConfig) -> Result<(), TaskError> {
        match unwind::contain(|| (self.task)(storage)) {
            Ok(result) => result,
            Err(msg) => Err(format!("panicked: {msg}").into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkPlan {
    items: Vec<WorkItem>,
}

impl WorkPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: WorkItem) {
        self.items.push(item);
    }

    pub fn with(mut self, item: WorkItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Agrupa las unidades en niveles: cada unidad queda en un nivel
    /// posterior a todas sus dependencias. Dentro de un nivel se conserva el
    /// orden del plan.
    ///
    /// Errores: claves duplicadas, dependencias desconocidas o ciclos.
    pub fn levels(&self) -> Result<Vec<Vec<&WorkItem>>, RunnerError> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(self.items.len());
        for (i, item) in self.items.iter().enumerate() {
            if index.insert(item.key.as_str(), i).is_some() {
                return Err(RunnerError::InvalidPipeline(format!("duplicate work item {}", item.key)));
            }
        }
        for item in &self.items {
            if let Some(dep) = item.depends_on.iter().find(|d| !index.contains_key(d.as_str())) {
                return Err(RunnerError::InvalidPipeline(format!("work item {} depends on unknown item {dep}", item.key)));
            }
        }

        let mut done: HashSet<&str> = HashSet::with_capacity(self.items.len());
        let mut levels = Vec::new();
        while done.len() < self.items.len() {
            let level: Vec<&WorkItem> = self.items
                                            .iter()
                                            .filter(|it| !done.contains(it.key.as_str()))
                                            .filter(|it| it.depends_on.iter().all(|d| done.contains(d.as_str())))
                                            .collect();
            if level.is_empty() {
                let stuck: Vec<&str> = self.items
                                           .iter()
                                           .map(|it| it.key.as_str())
                                           .filter(|k| !done.contains(k))
                                           .collect();
                return Err(RunnerError::InvalidPipeline(format!("dependency cycle among {}", stuck.join(", "))));
            }
            done.extend(level.iter().map(|it| it.key.as_str()));
            levels.push(level);
        }
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(key: &str) -> WorkItem {
        WorkItem::new(key, |_| Ok(()))
    }

    fn keys(level: &[&WorkItem]) -> Vec<String> {
        level.iter().map(|i| i.key.clone()).collect()
    }

    #[test]
    fn levels_respect_dependencies() {
        let plan = WorkPlan::new().with(noop("finalize").after("store:0").after("store:1"))
                                  .with(noop("cache:0"))
                                  .with(noop("store:0").after("cache:0"))
                                  .with(noop("cache:1"))
                                  .with(noop("store:1").after("cache:1"));
        let levels = plan.levels().unwrap();
        assert_eq!(levels.len(), 3);
        assert_eq!(keys(&levels[0]), vec!["cache:0", "cache:1"]);
        assert_eq!(keys(&levels[1]), vec!["store:0", "store:1"]);
        assert_eq!(keys(&levels[2]), vec!["finalize"]);
    }

    #[test]
    fn unknown_dependency_and_cycles_are_rejected() {
        let plan = WorkPlan::new().with(noop("a").after("ghost"));
        assert!(plan.levels().unwrap_err().to_string().contains("unknown item ghost"));

        let plan = WorkPlan::new().with(noop("a").after("b")).with(noop("b").after("a")).with(noop("c"));
        let err = plan.levels().unwrap_err().to_string();
        assert!(err.contains("cycle among a, b"), "{err}");
    }

    #[test]
    fn panicking_body_is_an_item_error() {
        let storage = StorageConfig::resolve(Some(crate::StorageSpec::new("memory", "memory://plan-panic/")), None, None).unwrap();
        let item = WorkItem::new("store:0", |_| panic!("item panicked"));
        assert_eq!(item.run(&storage).unwrap_err().to_string(), "panicked: item panicked");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let plan = WorkPlan::new().with(noop("a")).with(noop("a"));
        assert!(matches!(plan.levels(), Err(RunnerError::InvalidPipeline(_))));
    }
}
