//! forge-core: dispatch de ejecución de feedstocks.
//!
//! Tipos compartidos por el resto del workspace: errores, identidad de job,
//! storage, contrato de grafo, poda, catálogo de recetas y eventos.
pub mod constants;
pub mod errors;
pub mod event;
pub mod graph;
pub mod hashing;
pub mod job;
pub mod prune;
pub mod recipe;
pub mod report;
pub mod storage;
mod unwind;

pub use errors::RunnerError;
pub use event::{EventSink, InMemoryEventSink, JobEvent, JobStatus};
pub use graph::{GraphRef, PipelineGraph, TaskError, WorkItem, WorkPlan};
pub use job::{FeedstockIdentity, JobIdentity, JobName};
pub use prune::PrunePolicy;
pub use recipe::{resolve_recipes, select_recipes, NamespaceLoader, RecipeCatalog};
pub use report::{OutputFormat, Reporter};
pub use storage::{StorageConfig, StorageHandle, StorageRole, StorageSpec};
