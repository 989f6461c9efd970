//! forge-runner
//!
//! Fachada del workspace: reexporta los crates para quien quiera usar el
//! runner como librería.
//! - `forge_core`: errores, identidad de job, storage, grafo, poda, eventos.
//! - `forge_recipes`: recetas declarativas.
//! - `forge_bakery`: backends de ejecución y dispatcher.
//! - `forge_cli`: configuración, content providers y comando `bake`.

pub use forge_bakery;
pub use forge_cli;
pub use forge_core;
pub use forge_recipes;

pub use forge_bakery::{run_job, BakeJob, BakeOutcome, Bakery};
pub use forge_core::{JobEvent, JobName, JobStatus, OutputFormat, PipelineGraph, Reporter, RunnerError, StorageConfig};
