use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use forge_core::{EventSink, GraphRef, JobName, RunnerError, StorageConfig};

/// Todo lo que una bakery necesita para ejecutar una receta.
#[derive(Debug, Clone)]
pub struct BakeJob {
    pub recipe_id: String,
    pub job_name: JobName,
    pub graph: GraphRef,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BakeOutcome {
    pub job_name: String,
    pub recipe_id: String,
    /// Id asignado por el runner remoto, si lo hay.
    pub job_id: Option<String>,
    pub outputs: Vec<String>,
    pub items_run: usize,
}

impl BakeOutcome {
    pub fn for_job(job: &BakeJob) -> Self {
        Self { job_name: job.job_name.to_string(),
               recipe_id: job.recipe_id.clone(),
               job_id: None,
               outputs: Vec::new(),
               items_run: 0 }
    }
}

/// Backend de ejecución. Lleva el grafo hasta completarse o fallar.
///
/// Un error devuelto es terminal para la receta; el dispatcher lo convierte
/// en el evento `failed`.
#[async_trait]
pub trait Bakery: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    async fn bake(&self, job: &BakeJob, sink: &dyn EventSink, cancel: CancellationToken) -> Result<BakeOutcome, RunnerError>;
}
