//! Bakery local: ejecuta el plan en proceso sobre un pool `rayon`.
//!
//! El plan se recorre por niveles de dependencia. Dentro de un nivel las
//! unidades corren en paralelo; el primer fallo cancela el token hijo y las
//! unidades que aún no empezaron se saltan. Sólo se informa el primer fallo.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use forge_core::{EventSink, RunnerError, StorageConfig, WorkItem};

use crate::config::LocalBakeryConfig;
use crate::registry::LOCAL;
use crate::{BakeJob, BakeOutcome, Bakery};

#[derive(Debug, Clone)]
pub struct LocalDirectBakery {
    num_workers: usize,
}

impl LocalDirectBakery {
    pub fn new(config: LocalBakeryConfig) -> Self {
        Self { num_workers: config.workers() }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }
}

fn run_levels(levels: Vec<Vec<WorkItem>>,
              storage: StorageConfig,
              workers: usize,
              cancel: CancellationToken,
              job_name: &str)
              -> Result<usize, RunnerError> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers)
                                              .thread_name(|i| format!("forge-local-{i}"))
                                              .build()
                                              .map_err(|e| RunnerError::Internal(format!("local worker pool: {e}")))?;
    let first_failure: Mutex<Option<String>> = Mutex::new(None);
    let ran = AtomicUsize::new(0);

    for level in &levels {
        if cancel.is_cancelled() {
            break;
        }
        pool.install(|| {
                level.par_iter().for_each(|item| {
                                    if cancel.is_cancelled() {
                                        return;
                                    }
                                    match item.run(&storage) {
                                        Ok(()) => {
                                            ran.fetch_add(1, Ordering::SeqCst);
                                        }
                                        Err(e) => {
                                            let mut slot = first_failure.lock().unwrap_or_else(|p| p.into_inner());
                                            if slot.is_none() {
                                                *slot = Some(format!("work item {} failed: {e}", item.key));
                                                cancel.cancel();
                                            } else {
                                                log::debug!("suppressed later failure in {}: {e}", item.key);
                                            }
                                        }
                                    }
                                })
            });
    }

    if let Some(cause) = first_failure.into_inner().unwrap_or_else(|p| p.into_inner()) {
        return Err(RunnerError::execution(job_name, cause));
    }
    if cancel.is_cancelled() {
        return Err(RunnerError::execution(job_name, "cancelled"));
    }
    Ok(ran.into_inner())
}

#[async_trait]
impl Bakery for LocalDirectBakery {
    fn name(&self) -> &'static str {
        LOCAL
    }

    async fn bake(&self, job: &BakeJob, _sink: &dyn EventSink, cancel: CancellationToken) -> Result<BakeOutcome, RunnerError> {
        let plan = job.graph.plan();
        let levels: Vec<Vec<WorkItem>> = plan.levels()?
                                             .into_iter()
                                             .map(|level| level.into_iter().cloned().collect())
                                             .collect();
        log::info!("running {} work items of {} in {} levels on {} workers",
                   plan.len(),
                   job.recipe_id,
                   levels.len(),
                   self.num_workers);

        let storage = job.storage.clone();
        let workers = self.num_workers;
        let job_name = job.job_name.to_string();
        let child = cancel.child_token();
        let items_run = tokio::task::spawn_blocking(move || run_levels(levels, storage, workers, child, &job_name))
            .await
            .map_err(|e| RunnerError::Internal(format!("local bakery worker join failed: {e}")))??;

        let mut outcome = BakeOutcome::for_job(job);
        outcome.items_run = items_run;
        outcome.outputs = job.graph.output_locations(&job.storage);
        Ok(outcome)
    }
}
