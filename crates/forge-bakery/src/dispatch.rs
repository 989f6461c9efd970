use serde_json::Value;
use tokio_util::sync::CancellationToken;

use forge_core::{EventSink, JobEvent, JobStatus, RunnerError};

use crate::{BakeJob, BakeOutcome, Bakery};

/// Ejecuta `job` en `bakery` emitiendo `baking` al empezar y `completed` o
/// `failed` al terminar. El error se devuelve tal cual tras emitirlo.
pub async fn run_job(bakery: &dyn Bakery,
                     job: &BakeJob,
                     sink: &dyn EventSink,
                     cancel: CancellationToken)
                     -> Result<BakeOutcome, RunnerError> {
    let recipe_id = job.recipe_id.as_str();
    let job_name = job.job_name.as_str();

    sink.emit(JobEvent::new(JobStatus::Baking, format!("Running job for recipe {recipe_id}\n")).for_job(recipe_id, job_name)
                                                                                              .with_field("bakery", bakery.name())
                                                                                              .with_field("work_items", job.graph.plan().len()));

    match bakery.bake(job, sink, cancel).await {
        Ok(outcome) => {
            let outputs: Vec<Value> = outcome.outputs.iter().cloned().map(Value::from).collect();
            let mut ev = JobEvent::new(JobStatus::Completed, format!("Job {job_name} for recipe {recipe_id} completed\n"))
                .for_job(recipe_id, job_name)
                .with_field("outputs", outputs)
                .with_field("items_run", outcome.items_run);
            if let Some(id) = &outcome.job_id {
                ev = ev.with_field("job_id", id.clone());
            }
            sink.emit(ev);
            Ok(outcome)
        }
        Err(err) => {
            log::error!("recipe {recipe_id} failed: {err}");
            sink.emit(JobEvent::failed(format!("{err}\n")).for_job(recipe_id, job_name));
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use forge_core::{GraphRef, InMemoryEventSink, JobName, PipelineGraph, StorageConfig, StorageSpec, WorkPlan};
    use serde_json::json;

    #[derive(Debug)]
    struct Empty;

    impl PipelineGraph for Empty {
        fn id(&self) -> &str {
            "empty"
        }
        fn unit_count(&self) -> usize {
            0
        }
        fn bounded(&self, _bound: usize) -> GraphRef {
            Arc::new(Empty)
        }
        fn plan(&self) -> WorkPlan {
            WorkPlan::new()
        }
        fn describe(&self) -> Value {
            json!({})
        }
        fn output_locations(&self, storage: &StorageConfig) -> Vec<String> {
            vec![storage.target.url("empty")]
        }
    }

    #[derive(Debug)]
    struct Scripted(Result<(), RunnerError>);

    #[async_trait]
    impl Bakery for Scripted {
        fn name(&self) -> &'static str {
            "Scripted"
        }
        async fn bake(&self, job: &BakeJob, _sink: &dyn EventSink, _cancel: CancellationToken) -> Result<BakeOutcome, RunnerError> {
            self.0.clone().map(|_| {
                              let mut o = BakeOutcome::for_job(job);
                              o.job_id = Some("remote-1".into());
                              o
                          })
        }
    }

    fn job() -> BakeJob {
        BakeJob { recipe_id: "gpcp".into(),
                  job_name: JobName::new("gh-test-gpcp").unwrap(),
                  graph: Arc::new(Empty),
                  storage: StorageConfig::resolve(Some(StorageSpec::new("memory", "memory://dispatch/")), None, None).unwrap() }
    }

    #[tokio::test]
    async fn success_emits_baking_then_completed() {
        let sink = InMemoryEventSink::new();
        run_job(&Scripted(Ok(())), &job(), &sink, CancellationToken::new()).await.unwrap();
        assert_eq!(sink.statuses(), vec![JobStatus::Baking, JobStatus::Completed]);
        let events = sink.events();
        assert_eq!(events[0].message, "Running job for recipe gpcp\n");
        assert_eq!(events[0].job_name.as_deref(), Some("gh-test-gpcp"));
        assert_eq!(events[1].extra["job_id"], "remote-1");
    }

    #[tokio::test]
    async fn failure_emits_failed_and_returns_error() {
        let sink = InMemoryEventSink::new();
        let err = run_job(&Scripted(Err(RunnerError::execution("gh-test-gpcp", "disk full"))),
                          &job(),
                          &sink,
                          CancellationToken::new()).await
                                                   .unwrap_err();
        assert_eq!(err.to_string(), "job gh-test-gpcp failed: disk full");
        let last = sink.events().pop().unwrap();
        assert_eq!(last.status, JobStatus::Failed);
        assert_eq!(last.recipe_id.as_deref(), Some("gpcp"));
    }
}
