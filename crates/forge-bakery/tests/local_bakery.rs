use std::sync::{Arc, Mutex};

use forge_bakery::{run_job, BakeJob, Bakery, LocalBakeryConfig, LocalDirectBakery};
use forge_core::{GraphRef, InMemoryEventSink, JobName, JobStatus, PipelineGraph, RunnerError, StorageConfig, StorageSpec,
                 WorkItem, WorkPlan};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

type Log = Arc<Mutex<Vec<String>>>;

/// Grafo de prueba: `(key, deps, falla)` por unidad, registra el orden de
/// los items que llegaron a ejecutarse.
#[derive(Debug)]
struct Scripted {
    items: Vec<(&'static str, Vec<&'static str>, bool)>,
    log: Log,
}

impl PipelineGraph for Scripted {
    fn id(&self) -> &str {
        "scripted"
    }
    fn unit_count(&self) -> usize {
        self.items.len()
    }
    fn bounded(&self, bound: usize) -> GraphRef {
        Arc::new(Scripted { items: self.items.iter().take(bound).cloned().collect(),
                            log: Arc::clone(&self.log) })
    }
    fn plan(&self) -> WorkPlan {
        let mut plan = WorkPlan::new();
        for (key, deps, fails) in &self.items {
            let log = Arc::clone(&self.log);
            let (key, fails) = (*key, *fails);
            let mut item = WorkItem::new(key, move |_storage: &StorageConfig| {
                log.lock().unwrap().push(key.to_string());
                if fails {
                    Err(format!("{key} exploded").into())
                } else {
                    Ok(())
                }
            });
            for d in deps {
                item = item.after(*d);
            }
            plan.push(item);
        }
        plan
    }
    fn describe(&self) -> Value {
        json!({ "items": self.items.len() })
    }
    fn output_locations(&self, storage: &StorageConfig) -> Vec<String> {
        vec![storage.target.url("scripted")]
    }
}

fn job(graph: GraphRef) -> BakeJob {
    BakeJob { recipe_id: "scripted".into(),
              job_name: JobName::new("local-bakery-test").unwrap(),
              graph,
              storage: StorageConfig::resolve(Some(StorageSpec::new("memory", "memory://local-bakery/")), None, None).unwrap() }
}

fn bakery(workers: usize) -> LocalDirectBakery {
    LocalDirectBakery::new(LocalBakeryConfig { num_workers: Some(workers) })
}

#[tokio::test]
async fn dependents_run_after_dependencies() {
    let log: Log = Arc::default();
    let graph = Arc::new(Scripted { items: vec![("final", vec!["b", "c"], false),
                                                ("a", vec![], false),
                                                ("b", vec!["a"], false),
                                                ("c", vec!["a"], false)],
                                    log: Arc::clone(&log) });
    let sink = InMemoryEventSink::new();
    let outcome = run_job(&bakery(4), &job(graph), &sink, CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.items_run, 4);
    assert_eq!(outcome.outputs, vec!["memory://local-bakery/scripted".to_string()]);
    let order = log.lock().unwrap().clone();
    let pos = |k: &str| order.iter().position(|x| x == k).unwrap();
    assert_eq!(pos("a"), 0);
    assert!(pos("b") < pos("final") && pos("c") < pos("final"));
    assert_eq!(sink.statuses(), vec![JobStatus::Baking, JobStatus::Completed]);
}

#[tokio::test]
async fn first_failure_is_the_only_cause_and_stops_pending_items() {
    let log: Log = Arc::default();
    let graph = Arc::new(Scripted { items: vec![("boom", vec![], true),
                                                ("later", vec![], true),
                                                ("dependent", vec!["boom"], false)],
                                    log: Arc::clone(&log) });
    let sink = InMemoryEventSink::new();
    let err = run_job(&bakery(1), &job(graph), &sink, CancellationToken::new()).await.unwrap_err();

    match &err {
        RunnerError::BackendExecution { job_name, cause } => {
            assert_eq!(job_name, "local-bakery-test");
            assert_eq!(cause, "work item boom failed: boom exploded");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(log.lock().unwrap().clone(), vec!["boom".to_string()]);
    assert_eq!(sink.statuses(), vec![JobStatus::Baking, JobStatus::Failed]);
}

#[tokio::test]
async fn cancelled_token_prevents_any_work() {
    let log: Log = Arc::default();
    let graph = Arc::new(Scripted { items: vec![("a", vec![], false)],
                                    log: Arc::clone(&log) });
    let cancel = CancellationToken::new();
    cancel.cancel();
    let sink = InMemoryEventSink::new();
    let err = bakery(2).bake(&job(graph), &sink, cancel).await.unwrap_err();
    assert!(err.to_string().contains("cancelled"));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_plan_fails_before_running() {
    let log: Log = Arc::default();
    let graph = Arc::new(Scripted { items: vec![("a", vec!["ghost"], false)],
                                    log: Arc::clone(&log) });
    let sink = InMemoryEventSink::new();
    let err = bakery(2).bake(&job(graph), &sink, CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, RunnerError::InvalidPipeline(_)));
    assert!(log.lock().unwrap().is_empty());
}

/// Grafo con una unidad que entra en pánico antes que el resto.
#[derive(Debug)]
struct Panicking {
    log: Log,
}

impl PipelineGraph for Panicking {
    fn id(&self) -> &str {
        "panicking"
    }
    fn unit_count(&self) -> usize {
        2
    }
    fn bounded(&self, _bound: usize) -> GraphRef {
        Arc::new(Panicking { log: Arc::clone(&self.log) })
    }
    fn plan(&self) -> WorkPlan {
        let log = Arc::clone(&self.log);
        WorkPlan::new().with(WorkItem::new("cache:0", |_| panic!("item panicked")))
                       .with(WorkItem::new("cache:1", move |_| {
                           log.lock().unwrap().push("cache:1".to_string());
                           Ok(())
                       }))
    }
    fn describe(&self) -> Value {
        json!({ "items": 2 })
    }
    fn output_locations(&self, storage: &StorageConfig) -> Vec<String> {
        vec![storage.target.url("panicking")]
    }
}

#[tokio::test]
async fn panicking_item_is_an_execution_failure() {
    let log: Log = Arc::default();
    let sink = InMemoryEventSink::new();
    let err = run_job(&bakery(1), &job(Arc::new(Panicking { log: Arc::clone(&log) })), &sink, CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err,
               RunnerError::BackendExecution { job_name: "local-bakery-test".into(),
                                               cause: "work item cache:0 failed: panicked: item panicked".into() });
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(sink.statuses(), vec![JobStatus::Baking, JobStatus::Failed]);
}
