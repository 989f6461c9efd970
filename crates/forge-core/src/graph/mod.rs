//! Contrato del grafo de pipeline y su plan de trabajo.

mod definition;
mod plan;

pub use definition::{GraphRef, PipelineGraph};
pub use plan::{TaskError, TaskFn, WorkItem, WorkPlan};
