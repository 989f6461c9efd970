//! Tipos de evento y estructura `JobEvent`.
//!
//! Rol en el run:
//! - Cada componente (fetch, parsing, dispatcher) crea eventos inmutables.
//! - Sólo el reporter (o un sink inyectado en tests) los consume.
//! - El orden causal dentro de una receta es
//!   `fetching -> parsing -> baking -> completed | failed`.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Fetching,
    Parsing,
    Baking,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Fetching => "fetching",
            JobStatus::Parsing => "parsing",
            JobStatus::Baking => "baking",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// `completed` y `failed` cierran la receta.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvent {
    pub status: JobStatus,
    pub message: String,
    pub job_name: Option<String>,
    pub recipe_id: Option<String>,
    #[serde(rename = "timestamp")]
    pub ts: DateTime<Utc>,
    /// Campos adicionales por estado (job_id, outputs, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobEvent {
    pub fn new(status: JobStatus, message: impl Into<String>) -> Self {
        Self { status,
               message: message.into(),
               job_name: None,
               recipe_id: None,
               ts: Utc::now(),
               extra: Map::new() }
    }

    pub fn fetching(message: impl Into<String>) -> Self {
        Self::new(JobStatus::Fetching, message)
    }

    pub fn parsing(message: impl Into<String>) -> Self {
        Self::new(JobStatus::Parsing, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(JobStatus::Failed, message)
    }

    /// Asocia el evento a una receta y su job.
    pub fn for_job(mut self, recipe_id: impl Into<String>, job_name: impl Into<String>) -> Self {
        self.recipe_id = Some(recipe_id.into());
        self.job_name = Some(job_name.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_stable_field_names() {
        let ev = JobEvent::new(JobStatus::Baking, "Running job for recipe gpcp\n").for_job("gpcp", "gh-a-b-c")
                                                                                   .with_field("work_items", 4);
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["status"], "baking");
        assert_eq!(v["job_name"], "gh-a-b-c");
        assert_eq!(v["recipe_id"], "gpcp");
        assert_eq!(v["work_items"], 4);
        assert!(v.get("timestamp").is_some());
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Baking.is_terminal());
    }
}
