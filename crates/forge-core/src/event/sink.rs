use std::sync::Mutex;

use super::{JobEvent, JobStatus};

/// Consumidor de eventos. Se pasa explícitamente a quien emite.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: JobEvent);
}

/// Sink que acumula en memoria (orden de emisión). Pensado para tests.
#[derive(Debug, Default)]
pub struct InMemoryEventSink {
    inner: Mutex<Vec<JobEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<JobEvent> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn statuses(&self) -> Vec<JobStatus> {
        self.events().iter().map(|e| e.status).collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn emit(&self, event: JobEvent) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }
}
