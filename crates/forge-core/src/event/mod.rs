//! Eventos de ciclo de vida de un job y trait `EventSink`.

mod sink;
mod types;

pub use sink::{EventSink, InMemoryEventSink};
pub use types::{JobEvent, JobStatus};
