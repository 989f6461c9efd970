//! forge-bakery: backends de ejecución intercambiables.
//!
//! - `LocalDirectBakery`: ejecución en proceso sobre un pool `rayon`.
//! - `DistributedBakery`: envío a un runner remoto por HTTP y polling.
//!
//! `dispatch::run_job` envuelve cualquier bakery y emite los eventos de
//! inicio y de estado terminal.

pub mod bakery;
pub mod config;
pub mod dispatch;
pub mod distributed;
pub mod local;
pub mod registry;

pub use bakery::{BakeJob, BakeOutcome, Bakery};
pub use config::{BakeryConfig, DistributedBakeryConfig, LocalBakeryConfig};
pub use dispatch::run_job;
pub use distributed::DistributedBakery;
pub use local::LocalDirectBakery;
pub use registry::{build_bakery, canonical_name};
