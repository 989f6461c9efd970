//! Identidad de job: nombre validado (`JobName`) y generador con cache
//! (`JobIdentity`).

mod identity;
mod name;

pub use identity::{FeedstockIdentity, JobIdentity};
pub use name::{validate_job_name, JobName};
