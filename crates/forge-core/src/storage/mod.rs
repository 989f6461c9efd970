//! Storage: roles, handles perezosos y backends de filesystem.
//!
//! Un `StorageHandle` es la tripleta declarativa (clase, args, root) más un
//! backend que se construye en el primer uso. El resolver arma los tres roles
//! de un run (`StorageConfig`).

mod config;
mod error;
mod fs;
mod handle;
mod http;
mod local;
mod memory;
pub mod registry;
mod role;

pub use config::{default_cache_spec, StorageConfig};
pub use error::StorageError;
pub use fs::FileSystem;
pub use handle::{join_path, StorageHandle, StorageSpec};
pub use http::HttpFileSystem;
pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;
pub use role::StorageRole;
