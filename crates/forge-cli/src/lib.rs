//! forge-cli: capa de línea de comandos de `forge-runner`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod fetch;
pub mod logging;
