//! Parámetros de cada bakery, leídos de su sección en el archivo de
//! configuración.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use forge_core::RunnerError;

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_poll_errors() -> u32 {
    5
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalBakeryConfig {
    /// Tamaño del pool. `None` = paralelismo disponible.
    pub num_workers: Option<usize>,
}

impl LocalBakeryConfig {
    pub fn workers(&self) -> usize {
        self.num_workers
            .filter(|n| *n > 0)
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistributedBakeryConfig {
    pub endpoint: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_max_poll_errors")]
    pub max_poll_errors: u32,
}

impl DistributedBakeryConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(),
               region: None,
               auth_token: None,
               poll_interval_ms: default_poll_interval_ms(),
               timeout_secs: None,
               max_poll_errors: default_max_poll_errors() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BakeryConfig {
    Local(LocalBakeryConfig),
    Distributed(DistributedBakeryConfig),
}

/// Parsea una sección; ausente equivale a `{}`.
pub(crate) fn parse_section<T: for<'de> Deserialize<'de>>(class: &str, section: Option<&Value>) -> Result<T, RunnerError> {
    let value = section.cloned().unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(value).map_err(|e| RunnerError::Config(format!("{class}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn distributed_defaults() {
        let cfg: DistributedBakeryConfig = parse_section("DistributedBakery", Some(&json!({"endpoint": "http://r"}))).unwrap();
        assert_eq!(cfg.poll_interval_ms, 2000);
        assert_eq!(cfg.max_poll_errors, 5);
        assert_eq!(cfg.timeout_secs, None);
    }

    #[test]
    fn missing_endpoint_and_unknown_fields_fail() {
        let err = parse_section::<DistributedBakeryConfig>("DistributedBakery", None).unwrap_err();
        assert!(err.to_string().contains("endpoint"));
        assert!(parse_section::<LocalBakeryConfig>("LocalDirectBakery", Some(&json!({"workers": 2}))).is_err());
    }

    #[test]
    fn local_workers_fall_back_to_parallelism() {
        assert_eq!(LocalBakeryConfig { num_workers: Some(3) }.workers(), 3);
        assert!(LocalBakeryConfig { num_workers: Some(0) }.workers() >= 1);
        assert!(LocalBakeryConfig::default().workers() >= 1);
    }
}
