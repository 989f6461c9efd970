//! Registro clase de bakery -> constructor.
//!
//! Acepta nombres cortos, alias y nombres con puntos
//! (`pangeo_forge_runner.bakery.local.LocalDirectBakery`).

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::Value;

use forge_core::RunnerError;

use crate::config::{parse_section, BakeryConfig, DistributedBakeryConfig, LocalBakeryConfig};
use crate::{Bakery, DistributedBakery, LocalDirectBakery};

pub const LOCAL: &str = "LocalDirectBakery";
pub const DISTRIBUTED: &str = "DistributedBakery";

static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([(LOCAL, LOCAL),
                   ("local", LOCAL),
                   (DISTRIBUTED, DISTRIBUTED),
                   ("distributed", DISTRIBUTED),
                   ("remote", DISTRIBUTED)])
});

/// Nombre canónico de una clase, o `None` si no está registrada.
pub fn canonical_name(class: &str) -> Option<&'static str> {
    let short = class.rsplit('.').next().unwrap_or(class);
    ALIASES.get(short).copied()
}

impl BakeryConfig {
    /// Config tipada a partir de la clase y su sección.
    pub fn from_section(class: &str, section: Option<&Value>) -> Result<Self, RunnerError> {
        match canonical_name(class) {
            Some(LOCAL) => Ok(BakeryConfig::Local(parse_section::<LocalBakeryConfig>(LOCAL, section)?)),
            Some(DISTRIBUTED) => Ok(BakeryConfig::Distributed(parse_section::<DistributedBakeryConfig>(DISTRIBUTED, section)?)),
            _ => {
                let mut known: Vec<&str> = ALIASES.keys().copied().collect();
                known.sort();
                Err(RunnerError::Config(format!("unknown bakery class {class}; known: {}", known.join(", "))))
            }
        }
    }

    pub fn into_bakery(self) -> Result<Arc<dyn Bakery>, RunnerError> {
        Ok(match self {
               BakeryConfig::Local(cfg) => Arc::new(LocalDirectBakery::new(cfg)),
               BakeryConfig::Distributed(cfg) => Arc::new(DistributedBakery::new(cfg)?),
           })
    }
}

/// Resuelve la clase y construye la bakery.
pub fn build_bakery(class: &str, section: Option<&Value>) -> Result<Arc<dyn Bakery>, RunnerError> {
    let bakery = BakeryConfig::from_section(class, section)?.into_bakery()?;
    log::debug!("bakery class {class} resolved to {}", bakery.name());
    Ok(bakery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dotted_and_alias_names_resolve() {
        assert_eq!(canonical_name("pangeo_forge_runner.bakery.local.LocalDirectBakery"), Some(LOCAL));
        assert_eq!(canonical_name("remote"), Some(DISTRIBUTED));
        assert_eq!(canonical_name("FlinkOperatorBakery"), None);
    }

    #[test]
    fn builds_each_variant() {
        assert_eq!(build_bakery("local", Some(&json!({"num_workers": 2}))).unwrap().name(), LOCAL);
        assert_eq!(build_bakery(DISTRIBUTED, Some(&json!({"endpoint": "http://127.0.0.1:1"}))).unwrap().name(),
                   DISTRIBUTED);
    }

    #[test]
    fn unknown_class_lists_known_names() {
        let err = build_bakery("Nope", None).unwrap_err().to_string();
        assert!(err.contains("unknown bakery class Nope"));
        assert!(err.contains("LocalDirectBakery"));
    }
}
