//! Errores del runner.
//!
//! Una única taxonomía compartida por todos los crates del workspace. Todas
//! las variantes son fatales para el run en curso: el dispatcher las
//! convierte en el último `JobEvent` (`failed`) y la CLI sale con código 1.

use thiserror::Error;

use crate::constants::JOB_NAME_PATTERN;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RunnerError {
    /// Ningún content provider pudo manejar el repo, o el fetch falló.
    #[error("Could not fetch {repo}: {detail}")]
    Fetch { repo: String, detail: String },

    /// El `recipe_id` pedido no existe en el catálogo.
    #[error("recipe_id='{requested}' not in [{}]", quoted_list(.available))]
    RecipeNotFound { requested: String, available: Vec<String> },

    /// El `job_name` no cumple la gramática. El formato es contrato.
    #[error("job_name must match the regex {}, instead found {value}", JOB_NAME_PATTERN)]
    InvalidJobName { value: String },

    /// Clase de backend desconocida o rol obligatorio ausente.
    #[error("storage {role} is misconfigured: {reason}")]
    StorageMisconfigured { role: String, reason: String },

    /// La bakery distribuida rechazó el job antes de empezar.
    #[error("job submission failed: {0}")]
    BackendSubmission(String),

    /// Fallo durante o después del inicio de la ejecución.
    #[error("job {job_name} failed: {cause}")]
    BackendExecution { job_name: String, cause: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl RunnerError {
    pub fn execution(job_name: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::BackendExecution { job_name: job_name.into(),
                                 cause: cause.into() }
    }
}

/// Lista con comillas simples, `['a', 'b']` sin corchetes.
fn quoted_list(items: &[String]) -> String {
    items.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_not_found_lists_valid_ids() {
        let err = RunnerError::RecipeNotFound { requested: "invalid_recipe_id".into(),
                                                available: vec!["gpcp-from-gcs".into()] };
        assert_eq!(err.to_string(), "recipe_id='invalid_recipe_id' not in ['gpcp-from-gcs']");
    }

    #[test]
    fn invalid_job_name_echoes_grammar_and_value() {
        let err = RunnerError::InvalidJobName { value: "Valid-Job".into() };
        assert_eq!(err.to_string(),
                   "job_name must match the regex ^[a-z][-_0-9a-z]{0,62}$, instead found Valid-Job");
    }

    #[test]
    fn execution_helper_keeps_cause_verbatim() {
        let err = RunnerError::execution("job-a", "worker 3: disk full");
        assert_eq!(err.to_string(), "job job-a failed: worker 3: disk full");
    }
}
