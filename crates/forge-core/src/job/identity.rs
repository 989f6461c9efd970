//! Generador de identidad de job.
//!
//! Un `JobIdentity` vive lo que dura un run. Si el usuario asigna un nombre,
//! se valida en el momento. Si no, la primera lectura sintetiza uno a partir
//! del feedstock y lo cachea: todas las lecturas posteriores devuelven el
//! mismo valor.

use once_cell::sync::OnceCell;
use serde_json::json;
use uuid::Uuid;

use super::name::JobName;
use crate::constants::{JOB_NAME_MAX_LEN, JOB_NAME_SUFFIX_LEN, RECIPE_HASH_LEN};
use crate::errors::RunnerError;
use crate::hashing::{hash_value, sha256_hex};

/// Identidad de un feedstock derivada de su localizador (URL o ruta).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedstockIdentity {
    pub repo: String,
    pub git_ref: Option<String>,
    /// Prefijo de origen: `gh` (github.com), `gl` (gitlab.com), `local` o la
    /// primera etiqueta del host.
    pub origin: String,
    pub org: String,
    pub name: String,
}

impl FeedstockIdentity {
    pub fn from_repo(repo: &str, git_ref: Option<&str>) -> Self {
        let (host, path) = split_locator(repo);
        let mut segments: Vec<&str> = path.split(['/', '\\']).filter(|s| !s.is_empty()).collect();
        let name = segments.pop().map(|s| s.strip_suffix(".git").unwrap_or(s)).unwrap_or_default();
        let org = segments.pop().unwrap_or_default();

        let origin = match host.as_deref() {
            Some("github.com") => "gh".to_string(),
            Some("gitlab.com") => "gl".to_string(),
            Some(h) => {
                let label = slug(h.split('.').next().unwrap_or(h));
                if label.is_empty() { "remote".to_string() } else { label }
            }
            None => "local".to_string(),
        };

        Self { repo: repo.to_string(),
               git_ref: git_ref.map(str::to_string),
               origin,
               org: org.to_string(),
               name: name.to_string() }
    }
}

/// Separa host (si lo hay) y ruta de un localizador.
fn split_locator(repo: &str) -> (Option<String>, String) {
    if let Some((_, rest)) = repo.split_once("://") {
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        let host = authority.rsplit('@').next().unwrap_or(authority);
        let host = host.split(':').next().unwrap_or(host).to_ascii_lowercase();
        let host = if host.is_empty() { None } else { Some(host) };
        return (host, path.to_string());
    }
    // scp-like: git@github.com:org/name.git
    if let Some(rest) = repo.strip_prefix("git@") {
        if let Some((host, path)) = rest.split_once(':') {
            return (Some(host.to_ascii_lowercase()), path.to_string());
        }
    }
    (None, repo.to_string())
}

/// Minúsculas, todo lo que no sea `[a-z0-9]` pasa a `-`, guiones colapsados y
/// recortados en los extremos.
pub(crate) fn slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Recorta a `max` caracteres sin dejar separadores colgando.
fn truncate_clean(value: &str, max: usize) -> &str {
    let cut = if value.len() > max { &value[..max] } else { value };
    cut.trim_end_matches(['-', '_'])
}

#[derive(Debug)]
pub struct JobIdentity {
    feedstock: FeedstockIdentity,
    recipe_hint: Option<String>,
    nonce: String,
    explicit: Option<JobName>,
    synthesized: OnceCell<JobName>,
}

impl JobIdentity {
    pub fn new(feedstock: FeedstockIdentity) -> Self {
        Self { feedstock,
               recipe_hint: None,
               nonce: Uuid::new_v4().to_string(),
               explicit: None,
               synthesized: OnceCell::new() }
    }

    /// Fija el nonce del sufijo (sólo cambia nombres aún no sintetizados).
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = nonce.into();
        self
    }

    /// Receta cuyo id entra en el nombre sintetizado.
    pub fn with_recipe_hint(mut self, recipe_id: impl Into<String>) -> Self {
        self.recipe_hint = Some(recipe_id.into());
        self
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit.is_some()
    }

    /// Asigna un nombre explícito. Si no cumple la gramática se devuelve el
    /// error y el valor previo no cambia.
    pub fn set_job_name(&mut self, value: &str) -> Result<(), RunnerError> {
        let name = JobName::new(value)?;
        self.explicit = Some(name);
        Ok(())
    }

    /// Nombre explícito o, si no hay, el sintetizado (cacheado tras la
    /// primera lectura).
    pub fn job_name(&self) -> Result<JobName, RunnerError> {
        if let Some(name) = &self.explicit {
            return Ok(name.clone());
        }
        self.synthesized.get_or_try_init(|| self.synthesize()).cloned()
    }

    /// Nombre para una receta concreta de un run que seleccionó `selected`
    /// recetas. Con más de una, cada receta recibe un hash corto de su id
    /// para que los nombres no colisionen.
    pub fn for_recipe(&self, recipe_id: &str, selected: usize) -> Result<JobName, RunnerError> {
        let base = self.job_name()?;
        if selected <= 1 {
            return Ok(base);
        }
        let digest = sha256_hex(recipe_id);
        let keep = JOB_NAME_MAX_LEN - 1 - RECIPE_HASH_LEN;
        JobName::new(format!("{}-{}", truncate_clean(base.as_str(), keep), &digest[..RECIPE_HASH_LEN]))
    }

    fn synthesize(&self) -> Result<JobName, RunnerError> {
        let fs = &self.feedstock;
        let recipe = self.recipe_hint.as_deref().unwrap_or_default();
        let parts: Vec<String> = [fs.origin.as_str(), fs.org.as_str(), fs.name.as_str(), recipe].iter()
                                                                                                .map(|p| slug(p))
                                                                                                .filter(|p| !p.is_empty())
                                                                                                .collect();
        let head = parts.join("-");
        let suffix = hash_value(&json!({
            "repo": fs.repo,
            "ref": fs.git_ref,
            "recipe": recipe,
            "nonce": self.nonce,
        }));
        let max_head = JOB_NAME_MAX_LEN - 1 - JOB_NAME_SUFFIX_LEN;
        let candidate = format!("{}-{}", truncate_clean(&head, max_head), &suffix[..JOB_NAME_SUFFIX_LEN]);
        log::debug!("synthesized job name {candidate} for {}", fs.repo);
        JobName::new(candidate)
    }
}
