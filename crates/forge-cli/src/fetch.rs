//! Content providers: traen el feedstock a un directorio local.
//!
//! Se prueban en orden y gana el primer `detect` positivo.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use forge_core::{EventSink, JobEvent, RunnerError};

/// Checkout listo para leer. Si vive en un directorio temporal, se borra al
/// soltar el valor.
#[derive(Debug)]
pub struct Checkout {
    path: PathBuf,
    _tmp: Option<TempDir>,
}

impl Checkout {
    pub fn in_place(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(),
               _tmp: None }
    }

    pub fn temporary(tmp: TempDir) -> Self {
        Self { path: tmp.path().to_path_buf(),
               _tmp: Some(tmp) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub trait ContentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, repo: &str) -> bool;

    /// Descarga `repo`. Las líneas de progreso se emiten como `fetching`.
    fn fetch(&self, repo: &str, git_ref: Option<&str>, sink: &dyn EventSink) -> Result<Checkout, RunnerError>;
}

/// Directorio local existente, usado tal cual.
#[derive(Debug, Default)]
pub struct LocalProvider;

impl ContentProvider for LocalProvider {
    fn name(&self) -> &'static str {
        "Local"
    }

    fn detect(&self, repo: &str) -> bool {
        Path::new(repo.strip_prefix("file://").unwrap_or(repo)).is_dir()
    }

    fn fetch(&self, repo: &str, git_ref: Option<&str>, _sink: &dyn EventSink) -> Result<Checkout, RunnerError> {
        if let Some(r) = git_ref {
            log::warn!("ref {r} ignored for local feedstock {repo}");
        }
        Ok(Checkout::in_place(repo.strip_prefix("file://").unwrap_or(repo)))
    }
}

/// Repositorio git: `git clone` en un temporal y `git checkout <ref>`.
#[derive(Debug, Default)]
pub struct GitProvider;

impl GitProvider {
    fn run_git(repo: &str, args: &[&str], cwd: Option<&Path>, sink: &dyn EventSink) -> Result<(), RunnerError> {
        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        let output = cmd.output().map_err(|e| RunnerError::Fetch { repo: repo.to_string(),
                                                                   detail: format!("could not run git: {e}") })?;
        for line in String::from_utf8_lossy(&output.stdout).lines()
                                                          .chain(String::from_utf8_lossy(&output.stderr).lines())
        {
            sink.emit(JobEvent::fetching(format!("{line}\n")));
        }
        if output.status.success() {
            Ok(())
        } else {
            Err(RunnerError::Fetch { repo: repo.to_string(),
                                     detail: format!("git {} exited with {}", args.first().copied().unwrap_or_default(), output.status) })
        }
    }
}

impl ContentProvider for GitProvider {
    fn name(&self) -> &'static str {
        "Git"
    }

    fn detect(&self, repo: &str) -> bool {
        repo.contains("://") || repo.starts_with("git@") || repo.ends_with(".git")
    }

    fn fetch(&self, repo: &str, git_ref: Option<&str>, sink: &dyn EventSink) -> Result<Checkout, RunnerError> {
        let tmp = tempfile::Builder::new().prefix("forge-runner-")
                                          .tempdir()
                                          .map_err(|e| RunnerError::Fetch { repo: repo.to_string(),
                                                                            detail: e.to_string() })?;
        let dest = tmp.path().to_string_lossy().into_owned();
        Self::run_git(repo, &["clone", "--quiet", repo, &dest], None, sink)?;
        if let Some(r) = git_ref {
            Self::run_git(repo, &["checkout", "--quiet", r], Some(tmp.path()), sink)?;
        }
        Ok(Checkout::temporary(tmp))
    }
}

pub fn default_providers() -> Vec<Box<dyn ContentProvider>> {
    vec![Box::new(LocalProvider), Box::new(GitProvider)]
}

/// Elige el primer provider que reconoce `repo` y descarga.
pub fn fetch_feedstock(providers: &[Box<dyn ContentProvider>],
                       repo: &str,
                       git_ref: Option<&str>,
                       sink: &dyn EventSink)
                       -> Result<Checkout, RunnerError> {
    let provider = providers.iter().find(|p| p.detect(repo)).ok_or_else(|| RunnerError::Fetch {
                                                                 repo: repo.to_string(),
                                                                 detail: "no content provider recognizes it".into(),
                                                             })?;
    sink.emit(JobEvent::fetching(format!("Picked {} content provider.\n", provider.name())));
    let checkout = provider.fetch(repo, git_ref, sink)?;
    log::info!("fetched {repo} into {}", checkout.path().display());
    Ok(checkout)
}
