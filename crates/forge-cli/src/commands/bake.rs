//! Comando `bake`: fetch -> parsing -> poda -> nombre -> storage -> bakery.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use forge_bakery::{build_bakery, run_job, BakeJob, BakeOutcome};
use forge_core::constants::DEFAULT_PRUNE_BOUND;
use forge_core::job::validate_job_name;
use forge_core::{resolve_recipes, EventSink, FeedstockIdentity, JobEvent, JobIdentity, PrunePolicy, Reporter, RunnerError,
                 StorageConfig};
use forge_recipes::DeclarativeNamespaceLoader;

use crate::cli::BakeArgs;
use crate::config::RunnerConfig;
use crate::fetch::{fetch_feedstock, ContentProvider};

/// Contexto para el evento final si el run falla antes de despachar.
#[derive(Debug, Default)]
struct RunState {
    recipe_id: Option<String>,
    job_name: Option<String>,
    reported: bool,
}

/// Ejecuta el comando. Cualquier error deja un último evento `failed` en el
/// reporter antes de devolverse.
pub async fn execute(args: &BakeArgs,
                     providers: &[Box<dyn ContentProvider>],
                     reporter: &Reporter,
                     cancel: CancellationToken)
                     -> Result<Vec<BakeOutcome>, RunnerError> {
    let mut state = RunState::default();
    match bake(args, providers, reporter, cancel, &mut state).await {
        Ok(outcomes) => Ok(outcomes),
        Err(err) => {
            if !state.reported {
                reporter.fatal(&err, state.recipe_id.as_deref(), state.job_name.as_deref());
            }
            Err(err)
        }
    }
}

async fn bake(args: &BakeArgs,
              providers: &[Box<dyn ContentProvider>],
              reporter: &Reporter,
              cancel: CancellationToken,
              state: &mut RunState)
              -> Result<Vec<BakeOutcome>, RunnerError> {
    let config = RunnerConfig::load_or_default(args.config.as_deref(), Path::new("."))?;

    let recipe_id = args.recipe_id.clone().or_else(|| config.bake.recipe_id.clone());
    let explicit_name = args.job_name.clone().or_else(|| config.bake.job_name.clone());
    if let Some(name) = &explicit_name {
        validate_job_name(name)?;
    }
    let prune = PrunePolicy::new(args.prune || config.bake.prune,
                                 config.bake.prune_bound.unwrap_or(DEFAULT_PRUNE_BOUND))?;

    let class = config.bakery_class();
    let bakery = build_bakery(class, config.bakery_section(class))?;
    let storage = StorageConfig::resolve(config.target_storage.clone(),
                                         config.input_cache_storage.clone(),
                                         config.metadata_cache_storage.clone())?;

    let checkout = fetch_feedstock(providers, &args.repo, args.git_ref.as_deref(), reporter)?;

    reporter.emit(JobEvent::parsing("Parsing recipes...\n"));
    let recipes = resolve_recipes(&DeclarativeNamespaceLoader::new(), checkout.path(), recipe_id.as_deref())?;
    if recipes.is_empty() {
        return Err(RunnerError::Config(format!("no recipes found in {}", args.repo)));
    }
    let ids: Vec<&str> = recipes.iter().map(|(id, _)| id.as_str()).collect();
    let selection = match recipe_id.as_deref() {
        Some(id) => format!("Baking only recipe_id='{id}'\n"),
        None => format!("Baking all recipes: '{}'\n", ids.join("', '")),
    };
    reporter.emit(JobEvent::parsing(selection).with_field("recipes", ids));

    let mut identity = JobIdentity::new(FeedstockIdentity::from_repo(&args.repo, args.git_ref.as_deref()));
    if recipes.len() == 1 {
        identity = identity.with_recipe_hint(recipes[0].0.clone());
    }
    if let Some(name) = &explicit_name {
        identity.set_job_name(name)?;
    }

    let mut outcomes = Vec::with_capacity(recipes.len());
    for (id, graph) in &recipes {
        state.recipe_id = Some(id.clone());
        state.job_name = None;
        let graph = prune.apply(graph)?;
        let job_name = identity.for_recipe(id, recipes.len())?;
        state.job_name = Some(job_name.to_string());

        let job = BakeJob { recipe_id: id.clone(),
                            job_name,
                            graph,
                            storage: storage.clone() };
        match run_job(bakery.as_ref(), &job, reporter, cancel.clone()).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => {
                state.reported = true;
                return Err(err);
            }
        }
    }
    Ok(outcomes)
}
