//! Receta indexada: una fuente por clave a lo largo de `concat_dim`.
//!
//! Plan de trabajo por unidad `i`:
//! - `cache:i` copia la fuente a la cache de entrada y anota su metadata.
//! - `store:i` (tras `cache:i`) escribe `{dataset}/{concat_dim}/{i}.json` en el target.
//! - `finalize` (tras todos los `store`) escribe `{dataset}/_meta.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use forge_core::hashing::hash_str;
use forge_core::storage::{registry, FileSystem, LocalFileSystem};
use forge_core::{GraphRef, PipelineGraph, RunnerError, StorageConfig, TaskError, WorkItem, WorkPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    #[serde(default)]
    pub start: i64,
    pub count: usize,
}

/// Forma declarativa, tal como aparece en el módulo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeDefinition {
    pub dataset: String,
    pub concat_dim: String,
    #[serde(default)]
    pub keys: Option<Vec<Value>>,
    #[serde(default)]
    pub range: Option<KeyRange>,
    pub source: String,
    #[serde(default)]
    pub attrs: Map<String, Value>,
}

fn key_to_string(v: &Value) -> Result<String, String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("unsupported key {other}")),
    }
}

/// Tope de unidades que puede declarar un `range`.
pub const MAX_RANGE_COUNT: usize = 1_000_000;

fn range_keys(r: KeyRange) -> Result<Vec<String>, String> {
    if r.count > MAX_RANGE_COUNT {
        return Err(format!("range count {} exceeds {MAX_RANGE_COUNT}", r.count));
    }
    let count = i64::try_from(r.count).map_err(|_| format!("range count {} is too large", r.count))?;
    (0..count).map(|i| {
                  r.start
                   .checked_add(i)
                   .map(|k| k.to_string())
                   .ok_or_else(|| format!("range start {} + {i} overflows", r.start))
              })
              .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRecipe {
    id: String,
    dataset: String,
    concat_dim: String,
    keys: Vec<String>,
    source: String,
    base_dir: PathBuf,
    attrs: Map<String, Value>,
}

impl IndexedRecipe {
    /// Valida la definición. `base_dir` resuelve fuentes relativas.
    pub fn from_definition(id: impl Into<String>, def: RecipeDefinition, base_dir: &Path) -> Result<Self, String> {
        let id = id.into();
        if def.dataset.trim().is_empty() {
            return Err(format!("recipe {id}: dataset is empty"));
        }
        if def.concat_dim.trim().is_empty() {
            return Err(format!("recipe {id}: concat_dim is empty"));
        }
        if def.source.trim().is_empty() {
            return Err(format!("recipe {id}: source is empty"));
        }
        let keys = match (def.keys, def.range) {
            (Some(_), Some(_)) => return Err(format!("recipe {id}: keys and range are exclusive")),
            (Some(keys), None) => keys.iter().map(key_to_string).collect::<Result<Vec<_>, _>>()
                                      .map_err(|e| format!("recipe {id}: {e}"))?,
            (None, Some(r)) => range_keys(r).map_err(|e| format!("recipe {id}: {e}"))?,
            (None, None) => return Err(format!("recipe {id}: needs keys or range")),
        };
        if keys.is_empty() {
            return Err(format!("recipe {id}: no keys"));
        }
        let placeholder = format!("{{{}}}", def.concat_dim);
        if keys.len() > 1 && !def.source.contains(&placeholder) {
            log::warn!("recipe {id}: source has no {placeholder} placeholder, every unit reads the same input");
        }
        Ok(Self { id,
                  dataset: def.dataset,
                  concat_dim: def.concat_dim,
                  keys,
                  source: def.source,
                  base_dir: base_dir.to_path_buf(),
                  attrs: def.attrs })
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn concat_dim(&self) -> &str {
        &self.concat_dim
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Fuente concreta de la clave `key`.
    pub fn source_for(&self, key: &str) -> String {
        let rendered = self.source.replace(&format!("{{{}}}", self.concat_dim), key);
        if rendered.contains("://") || Path::new(&rendered).is_absolute() {
            rendered
        } else {
            self.base_dir.join(rendered).to_string_lossy().into_owned()
        }
    }

    fn record_path(&self, index: usize) -> String {
        format!("{}/{}/{index}.json", self.dataset, self.concat_dim)
    }

    fn cache_path(&self, url: &str) -> String {
        let name = url.rsplit(['/', '\\']).next().unwrap_or("source");
        format!("{}/{}-{name}", self.dataset, &hash_str(url)[..16])
    }
}

/// Filesystem para leer una fuente según su esquema.
fn source_filesystem(url: &str) -> Result<Arc<dyn FileSystem>, TaskError> {
    match url.split_once("://") {
        Some((scheme, _)) => Ok(registry::build(scheme, &Map::new())?),
        None => Ok(Arc::new(LocalFileSystem::new())),
    }
}

impl PipelineGraph for IndexedRecipe {
    fn id(&self) -> &str {
        &self.id
    }

    fn unit_count(&self) -> usize {
        self.keys.len()
    }

    fn bounded(&self, bound: usize) -> GraphRef {
        let mut pruned = self.clone();
        pruned.keys.truncate(bound);
        Arc::new(pruned)
    }

    fn plan(&self) -> WorkPlan {
        let mut plan = WorkPlan::new();
        let me = Arc::new(self.clone());

        for (i, key) in self.keys.iter().enumerate() {
            let recipe = Arc::clone(&me);
            let key = key.clone();
            let cache_key = format!("cache:{i}");
            plan.push(WorkItem::new(cache_key.clone(), {
                let key = key.clone();
                let recipe = Arc::clone(&recipe);
                move |storage: &StorageConfig| {
                    let url = recipe.source_for(&key);
                    let data = source_filesystem(&url)?.read(&url)?;
                    storage.input_cache.write(&recipe.cache_path(&url), &data)?;
                    let info = json!({ "source": url, "key": key, "bytes": data.len() });
                    storage.metadata_cache
                           .write(&format!("{}/{i}.json", recipe.dataset), info.to_string().as_bytes())?;
                    Ok(())
                }
            }));

            plan.push(WorkItem::new(format!("store:{i}"), move |storage: &StorageConfig| {
                          let url = recipe.source_for(&key);
                          let data = storage.input_cache.read(&recipe.cache_path(&url))?;
                          let content = serde_json::from_slice::<Value>(&data)
                              .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&data).into_owned()));
                          let record = json!({
                              "dataset": recipe.dataset,
                              "concat_dim": recipe.concat_dim,
                              "index": i,
                              "key": key,
                              "source": url,
                              "content": content,
                          });
                          storage.target.write(&recipe.record_path(i), record.to_string().as_bytes())?;
                          Ok(())
                      }).after(cache_key));
        }

        let mut finalize = WorkItem::new("finalize", move |storage: &StorageConfig| {
            let mut dims = Map::new();
            dims.insert(me.concat_dim.clone(), json!(me.keys.len()));
            let meta = json!({
                "dataset": me.dataset,
                "dims": dims,
                "keys": me.keys,
                "attrs": me.attrs,
            });
            storage.target.write(&format!("{}/_meta.json", me.dataset), meta.to_string().as_bytes())?;
            Ok(())
        });
        for i in 0..self.keys.len() {
            finalize = finalize.after(format!("store:{i}"));
        }
        plan.push(finalize);
        plan
    }

    fn describe(&self) -> Value {
        let sources: Vec<String> = self.keys.iter().map(|k| self.source_for(k)).collect();
        json!({
            "kind": "indexed",
            "id": self.id,
            "dataset": self.dataset,
            "concat_dim": self.concat_dim,
            "keys": self.keys,
            "sources": sources,
            "attrs": self.attrs,
        })
    }

    fn output_locations(&self, storage: &StorageConfig) -> Vec<String> {
        vec![storage.target.url(&self.dataset)]
    }
}

impl From<IndexedRecipe> for GraphRef {
    fn from(recipe: IndexedRecipe) -> Self {
        Arc::new(recipe)
    }
}

/// Error de configuración que nombra el módulo de origen.
pub(crate) fn module_error(module: &str, reason: impl std::fmt::Display) -> RunnerError {
    RunnerError::Config(format!("recipe module {module}: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::StorageSpec;

    fn def(yaml: &str) -> RecipeDefinition {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn range_keys_and_source_rendering() {
        let r = IndexedRecipe::from_definition("gpcp",
                                               def("dataset: gpcp\nconcat_dim: time\nrange: {start: 1996, count: 3}\nsource: data/{time}.json\n"),
                                               Path::new("/fs/feedstock")).unwrap();
        assert_eq!(r.keys(), ["1996", "1997", "1998"]);
        assert_eq!(r.source_for("1997"), "/fs/feedstock/data/1997.json");
        assert_eq!(r.unit_count(), 3);
        assert_eq!(r.bounded(2).unit_count(), 2);
        assert_eq!(r.unit_count(), 3);
    }

    #[test]
    fn invalid_definitions_are_rejected() {
        let base = Path::new("/x");
        assert!(IndexedRecipe::from_definition("a", def("dataset: d\nconcat_dim: t\nsource: s\n"), base).is_err());
        assert!(IndexedRecipe::from_definition("a",
                                               def("dataset: d\nconcat_dim: t\nkeys: [1]\nrange: {count: 1}\nsource: s\n"),
                                               base).is_err());
        assert!(IndexedRecipe::from_definition("a", def("dataset: d\nconcat_dim: t\nkeys: []\nsource: s\n"), base).is_err());
        assert!(serde_yaml::from_str::<RecipeDefinition>("dataset: d\nconcat_dim: t\nsource: s\nbogus: 1\n").is_err());
    }

    #[test]
    fn extreme_ranges_are_config_errors() {
        let base = Path::new("/x");
        let near_max = format!("dataset: d\nconcat_dim: t\nrange: {{start: {}, count: 3}}\nsource: s\n", i64::MAX - 1);
        let err = IndexedRecipe::from_definition("a", def(&near_max), base).unwrap_err();
        assert!(err.starts_with("recipe a: range start") && err.ends_with("overflows"), "{err}");

        let huge = format!("dataset: d\nconcat_dim: t\nrange: {{count: {}}}\nsource: s\n", u64::MAX);
        let err = IndexedRecipe::from_definition("a", def(&huge), base).unwrap_err();
        assert!(err.contains("exceeds"), "{err}");

        let last = format!("dataset: d\nconcat_dim: t\nrange: {{start: {}, count: 1}}\nsource: s\n", i64::MAX);
        assert_eq!(IndexedRecipe::from_definition("a", def(&last), base).unwrap().keys(), [i64::MAX.to_string()]);
    }

    #[test]
    fn plan_orders_cache_store_finalize() {
        let r = IndexedRecipe::from_definition("a", def("dataset: d\nconcat_dim: t\nkeys: [x, y]\nsource: '{t}'\n"), Path::new("/b"))
                  .unwrap();
        let plan = r.plan();
        let levels = plan.levels().unwrap();
        let keys: Vec<Vec<&str>> = levels.iter().map(|l| l.iter().map(|i| i.key.as_str()).collect()).collect();
        assert_eq!(keys, vec![vec!["cache:0", "cache:1"], vec!["store:0", "store:1"], vec!["finalize"]]);
    }

    #[test]
    fn execute_writes_records_and_meta() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        for k in ["a", "b", "c"] {
            std::fs::write(data.join(format!("{k}.json")), format!("{{\"k\":\"{k}\"}}")).unwrap();
        }
        let r = IndexedRecipe::from_definition("demo",
                                               def("dataset: demo\nconcat_dim: band\nkeys: [a, b, c]\nsource: data/{band}.json\nattrs: {units: mm}\n"),
                                               dir.path()).unwrap();
        let root = "memory://recipe-exec/target/";
        let cache = dir.path().join("cache").to_string_lossy().to_string();
        let storage = StorageConfig::resolve(Some(StorageSpec::new("memory", root)),
                                             Some(StorageSpec::new("local", cache.clone())),
                                             Some(StorageSpec::new("local", cache))).unwrap();
        r.execute(&storage).unwrap();

        let records = storage.target.list("demo/band").unwrap();
        assert_eq!(records, vec!["demo/band/0.json", "demo/band/1.json", "demo/band/2.json"]);
        let rec: Value = serde_json::from_slice(&storage.target.read("demo/band/1.json").unwrap()).unwrap();
        assert_eq!(rec["content"]["k"], "b");
        let meta: Value = serde_json::from_slice(&storage.target.read("demo/_meta.json").unwrap()).unwrap();
        assert_eq!(meta["dims"]["band"], 3);
        assert_eq!(meta["attrs"]["units"], "mm");
        assert_eq!(r.output_locations(&storage), vec![format!("{root}demo")]);
    }
}
