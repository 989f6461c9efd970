use std::sync::Arc;

use serde_json::Value;

use super::{TaskError, WorkPlan};
use crate::storage::StorageConfig;

pub type GraphRef = Arc<dyn PipelineGraph>;

/// Grafo de pipeline opaco. El resolver lo obtiene del feedstock y la
/// bakery lo ejecuta; nadie más lo inspecciona.
pub trait PipelineGraph: Send + Sync + std::fmt::Debug {
    /// Identificador estable (el recipe id).
    fn id(&self) -> &str;

    /// Tamaño a lo largo de la dimensión de indexación principal.
    fn unit_count(&self) -> usize;

    /// Nuevo grafo con, como mucho, las primeras `bound` unidades. El
    /// original no cambia.
    fn bounded(&self, bound: usize) -> GraphRef;

    /// Unidades de trabajo con sus dependencias.
    fn plan(&self) -> WorkPlan;

    /// Payload serializable que describe el grafo a un runner remoto.
    fn describe(&self) -> Value;

    /// Ubicaciones que el grafo deja escritas tras ejecutarse.
    fn output_locations(&self, storage: &StorageConfig) -> Vec<String>;

    /// Ejecución secuencial del plan en orden de dependencias.
    fn execute(&self, storage: &StorageConfig) -> Result<(), TaskError> {
        let plan = self.plan();
        for level in plan.levels()? {
            for item in level {
                item.run(storage).map_err(|e| format!("work item {} failed: {e}", item.key))?;
            }
        }
        Ok(())
    }
}
