//! Constantes del runner.
//!
//! Agrupa los valores que forman parte de contratos observables: la
//! gramática de `job_name` (su mensaje de error es superficie de
//! compatibilidad), los límites de longitud y el bound por defecto del
//! modo `prune`.

/// Versión lógica del runner. Se incluye en el payload enviado a bakeries
/// remotas para que el servicio pueda rechazar formatos incompatibles.
pub const RUNNER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Gramática de un `job_name` válido. El texto literal aparece en el mensaje
/// de `InvalidJobName`, no modificar sin coordinar con los consumidores.
pub const JOB_NAME_PATTERN: &str = "^[a-z][-_0-9a-z]{0,62}$";

/// Longitud máxima de un `job_name` (1 letra inicial + 62).
pub const JOB_NAME_MAX_LEN: usize = 63;

/// Hex del sufijo desambiguador de nombres sintetizados.
pub const JOB_NAME_SUFFIX_LEN: usize = 8;

/// Hex del hash por receta cuando un run selecciona varias recetas.
pub const RECIPE_HASH_LEN: usize = 5;

/// Unidades que conserva `prune` por defecto a lo largo de la dimensión
/// primaria.
pub const DEFAULT_PRUNE_BOUND: usize = 2;
