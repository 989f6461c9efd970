//! Pánicos contenidos dentro de una unidad de trabajo.
//!
//! Un pánico capturado por `contain` se convierte en un error normal de la
//! unidad. El panic hook del reporter consulta `is_contained` y no escribe
//! registro para esos pánicos: el fallo llega al dispatcher como cualquier
//! otro error.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

thread_local! {
    static CONTAINED: Cell<usize> = const { Cell::new(0) };
}

/// Ejecuta `f`; un pánico se devuelve como `Err` con su mensaje.
pub(crate) fn contain<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    CONTAINED.with(|c| c.set(c.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CONTAINED.with(|c| c.set(c.get() - 1));
    result.map_err(|payload| payload_message(payload.as_ref()))
}

/// `true` si el hilo actual está dentro de `contain`.
pub(crate) fn is_contained() -> bool {
    CONTAINED.with(|c| c.get() > 0)
}

pub(crate) fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    payload.downcast_ref::<String>().cloned().unwrap_or_else(|| "unknown panic".to_string())
}
