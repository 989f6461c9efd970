use tracing_subscriber::EnvFilter;

/// Logging de diagnóstico a stderr; stdout queda para los eventos.
///
/// `RUST_LOG` tiene prioridad sobre `log_level`. Los registros del facade
/// `log` de los demás crates llegan por el puente de `tracing-subscriber`.
pub fn init(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let installed = tracing_subscriber::fmt().with_env_filter(env_filter)
                                             .with_target(false)
                                             .with_writer(std::io::stderr)
                                             .try_init();
    if installed.is_err() {
        tracing::debug!("logging already initialized");
    }
}
