//! Reporter de eventos estructurados.
//!
//! El modo de salida se fija al construir el reporter y no cambia durante el
//! run. En modo JSON cada evento es un registro autocontenido por línea; en
//! modo texto se escribe el mensaje tal cual y el productor decide dónde van
//! los saltos de línea.
//!
//! El reporter es un objeto explícito (normalmente `Arc<Reporter>`) que se
//! pasa a fetch, parsing y dispatcher. Los tests pueden construirlo sobre un
//! buffer en memoria.

use std::fmt::Display;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::event::{EventSink, JobEvent};
use crate::unwind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

pub struct Reporter {
    format: OutputFormat,
    out: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter").field("format", &self.format).finish()
    }
}

impl Reporter {
    pub fn new(format: OutputFormat, out: Box<dyn Write + Send>) -> Self {
        Self { format,
               out: Mutex::new(out) }
    }

    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, Box::new(io::stdout()))
    }

    /// Reporter sobre un buffer compartido; el buffer queda accesible al
    /// caller para inspeccionar la salida.
    pub fn buffered(format: OutputFormat) -> (Self, SharedBuffer) {
        let buf = SharedBuffer::default();
        (Self::new(format, Box::new(buf.clone())), buf)
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Representación de un evento según el modo. En JSON incluye el salto de
    /// línea final; en texto no añade nada.
    pub fn render(&self, event: &JobEvent) -> String {
        match self.format {
            OutputFormat::Text => event.message.clone(),
            OutputFormat::Json => {
                let mut record = event.clone();
                record.message = record.message.trim_end_matches(['\n', '\r']).to_string();
                match serde_json::to_string(&record) {
                    Ok(line) => format!("{line}\n"),
                    Err(e) => fallback_record(&e.to_string()),
                }
            }
        }
    }

    /// Escribe el evento de fallo final de un run.
    pub fn fatal(&self, err: &dyn Display, recipe_id: Option<&str>, job_name: Option<&str>) {
        let mut ev = JobEvent::failed(format!("{err}\n"));
        ev.recipe_id = recipe_id.map(str::to_string);
        ev.job_name = job_name.map(str::to_string);
        self.emit(ev);
    }

    /// Instala un panic hook que garantiza un último registro `failed` bien
    /// formado en modo JSON. En modo texto deja el hook por defecto. Los
    /// pánicos contenidos en una unidad de trabajo no escriben registro.
    pub fn install_panic_hook(self: &Arc<Self>) {
        if self.format != OutputFormat::Json {
            return;
        }
        let reporter = Arc::clone(self);
        std::panic::set_hook(Box::new(move |info| {
            let msg = unwind::payload_message(info.payload());
            if unwind::is_contained() {
                log::debug!("work item panicked: {msg}");
                return;
            }
            let location = info.location().map(|l| format!(" at {}:{}", l.file(), l.line())).unwrap_or_default();
            reporter.emit(JobEvent::failed(format!("Error during running: {msg}{location}")));
        }));
    }

    fn write_str(&self, s: &str) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = out.write_all(s.as_bytes()).and_then(|_| out.flush()) {
            log::warn!("reporter write failed: {e}");
        }
    }
}

impl EventSink for Reporter {
    fn emit(&self, event: JobEvent) {
        let rendered = self.render(&event);
        self.write_str(&rendered);
    }
}

fn fallback_record(reason: &str) -> String {
    let v = serde_json::json!({
        "status": "failed",
        "message": format!("could not serialize event: {reason}"),
        "job_name": null,
        "recipe_id": null,
    });
    format!("{v}\n")
}

/// Buffer clonable que implementa `Write`.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::JobStatus;

    #[test]
    fn json_mode_writes_one_record_per_line() {
        let (reporter, buf) = Reporter::buffered(OutputFormat::Json);
        reporter.emit(JobEvent::fetching("Picked Git content provider.\n"));
        reporter.emit(JobEvent::new(JobStatus::Baking, "Running job for recipe a\n").for_job("a", "job-a"));

        let lines = buf.lines();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["status"], "fetching");
        assert_eq!(first["message"], "Picked Git content provider.");
        let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["job_name"], "job-a");
        assert_eq!(second["recipe_id"], "a");
    }

    #[test]
    fn text_mode_adds_no_separators() {
        let (reporter, buf) = Reporter::buffered(OutputFormat::Text);
        reporter.emit(JobEvent::fetching("cloning"));
        reporter.emit(JobEvent::fetching("...done\n"));
        assert_eq!(buf.contents(), "cloning...done\n");
    }

    #[test]
    fn panic_hook_writes_final_record_except_for_contained_panics() {
        let (reporter, buf) = Reporter::buffered(OutputFormat::Json);
        let reporter = Arc::new(reporter);
        reporter.install_panic_hook();

        reporter.emit(JobEvent::parsing("Parsing recipes...\n"));
        let contained: Result<(), String> = unwind::contain(|| panic!("inside a work item"));
        let escaped: std::thread::Result<()> = std::panic::catch_unwind(|| panic!("uncaught fatal"));
        let _ = std::panic::take_hook();

        assert!(contained.is_err() && escaped.is_err());
        let recs: Vec<serde_json::Value> = buf.lines().iter().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(recs.len(), 2);
        let last = &recs[1];
        assert_eq!(last["status"], "failed");
        assert!(last["message"].as_str().unwrap().starts_with("Error during running: uncaught fatal"));
    }

    #[test]
    fn fatal_is_last_well_formed_record() {
        let (reporter, buf) = Reporter::buffered(OutputFormat::Json);
        reporter.emit(JobEvent::parsing("Parsing recipes...\n"));
        reporter.fatal(&"boom", Some("r"), None);

        let last = buf.lines().pop().unwrap();
        let v: serde_json::Value = serde_json::from_str(&last).unwrap();
        assert_eq!(v["status"], "failed");
        assert_eq!(v["message"], "boom");
        assert_eq!(v["recipe_id"], "r");
    }
}
