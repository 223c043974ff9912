pub mod api;
pub mod assistant;
pub mod inference;

use std::path::{Path, PathBuf};

use inference::config::LogFormat;

/// Return the platform-standard data directory for PropDesk.
///
/// - macOS: `~/Library/Application Support/com.propdesk.assistant/`
/// - Windows: `{FOLDERID_RoamingAppData}\com.propdesk.assistant\`
/// - Linux: `$XDG_DATA_HOME/com.propdesk.assistant/` (fallback `~/.local/share/...`)
///
/// Falls back to `~/.propdesk/` only if none of the above can be resolved.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("com.propdesk.assistant");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".propdesk")
}

/// Resolve the SQLite path: the configured one, else `<data_dir>/assistant.db`.
pub fn resolve_db_path(configured: Option<&str>) -> String {
    if let Some(path) = configured.map(str::trim).filter(|p| !p.is_empty()) {
        return inference::config::expand_tilde(path);
    }
    let dir = data_dir();
    if !dir.exists() {
        let _ = std::fs::create_dir_all(&dir);
    }
    dir.join("assistant.db").to_string_lossy().into_owned()
}

/// Initialize the tracing subscriber, writing structured logs under `log_dir`.
///
/// On each startup:
/// 1. Rotates existing logs (assistant.log → .1 → .2 → .3, keeps last 3).
/// 2. Opens a fresh assistant.log with a line-flushing writer. If the file
///    cannot be opened, logs go to stderr instead.
/// 3. Logs a startup banner with the log path.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing(log_dir: &Path, format: LogFormat) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let _ = std::fs::create_dir_all(log_dir);
    let log_path = log_dir.join("assistant.log");
    rotate_log_file(&log_path, 3);

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("propdesk_assistant=info,warn"));

    let writer = match &log_file {
        Ok(file) => match file.try_clone() {
            Ok(clone) => LogWriter::File(FlushingWriter::new(clone)),
            Err(_) => LogWriter::Stderr,
        },
        Err(_) => LogWriter::Stderr,
    };

    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }

    if let Err(e) = &log_file {
        tracing::warn!(path = %log_path.display(), error = %e, "could not open log file, logging to stderr");
    }

    // Startup banner
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %log_path.display(),
        pid = std::process::id(),
        "=== PropDesk assistant starting ==="
    );
}

/// Rotate log files: `assistant.log` → `assistant.log.1` → `.2` → … → `.{keep}`.
///
/// Oldest file beyond `keep` is deleted. Missing files in the chain are skipped.
fn rotate_log_file(base_path: &Path, keep: u32) {
    let oldest = format!("{}.{keep}", base_path.display());
    let _ = std::fs::remove_file(&oldest);

    for i in (1..keep).rev() {
        let from = format!("{}.{i}", base_path.display());
        let to = format!("{}.{}", base_path.display(), i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    if base_path.exists() {
        let to = format!("{}.1", base_path.display());
        let _ = std::fs::rename(base_path, &to);
    }
}

/// Where log lines go.
#[derive(Clone)]
enum LogWriter {
    File(FlushingWriter),
    Stderr,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogWriter {
    type Writer = Box<dyn std::io::Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        match self {
            LogWriter::File(w) => Box::new(w.clone()),
            LogWriter::Stderr => Box::new(std::io::stderr()),
        }
    }
}

/// A writer that wraps `std::fs::File` and flushes after every write.
///
/// Without explicit flushing, log entries may sit in OS buffers and be lost
/// on crash.
#[derive(Clone)]
struct FlushingWriter {
    file: std::sync::Arc<std::sync::Mutex<std::fs::File>>,
}

impl FlushingWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: std::sync::Arc::new(std::sync::Mutex::new(file)),
        }
    }
}

impl std::io::Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("lock poisoned: {e}")))?;
        let n = std::io::Write::write(&mut *f, buf)?;
        std::io::Write::flush(&mut *f)?;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("lock poisoned: {e}")))?;
        std::io::Write::flush(&mut *f)
    }
}
