//! Process-wide `tracing` setup driven by the `logging` config section.
//!
//! Events go to a daily rolling file (`chatprobe.log.<YYYY-MM-DD>`) and,
//! unless disabled, to stderr. `RUST_LOG` overrides the configured filter.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chatprobe_config::{LogFormat, LoggingConfig};
use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

const LOG_DIR_ENV: &str = "CHATPROBE_LOG_DIR";
const LOG_FILE: &str = "chatprobe.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the file writer alive; drop it last so buffered events are flushed.
#[must_use = "dropping the handle stops file logging"]
pub struct LogHandle {
    path: PathBuf,
    _guard: WorkerGuard,
}

impl LogHandle {
    /// Today's log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cfg: &LoggingConfig) -> anyhow::Result<LogHandle> {
    let dir = log_dir(cfg.dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let today = Local::now().format("%Y-%m-%d");
    let path = dir.join(format!("{LOG_FILE}.{today}"));

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, LOG_FILE));

    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);
    layers.push(match cfg.format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(false).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    });
    if cfg.stderr {
        layers.push(match cfg.format {
            LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
            LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        });
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.filter));

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("tracing subscriber already installed")?;

    Ok(LogHandle {
        path,
        _guard: guard,
    })
}

/// `logging.dir`, then `CHATPROBE_LOG_DIR`, then the platform data dir.
fn log_dir(configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured {
        return tilde(dir);
    }
    if let Some(dir) = std::env::var_os(LOG_DIR_ENV).filter(|d| !d.is_empty()) {
        return tilde(Path::new(&dir));
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chatprobe")
}

fn tilde(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
