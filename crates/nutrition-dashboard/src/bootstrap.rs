use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use nutrition_core::settings::app_dir_in;
use nutrition_data::reader::resolve_data_dir;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.nutrition-dashboard/` and its `logs/` and `data/` subdirectories
/// exist.
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    ensure_directories_in(&home)
}

/// [`ensure_directories`] rooted at `base_dir` instead of the home directory.
pub fn ensure_directories_in(base_dir: &Path) -> anyhow::Result<()> {
    let root = app_dir_in(base_dir);
    std::fs::create_dir_all(&root)?;
    std::fs::create_dir_all(root.join("logs"))?;
    std::fs::create_dir_all(root.join("data"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `DEBUG`/`INFO`/`WARNING`/`ERROR`/`CRITICAL` level name to a
/// `tracing` filter directive. Unknown names pass through unchanged.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr, and additionally to `log_file` (appended, no ANSI
/// colours) when one is given. `RUST_LOG` overrides `log_level` when set.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(log_level)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Directory to read `days.json` and `products.json` from.
///
/// An explicit `--data-dir` (or `DATA_DIR`) wins; otherwise
/// `~/.nutrition-dashboard/data/`.
pub fn discover_data_path(explicit: Option<&Path>) -> PathBuf {
    let path = resolve_data_dir(explicit);
    if !path.exists() {
        tracing::warn!(path = %path.display(), "data directory does not exist");
    }
    path
}

// ── Tests ──────────────────────────────────────────────────────────────────────
