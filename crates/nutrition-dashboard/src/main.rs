mod bootstrap;
mod render;

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use nutrition_core::i18n::Translator;
use nutrition_core::settings::Settings;
use nutrition_data::analysis::load_dashboard;
use nutrition_runtime::data_manager::{DataManager, FileDataProvider};
use nutrition_runtime::lock::AppLock;
use nutrition_runtime::orchestrator::{RefreshOrchestrator, RefreshUpdate};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Nutrition Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Language: {}, Timezone: {}",
        settings.view,
        settings.language,
        settings.timezone
    );

    let translator = settings.translator();

    let mut lock = AppLock::load()?;
    if lock.is_locked() {
        let Some(passcode) = settings.passcode.as_deref() else {
            bail!(
                "{}. {} (--passcode)",
                translator.translate("app_locked"),
                translator.translate("enter_password")
            );
        };
        lock.unlock(passcode)
            .with_context(|| translator.translate("auth_required"))?;
    }

    if let Some(passcode) = settings.set_passcode.as_deref() {
        lock.set_passcode(Some(passcode), true)?;
        println!("{}", translator.translate("lock_enabled"));
        return Ok(());
    }
    if settings.disable_lock {
        lock.set_passcode(None, false)?;
        println!("{}", translator.translate("lock_disabled"));
        return Ok(());
    }

    let data_dir = bootstrap::discover_data_path(settings.data_dir.as_deref());
    let anchor = settings.anchor_date()?;

    if settings.watch {
        run_watch(&settings, &data_dir, anchor, &translator).await
    } else {
        let snapshot = load_dashboard(&data_dir)
            .with_context(|| format!("loading nutrition data from {}", data_dir.display()))?;
        print!(
            "{}",
            render::render_view(&settings.view, &snapshot, anchor, &translator)
        );
        Ok(())
    }
}

/// Re-render the selected view after every applied refresh until Ctrl+C.
async fn run_watch(
    settings: &Settings,
    data_dir: &Path,
    anchor: NaiveDate,
    translator: &Translator,
) -> Result<()> {
    tracing::info!("Starting watch mode, refresh every {}s", settings.refresh_rate);

    let manager = DataManager::new(FileDataProvider::new(data_dir));
    let orchestrator = RefreshOrchestrator::new(manager, u64::from(settings.refresh_rate));
    let (mut rx, handle) = orchestrator.start();

    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Some(RefreshUpdate::Snapshot(snapshot)) => {
                    // Clear the terminal and home the cursor.
                    print!("\x1b[2J\x1b[H");
                    print!(
                        "{}",
                        render::render_view(&settings.view, &snapshot, anchor, translator)
                    );
                }
                Some(RefreshUpdate::Failed(message)) => {
                    eprintln!("{message}");
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; stopping refresh task");
                break;
            }
        }
    }

    handle.abort();
    Ok(())
}
