use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DashboardError, Result};
use crate::i18n::{Language, Translator};
use crate::time_utils;

/// Directory under `$HOME` holding persisted params, lock config and logs.
pub const APP_DIR_NAME: &str = ".nutrition-dashboard";

/// `~/.nutrition-dashboard`, or `./.nutrition-dashboard` without a home dir.
pub fn app_dir() -> PathBuf {
    app_dir_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
}

pub fn app_dir_in(base_dir: &Path) -> PathBuf {
    base_dir.join(APP_DIR_NAME)
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Nutrition tracking dashboard: daily, weekly, calendar and report views
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nutrition-dashboard",
    about = "Nutrition tracking dashboard: daily, weekly, calendar and report views",
    version
)]
pub struct Settings {
    /// View to render
    #[arg(long, default_value = "daily", value_parser = ["daily", "weekly", "calendar", "report", "day"])]
    pub view: String,

    /// Anchor date (YYYY-MM-DD) for the calendar, report and day views; defaults to today
    #[arg(long)]
    pub date: Option<String>,

    /// Display language
    #[arg(long, default_value = "auto", value_parser = ["fr", "en", "auto"])]
    pub language: String,

    /// Timezone used to resolve "today" (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Directory holding days.json and products.json
    #[arg(long, env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep running and re-render after every refresh
    #[arg(long)]
    pub watch: bool,

    /// Refresh interval in seconds for --watch (1-3600)
    #[arg(long, default_value = "300", value_parser = clap::value_parser!(u32).range(1..=3600))]
    pub refresh_rate: u32,

    /// Passcode used to unlock the dashboard when the app lock is enabled
    #[arg(long)]
    pub passcode: Option<String>,

    /// Enable the app lock with this passcode
    #[arg(long, conflicts_with = "disable_lock")]
    pub set_passcode: Option<String>,

    /// Disable the app lock
    #[arg(long)]
    pub disable_lock: bool,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.nutrition-dashboard/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
}

impl LastUsedParams {
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        app_dir_in(base_dir).join("last_used.json")
    }

    /// Load persisted params; `Default` when the file is absent or unreadable.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    pub fn clear_at(path: &Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation with an explicit config path so tests can
    /// redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins; the anchor date and passcodes are never persisted.
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "language") {
            if let Some(v) = last.language {
                settings.language = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "refresh_rate") {
            if let Some(v) = last.refresh_rate {
                settings.refresh_rate = v;
            }
        }
        if settings.data_dir.is_none() {
            settings.data_dir = last.data_dir;
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!(error = %e, "could not persist last-used params");
        }

        settings
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = time_utils::get_system_timezone();
        }
        if !time_utils::validate_timezone(&settings.timezone) {
            tracing::warn!(timezone = %settings.timezone, "unknown timezone; using UTC");
            settings.timezone = "UTC".to_string();
        }

        if settings.language == "auto" {
            let tag = std::env::var("LANG").unwrap_or_default();
            settings.language = Language::from_locale_tag(&tag).code().to_string();
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// Translator for the resolved display language.
    pub fn translator(&self) -> Translator {
        Translator::new(self.language.parse().unwrap_or(Language::DEFAULT))
    }

    /// The `--date` value, or today in the configured timezone.
    pub fn anchor_date(&self) -> Result<NaiveDate> {
        match self.date.as_deref() {
            Some(raw) => time_utils::parse_date_key(raw)
                .ok_or_else(|| DashboardError::InvalidDate(raw.to_string())),
            None => Ok(time_utils::today_in(&self.timezone)),
        }
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            view: Some(s.view.clone()),
            language: Some(s.language.clone()),
            timezone: Some(s.timezone.clone()),
            data_dir: s.data_dir.clone(),
            refresh_rate: Some(s.refresh_rate),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    fn run(args: &[&str], config_path: &Path) -> Settings {
        let args: Vec<std::ffi::OsString> = std::iter::once("nutrition-dashboard")
            .chain(args.iter().copied())
            .map(std::ffi::OsString::from)
            .collect();
        Settings::load_with_last_used_impl(args, config_path)
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            view: Some("weekly".to_string()),
            language: Some("en".to_string()),
            timezone: Some("Europe/Paris".to_string()),
            data_dir: Some(PathBuf::from("/srv/nutrition")),
            refresh_rate: Some(60),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.view.as_deref(), Some("weekly"));
        assert_eq!(loaded.language.as_deref(), Some("en"));
        assert_eq!(loaded.timezone.as_deref(), Some("Europe/Paris"));
        assert_eq!(loaded.data_dir, Some(PathBuf::from("/srv/nutrition")));
        assert_eq!(loaded.refresh_rate, Some(60));
    }

    #[test]
    fn test_last_used_params_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = LastUsedParams::load_from(&tmp_config_path(&tmp));
        assert!(loaded.view.is_none());
        assert!(loaded.language.is_none());
        assert!(loaded.refresh_rate.is_none());
    }

    #[test]
    fn test_last_used_params_garbage_file_is_default() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();
        assert!(LastUsedParams::load_from(&path).view.is_none());
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["nutrition-dashboard"]);
        assert_eq!(settings.view, "daily");
        assert_eq!(settings.language, "auto");
        assert_eq!(settings.timezone, "auto");
        assert_eq!(settings.refresh_rate, 300);
        assert_eq!(settings.log_level, "WARNING");
        assert!(settings.date.is_none());
        assert!(settings.passcode.is_none());
        assert!(!settings.watch);
        assert!(!settings.disable_lock);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_rejects_unknown_view() {
        let result = Settings::try_parse_from(["nutrition-dashboard", "--view", "monthly"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_set_passcode_conflicts_with_disable_lock() {
        let result = Settings::try_parse_from([
            "nutrition-dashboard",
            "--set-passcode",
            "1234",
            "--disable-lock",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_with_last_used_merges_persisted_view() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            view: Some("calendar".to_string()),
            language: Some("en".to_string()),
            timezone: Some("UTC".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = run(&[], &config_path);
        assert_eq!(settings.view, "calendar");
        assert_eq!(settings.language, "en");
        assert_eq!(settings.timezone, "UTC");
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            view: Some("calendar".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = run(&["--view", "report"], &config_path);
        assert_eq!(settings.view, "report");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            view: Some("weekly".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        run(&["--clear"], &config_path);
        assert!(!config_path.exists(), "file must be gone after --clear");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = run(&["--debug"], &tmp_config_path(&tmp));
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_resolves_auto() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = run(&[], &tmp_config_path(&tmp));
        assert_ne!(settings.timezone, "auto");
        assert!(settings.language == "fr" || settings.language == "en");
    }

    #[test]
    fn test_load_with_last_used_invalid_timezone_falls_back_to_utc() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = run(&["--timezone", "Mars/Olympus"], &tmp_config_path(&tmp));
        assert_eq!(settings.timezone, "UTC");
    }

    #[test]
    fn test_load_with_last_used_does_not_persist_passcode() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        run(&["--passcode", "4321", "--view", "weekly"], &config_path);

        let raw = std::fs::read_to_string(&config_path).expect("persisted");
        assert!(!raw.contains("4321"));
        assert_eq!(
            LastUsedParams::load_from(&config_path).view.as_deref(),
            Some("weekly")
        );
    }

    #[test]
    fn test_anchor_date_parses_strictly() {
        let mut settings = Settings::parse_from(["nutrition-dashboard", "--date", "2024-03-15"]);
        settings.timezone = "UTC".to_string();
        assert_eq!(
            settings.anchor_date().unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );

        settings.date = Some("2024-3-15".to_string());
        assert!(matches!(
            settings.anchor_date(),
            Err(DashboardError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_translator_from_language() {
        let mut settings = Settings::parse_from(["nutrition-dashboard", "--language", "en"]);
        assert_eq!(settings.translator().language(), Language::En);
        settings.language = "auto".to_string();
        assert_eq!(settings.translator().language(), Language::Fr);
    }
}
