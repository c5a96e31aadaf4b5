//! Passcode gate for the dashboard.
//!
//! The lock settings live in `config.json` inside the app directory as
//! `{"security_enabled": bool, "password_hash": string}`. Passcodes are stored
//! as Argon2id PHC strings. This is a client-side gate only: the data files
//! themselves are not encrypted.

use std::path::{Path, PathBuf};

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use nutrition_core::error::{DashboardError, Result};
use nutrition_core::settings::app_dir;
use serde::{Deserialize, Serialize};

/// File name of the lock configuration inside the app directory.
pub const LOCK_CONFIG_FILE: &str = "config.json";

const MSG_CONFIG_ERROR: &str = "Security configuration error";
const MSG_INVALID_PASSWORD: &str = "Invalid password";

// ── LockConfig ────────────────────────────────────────────────────────────────

/// Persisted lock settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default)]
    pub security_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

impl LockConfig {
    pub fn config_path() -> PathBuf {
        app_dir().join(LOCK_CONFIG_FILE)
    }

    /// Load from `path`; a missing file means the lock is disabled.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| DashboardError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write atomically through a temporary sibling file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

// ── AppLock ───────────────────────────────────────────────────────────────────

/// Lock state for one dashboard session.
///
/// A session starts locked whenever the lock is enabled and stays locked until
/// [`unlock`](Self::unlock) succeeds.
pub struct AppLock {
    path: PathBuf,
    config: LockConfig,
    unlocked: bool,
}

impl AppLock {
    /// Load the lock for the default app directory.
    pub fn load() -> Result<Self> {
        Self::load_from(LockConfig::config_path())
    }

    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = LockConfig::load_from(&path)?;
        Ok(Self {
            path,
            config,
            unlocked: false,
        })
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.security_enabled
    }

    pub fn is_locked(&self) -> bool {
        self.config.security_enabled && !self.unlocked
    }

    /// Enable or disable the lock and persist the change.
    ///
    /// Enabling requires a non-empty passcode, which replaces any stored hash.
    /// Disabling keeps the stored hash so the lock can be turned back on.
    pub fn set_passcode(&mut self, passcode: Option<&str>, enabled: bool) -> Result<()> {
        let mut config = self.config.clone();
        if enabled {
            let passcode = passcode
                .filter(|p| !p.is_empty())
                .ok_or_else(|| DashboardError::Lock("A passcode is required".to_string()))?;
            config.password_hash = Some(hash_passcode(passcode)?);
        }
        config.security_enabled = enabled;
        config.save_to(&self.path)?;

        tracing::info!(enabled, "app lock updated");
        self.config = config;
        self.unlocked = !enabled;
        Ok(())
    }

    /// Check `passcode` against the stored hash without changing lock state.
    pub fn verify(&self, passcode: &str) -> Result<()> {
        if !self.config.security_enabled {
            return Ok(());
        }
        let hash = self
            .config
            .password_hash
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| DashboardError::Lock(MSG_CONFIG_ERROR.to_string()))?;

        if verify_passcode(passcode, hash)? {
            Ok(())
        } else {
            Err(DashboardError::Lock(MSG_INVALID_PASSWORD.to_string()))
        }
    }

    /// Verify and, on success, unlock this session.
    pub fn unlock(&mut self, passcode: &str) -> Result<()> {
        self.verify(passcode)?;
        self.unlocked = true;
        Ok(())
    }

    /// Lock the session again.
    pub fn lock(&mut self) {
        self.unlocked = false;
    }
}

// ── Hashing ───────────────────────────────────────────────────────────────────

fn hash_passcode(passcode: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(passcode.as_bytes(), &salt)
        .map_err(|e| DashboardError::Lock(format!("Failed to hash passcode: {e}")))?;
    Ok(hash.to_string())
}

/// A hash that does not parse counts as a configuration error.
fn verify_passcode(passcode: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        tracing::warn!(error = %e, "stored passcode hash is malformed");
        DashboardError::Lock(MSG_CONFIG_ERROR.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(passcode.as_bytes(), &parsed)
        .is_ok())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
