//! Snapshot owner for the dashboard runtime.
//!
//! A [`DataManager`] pulls raw days from a [`DataProvider`], runs them through
//! the analysis pipeline and keeps the most recent [`DashboardSnapshot`].
//! Every fetch is tagged with a [`RequestId`]; a result is applied only when
//! its id is newer than the last applied one, so a slow, older fetch can never
//! replace data from a newer one. Fetches are retried up to three times with
//! linear back-off, and a failure keeps the previous snapshot in place.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nutrition_core::error::Result;
use nutrition_core::models::RawDayMap;
use nutrition_data::analysis::{analyze, DashboardSnapshot};
use nutrition_data::reader::load_data;

/// Maximum number of fetch attempts per refresh.
const MAX_RETRY_ATTEMPTS: u32 = 3;

// ── DataProvider ──────────────────────────────────────────────────────────────

/// Source of raw per-day records.
pub trait DataProvider: Send + Sync {
    fn fetch(&self) -> Result<RawDayMap>;
}

/// Reads `days.json` and `products.json` from a directory.
#[derive(Debug, Clone)]
pub struct FileDataProvider {
    data_dir: PathBuf,
}

impl FileDataProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl DataProvider for FileDataProvider {
    fn fetch(&self) -> Result<RawDayMap> {
        load_data(&self.data_dir)
    }
}

/// Call `provider` up to three times, sleeping 0, 100 then 200 ms before each
/// attempt. Returns the last error when every attempt fails.
///
/// Blocks the calling thread; async callers run it on `spawn_blocking`.
pub fn fetch_with_retry(provider: &dyn DataProvider) -> Result<RawDayMap> {
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let sleep_ms = u64::from(attempt) * 100;
            tracing::debug!(attempt, sleep_ms, "retrying fetch after back-off");
            thread::sleep(Duration::from_millis(sleep_ms));
        }

        match provider.fetch() {
            Ok(days) => return Ok(days),
            Err(e) if attempt + 1 < MAX_RETRY_ATTEMPTS => {
                tracing::warn!(attempt, error = %e, "fetch attempt failed");
            }
            Err(e) => return Err(e),
        }
        attempt += 1;
    }
}

// ── RequestId ─────────────────────────────────────────────────────────────────

/// Monotonic tag for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What [`DataManager::complete`] did with a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result replaced the current snapshot.
    Applied,
    /// The fetch failed; the previous snapshot is kept.
    Failed,
    /// A newer request already completed; the result was dropped.
    Superseded,
}

// ── DataManager ───────────────────────────────────────────────────────────────

/// Owns the current snapshot and decides which fetch results may replace it.
///
/// ```no_run
/// use nutrition_runtime::data_manager::{DataManager, FileDataProvider};
///
/// let mut mgr = DataManager::new(FileDataProvider::new("/tmp/nutrition"));
/// mgr.refresh();
/// if let Some(snapshot) = mgr.snapshot() {
///     println!("{} days", snapshot.daily.len());
/// }
/// ```
pub struct DataManager {
    provider: Arc<dyn DataProvider>,
    next_request: u64,
    last_applied: Option<RequestId>,
    snapshot: Option<DashboardSnapshot>,
    last_error: Option<String>,
    last_refresh: Option<Instant>,
}

impl DataManager {
    pub fn new(provider: impl DataProvider + 'static) -> Self {
        Self::with_provider(Arc::new(provider))
    }

    pub fn with_provider(provider: Arc<dyn DataProvider>) -> Self {
        Self {
            provider,
            next_request: 0,
            last_applied: None,
            snapshot: None,
            last_error: None,
            last_refresh: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Shared handle to the provider, for fetching off the owning thread.
    pub fn provider(&self) -> Arc<dyn DataProvider> {
        Arc::clone(&self.provider)
    }

    /// Allocate the id for a new fetch. Ids strictly increase.
    pub fn begin_request(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    /// Record the outcome of the fetch tagged `id`.
    ///
    /// Results (successful or not) from a request older than the last applied
    /// one are dropped. A failure sets [`last_error`](Self::last_error) and
    /// leaves the current snapshot untouched.
    pub fn complete(&mut self, id: RequestId, result: Result<RawDayMap>) -> Completion {
        if self.last_applied.is_some_and(|last| id <= last) {
            tracing::debug!(request = %id, "discarding superseded fetch result");
            return Completion::Superseded;
        }

        match result {
            Ok(days) => {
                let snapshot = analyze(&days);
                tracing::debug!(
                    request = %id,
                    days = snapshot.metadata.days_processed,
                    weeks = snapshot.metadata.weeks_created,
                    "snapshot updated"
                );
                self.snapshot = Some(snapshot);
                self.last_applied = Some(id);
                self.last_error = None;
                self.last_refresh = Some(Instant::now());
                Completion::Applied
            }
            Err(e) => {
                tracing::warn!(request = %id, error = %e, "fetch failed; keeping previous snapshot");
                self.last_error = Some(e.to_string());
                Completion::Failed
            }
        }
    }

    /// Fetch synchronously (with retries) and apply the result.
    pub fn refresh(&mut self) -> Completion {
        let id = self.begin_request();
        let result = fetch_with_retry(self.provider.as_ref());
        self.complete(id, result)
    }

    /// The most recently applied snapshot, if any fetch has succeeded.
    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_applied(&self) -> Option<RequestId> {
        self.last_applied
    }

    /// Message of the last failed fetch; cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Time since the last applied snapshot.
    pub fn snapshot_age(&self) -> Option<Duration> {
        self.last_refresh.map(|ts| ts.elapsed())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
