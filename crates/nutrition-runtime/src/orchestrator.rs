//! Async refresh orchestrator.
//!
//! Owns a [`DataManager`] inside a tokio task and refreshes it on a fixed
//! interval or on demand. Each fetch runs on the blocking pool tagged with its
//! [`RequestId`]; results come back over an internal channel and go through
//! [`DataManager::complete`], so overlapping fetches are resolved in request
//! order rather than arrival order. Applied snapshots are forwarded to the
//! caller through an `mpsc` channel.

use std::time::Duration;

use nutrition_core::error::Result;
use nutrition_core::models::RawDayMap;
use nutrition_data::analysis::DashboardSnapshot;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use crate::data_manager::{fetch_with_retry, Completion, DataManager, RequestId};

// ── Public types ──────────────────────────────────────────────────────────────

/// One message from the refresh loop to the presentation layer.
#[derive(Debug, Clone)]
pub enum RefreshUpdate {
    /// A newer snapshot was applied.
    Snapshot(DashboardSnapshot),
    /// A fetch failed; the previous snapshot remains current.
    Failed(String),
}

// ── RefreshOrchestrator ───────────────────────────────────────────────────────

/// Background refresh coordinator.
pub struct RefreshOrchestrator {
    refresh_interval: Duration,
    manager: DataManager,
}

impl RefreshOrchestrator {
    pub fn new(manager: DataManager, refresh_interval_secs: u64) -> Self {
        Self {
            refresh_interval: Duration::from_secs(refresh_interval_secs),
            manager,
        }
    }

    /// Spawn the refresh loop.
    ///
    /// Returns the update receiver and a [`RefreshHandle`] for requesting
    /// immediate refreshes or stopping the loop.
    pub fn start(self) -> (mpsc::Receiver<RefreshUpdate>, RefreshHandle) {
        let (update_tx, update_rx) = mpsc::channel(16);
        let (refresh_tx, refresh_rx) = mpsc::channel(4);

        let handle = tokio::spawn(async move {
            self.refresh_loop(update_tx, refresh_rx).await;
        });

        (update_rx, RefreshHandle { handle, refresh_tx })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Fetch immediately, then on every tick or refresh request. Exits when
    /// the update receiver is dropped.
    async fn refresh_loop(
        mut self,
        update_tx: mpsc::Sender<RefreshUpdate>,
        mut refresh_rx: mpsc::Receiver<()>,
    ) {
        let (result_tx, mut result_rx) = mpsc::unbounded_channel();

        self.spawn_fetch(&result_tx);

        let mut interval = time::interval(self.refresh_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately; the initial fetch is already running.
        interval.tick().await;

        let mut refresh_open = true;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.spawn_fetch(&result_tx);
                }
                request = refresh_rx.recv(), if refresh_open => {
                    match request {
                        Some(()) => {
                            tracing::debug!("manual refresh requested");
                            self.spawn_fetch(&result_tx);
                        }
                        None => refresh_open = false,
                    }
                }
                Some((id, result)) = result_rx.recv() => {
                    if !self.apply(id, result, &update_tx).await {
                        tracing::debug!("update channel closed; exiting refresh loop");
                        break;
                    }
                }
            }
        }
    }

    /// Start one tagged fetch on the blocking pool.
    fn spawn_fetch(&mut self, result_tx: &mpsc::UnboundedSender<(RequestId, Result<RawDayMap>)>) {
        let id = self.manager.begin_request();
        let provider = self.manager.provider();
        let result_tx = result_tx.clone();

        tracing::debug!(request = %id, "starting fetch");
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || fetch_with_retry(provider.as_ref()))
                .await
                .unwrap_or_else(|e| {
                    Err(nutrition_core::error::DashboardError::Other(e.into()))
                });
            let _ = result_tx.send((id, result));
        });
    }

    /// Apply a finished fetch and forward the outcome. Returns `false` once
    /// the receiver is gone.
    async fn apply(
        &mut self,
        id: RequestId,
        result: Result<RawDayMap>,
        update_tx: &mpsc::Sender<RefreshUpdate>,
    ) -> bool {
        let update = match self.manager.complete(id, result) {
            Completion::Applied => match self.manager.snapshot() {
                Some(snapshot) => RefreshUpdate::Snapshot(snapshot.clone()),
                None => return true,
            },
            Completion::Failed => RefreshUpdate::Failed(
                self.manager.last_error().unwrap_or_default().to_string(),
            ),
            Completion::Superseded => return !update_tx.is_closed(),
        };

        update_tx.send(update).await.is_ok()
    }
}

// ── RefreshHandle ─────────────────────────────────────────────────────────────

/// Handle to the background refresh task.
pub struct RefreshHandle {
    handle: tokio::task::JoinHandle<()>,
    refresh_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Ask for an immediate refresh. Returns `false` when the loop has
    /// stopped or already has requests queued.
    pub fn request_refresh(&self) -> bool {
        self.refresh_tx.try_send(()).is_ok()
    }

    /// Stop the refresh loop.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
