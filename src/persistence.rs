//! Loading, saving and periodically flushing the snapshot.
//!
//! Persistence is best-effort: [`Telemetry::initialize`] and
//! [`Telemetry::save`] log failures and carry on with the in-memory state.
//! The `try_` variants surface the error instead.

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::{MetricsSnapshot, Result, Telemetry, TelemetryConfig};

/// Handle to the background save task.
///
/// Dropping the handle detaches the task; it keeps saving until the
/// runtime shuts down. Call [`PeriodicSave::stop`] to end it.
#[derive(Debug)]
pub struct PeriodicSave {
    handle: JoinHandle<()>,
}

impl PeriodicSave {
    /// Stops the background task. Saves already in flight still complete.
    pub fn stop(self) {
        self.handle.abort();
    }

    /// Returns true while the background task is alive.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Telemetry {
    /// Overlays the persisted snapshot, if any, onto the in-memory one.
    ///
    /// Failures are logged and the current state is kept.
    pub async fn initialize(&self) {
        if let Err(e) = self.try_initialize().await {
            warn!("Failed to load telemetry snapshot: {}", e);
        }
    }

    /// Like [`Telemetry::initialize`], but returns the load error.
    ///
    /// Returns whether a persisted snapshot was found.
    pub async fn try_initialize(&self) -> Result<bool> {
        let key = &self.config.storage_key;
        let Some(persisted) = self.store.get(key).await? else {
            debug!(%key, "no persisted telemetry snapshot");
            return Ok(false);
        };

        let mut state = self.write();
        let merged = state.overlay(persisted)?;
        *state = merged;
        debug!(%key, searches = state.search_count, "telemetry snapshot loaded");
        Ok(true)
    }

    /// Writes the whole snapshot to the store.
    ///
    /// Failures are logged; the next save simply overwrites.
    pub async fn save(&self) {
        if let Err(e) = self.try_save().await {
            warn!("Failed to save telemetry snapshot: {}", e);
        }
    }

    /// Like [`Telemetry::save`], but returns the write error.
    pub async fn try_save(&self) -> Result<()> {
        let value = {
            let state = self.read();
            serde_json::to_value(&*state)?
        };
        let key = &self.config.storage_key;
        self.store.set(key, value).await?;
        debug!(%key, "telemetry snapshot saved");
        Ok(())
    }

    /// Starts a new measurement window and persists it.
    ///
    /// A failed write is logged; the in-memory state is reset regardless.
    pub async fn reset(&self) {
        if let Err(e) = self.try_reset().await {
            warn!("Failed to save telemetry snapshot: {}", e);
        }
    }

    /// Like [`Telemetry::reset`], but returns the write error.
    pub async fn try_reset(&self) -> Result<()> {
        let now = Utc::now();
        *self.write() = MetricsSnapshot::new(now);
        info!(last_reset = %now, "telemetry reset");
        self.try_save().await
    }

    /// Spawns a task that saves every `save_interval`.
    ///
    /// The first save happens one interval after this call. Each tick
    /// spawns its own save, so a slow store may see overlapping writes;
    /// every write is a full snapshot and the last one wins. A zero
    /// interval falls back to the default period.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_periodic_save(&self) -> PeriodicSave {
        let mut period = self.config.save_interval();
        if period.is_zero() {
            period = TelemetryConfig::default().save_interval();
            warn!(
                period_ms = period.as_millis() as u64,
                "save interval is zero, using the default"
            );
        }
        let telemetry = self.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let telemetry = telemetry.clone();
                tokio::spawn(async move { telemetry.save().await });
            }
        });
        debug!(period_ms = period.as_millis() as u64, "periodic save started");

        PeriodicSave { handle }
    }
}
