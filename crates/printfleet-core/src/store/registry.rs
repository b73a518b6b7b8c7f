// ── Fleet registry ──
//
// Authoritative map of printer id -> record plus the poll handle of each
// printer's poller. One lock guards both so the consumer's tombstone check
// and the delete path can never interleave. No I/O happens under the lock.

use std::collections::HashMap;

use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;
use crate::model::{DeviceConfig, DeviceId, DeviceRecord, DeviceStage};
use crate::poller::{StatusUpdate, TelemetryUpdate};

/// Lifecycle of a printer's poller, as seen by the registry.
#[derive(Debug, Clone)]
pub enum PollHandle {
    /// A poller is running; cancelling the token stops it.
    Active(CancellationToken),
    /// The printer was deleted. Cleared when its poller's last message arrives.
    Tombstoned,
    /// No poller known.
    Absent,
}

impl PollHandle {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn is_tombstoned(&self) -> bool {
        matches!(self, Self::Tombstoned)
    }
}

/// What the consumer did with a status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The printer was deleted; the tombstone has been purged.
    Tombstoned,
    /// The emitting poller has been cancelled.
    Stale,
    /// No record for the id. Updates never create records.
    Unknown,
}

#[derive(Default)]
struct RegistryState {
    records: IndexMap<DeviceId, DeviceRecord>,
    /// Only `Active` and `Tombstoned` are stored; a missing key is `Absent`.
    handles: HashMap<DeviceId, PollHandle>,
}

/// The set of registered printers.
pub struct Registry {
    state: RwLock<RegistryState>,
    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        Self {
            state: RwLock::new(RegistryState::default()),
            version,
        }
    }

    /// Subscribe to the version counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Register a printer whose poller is driven by `token`.
    ///
    /// A tombstone left by an earlier delete of the same id is replaced.
    pub async fn add(
        &self,
        config: DeviceConfig,
        token: CancellationToken,
    ) -> Result<DeviceRecord, CoreError> {
        let record = DeviceRecord::new(config);
        let id = record.id.clone();

        let mut state = self.state.write().await;
        if state.records.contains_key(&id) {
            return Err(CoreError::AlreadyExists { id: id.to_string() });
        }
        state.records.insert(id.clone(), record.clone());
        state.handles.insert(id, PollHandle::Active(token));
        drop(state);

        self.bump_version();
        Ok(record)
    }

    /// Replace a printer's mutable configuration (name, ui, cameras).
    pub async fn update(&self, config: DeviceConfig) -> Result<DeviceRecord, CoreError> {
        let id = config.id();

        let mut state = self.state.write().await;
        let Some(record) = state.records.get_mut(&id) else {
            return Err(CoreError::DeviceNotFound { id: id.to_string() });
        };
        record.config.name = config.name;
        record.config.ui = config.ui;
        record.config.cameras = config.cameras;
        let updated = record.clone();
        drop(state);

        self.bump_version();
        Ok(updated)
    }

    /// Delete a printer, cancel its poller and leave a tombstone.
    pub async fn remove(&self, id: &DeviceId) -> Result<DeviceRecord, CoreError> {
        let mut state = self.state.write().await;
        let Some(record) = state.records.shift_remove(id) else {
            return Err(CoreError::DeviceNotFound { id: id.to_string() });
        };
        if let Some(PollHandle::Active(token)) =
            state.handles.insert(id.clone(), PollHandle::Tombstoned)
        {
            token.cancel();
        }
        drop(state);

        self.bump_version();
        Ok(record)
    }

    /// Merge one status update. The only path that writes telemetry.
    pub async fn apply(&self, update: StatusUpdate) -> ApplyOutcome {
        let mut state = self.state.write().await;

        if matches!(state.handles.get(&update.device_id), Some(PollHandle::Tombstoned)) {
            state.handles.remove(&update.device_id);
            return ApplyOutcome::Tombstoned;
        }
        if update.handle.is_cancelled() {
            return ApplyOutcome::Stale;
        }
        let Some(record) = state.records.get_mut(&update.device_id) else {
            return ApplyOutcome::Unknown;
        };

        match update.telemetry {
            TelemetryUpdate::Snapshot(snapshot) => {
                record.telemetry = *snapshot;
                record.stage = DeviceStage::Online;
                record.last_seen = Some(Utc::now());
            }
            TelemetryUpdate::Offline => {
                record.telemetry.mark_offline();
                record.stage = DeviceStage::Offline;
            }
            TelemetryUpdate::Stopped => return ApplyOutcome::Stale,
        }
        state
            .handles
            .insert(update.device_id, PollHandle::Active(update.handle));
        drop(state);

        self.bump_version();
        ApplyOutcome::Applied
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub async fn get(&self, id: &DeviceId) -> Option<DeviceRecord> {
        self.state.read().await.records.get(id).cloned()
    }

    pub async fn contains(&self, id: &DeviceId) -> bool {
        self.state.read().await.records.contains_key(id)
    }

    /// All records, sorted by id descending.
    pub async fn list(&self) -> Vec<DeviceRecord> {
        let mut records: Vec<DeviceRecord> =
            self.state.read().await.records.values().cloned().collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        records
    }

    /// Configurations in insertion order, for persistence.
    pub async fn configs(&self) -> Vec<DeviceConfig> {
        self.state
            .read()
            .await
            .records
            .values()
            .map(|r| r.config.clone())
            .collect()
    }

    pub async fn poll_handle(&self, id: &DeviceId) -> PollHandle {
        self.state
            .read()
            .await
            .handles
            .get(id)
            .cloned()
            .unwrap_or(PollHandle::Absent)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }
}
