// ── Configuration persistence seam ──
//
// The gateway never touches disk. After every successful add, update or
// delete it hands the full printer list to a `ConfigPersistence`.

use std::sync::Mutex;

use crate::error::CoreError;
use crate::model::DeviceConfig;

/// Sink for the printer list. Called from a blocking task.
pub trait ConfigPersistence: Send + Sync + 'static {
    fn save_devices(&self, devices: &[DeviceConfig]) -> Result<(), CoreError>;
}

/// Keeps the last saved list in memory.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    saved: Mutex<Option<Vec<DeviceConfig>>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently saved list, if any save happened.
    pub fn last_saved(&self) -> Option<Vec<DeviceConfig>> {
        self.saved.lock().ok()?.clone()
    }
}

impl ConfigPersistence for MemoryPersistence {
    fn save_devices(&self, devices: &[DeviceConfig]) -> Result<(), CoreError> {
        let mut saved = self.saved.lock().map_err(|e| CoreError::Persistence {
            message: format!("lock poisoned: {e}"),
        })?;
        *saved = Some(devices.to_vec());
        Ok(())
    }
}
