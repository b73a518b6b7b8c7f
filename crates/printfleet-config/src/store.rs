// ── TOML-backed printer persistence ──
//
// Keeps the loaded document in memory and rewrites the whole file when the
// gateway reports a new printer list. Everything except `printers` is
// written back exactly as loaded.

use std::path::PathBuf;
use std::sync::Mutex;

use tracing::debug;

use printfleet_core::{ConfigPersistence, CoreError, DeviceConfig};

use crate::{Config, save_config};

#[derive(Debug)]
pub struct TomlConfigStore {
    path: PathBuf,
    document: Mutex<Config>,
}

impl TomlConfigStore {
    pub fn new(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            document: Mutex::new(config),
        }
    }
}

impl ConfigPersistence for TomlConfigStore {
    fn save_devices(&self, devices: &[DeviceConfig]) -> Result<(), CoreError> {
        let mut document = self.document.lock().map_err(|_| CoreError::Persistence {
            message: "config document lock poisoned".into(),
        })?;
        document.printers = devices.to_vec();

        save_config(&self.path, &document).map_err(|e| CoreError::Persistence {
            message: format!("{}: {e}", self.path.display()),
        })?;
        debug!(path = %self.path.display(), printers = devices.len(), "config saved");
        Ok(())
    }
}
