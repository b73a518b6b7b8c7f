// ── Printer domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::camera::CameraConfig;
use super::ids::DeviceId;
use super::telemetry::TelemetrySnapshot;
use crate::error::CoreError;

/// Operator-supplied description of one printer.
///
/// `host` and `port` are the identity; only `name`, `ui`, and `cameras`
/// change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Preferred UI backend for the printer root; falls back to the first one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui: Option<String>,
    #[serde(default)]
    pub cameras: Vec<CameraConfig>,
}

impl DeviceConfig {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            ui: None,
            cameras: Vec::new(),
        }
    }

    pub fn id(&self) -> DeviceId {
        DeviceId::for_endpoint(&self.host, self.port)
    }

    /// `http://host:port`, the printer's control endpoint.
    pub fn base_url(&self) -> Result<Url, CoreError> {
        Url::parse(&format!("http://{}:{}", self.host, self.port)).map_err(|e| {
            CoreError::ValidationFailed {
                message: format!("invalid printer address {}:{}: {e}", self.host, self.port),
            }
        })
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.host.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "printer host must not be empty".into(),
            });
        }
        if self.host.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(CoreError::ValidationFailed {
                message: format!("printer host {:?} is not a hostname or IP", self.host),
            });
        }
        if self.port == 0 {
            return Err(CoreError::ValidationFailed {
                message: "printer port must be non-zero".into(),
            });
        }
        self.base_url()?;

        for cam in &self.cameras {
            if cam.ip.trim().is_empty() || cam.port == 0 {
                return Err(CoreError::ValidationFailed {
                    message: format!("camera {:?} needs an ip and a non-zero port", cam.path),
                });
            }
            if cam.ip.contains(|c: char| c.is_whitespace() || c == '/') {
                return Err(CoreError::ValidationFailed {
                    message: format!("camera ip {:?} is not a hostname or IP", cam.ip),
                });
            }
        }
        Ok(())
    }

    /// Recompute every camera id from its endpoint.
    pub fn normalized(mut self) -> Self {
        self.cameras = self
            .cameras
            .into_iter()
            .map(CameraConfig::normalized)
            .collect();
        self
    }
}

/// Lifecycle stage as seen by the poller.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceStage {
    #[default]
    Offline,
    Online,
}

/// Registry entry: configuration plus the latest observed telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub config: DeviceConfig,
    pub stage: DeviceStage,
    pub telemetry: TelemetrySnapshot,
    /// Last successful poll.
    pub last_seen: Option<DateTime<Utc>>,
}

impl DeviceRecord {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            id: config.id(),
            config,
            stage: DeviceStage::Offline,
            telemetry: TelemetrySnapshot::default(),
            last_seen: None,
        }
    }

    pub fn is_online(&self) -> bool {
        self.stage == DeviceStage::Online
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CameraId, CameraKind};

    #[test]
    fn new_record_starts_offline() {
        let record = DeviceRecord::new(DeviceConfig::new("voron", "192.0.2.5", 7125));
        assert_eq!(record.id, DeviceId::for_endpoint("192.0.2.5", 7125));
        assert_eq!(record.stage, DeviceStage::Offline);
        assert!(record.telemetry.is_offline());
        assert!(record.last_seen.is_none());
    }

    #[test]
    fn validate_rejects_bad_addresses() {
        assert!(DeviceConfig::new("a", "", 7125).validate().is_err());
        assert!(DeviceConfig::new("a", "host name", 7125).validate().is_err());
        assert!(DeviceConfig::new("a", "host/x", 7125).validate().is_err());
        assert!(DeviceConfig::new("a", "192.0.2.5", 0).validate().is_err());
        assert!(DeviceConfig::new("a", "192.0.2.5", 7125).validate().is_ok());
    }

    #[test]
    fn validate_rejects_incomplete_camera() {
        let mut config = DeviceConfig::new("a", "192.0.2.5", 7125);
        config
            .cameras
            .push(CameraConfig::new("", 80, "/webcam/", CameraKind::MjpegStream));
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_camera_ip_with_path() {
        for ip in ["10.0.0.2/x", "10.0.0.2 x"] {
            let mut config = DeviceConfig::new("a", "192.0.2.5", 7125);
            config
                .cameras
                .push(CameraConfig::new(ip, 80, "/webcam/", CameraKind::MjpegStream));
            assert!(config.validate().is_err(), "{ip} accepted");
        }

        let mut config = DeviceConfig::new("a", "192.0.2.5", 7125);
        config
            .cameras
            .push(CameraConfig::new("10.0.0.2", 80, "/webcam/", CameraKind::MjpegStream));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn normalized_recomputes_camera_ids() {
        let mut config = DeviceConfig::new("a", "192.0.2.5", 7125);
        let mut cam = CameraConfig::new("192.0.2.5", 80, "/webcam/", CameraKind::MjpegStream);
        cam.id = CameraId::from("client-made");
        config.cameras.push(cam);

        let config = config.normalized();
        assert_eq!(
            config.cameras[0].id,
            CameraId::for_stream("192.0.2.5", 80, "/webcam/")
        );
    }

    #[test]
    fn stage_display() {
        assert_eq!(DeviceStage::Online.to_string(), "online");
        assert_eq!(DeviceStage::Offline.to_string(), "offline");
    }
}
