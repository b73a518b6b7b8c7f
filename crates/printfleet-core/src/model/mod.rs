// ── Domain model ──
//
// Canonical printer, camera and telemetry types shared by the registry,
// the poller and the HTTP surface.

pub mod camera;
pub mod device;
pub mod ids;
pub mod telemetry;

pub use camera::{CameraConfig, CameraKind};
pub use device::{DeviceConfig, DeviceRecord, DeviceStage};
pub use ids::{CameraId, DeviceId};
pub use telemetry::{HeaterState, OFFLINE_STATE, SdCardState, TelemetrySnapshot};
