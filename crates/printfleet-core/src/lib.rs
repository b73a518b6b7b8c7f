//! Fleet state and routing between `printfleet-api` and the HTTP surface.
//!
//! - **[`Gateway`]**: Central facade. Owns the printer registry, the
//!   route table, the status channel, one poller task per printer and the
//!   single status consumer. [`add_device`](Gateway::add_device),
//!   [`update_device`](Gateway::update_device) and
//!   [`remove_device`](Gateway::remove_device) are serialized; reads are not.
//!
//! - **[`Registry`]**: Printer records plus each poller's [`PollHandle`]
//!   under one lock. Telemetry is only ever written by the consumer.
//!
//! - **[`RouteTable`]** / **[`DeviceRoutes`]**: Per-printer route sets,
//!   built off to the side and swapped in whole.
//!
//! - **[`CameraDiscovery`]**: Concurrent best-effort camera probing.
//!
//! - **[`ConfigPersistence`]**: The seam through which the printer list is
//!   saved. Core never touches disk.

pub mod config;
mod consumer;
pub mod discovery;
pub mod error;
pub mod gateway;
pub mod model;
pub mod persistence;
pub mod poller;
pub mod routing;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DiscoveryTargets, GatewaySettings, MjpegTarget, UiBackend};
pub use discovery::CameraDiscovery;
pub use error::CoreError;
pub use gateway::Gateway;
pub use model::{
    CameraConfig, CameraId, CameraKind, DeviceConfig, DeviceId, DeviceRecord, DeviceStage,
    HeaterState, OFFLINE_STATE, SdCardState, TelemetrySnapshot,
};
pub use persistence::{ConfigPersistence, MemoryPersistence};
pub use poller::{StatusUpdate, TelemetryUpdate};
pub use routing::{DeviceRoutes, ResolvedRoute, RouteTable, RouteTarget};
pub use store::{ApplyOutcome, PollHandle, Registry};
