// printfleet-api: Async HTTP clients for Moonraker hosts and camera streamers

pub mod camera;
pub mod error;
pub mod moonraker;
pub mod transport;

pub use camera::{CameraProber, StreamCandidate, StreamSource};
pub use error::Error;
pub use moonraker::MoonrakerClient;
pub use moonraker::models::{
    HeaterStats, ObjectsQuery, PrintStats, PrintStatsInfo, PrinterObjects, VirtualSdCard, Webcam,
};
pub use transport::TransportConfig;
