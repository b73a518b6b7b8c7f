// Moonraker JSON/HTTP API
//
// Only the two read endpoints the gateway needs: the object query used
// for telemetry polling and the webcam list used to vet discovered cameras.

pub mod client;
pub mod models;

pub use client::MoonrakerClient;
