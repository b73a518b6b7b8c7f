//! HTTP surface of the printfleet gateway.
//!
//! [`build_router`] mounts the device API under `/v1/api` and the dynamic
//! per-printer proxy under `/printers/{id}`. [`serve`] runs it on any
//! already-bound listener, so a tunnel can hand in its own.

mod api;
mod error;
mod proxy;
mod router;

use printfleet_api::TransportConfig;
use printfleet_core::Gateway;

pub use error::ApiError;
pub use router::{build_router, serve};

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    gateway: Gateway,
    /// Forwarding client: no redirects, no overall timeout.
    proxy: reqwest::Client,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Result<Self, printfleet_api::Error> {
        let transport =
            TransportConfig::default().with_timeout(gateway.settings().request_timeout);
        let proxy = transport.build_proxy_client()?;
        Ok(Self { gateway, proxy })
    }
}
