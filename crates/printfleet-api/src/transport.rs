// Shared transport configuration for building reqwest::Client instances.
//
// Pollers, camera probes, and the reverse proxy all build their clients
// here so timeouts and the user agent stay consistent.

use std::time::Duration;

const USER_AGENT: &str = concat!("printfleet/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-request deadline for API calls (polls, probes).
    pub timeout: Duration,
    /// Deadline for establishing a TCP connection.
    pub connect_timeout: Duration,
    /// Accept self-signed certificates on `https` upstreams.
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            connect_timeout: Duration::from_secs(3),
            accept_invalid_certs: true,
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = self.connect_timeout.min(timeout);
        self
    }

    /// Build a `reqwest::Client` for bounded API calls.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| crate::error::Error::ClientBuild(e.to_string()))
    }

    /// Build a `reqwest::Client` for transparent forwarding.
    ///
    /// No overall timeout (camera streams never end), no redirect following,
    /// and no transparent decompression: bodies pass through byte-for-byte.
    pub fn build_proxy_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::none())
            .no_gzip()
            .no_brotli()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| crate::error::Error::ClientBuild(e.to_string()))
    }
}
