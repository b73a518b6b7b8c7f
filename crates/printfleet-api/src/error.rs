use thiserror::Error;

/// Top-level error type for the `printfleet-api` crate.
///
/// Covers every failure mode of the upstream clients: transport,
/// non-success status codes, and payload decoding. `printfleet-core`
/// decides which of these count against a printer's health.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Upstream ────────────────────────────────────────────────────
    /// The upstream answered, but not with a 2xx.
    #[error("Upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the upstream answered with a body we could not decode.
    pub fn is_decode(&self) -> bool {
        match self {
            Self::Deserialization { .. } => true,
            Self::Transport(e) => e.is_decode(),
            _ => false,
        }
    }
}
