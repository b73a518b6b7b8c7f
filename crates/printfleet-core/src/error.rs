// ── Core error types ──
//
// Errors surfaced by the gateway to its callers. Upstream HTTP failures
// are folded into `Upstream`; the poller handles its own transport errors
// and never returns them here.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Registry errors ──────────────────────────────────────────────
    #[error("Printer already registered: {id}")]
    AlreadyExists { id: String },

    #[error("Printer not found: {id}")]
    DeviceNotFound { id: String },

    #[error("No routes published for printer {id}")]
    RoutesNotFound { id: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Failed to persist configuration: {message}")]
    Persistence { message: String },

    #[error("Upstream request failed: {message}")]
    Upstream { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<printfleet_api::Error> for CoreError {
    fn from(err: printfleet_api::Error) -> Self {
        match err {
            printfleet_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            printfleet_api::Error::ClientBuild(msg) => CoreError::Internal(msg),
            other => CoreError::Upstream {
                message: other.to_string(),
            },
        }
    }
}
