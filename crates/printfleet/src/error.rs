//! Binary error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use printfleet_config::ConfigError;
use printfleet_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 3;
    pub const BIND: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Invalid configuration in {path}")]
    #[diagnostic(
        code(printfleet::config),
        help("Fix the file or override values with PRINTFLEET_* environment variables.")
    )]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    #[error("Could not listen on {addr}")]
    #[diagnostic(
        code(printfleet::bind),
        help("Is another instance running? Pick a different port with --port.")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not open log file {path}")]
    #[diagnostic(code(printfleet::log_file))]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(printfleet::gateway))]
    Gateway(#[from] CoreError),

    #[error(transparent)]
    #[diagnostic(code(printfleet::http_client))]
    HttpClient(#[from] printfleet_api::Error),

    #[error("Server stopped unexpectedly")]
    #[diagnostic(code(printfleet::server))]
    Server(#[source] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => exit_code::CONFIG,
            Self::Bind { .. } => exit_code::BIND,
            _ => exit_code::GENERAL,
        }
    }
}
