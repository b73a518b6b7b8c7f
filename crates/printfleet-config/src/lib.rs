//! Configuration for the printfleet gateway.
//!
//! One TOML document holds the listener, poller tuning, UI backends,
//! remote access and the printer list. Loading layers defaults, the file
//! and `PRINTFLEET_*` environment variables; [`Config::to_settings`]
//! translates the result into `printfleet_core::GatewaySettings`.

mod store;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use url::Url;

use printfleet_core::routing::{CAMERAS_SEGMENT, CONTROL_API_SEGMENTS};
use printfleet_core::{DeviceConfig, DiscoveryTargets, GatewaySettings, MjpegTarget, UiBackend};

pub use store::TomlConfigStore;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Local listener port.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    #[serde(default)]
    pub poller: PollerConfig,

    /// UI backends in preference order. The first is the default UI.
    #[serde(default = "default_ui_backends")]
    pub ui_backends: Vec<UiBackendConfig>,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    /// Registered printers. Rewritten on every add, update and delete.
    #[serde(default)]
    pub printers: Vec<DeviceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            poller: PollerConfig::default(),
            ui_backends: default_ui_backends(),
            discovery: DiscoveryConfig::default(),
            remote: RemoteConfig::default(),
            printers: Vec::new(),
        }
    }
}

fn default_listen_port() -> u16 {
    9873
}

fn default_ui_backends() -> Vec<UiBackendConfig> {
    vec![
        UiBackendConfig {
            name: "fluidd".into(),
            url: "http://127.0.0.1:9871".into(),
        },
        UiBackendConfig {
            name: "mainsail".into(),
            url: "http://127.0.0.1:9872".into(),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollerConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Consecutive failures before a printer is reported offline.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            timeout_secs: default_timeout(),
            failure_threshold: default_failure_threshold(),
        }
    }
}

fn default_interval() -> u64 {
    3
}
fn default_timeout() -> u64 {
    3
}
fn default_failure_threshold() -> u32 {
    3
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UiBackendConfig {
    /// Path segment under `/printers/<id>/`, e.g. `fluidd`.
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_mjpeg_targets")]
    pub mjpeg: Vec<MjpegTargetConfig>,

    /// go2rtc API port. `0` disables the go2rtc probe.
    #[serde(default = "default_go2rtc_port")]
    pub go2rtc_port: u16,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            mjpeg: default_mjpeg_targets(),
            go2rtc_port: default_go2rtc_port(),
        }
    }
}

fn default_mjpeg_targets() -> Vec<MjpegTargetConfig> {
    DiscoveryTargets::default()
        .mjpeg
        .into_iter()
        .map(|t| MjpegTargetConfig {
            port: t.port,
            path: t.path,
        })
        .collect()
}

fn default_go2rtc_port() -> u16 {
    DiscoveryTargets::default().go2rtc_port.unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MjpegTargetConfig {
    pub port: u16,
    pub path: String,
}

/// Second listener exposed through a tunnel (e.g. a Tailscale funnel).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_remote_listen")]
    pub listen: String,

    /// Who the tunnel layer lets in. Checked here, enforced there.
    #[serde(default)]
    pub oauth: Vec<OAuthRule>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_remote_listen(),
            oauth: Vec::new(),
        }
    }
}

fn default_remote_listen() -> String {
    "100.64.0.1:80".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OAuthRule {
    /// Identity provider, e.g. `github` or `google`.
    pub provider: String,

    #[serde(default)]
    pub emails: Vec<String>,
}

// ── Validation & translation ────────────────────────────────────────

impl Config {
    /// Startup invariants. Any violation is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poller.interval_secs == 0 {
            return Err(ConfigError::validation("poller.interval_secs", "must be at least 1"));
        }
        if self.poller.timeout_secs == 0 {
            return Err(ConfigError::validation("poller.timeout_secs", "must be at least 1"));
        }
        if self.poller.failure_threshold == 0 {
            return Err(ConfigError::validation(
                "poller.failure_threshold",
                "must be at least 1",
            ));
        }

        self.validate_ui_backends()?;

        if self.remote.enabled {
            self.remote
                .listen
                .parse::<std::net::SocketAddr>()
                .map_err(|e| ConfigError::validation("remote.listen", e.to_string()))?;
            let has_email = self
                .remote
                .oauth
                .iter()
                .any(|rule| rule.emails.iter().any(|email| !email.trim().is_empty()));
            if !has_email {
                return Err(ConfigError::validation(
                    "remote.oauth",
                    "remote access is enabled but no OAuth rule allows any email",
                ));
            }
        }

        Ok(())
    }

    fn validate_ui_backends(&self) -> Result<(), ConfigError> {
        if self.ui_backends.is_empty() {
            return Err(ConfigError::validation("ui_backends", "at least one UI backend is required"));
        }

        let mut seen = HashSet::new();
        for ui in &self.ui_backends {
            let name = ui.name.as_str();
            if name.is_empty() || name.contains('/') {
                return Err(ConfigError::validation(
                    "ui_backends.name",
                    format!("'{name}' is not a single path segment"),
                ));
            }
            if name == CAMERAS_SEGMENT || CONTROL_API_SEGMENTS.contains(&name) {
                return Err(ConfigError::validation(
                    "ui_backends.name",
                    format!("'{name}' is reserved"),
                ));
            }
            if !seen.insert(name) {
                return Err(ConfigError::validation(
                    "ui_backends.name",
                    format!("duplicate UI backend '{name}'"),
                ));
            }
            parse_ui_url(ui)?;
        }
        Ok(())
    }

    /// Build the core's runtime settings.
    pub fn to_settings(&self) -> Result<GatewaySettings, ConfigError> {
        let ui_backends = self
            .ui_backends
            .iter()
            .map(|ui| {
                Ok(UiBackend {
                    name: ui.name.clone(),
                    url: parse_ui_url(ui)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let discovery = DiscoveryTargets {
            mjpeg: self
                .discovery
                .mjpeg
                .iter()
                .map(|t| MjpegTarget::new(t.port, t.path.clone()))
                .collect(),
            go2rtc_port: (self.discovery.go2rtc_port != 0).then_some(self.discovery.go2rtc_port),
        };

        Ok(GatewaySettings {
            poll_interval: Duration::from_secs(self.poller.interval_secs),
            request_timeout: Duration::from_secs(self.poller.timeout_secs),
            failure_threshold: self.poller.failure_threshold,
            ui_backends,
            discovery,
        })
    }
}

fn parse_ui_url(ui: &UiBackendConfig) -> Result<Url, ConfigError> {
    let url: Url = ui.url.parse().map_err(|_| ConfigError::Validation {
        field: "ui_backends.url".into(),
        reason: format!("invalid URL for '{}': {}", ui.name, ui.url),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::validation(
            "ui_backends.url",
            format!("'{}' must be http or https", ui.url),
        ));
    }
    Ok(url)
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "printfleet", "printfleet").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("printfleet");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from defaults, the file at `path` and environment.
///
/// A missing file is not an error; defaults apply.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PRINTFLEET_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Like [`load_config`], but writes a default file first if none exists.
pub fn load_or_init(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        save_config(path, &Config::default())?;
        info!(path = %path.display(), "wrote default configuration");
    }
    load_config(path)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
