// ── Camera domain types ──

use serde::{Deserialize, Serialize};
use url::Url;

use super::ids::CameraId;

/// How a camera stream was found or what serves it.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CameraKind {
    #[default]
    MjpegStream,
    Go2rtc,
    /// Listed by the printer host's own webcam registry with a full URL.
    MoonrakerReported,
}

/// A camera stream reachable from the gateway.
///
/// `path` carries the stream path and query, e.g. `/webcam/?action=stream`.
/// The id is always recomputed from `(ip, port, path)`; a client-supplied
/// value never survives [`CameraConfig::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub id: CameraId,
    pub ip: String,
    pub port: u16,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub kind: CameraKind,
}

impl CameraConfig {
    pub fn new(ip: impl Into<String>, port: u16, path: impl Into<String>, kind: CameraKind) -> Self {
        let ip = ip.into();
        let path = path.into();
        Self {
            id: CameraId::for_stream(&ip, port, &path),
            ip,
            port,
            path,
            kind,
        }
    }

    /// Build from an absolute stream URL. `None` for non-HTTP or host-less URLs.
    pub fn from_url(url: &Url, kind: CameraKind) -> Option<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let host = url.host_str()?;
        let port = url.port_or_known_default()?;
        let path = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_owned(),
        };
        Some(Self::new(host, port, path, kind))
    }

    /// Recompute the id from the stream endpoint.
    pub fn normalized(mut self) -> Self {
        self.id = CameraId::for_stream(&self.ip, self.port, &self.path);
        self
    }

    /// `http://ip:port`, the upstream every request for this camera goes to.
    pub fn upstream_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("http://{}:{}", self.ip, self.port))
    }

    /// First path segment, for cameras UIs address relative to the printer
    /// (`/webcam/?action=stream` is served under `<printer>/webcam/`).
    ///
    /// `None` when the path has a single segment or the first segment
    /// carries a query, since a route there would swallow the UI root.
    pub fn relative_prefix(&self) -> Option<&str> {
        let trimmed = self.path.strip_prefix('/').unwrap_or(&self.path);
        let mut segments = trimmed.split('/');
        let first = segments.next()?;
        segments.next()?;
        if first.is_empty() || first.contains(['?', '=']) {
            return None;
        }
        Some(first)
    }
}
