// ── Runtime gateway configuration ──
//
// These types describe *how* the gateway polls, probes and routes.
// They never touch disk: the binary builds `GatewaySettings` from the
// configuration document and hands it in.

use std::time::Duration;

use url::Url;

/// A browser UI served for every printer (Fluidd, Mainsail, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiBackend {
    /// Path segment the UI is mounted under, e.g. `fluidd`.
    pub name: String,
    pub url: Url,
}

/// One `port + path` an MJPEG streamer may be listening on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MjpegTarget {
    pub port: u16,
    pub path: String,
}

impl MjpegTarget {
    pub fn new(port: u16, path: impl Into<String>) -> Self {
        Self {
            port,
            path: path.into(),
        }
    }
}

/// Where camera discovery looks on a printer host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryTargets {
    pub mjpeg: Vec<MjpegTarget>,
    /// go2rtc API port; `None` disables the go2rtc probe.
    pub go2rtc_port: Option<u16>,
}

impl Default for DiscoveryTargets {
    fn default() -> Self {
        Self {
            mjpeg: vec![
                MjpegTarget::new(4408, "/webcam"),
                MjpegTarget::new(4409, "/webcam"),
                MjpegTarget::new(80, "/webcam"),
                MjpegTarget::new(80, "/webcam2"),
                MjpegTarget::new(80, "/webcam3"),
                MjpegTarget::new(80, "/webcam4"),
            ],
            go2rtc_port: Some(1984),
        }
    }
}

/// Configuration for a running gateway.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Status poll period per printer.
    pub poll_interval: Duration,
    /// Deadline for every poll and probe request.
    pub request_timeout: Duration,
    /// Consecutive poll failures before a printer is reported offline.
    pub failure_threshold: u32,
    /// UI backends, in preference order. The first is the default.
    pub ui_backends: Vec<UiBackend>,
    pub discovery: DiscoveryTargets,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            request_timeout: Duration::from_secs(3),
            failure_threshold: 3,
            ui_backends: default_ui_backends(),
            discovery: DiscoveryTargets::default(),
        }
    }
}

impl GatewaySettings {
    pub fn ui_backend(&self, name: &str) -> Option<&UiBackend> {
        self.ui_backends.iter().find(|ui| ui.name == name)
    }
}

fn default_ui_backends() -> Vec<UiBackend> {
    [("fluidd", 9871), ("mainsail", 9872)]
        .into_iter()
        .filter_map(|(name, port)| {
            Url::parse(&format!("http://127.0.0.1:{port}"))
                .ok()
                .map(|url| UiBackend {
                    name: name.to_owned(),
                    url,
                })
        })
        .collect()
}
