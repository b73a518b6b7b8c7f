// Camera streamer probes
//
// Best-effort detection of camera services running next to a printer.
// Each probe answers with zero or more candidate stream URLs; callers
// treat any error as "no camera here".

mod go2rtc;
mod mjpeg;

use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Which streamer produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamSource {
    /// mjpg-streamer / ustreamer / crowsnest style MJPEG server.
    MjpegStreamer,
    /// go2rtc stream multiplexer.
    Go2rtc,
}

/// One stream URL offered by a probed service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamCandidate {
    pub source: StreamSource,
    pub url: Url,
}

/// HTTP client for camera probes.
#[derive(Debug, Clone)]
pub struct CameraProber {
    http: reqwest::Client,
}

impl CameraProber {
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
        })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}
