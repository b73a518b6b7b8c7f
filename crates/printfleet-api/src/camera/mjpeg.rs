use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{CameraProber, StreamCandidate, StreamSource};
use crate::error::Error;

/// Marker text on mjpg-streamer's built-in index page.
const STREAMER_MARKER: &str = "Details about the M-JPEG streamer";

#[derive(Debug, Deserialize)]
struct ProgramInfo {
    #[serde(default)]
    inputs: Vec<serde_json::Value>,
}

impl CameraProber {
    /// Probe `http://{host}:{port}{path}` for an MJPEG streamer.
    ///
    /// `program.json` is tried first; one candidate per declared input.
    /// If it is not served, the base page is fetched and accepted as a
    /// single stream when it carries the mjpg-streamer marker.
    pub async fn probe_mjpeg_streamer(
        &self,
        host: &str,
        port: u16,
        path: &str,
    ) -> Result<Vec<StreamCandidate>, Error> {
        let base = format!("http://{host}:{port}{path}");
        let program_url = Url::parse(&format!("{base}/program.json"))?;
        debug!(url = %program_url, "probing mjpeg streamer");

        let resp = self.http.get(program_url).send().await?;
        if resp.status().is_success() {
            let body = resp.text().await?;
            let program: ProgramInfo =
                serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body,
                })?;

            return (0..program.inputs.len())
                .map(|i| {
                    Ok(StreamCandidate {
                        source: StreamSource::MjpegStreamer,
                        url: Url::parse(&format!("{base}/?action=stream_{i}"))?,
                    })
                })
                .collect();
        }

        let base_url = Url::parse(&base)?;
        let resp = self.http.get(base_url.clone()).send().await?;
        if !resp.status().is_success() {
            return Ok(Vec::new());
        }

        let body = resp.text().await?;
        if body.contains(STREAMER_MARKER) {
            Ok(vec![StreamCandidate {
                source: StreamSource::MjpegStreamer,
                url: base_url,
            }])
        } else {
            Ok(Vec::new())
        }
    }
}
