use tracing::debug;
use url::Url;

use super::{CameraProber, StreamCandidate, StreamSource};
use crate::error::Error;

impl CameraProber {
    /// Probe a go2rtc instance; one candidate per configured stream.
    pub async fn probe_go2rtc(&self, host: &str, port: u16) -> Result<Vec<StreamCandidate>, Error> {
        let streams_url = Url::parse(&format!("http://{host}:{port}/api/streams"))?;
        debug!(url = %streams_url, "probing go2rtc");

        let resp = self.http.get(streams_url).send().await?;
        if !resp.status().is_success() {
            return Ok(Vec::new());
        }

        let body = resp.text().await?;
        let streams: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&body)
            .map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })?;

        let page = Url::parse(&format!("http://{host}:{port}/stream.html"))?;
        Ok(streams
            .keys()
            .map(|name| {
                // The stream name goes in as-is; only characters a URL
                // cannot carry (spaces, quotes) get percent-encoded.
                let mut url = page.clone();
                url.set_query(Some(&format!("src={name}")));
                StreamCandidate {
                    source: StreamSource::Go2rtc,
                    url,
                }
            })
            .collect())
    }
}
