// Moonraker HTTP client
//
// Wraps `reqwest::Client` with Moonraker URL construction and envelope
// unwrapping. Callers get the `result` payload; the envelope is stripped
// before they see it.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::moonraker::models::{MoonrakerResponse, ObjectsQuery, Webcam, WebcamList};
use crate::transport::TransportConfig;

/// Objects requested on every status poll.
const STATUS_OBJECTS: &str = "print_stats&virtual_sdcard&extruder&heater_bed";

/// Raw HTTP client for one Moonraker instance.
#[derive(Debug, Clone)]
pub struct MoonrakerClient {
    http: reqwest::Client,
    base_url: Url,
}

impl MoonrakerClient {
    /// Create a client for `http://{host}:{port}/` from a `TransportConfig`.
    pub fn new(host: &str, port: u16, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("http://{host}:{port}/"))?;
        Ok(Self {
            http: transport.build_client()?,
            base_url,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Lets many pollers share one connection pool.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The Moonraker base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Query the print, SD card, and heater objects.
    pub async fn query_status(&self) -> Result<ObjectsQuery, Error> {
        let mut url = self.base_url.join("printer/objects/query")?;
        url.set_query(Some(STATUS_OBJECTS));
        self.get(url).await
    }

    /// List the webcams Moonraker itself knows about.
    pub async fn list_webcams(&self) -> Result<Vec<Webcam>, Error> {
        let url = self.base_url.join("server/webcams/list")?;
        let list: WebcamList = self.get(url).await?;
        Ok(list.webcams)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and unwrap the `{ result }` envelope.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.text().await?;
        let envelope: MoonrakerResponse<T> = serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;
        Ok(envelope.result)
    }
}
