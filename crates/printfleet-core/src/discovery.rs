// ── Camera discovery ──
//
// Probes a printer host for camera streamers. Every probe target runs as
// its own task holding a clone of one sender; the aggregator's receive
// loop ends when the last clone is dropped, i.e. when every probe is done.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tracing::{debug, info};

use printfleet_api::{CameraProber, StreamCandidate, StreamSource};

use crate::config::DiscoveryTargets;
use crate::model::{CameraConfig, CameraKind};

/// Concurrent best-effort camera prober.
#[derive(Debug, Clone)]
pub struct CameraDiscovery {
    prober: CameraProber,
    targets: DiscoveryTargets,
}

impl CameraDiscovery {
    pub fn new(prober: CameraProber, targets: DiscoveryTargets) -> Self {
        Self { prober, targets }
    }

    /// Probe every target on `host`. Deduplicated by camera id, first wins.
    ///
    /// Never fails: a probe that errors contributes nothing.
    pub async fn discover(&self, host: &str) -> Vec<CameraConfig> {
        let (tx, mut rx) = mpsc::unbounded_channel::<StreamCandidate>();

        for target in &self.targets.mjpeg {
            let tx = tx.clone();
            let prober = self.prober.clone();
            let host = host.to_owned();
            let target = target.clone();
            tokio::spawn(async move {
                match prober
                    .probe_mjpeg_streamer(&host, target.port, &target.path)
                    .await
                {
                    Ok(found) => forward(&tx, found),
                    Err(e) => {
                        debug!(host = %host, port = target.port, path = %target.path, error = %e, "mjpeg probe: nothing");
                    }
                }
            });
        }

        if let Some(port) = self.targets.go2rtc_port {
            let tx = tx.clone();
            let prober = self.prober.clone();
            let host = host.to_owned();
            tokio::spawn(async move {
                match prober.probe_go2rtc(&host, port).await {
                    Ok(found) => forward(&tx, found),
                    Err(e) => debug!(host = %host, port, error = %e, "go2rtc probe: nothing"),
                }
            });
        }

        // Only the probe tasks hold senders now.
        drop(tx);

        let mut seen = HashSet::new();
        let mut cameras = Vec::new();
        while let Some(candidate) = rx.recv().await {
            let Some(camera) = camera_from_candidate(&candidate) else {
                debug!(url = %candidate.url, "skipping camera candidate without host/port");
                continue;
            };
            if seen.insert(camera.id.clone()) {
                cameras.push(camera);
            }
        }

        info!(host = %host, count = cameras.len(), "camera discovery finished");
        cameras
    }
}

fn forward(tx: &mpsc::UnboundedSender<StreamCandidate>, found: Vec<StreamCandidate>) {
    for candidate in found {
        // receiver only goes away once discovery is abandoned
        let _ = tx.send(candidate);
    }
}

fn camera_from_candidate(candidate: &StreamCandidate) -> Option<CameraConfig> {
    let kind = match candidate.source {
        StreamSource::MjpegStreamer => CameraKind::MjpegStream,
        StreamSource::Go2rtc => CameraKind::Go2rtc,
    };
    CameraConfig::from_url(&candidate.url, kind)
}
