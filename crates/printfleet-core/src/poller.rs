// ── Status poller ──
//
// One task per printer. Polls the Moonraker object query on a fixed
// period and pushes the outcome onto the shared status channel. Pollers
// never touch the registry; the status consumer is the only writer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use printfleet_api::MoonrakerClient;

use crate::model::{DeviceId, TelemetrySnapshot};

/// What a poll tick observed.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryUpdate {
    /// Fresh telemetry; replaces the stored snapshot wholesale.
    Snapshot(Box<TelemetrySnapshot>),
    /// The failure threshold was reached.
    Offline,
    /// Last message of a cancelled poller. Lets the consumer purge the
    /// printer's tombstone once nothing else can follow it.
    Stopped,
}

/// One message on the status channel.
///
/// `handle` is the emitting poller's own cancellation token, so the
/// consumer can tell a live poller from one whose printer was deleted.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub device_id: DeviceId,
    pub telemetry: TelemetryUpdate,
    pub handle: CancellationToken,
}

/// Consecutive-failure counter. Fires once per streak, then starts over.
#[derive(Debug)]
pub(crate) struct FailureStreak {
    count: u32,
    threshold: u32,
}

impl FailureStreak {
    pub(crate) fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold: threshold.max(1),
        }
    }

    /// Record a failure. Returns `true` when the threshold is reached.
    pub(crate) fn record_failure(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.threshold {
            self.count = 0;
            true
        } else {
            false
        }
    }

    pub(crate) fn reset(&mut self) {
        self.count = 0;
    }
}

/// Poll one printer until `cancel` fires.
pub(crate) async fn poll_task(
    device_id: DeviceId,
    client: MoonrakerClient,
    period: Duration,
    failure_threshold: u32,
    tx: mpsc::UnboundedSender<StatusUpdate>,
    cancel: CancellationToken,
) {
    info!(device_id = %device_id, url = %client.base_url(), "poller started");
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick
    let mut streak = FailureStreak::new(failure_threshold);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let result = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = client.query_status() => result,
                };

                let telemetry = match result {
                    Ok(query) => {
                        streak.reset();
                        TelemetryUpdate::Snapshot(Box::new(query.into()))
                    }
                    Err(e) if e.is_decode() => {
                        warn!(device_id = %device_id, error = %e, "poll: undecodable status");
                        continue;
                    }
                    Err(e) => {
                        if e.is_transient() {
                            debug!(device_id = %device_id, error = %e, "poll: request failed");
                        } else {
                            warn!(device_id = %device_id, error = %e, "poll: status query failed");
                        }
                        if !streak.record_failure() {
                            continue;
                        }
                        info!(device_id = %device_id, "poll: failure threshold reached, reporting offline");
                        TelemetryUpdate::Offline
                    }
                };

                let update = StatusUpdate {
                    device_id: device_id.clone(),
                    telemetry,
                    handle: cancel.clone(),
                };
                if tx.send(update).is_err() {
                    debug!(device_id = %device_id, "poll: status channel closed");
                    break;
                }
            }
        }
    }

    if cancel.is_cancelled() {
        // Ordered after anything this poller already sent.
        let _ = tx.send(StatusUpdate {
            device_id: device_id.clone(),
            telemetry: TelemetryUpdate::Stopped,
            handle: cancel,
        });
    }
    debug!(device_id = %device_id, "poller stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use printfleet_api::TransportConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn streak_fires_on_threshold_then_resets() {
        let mut streak = FailureStreak::new(3);
        assert!(!streak.record_failure());
        assert!(!streak.record_failure());
        assert!(streak.record_failure());
        // next streak starts over
        assert!(!streak.record_failure());
        assert!(!streak.record_failure());
        assert!(streak.record_failure());
    }

    #[test]
    fn streak_reset_on_success() {
        let mut streak = FailureStreak::new(3);
        streak.record_failure();
        streak.record_failure();
        streak.reset();
        assert!(!streak.record_failure());
        assert!(!streak.record_failure());
        assert!(streak.record_failure());
    }

    #[test]
    fn zero_threshold_behaves_like_one() {
        let mut streak = FailureStreak::new(0);
        assert!(streak.record_failure());
    }

    fn spawn_poller(
        server: &MockServer,
        threshold: u32,
    ) -> (mpsc::UnboundedReceiver<StatusUpdate>, CancellationToken) {
        spawn_poller_every(server, threshold, Duration::from_millis(20))
    }

    fn spawn_poller_every(
        server: &MockServer,
        threshold: u32,
        period: Duration,
    ) -> (mpsc::UnboundedReceiver<StatusUpdate>, CancellationToken) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let client = MoonrakerClient::new(
            "127.0.0.1",
            server.address().port(),
            &TransportConfig::default(),
        )
        .unwrap();
        tokio::spawn(poll_task(
            DeviceId::from("1"),
            client,
            period,
            threshold,
            tx,
            cancel.clone(),
        ));
        (rx, cancel)
    }

    #[tokio::test]
    async fn emits_snapshot_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/printer/objects/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "status": { "print_stats": { "state": "printing", "filename": "x.gcode" } } }
            })))
            .mount(&server)
            .await;

        let (mut rx, cancel) = spawn_poller(&server, 3);
        let update = rx.recv().await.unwrap();
        cancel.cancel();

        match update.telemetry {
            TelemetryUpdate::Snapshot(snap) => {
                assert_eq!(snap.state, "printing");
                assert_eq!(snap.filename, "x.gcode");
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn emits_offline_after_threshold_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/printer/objects/query"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3..)
            .mount(&server)
            .await;

        let (mut rx, cancel) = spawn_poller_every(&server, 3, Duration::from_millis(200));
        let update = rx.recv().await.unwrap();
        let requests = server.received_requests().await.unwrap().len();
        cancel.cancel();

        assert_eq!(update.telemetry, TelemetryUpdate::Offline);
        assert_eq!(requests, 3, "offline must follow the third failure exactly");
    }

    #[tokio::test]
    async fn failures_then_success_reports_offline_then_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/printer/objects/query"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(4)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/printer/objects/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "status": { "print_stats": { "state": "standby" } } }
            })))
            .mount(&server)
            .await;

        let (mut rx, cancel) = spawn_poller(&server, 3);
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        cancel.cancel();

        // The fourth failure starts a new streak and stays silent.
        assert_eq!(first.telemetry, TelemetryUpdate::Offline);
        assert!(matches!(second.telemetry, TelemetryUpdate::Snapshot(ref s) if s.state == "standby"));
    }

    #[tokio::test]
    async fn undecodable_body_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/printer/objects/query"))
            .respond_with(ResponseTemplate::new(200).set_body_string("garbage"))
            .mount(&server)
            .await;

        let (mut rx, cancel) = spawn_poller(&server, 1);
        let waited = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
        cancel.cancel();

        assert!(waited.is_err(), "decode failures must not produce updates");
    }

    #[tokio::test]
    async fn stops_when_cancelled() {
        let server = MockServer::start().await;
        let (mut rx, cancel) = spawn_poller(&server, 3);
        cancel.cancel();

        let last = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        let last = last.unwrap().unwrap();
        assert_eq!(last.telemetry, TelemetryUpdate::Stopped);
        assert!(last.handle.is_cancelled());

        // The task drops its sender on exit, closing the channel.
        let closed = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(matches!(closed, Ok(None)));
    }
}
