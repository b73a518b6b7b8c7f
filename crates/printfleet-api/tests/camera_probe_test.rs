#![allow(clippy::unwrap_used)]
// Integration tests for `CameraProber` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use printfleet_api::{CameraProber, StreamSource};

fn prober() -> CameraProber {
    CameraProber::with_client(reqwest::Client::new())
}

// ── mjpg-streamer ───────────────────────────────────────────────────

#[tokio::test]
async fn test_mjpeg_program_json_lists_inputs() {
    let server = MockServer::start().await;
    let port = server.address().port();

    Mock::given(method("GET"))
        .and(path("/webcam/program.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "inputs": [{ "name": "input_uvc.so" }, { "name": "input_uvc.so" }],
            "outputs": []
        })))
        .mount(&server)
        .await;

    let found = prober()
        .probe_mjpeg_streamer("127.0.0.1", port, "/webcam")
        .await
        .unwrap();

    let urls: Vec<String> = found.iter().map(|c| c.url.to_string()).collect();
    assert_eq!(
        urls,
        vec![
            format!("http://127.0.0.1:{port}/webcam/?action=stream_0"),
            format!("http://127.0.0.1:{port}/webcam/?action=stream_1"),
        ]
    );
    assert!(found.iter().all(|c| c.source == StreamSource::MjpegStreamer));
}

#[tokio::test]
async fn test_mjpeg_falls_back_to_marker_page() {
    let server = MockServer::start().await;
    let port = server.address().port();

    Mock::given(method("GET"))
        .and(path("/webcam/program.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/webcam"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><h1>Details about the M-JPEG streamer</h1></html>",
        ))
        .mount(&server)
        .await;

    let found = prober()
        .probe_mjpeg_streamer("127.0.0.1", port, "/webcam")
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].url.path(), "/webcam");
}

#[tokio::test]
async fn test_mjpeg_unrelated_page_is_not_a_camera() {
    let server = MockServer::start().await;
    let port = server.address().port();

    Mock::given(method("GET"))
        .and(path("/webcam"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>router login</html>"))
        .mount(&server)
        .await;

    let found = prober()
        .probe_mjpeg_streamer("127.0.0.1", port, "/webcam")
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_mjpeg_bad_program_json_is_an_error() {
    let server = MockServer::start().await;
    let port = server.address().port();

    Mock::given(method("GET"))
        .and(path("/webcam/program.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = prober()
        .probe_mjpeg_streamer("127.0.0.1", port, "/webcam")
        .await;
    assert!(result.unwrap_err().is_decode());
}

// ── go2rtc ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_go2rtc_lists_streams() {
    let server = MockServer::start().await;
    let port = server.address().port();

    Mock::given(method("GET"))
        .and(path("/api/streams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bed": { "producers": [] },
            "nozzle cam": { "producers": [] },
            "tool+cam": { "producers": [] }
        })))
        .mount(&server)
        .await;

    let found = prober().probe_go2rtc("127.0.0.1", port).await.unwrap();

    let urls: Vec<String> = found.iter().map(|c| c.url.to_string()).collect();
    assert_eq!(
        urls,
        vec![
            format!("http://127.0.0.1:{port}/stream.html?src=bed"),
            format!("http://127.0.0.1:{port}/stream.html?src=nozzle%20cam"),
            format!("http://127.0.0.1:{port}/stream.html?src=tool+cam"),
        ]
    );
    assert!(found.iter().all(|c| c.source == StreamSource::Go2rtc));
}

#[tokio::test]
async fn test_go2rtc_absent() {
    let server = MockServer::start().await;
    let port = server.address().port();

    let found = prober().probe_go2rtc("127.0.0.1", port).await.unwrap();
    assert!(found.is_empty());
}
