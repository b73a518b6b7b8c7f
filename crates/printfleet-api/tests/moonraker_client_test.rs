#![allow(clippy::unwrap_used)]
// Integration tests for `MoonrakerClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use printfleet_api::{Error, MoonrakerClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, MoonrakerClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let client = MoonrakerClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Status query ────────────────────────────────────────────────────

#[tokio::test]
async fn test_query_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/printer/objects/query"))
        .and(query_param("print_stats", ""))
        .and(query_param("heater_bed", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "status": {
                    "print_stats": {
                        "filename": "benchy.gcode",
                        "state": "printing",
                        "total_duration": 120.0,
                        "print_duration": 100.0,
                        "filament_used": 42.5,
                        "message": "",
                        "info": { "total_layer": 200, "current_layer": 12 }
                    },
                    "virtual_sdcard": {
                        "file_path": "/home/pi/gcodes/benchy.gcode",
                        "progress": 0.25,
                        "is_active": true,
                        "file_position": 1024,
                        "file_size": 4096
                    },
                    "extruder": { "temperature": 210.3, "target": 210.0 },
                    "heater_bed": { "temperature": 59.8, "target": 60.0 }
                },
                "eventtime": 5000.25
            }
        })))
        .mount(&server)
        .await;

    let status = client.query_status().await.unwrap();
    assert_eq!(status.status.print_stats.filename, "benchy.gcode");
    assert_eq!(status.status.print_stats.info.current_layer, Some(12));
    assert_eq!(status.status.virtual_sdcard.file_size, 4096);
    assert!(status.status.virtual_sdcard.is_active);
    assert!((status.status.extruder.target - 210.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_query_status_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/printer/objects/query"))
        .respond_with(ResponseTemplate::new(503).set_body_string("klippy not ready"))
        .mount(&server)
        .await;

    let result = client.query_status().await;
    assert!(
        matches!(result, Err(Error::Status { status: 503, .. })),
        "expected Status error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_query_status_garbage_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/printer/objects/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let err = client.query_status().await.unwrap_err();
    assert!(err.is_decode(), "expected decode error, got: {err:?}");
}

#[tokio::test]
async fn test_query_status_connection_refused() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/", server.uri())).unwrap();
    drop(server);

    let client = MoonrakerClient::with_client(reqwest::Client::new(), base_url);
    let err = client.query_status().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    assert!(err.is_transient());
}

// ── Webcams ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_webcams() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/server/webcams/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "webcams": [
                    {
                        "name": "nozzle",
                        "service": "mjpegstreamer-adaptive",
                        "stream_url": "/webcam/?action=stream",
                        "snapshot_url": "/webcam/?action=snapshot",
                        "enabled": true
                    },
                    { "name": "off", "stream_url": "/webcam2/", "enabled": false }
                ]
            }
        })))
        .mount(&server)
        .await;

    let webcams = client.list_webcams().await.unwrap();
    assert_eq!(webcams.len(), 2);
    assert_eq!(webcams[0].stream_url, "/webcam/?action=stream");
    assert!(webcams[0].enabled);
    assert!(!webcams[1].enabled);
    assert_eq!(webcams[1].service, "");
}
