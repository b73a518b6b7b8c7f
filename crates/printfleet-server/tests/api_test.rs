#![allow(clippy::unwrap_used)]
// Device API over a real listener.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

use printfleet_core::{DeviceId, DiscoveryTargets, Gateway, GatewaySettings, MemoryPersistence};
use printfleet_server::{AppState, build_router, serve};

struct TestServer {
    base: String,
    gateway: Gateway,
    persistence: Arc<MemoryPersistence>,
    cancel: CancellationToken,
}

impl TestServer {
    async fn start() -> Self {
        let settings = GatewaySettings {
            poll_interval: Duration::from_millis(50),
            request_timeout: Duration::from_secs(1),
            discovery: DiscoveryTargets {
                mjpeg: Vec::new(),
                go2rtc_port: None,
            },
            ..GatewaySettings::default()
        };
        let persistence = Arc::new(MemoryPersistence::new());
        let gateway = Gateway::new(settings, persistence.clone()).unwrap();
        gateway.start(Vec::new()).await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let app = build_router(AppState::new(gateway.clone()).unwrap());
        let cancel = CancellationToken::new();
        tokio::spawn(serve(listener, app, cancel.clone()));

        Self {
            base,
            gateway,
            persistence,
            cancel,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn stop(self) {
        self.cancel.cancel();
        self.gateway.shutdown().await;
    }
}

fn printer_body(printer: &MockServer) -> Value {
    json!({
        "name": "voron",
        "host": "127.0.0.1",
        "port": printer.address().port(),
    })
}

#[tokio::test]
async fn test_healthz() {
    let server = TestServer::start().await;
    let body: Value = reqwest::get(server.url("/healthz"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["printers"], 0);
    server.stop().await;
}

#[tokio::test]
async fn test_create_list_get_delete() {
    let printer = MockServer::start().await;
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/v1/api/printers"))
        .json(&printer_body(&printer))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    let id = DeviceId::for_endpoint("127.0.0.1", printer.address().port());
    assert_eq!(created["id"], id.as_str());
    assert_eq!(created["config"]["name"], "voron");

    let list: Vec<Value> = client
        .get(server.url("/v1/api/printers"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);

    let resp = client
        .get(server.url(&format!("/v1/api/printers/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let cameras: Vec<Value> = client
        .get(server.url(&format!("/v1/api/printers/{id}/cameras")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(cameras.is_empty());

    let resp = client
        .delete(server.url(&format!("/v1/api/printers?id={id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
    assert_eq!(server.persistence.last_saved().unwrap().len(), 0);

    let resp = client
        .get(server.url(&format!("/v1/api/printers/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    server.stop().await;
}

#[tokio::test]
async fn test_duplicate_create_conflicts() {
    let printer = MockServer::start().await;
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    for expected in [201, 409] {
        let resp = client
            .post(server.url("/v1/api/printers"))
            .json(&printer_body(&printer))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), expected);
    }
    let body: Value = client
        .post(server.url("/v1/api/printers"))
        .json(&printer_body(&printer))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["error_code"], "CONFLICT");
    server.stop().await;
}

#[tokio::test]
async fn test_bad_bodies_are_400() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/v1/api/printers"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(server.url("/v1/api/printers"))
        .json(&json!({ "name": "x", "host": "", "port": 7125 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    server.stop().await;
}

#[tokio::test]
async fn test_update_unknown_is_400() {
    let server = TestServer::start().await;
    let resp = reqwest::Client::new()
        .put(server.url("/v1/api/printers"))
        .json(&json!({ "name": "ghost", "host": "192.0.2.77", "port": 7125 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    server.stop().await;
}

#[tokio::test]
async fn test_update_renames() {
    let printer = MockServer::start().await;
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    client
        .post(server.url("/v1/api/printers"))
        .json(&printer_body(&printer))
        .send()
        .await
        .unwrap();

    let mut body = printer_body(&printer);
    body["name"] = json!("voron 2.4");
    let resp = client
        .put(server.url("/v1/api/printers"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["config"]["name"], "voron 2.4");
    server.stop().await;
}

#[tokio::test]
async fn test_delete_errors() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .delete(server.url("/v1/api/printers"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .delete(server.url("/v1/api/printers?id=12345"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    server.stop().await;
}

#[tokio::test]
async fn test_discovery_query_validation() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    for query in ["", "?ip=127.0.0.1", "?ip=127.0.0.1&port=abc", "?port=80"] {
        let resp = client
            .get(server.url(&format!("/v1/api/cameras{query}")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "query: {query}");
    }

    let resp = client
        .get(server.url("/v1/api/cameras?ip=127.0.0.1&port=7125"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cameras: Vec<Value> = resp.json().await.unwrap();
    assert!(cameras.is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_unknown_printer_proxy_is_404() {
    let server = TestServer::start().await;
    let resp = reqwest::get(server.url("/printers/999/anything"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(server.gateway.list_devices().await.len(), 0);
    server.stop().await;
}
