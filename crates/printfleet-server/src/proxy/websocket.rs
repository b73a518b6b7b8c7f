// WebSocket bridging. The upstream socket is opened before the client's
// upgrade is accepted, so an unreachable printer still gets a 502.

use axum::extract::ws::{self, WebSocket, WebSocketUpgrade};
use axum::extract::{FromRequestParts, Request};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;

use super::PROXY_ORIGIN;

type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Request headers carried over to the upstream handshake.
const FORWARDED_HEADERS: [&str; 3] = ["cookie", "authorization", "sec-websocket-protocol"];

pub(super) async fn bridge(req: Request, url: Url) -> Response {
    let (mut parts, _body) = req.into_parts();
    let upgrade = match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
        Ok(upgrade) => upgrade,
        Err(rejection) => return rejection.into_response(),
    };

    let upstream = match connect(&url, &parts.headers).await {
        Ok(upstream) => upstream,
        Err(e) => return e.into_response(),
    };

    upgrade.on_upgrade(move |client| pump(client, upstream, url))
}

async fn connect(url: &Url, headers: &header::HeaderMap) -> Result<UpstreamSocket, ApiError> {
    let mut ws_url = url.clone();
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    ws_url
        .set_scheme(scheme)
        .map_err(|()| ApiError::Internal(format!("cannot convert {url} to a websocket URL")))?;

    let uri: tungstenite::http::Uri = ws_url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| ApiError::Internal(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri).with_header("Origin", PROXY_ORIGIN);
    for name in FORWARDED_HEADERS {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            request = request.with_header(name, value);
        }
    }

    let (socket, _response) = tokio_tungstenite::connect_async(request).await.map_err(|e| {
        warn!(url = %ws_url, error = %e, "upstream websocket connect failed");
        ApiError::BadGateway(format!("upstream websocket unavailable: {e}"))
    })?;
    debug!(url = %ws_url, "upstream websocket connected");
    Ok(socket)
}

/// Shuttle frames both ways until either side closes.
async fn pump(client: WebSocket, upstream: UpstreamSocket, url: Url) {
    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    let client_to_upstream = async {
        while let Some(Ok(msg)) = client_rx.next().await {
            let Some(msg) = to_upstream(msg) else { continue };
            if upstream_tx.send(msg).await.is_err() {
                break;
            }
        }
        let _ = upstream_tx.close().await;
    };

    let upstream_to_client = async {
        while let Some(Ok(msg)) = upstream_rx.next().await {
            let Some(msg) = to_client(msg) else { continue };
            if client_tx.send(msg).await.is_err() {
                break;
            }
        }
        let _ = client_tx.close().await;
    };

    tokio::select! {
        () = client_to_upstream => {},
        () = upstream_to_client => {},
    }
    debug!(url = %url, "websocket bridge closed");
}

// Pings and pongs are answered by each side's own socket.

fn to_upstream(msg: ws::Message) -> Option<tungstenite::Message> {
    match msg {
        ws::Message::Text(text) => Some(tungstenite::Message::Text(text.as_str().into())),
        ws::Message::Binary(data) => Some(tungstenite::Message::Binary(data)),
        ws::Message::Close(frame) => Some(tungstenite::Message::Close(frame.map(|f| {
            tungstenite::protocol::CloseFrame {
                code: f.code.into(),
                reason: f.reason.as_str().into(),
            }
        }))),
        ws::Message::Ping(_) | ws::Message::Pong(_) => None,
    }
}

fn to_client(msg: tungstenite::Message) -> Option<ws::Message> {
    match msg {
        tungstenite::Message::Text(text) => Some(ws::Message::Text(text.as_str().into())),
        tungstenite::Message::Binary(data) => Some(ws::Message::Binary(data)),
        tungstenite::Message::Close(frame) => Some(ws::Message::Close(frame.map(|f| {
            ws::CloseFrame {
                code: f.code.into(),
                reason: f.reason.as_str().into(),
            }
        }))),
        tungstenite::Message::Ping(_)
        | tungstenite::Message::Pong(_)
        | tungstenite::Message::Frame(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_close_cross_over() {
        let up = to_upstream(ws::Message::Text("hello".into()));
        assert_eq!(up, Some(tungstenite::Message::Text("hello".into())));

        let down = to_client(tungstenite::Message::Close(Some(
            tungstenite::protocol::CloseFrame {
                code: tungstenite::protocol::frame::coding::CloseCode::Normal,
                reason: "bye".into(),
            },
        )));
        let Some(ws::Message::Close(Some(frame))) = down else {
            panic!("expected close frame");
        };
        assert_eq!(frame.code, 1000);
        assert_eq!(frame.reason.as_str(), "bye");
    }

    #[test]
    fn pings_stay_local() {
        assert_eq!(to_upstream(ws::Message::Ping(Vec::new().into())), None);
        assert!(to_client(tungstenite::Message::Pong(Vec::new().into())).is_none());
    }
}
