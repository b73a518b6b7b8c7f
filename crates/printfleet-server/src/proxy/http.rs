// Plain HTTP forwarding. Bodies are streamed both ways; nothing is buffered.

use axum::body::{Body, HttpBody};
use axum::extract::Request;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use tracing::warn;
use url::Url;

use crate::error::ApiError;

use super::{PROXY_ORIGIN, end_to_end_headers};

pub(super) async fn forward(client: &reqwest::Client, req: Request, url: Url) -> Response {
    match send(client, req, &url).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn send(client: &reqwest::Client, req: Request, url: &Url) -> Result<Response, ApiError> {
    let (parts, body) = req.into_parts();

    let mut headers = end_to_end_headers(&parts.headers);
    headers.remove(header::HOST);
    if let Some(host) = host_header(url) {
        headers.insert(header::HOST, host);
    }
    headers.insert("x-scheme", HeaderValue::from_static("http"));
    headers.insert("x-real-ip", HeaderValue::from_static("127.0.0.1"));
    headers.insert(header::ORIGIN, HeaderValue::from_static(PROXY_ORIGIN));

    let mut request = client.request(parts.method, url.clone()).headers(headers);
    if !body.is_end_stream() {
        request = request.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let upstream = request
        .send()
        .await
        .map_err(|e| {
            warn!(url = %url, error = %e, "upstream request failed");
            ApiError::BadGateway(format!("upstream unavailable: {}", url.origin().ascii_serialization()))
        })?;

    let status = upstream.status();
    let response_headers = end_to_end_headers(upstream.headers());
    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

fn host_header(url: &Url) -> Option<HeaderValue> {
    let host = url.host_str()?;
    let value = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };
    HeaderValue::from_str(&value).ok()
}
