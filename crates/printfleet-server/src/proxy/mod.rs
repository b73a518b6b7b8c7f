// ── Dynamic printer proxy ──
//
// `/printers/{id}/...` is resolved against the printer's published routes
// on every request. The route table lock is held only to clone an `Arc`.

mod http;
mod websocket;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, header};
use axum::response::{IntoResponse, Response};
use tracing::trace;
use url::Url;

use printfleet_core::{DeviceId, ResolvedRoute};

use crate::AppState;
use crate::error::ApiError;

/// `Origin` presented to every upstream.
pub(crate) const PROXY_ORIGIN: &str = "http://printfleet.local";

const PRINTERS_PREFIX: &str = "/printers/";

pub(crate) async fn proxy_handler(State(state): State<AppState>, req: Request) -> Response {
    match route_request(&state, &req) {
        Ok((route, url)) => {
            trace!(target_url = %url, route = ?route.target, "proxying");
            if is_websocket_upgrade(req.headers()) {
                websocket::bridge(req, url).await
            } else {
                http::forward(&state.proxy, req, url).await
            }
        }
        Err(e) => e.into_response(),
    }
}

fn route_request(state: &AppState, req: &Request) -> Result<(ResolvedRoute, Url), ApiError> {
    let (device_id, rest) = split_device_path(req.uri().path())
        .ok_or_else(|| ApiError::NotFound("not a printer path".into()))?;

    let routes = state
        .gateway
        .routes(&DeviceId::from(device_id))
        .ok_or_else(|| ApiError::NotFound(format!("printer {device_id}")))?;
    let route = routes
        .resolve(rest)
        .ok_or_else(|| ApiError::NotFound(format!("no route for '/{rest}' on printer {device_id}")))?;

    let url = upstream_url(&route, req.uri().query());
    Ok((route, url))
}

/// `/printers/123/fluidd/x` -> `("123", "fluidd/x")`.
fn split_device_path(path: &str) -> Option<(&str, &str)> {
    let tail = path.strip_prefix(PRINTERS_PREFIX)?;
    let (id, rest) = tail.split_once('/').unwrap_or((tail, ""));
    (!id.is_empty()).then_some((id, rest))
}

/// Upstream URL for a resolved route. The upstream's own path is kept as a base.
pub(crate) fn upstream_url(route: &ResolvedRoute, query: Option<&str>) -> Url {
    let mut url = route.upstream.clone();
    let path = format!("{}{}", url.path().trim_end_matches('/'), route.path);
    url.set_path(&path);
    url.set_query(query);
    url
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

/// Connection-scoped headers that must not cross the proxy.
pub(crate) fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Copy `headers`, dropping hop-by-hop headers and any named in `Connection`.
pub(crate) fn end_to_end_headers(headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || listed.iter().any(|l| l == name.as_str()) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
