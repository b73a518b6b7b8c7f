// ── Device API ──
//
// CRUD over the printer registry plus the discovery endpoint. All
// mutations go through `Gateway`, which serializes them.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use printfleet_core::{CameraConfig, CoreError, DeviceConfig, DeviceId, DeviceRecord};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    version: &'static str,
    printers: usize,
}

pub(crate) async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        printers: state.gateway.list_devices().await.len(),
    })
}

// ── Printers ─────────────────────────────────────────────────────────

pub(crate) async fn list_printers(State(state): State<AppState>) -> Json<Vec<DeviceRecord>> {
    Json(state.gateway.list_devices().await)
}

pub(crate) async fn get_printer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeviceRecord>, ApiError> {
    state
        .gateway
        .get_device(&DeviceId::from(id.as_str()))
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("printer {id}")))
}

pub(crate) async fn printer_cameras(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CameraConfig>>, ApiError> {
    state
        .gateway
        .device_cameras(&DeviceId::from(id.as_str()))
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("printer {id}")))
}

pub(crate) async fn create_printer(
    State(state): State<AppState>,
    body: Result<Json<DeviceConfig>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(config) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let record = state.gateway.add_device(config).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Unknown printers are a bad request here, not a 404: the body names them.
pub(crate) async fn update_printer(
    State(state): State<AppState>,
    body: Result<Json<DeviceConfig>, JsonRejection>,
) -> Result<Json<DeviceRecord>, ApiError> {
    let Json(config) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    match state.gateway.update_device(config).await {
        Ok(record) => Ok(Json(record)),
        Err(e @ (CoreError::DeviceNotFound { .. } | CoreError::RoutesNotFound { .. })) => {
            Err(ApiError::BadRequest(e.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteQuery {
    id: Option<String>,
}

pub(crate) async fn delete_printer(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode, ApiError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing printer id".into()))?;
    state.gateway.remove_device(&DeviceId::from(id.as_str())).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Discovery ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct DiscoverQuery {
    ip: Option<String>,
    port: Option<String>,
}

pub(crate) async fn discover_cameras(
    State(state): State<AppState>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<Vec<CameraConfig>>, ApiError> {
    let ip = query
        .ip
        .filter(|ip| !ip.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing ip".into()))?;
    let port = query
        .port
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("missing port".into()))?
        .parse::<u16>()
        .map_err(|e| ApiError::BadRequest(format!("invalid port: {e}")))?;

    let cameras = state.gateway.discover_cameras(&ip, port).await?;
    Ok(Json(cameras))
}
