// ── Router and listener ──

use axum::Router;
use axum::http::{Extensions, HeaderMap, StatusCode, Version};
use axum::routing::{any, get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::{DefaultPredicate, NotForContentType, Predicate};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::api;
use crate::proxy::proxy_handler;

/// Full application: health, device API and the per-printer proxy.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/printers",
            get(api::list_printers)
                .post(api::create_printer)
                .put(api::update_printer)
                .delete(api::delete_printer),
        )
        .route("/printers/{id}", get(api::get_printer))
        .route("/printers/{id}/cameras", get(api::printer_cameras))
        .route("/cameras", get(api::discover_cameras));

    // MJPEG streams never end; compressing them would stall the browser.
    let compress_when = DefaultPredicate::new()
        .and(NotForContentType::new("multipart/x-mixed-replace"))
        .and(|status: StatusCode, _: Version, _: &HeaderMap, _: &Extensions| {
            status != StatusCode::SWITCHING_PROTOCOLS
        });

    Router::new()
        .route("/healthz", get(api::healthz))
        .nest("/v1/api", api)
        .route("/printers/{device_id}", any(proxy_handler))
        .route("/printers/{device_id}/", any(proxy_handler))
        .route("/printers/{device_id}/{*rest}", any(proxy_handler))
        .layer(CompressionLayer::new().compress_when(compress_when))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` on an already-bound listener until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}
