// ── Per-printer routes ──
//
// Everything needed to map a path under `/printers/<id>` to an upstream.
// Built completely before it is published, never mutated afterwards.

use std::collections::HashSet;

use indexmap::IndexMap;
use url::Url;

use printfleet_api::Webcam;

use crate::config::UiBackend;
use crate::error::CoreError;
use crate::model::{CameraConfig, CameraId, CameraKind, DeviceConfig, DeviceId};

/// First path segments served by the printer's own control API.
pub const CONTROL_API_SEGMENTS: [&str; 6] =
    ["websocket", "printer", "api", "access", "machine", "server"];

/// Segment under which cameras are addressed by id.
pub const CAMERAS_SEGMENT: &str = "cameras";

/// Which upstream a request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// The printer's control endpoint.
    Control,
    /// A UI backend, by name.
    Ui(String),
    Camera(CameraId),
}

/// A resolved request: forward `path` (plus the original query) to `upstream`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub target: RouteTarget,
    pub upstream: Url,
    pub path: String,
}

#[derive(Debug, Clone)]
struct RoutedCamera {
    config: CameraConfig,
    upstream: Url,
}

/// The sub-router of one printer.
#[derive(Debug, Clone)]
pub struct DeviceRoutes {
    device_id: DeviceId,
    control: Url,
    ui_backends: Vec<UiBackend>,
    default_ui: Option<usize>,
    cameras: IndexMap<CameraId, RoutedCamera>,
    /// Relative prefix (`webcam`) -> camera.
    relative_cameras: IndexMap<String, CameraId>,
}

impl DeviceRoutes {
    /// Build the routes for `config` with the final camera set.
    pub fn build(
        config: &DeviceConfig,
        cameras: Vec<CameraConfig>,
        ui_backends: &[UiBackend],
    ) -> Result<Self, CoreError> {
        let control = config.base_url()?;
        let default_ui = config
            .ui
            .as_deref()
            .and_then(|name| ui_backends.iter().position(|ui| ui.name == name))
            .or_else(|| (!ui_backends.is_empty()).then_some(0));

        let mut routed = IndexMap::new();
        let mut relative_cameras = IndexMap::new();
        for camera in cameras {
            if routed.contains_key(&camera.id) {
                continue;
            }
            let upstream = camera.upstream_url().map_err(|e| CoreError::ValidationFailed {
                message: format!("invalid camera address {}:{}: {e}", camera.ip, camera.port),
            })?;
            if let Some(prefix) = camera.relative_prefix() {
                let reserved = prefix == CAMERAS_SEGMENT
                    || CONTROL_API_SEGMENTS.contains(&prefix)
                    || ui_backends.iter().any(|ui| ui.name == prefix);
                if !reserved {
                    relative_cameras
                        .entry(prefix.to_owned())
                        .or_insert_with(|| camera.id.clone());
                }
            }
            routed.insert(camera.id.clone(), RoutedCamera {
                config: camera,
                upstream,
            });
        }

        Ok(Self {
            device_id: config.id(),
            control,
            ui_backends: ui_backends.to_vec(),
            default_ui,
            cameras: routed,
            relative_cameras,
        })
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn default_ui(&self) -> Option<&UiBackend> {
        self.default_ui.and_then(|i| self.ui_backends.get(i))
    }

    /// Cameras reachable through this printer, in routing order.
    pub fn cameras(&self) -> Vec<CameraConfig> {
        self.cameras.values().map(|c| c.config.clone()).collect()
    }

    // ── Resolution ───────────────────────────────────────────────────

    /// Resolve the part of the path after `/printers/<id>`.
    ///
    /// `None` means 404: unknown camera id, or no UI to fall back to.
    pub fn resolve(&self, rest: &str) -> Option<ResolvedRoute> {
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        let (first, remainder) = split_first_segment(rest);

        if first == CAMERAS_SEGMENT {
            let inner = remainder.strip_prefix('/')?;
            let (camera_id, camera_path) = split_first_segment(inner);
            let camera = self.cameras.get(&CameraId::from(camera_id))?;
            return Some(ResolvedRoute {
                target: RouteTarget::Camera(camera.config.id.clone()),
                upstream: camera.upstream.clone(),
                path: or_root(camera_path),
            });
        }

        if is_control_segment(first) {
            return Some(self.control_route(format!("/{rest}")));
        }

        if let Some(ui) = self.ui_backends.iter().find(|ui| ui.name == first) {
            let inner = remainder.strip_prefix('/').unwrap_or(remainder);
            let (inner_first, _) = split_first_segment(inner);
            if is_control_segment(inner_first) {
                return Some(self.control_route(format!("/{inner}")));
            }
            if let Some(route) = self.relative_camera_route(inner_first, inner) {
                return Some(route);
            }
            return Some(ResolvedRoute {
                target: RouteTarget::Ui(ui.name.clone()),
                upstream: ui.url.clone(),
                path: format!("/{inner}"),
            });
        }

        if let Some(route) = self.relative_camera_route(first, rest) {
            return Some(route);
        }

        let ui = self.default_ui()?;
        Some(ResolvedRoute {
            target: RouteTarget::Ui(ui.name.clone()),
            upstream: ui.url.clone(),
            path: format!("/{rest}"),
        })
    }

    fn control_route(&self, path: String) -> ResolvedRoute {
        ResolvedRoute {
            target: RouteTarget::Control,
            upstream: self.control.clone(),
            path,
        }
    }

    fn relative_camera_route(&self, segment: &str, path: &str) -> Option<ResolvedRoute> {
        let camera_id = self.relative_cameras.get(segment)?;
        let camera = self.cameras.get(camera_id)?;
        Some(ResolvedRoute {
            target: RouteTarget::Camera(camera_id.clone()),
            upstream: camera.upstream.clone(),
            path: format!("/{path}"),
        })
    }
}

fn is_control_segment(segment: &str) -> bool {
    CONTROL_API_SEGMENTS.contains(&segment)
}

/// `"a/b/c"` -> `("a", "/b/c")`, `"a"` -> `("a", "")`.
fn split_first_segment(path: &str) -> (&str, &str) {
    match path.find('/') {
        Some(i) => path.split_at(i),
        None => (path, ""),
    }
}

fn or_root(path: &str) -> String {
    if path.is_empty() {
        "/".to_owned()
    } else {
        path.to_owned()
    }
}

// ── Camera set ──────────────────────────────────────────────────────

/// Final camera set for a printer.
///
/// Configured cameras come first. A discovered camera is kept only when
/// the printer's own webcam list has an enabled entry streaming from the
/// same path. Enabled webcam entries with absolute URLs are added as
/// `moonraker-reported` cameras. Ids already present are never repeated.
pub fn merge_cameras(
    configured: &[CameraConfig],
    discovered: Vec<CameraConfig>,
    reported: &[Webcam],
) -> Vec<CameraConfig> {
    let enabled: Vec<&Webcam> = reported.iter().filter(|w| w.enabled).collect();
    let mut seen: HashSet<CameraId> = HashSet::new();
    let mut cameras = Vec::new();

    for camera in configured {
        if seen.insert(camera.id.clone()) {
            cameras.push(camera.clone());
        }
    }

    for camera in discovered {
        let vetted = enabled.iter().any(|w| w.stream_url == camera.path);
        if vetted && seen.insert(camera.id.clone()) {
            cameras.push(camera);
        }
    }

    for webcam in enabled {
        let Ok(url) = Url::parse(&webcam.stream_url) else {
            continue; // relative URLs only vet discovered cameras
        };
        if let Some(camera) = CameraConfig::from_url(&url, CameraKind::MoonrakerReported) {
            if seen.insert(camera.id.clone()) {
                cameras.push(camera);
            }
        }
    }

    cameras
}
