// ── Dynamic routing ──
//
// Per-printer route sets and the concurrent table that publishes them.

mod device_routes;
mod table;

pub use device_routes::{
    CAMERAS_SEGMENT, CONTROL_API_SEGMENTS, DeviceRoutes, ResolvedRoute, RouteTarget,
    merge_cameras,
};
pub use table::RouteTable;
