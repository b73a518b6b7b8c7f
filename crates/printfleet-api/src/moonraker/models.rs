// Moonraker response types
//
// Every Moonraker JSON endpoint wraps its payload as `{ "result": ... }`.
// Fields use `#[serde(default)]` liberally: objects that a printer does
// not have (no heated bed, no SD card) are simply absent from the reply.

use serde::{Deserialize, Serialize};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard Moonraker response envelope.
#[derive(Debug, Deserialize)]
pub struct MoonrakerResponse<T> {
    pub result: T,
}

// ── Object query ─────────────────────────────────────────────────────

/// Result of `printer/objects/query?print_stats&virtual_sdcard&extruder&heater_bed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectsQuery {
    #[serde(default)]
    pub status: PrinterObjects,
    #[serde(default)]
    pub eventtime: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrinterObjects {
    #[serde(default)]
    pub print_stats: PrintStats,
    #[serde(default)]
    pub virtual_sdcard: VirtualSdCard,
    #[serde(default)]
    pub extruder: HeaterStats,
    #[serde(default)]
    pub heater_bed: HeaterStats,
}

/// Klipper `print_stats` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintStats {
    #[serde(default)]
    pub filename: String,
    /// `standby`, `printing`, `paused`, `complete`, `cancelled`, `error`.
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub total_duration: f64,
    #[serde(default)]
    pub print_duration: f64,
    #[serde(default)]
    pub filament_used: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub info: PrintStatsInfo,
}

/// Layer progress. Both are `null` unless the slicer emits `SET_PRINT_STATS_INFO`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintStatsInfo {
    #[serde(default)]
    pub total_layer: Option<u32>,
    #[serde(default)]
    pub current_layer: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualSdCard {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub file_position: u64,
    #[serde(default)]
    pub file_size: u64,
}

/// Shared shape of `extruder` and `heater_bed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaterStats {
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub target: f64,
}

// ── Webcams ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WebcamList {
    #[serde(default)]
    pub webcams: Vec<Webcam>,
}

/// One entry of `server/webcams/list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webcam {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub service: String,
    /// Relative (`/webcam/?action=stream`) or absolute URL.
    #[serde(default)]
    pub stream_url: String,
    #[serde(default)]
    pub snapshot_url: String,
    #[serde(default)]
    pub enabled: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn objects_query_tolerates_missing_objects() {
        let raw = json!({
            "result": {
                "status": {
                    "print_stats": { "filename": "x.gcode", "state": "printing" }
                },
                "eventtime": 1234.5
            }
        });
        let parsed: MoonrakerResponse<ObjectsQuery> = serde_json::from_value(raw).unwrap();
        let query = parsed.result;

        assert_eq!(query.status.print_stats.filename, "x.gcode");
        assert_eq!(query.status.print_stats.state, "printing");
        assert_eq!(query.status.heater_bed, HeaterStats::default());
        assert!(query.status.virtual_sdcard.file_path.is_none());
        assert!((query.eventtime - 1234.5).abs() < f64::EPSILON);
    }

    #[test]
    fn layer_info_accepts_null() {
        let raw = json!({ "total_layer": null, "current_layer": 12 });
        let info: PrintStatsInfo = serde_json::from_value(raw).unwrap();
        assert_eq!(info.total_layer, None);
        assert_eq!(info.current_layer, Some(12));
    }
}
