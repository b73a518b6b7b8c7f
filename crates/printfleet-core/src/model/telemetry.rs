// ── Telemetry snapshot ──
//
// The latest observed printer status, flattened from Moonraker's object
// query. Replaced wholesale on every successful poll.

use serde::{Deserialize, Serialize};

use printfleet_api::{HeaterStats, ObjectsQuery, VirtualSdCard};

/// State string reported for printers that stopped answering polls.
pub const OFFLINE_STATE: &str = "offline";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub filename: String,
    /// Upstream print state, carried opaquely (`printing`, `paused`, ...).
    pub state: String,
    pub total_duration: f64,
    pub print_duration: f64,
    pub filament_used: f64,
    pub message: String,
    pub current_layer: Option<u32>,
    pub total_layer: Option<u32>,
    pub sd_card: SdCardState,
    pub extruder: HeaterState,
    pub heater_bed: HeaterState,
    /// Host monotonic clock at the time of the query.
    pub event_time: f64,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            filename: String::new(),
            state: OFFLINE_STATE.to_owned(),
            total_duration: 0.0,
            print_duration: 0.0,
            filament_used: 0.0,
            message: String::new(),
            current_layer: None,
            total_layer: None,
            sd_card: SdCardState::default(),
            extruder: HeaterState::default(),
            heater_bed: HeaterState::default(),
            event_time: 0.0,
        }
    }
}

impl TelemetrySnapshot {
    /// Flag the snapshot offline, keeping the last known values as stale data.
    pub fn mark_offline(&mut self) {
        OFFLINE_STATE.clone_into(&mut self.state);
    }

    pub fn is_offline(&self) -> bool {
        self.state == OFFLINE_STATE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SdCardState {
    pub file_path: Option<String>,
    pub progress: f64,
    pub is_active: bool,
    pub file_position: u64,
    pub file_size: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaterState {
    pub temperature: f64,
    pub target: f64,
}

// ── Conversion from API responses ───────────────────────────────────

impl From<ObjectsQuery> for TelemetrySnapshot {
    fn from(query: ObjectsQuery) -> Self {
        let objects = query.status;
        let stats = objects.print_stats;
        Self {
            filename: stats.filename,
            state: stats.state,
            total_duration: stats.total_duration,
            print_duration: stats.print_duration,
            filament_used: stats.filament_used,
            message: stats.message,
            current_layer: stats.info.current_layer,
            total_layer: stats.info.total_layer,
            sd_card: objects.virtual_sdcard.into(),
            extruder: objects.extruder.into(),
            heater_bed: objects.heater_bed.into(),
            event_time: query.eventtime,
        }
    }
}

impl From<VirtualSdCard> for SdCardState {
    fn from(sd: VirtualSdCard) -> Self {
        Self {
            file_path: sd.file_path,
            progress: sd.progress,
            is_active: sd.is_active,
            file_position: sd.file_position,
            file_size: sd.file_size,
        }
    }
}

impl From<HeaterStats> for HeaterState {
    fn from(h: HeaterStats) -> Self {
        Self {
            temperature: h.temperature,
            target: h.target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printfleet_api::{PrintStats, PrinterObjects};

    #[test]
    fn default_is_offline() {
        let snap = TelemetrySnapshot::default();
        assert!(snap.is_offline());
        assert!(snap.filename.is_empty());
    }

    #[test]
    fn mark_offline_keeps_stale_fields() {
        let mut snap = TelemetrySnapshot {
            filename: "x.gcode".into(),
            state: "printing".into(),
            ..TelemetrySnapshot::default()
        };
        snap.mark_offline();
        assert_eq!(snap.state, OFFLINE_STATE);
        assert_eq!(snap.filename, "x.gcode");
    }

    #[test]
    fn converts_object_query() {
        let query = ObjectsQuery {
            status: PrinterObjects {
                print_stats: PrintStats {
                    filename: "x.gcode".into(),
                    state: "printing".into(),
                    ..PrintStats::default()
                },
                extruder: HeaterStats {
                    temperature: 200.5,
                    target: 210.0,
                },
                ..PrinterObjects::default()
            },
            eventtime: 42.0,
        };

        let snap = TelemetrySnapshot::from(query);
        assert_eq!(snap.state, "printing");
        assert_eq!(snap.filename, "x.gcode");
        assert!((snap.extruder.target - 210.0).abs() < f64::EPSILON);
        assert!((snap.event_time - 42.0).abs() < f64::EPSILON);
    }
}
