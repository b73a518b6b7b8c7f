// ── Identity types ──
//
// Printer and camera ids are 32-bit FNV-1a hashes of their network
// endpoint, rendered as decimal strings. The same endpoint always maps
// to the same id, across restarts and across processes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME)
    })
}

// ── DeviceId ────────────────────────────────────────────────────────

/// Stable identifier for a printer, derived from `host:port`.
///
/// Used as the registry key and as the `/printers/<id>` path segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn for_endpoint(host: &str, port: u16) -> Self {
        Self(fnv1a_32(format!("{host}:{port}").as_bytes()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── CameraId ────────────────────────────────────────────────────────

/// Stable identifier for a camera stream, derived from `ip:port` + path.
///
/// Two probes that report the same stream yield the same id, which makes
/// it the deduplication key during discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(String);

impl CameraId {
    pub fn for_stream(ip: &str, port: u16, path: &str) -> Self {
        Self(fnv1a_32(format!("{ip}:{port}{path}").as_bytes()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CameraId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
