use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DOOR: &str = "door";
pub const WIFI_DBM: &str = "wdBm";
pub const LAMP: &str = "lamp";
pub const VACATION: &str = "vacation";
pub const CYCLES: &str = "cycles";

/// Flat key-value status record returned by `status=json`.
///
/// The controller's field set is not fixed across firmware, so the whole object
/// is kept and individual values are looked up on demand.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DeviceStatus(Map<String, Value>);

impl DeviceStatus {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String fields as-is, any other JSON value as its JSON text.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// `"on"` in any case counts as on; everything else, including absence, is off.
    pub fn is_on(&self, key: &str) -> bool {
        self.text(key)
            .map(|value| value.eq_ignore_ascii_case("on"))
            .unwrap_or(false)
    }

    pub fn door(&self) -> DoorState {
        self.text(DOOR)
            .map(|value| DoorState::parse(&value))
            .unwrap_or(DoorState::Unknown)
    }

    pub fn wifi_dbm(&self) -> Option<i64> {
        self.integer(WIFI_DBM)
    }

    pub fn cycles(&self) -> Option<i64> {
        self.integer(CYCLES)
    }

    pub fn lamp_on(&self) -> bool {
        self.is_on(LAMP)
    }

    pub fn vacation_on(&self) -> bool {
        self.is_on(VACATION)
    }
}

impl From<Map<String, Value>> for DeviceStatus {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorState {
    Open,
    Opening,
    Closed,
    Closing,
    Stopped,
    Problem,
    Unknown,
}

impl DoorState {
    /// The controller reports free-form strings such as `"Opened"` or
    /// `"Door closing"`, so matching is by substring. Order matters:
    /// `"opening"` also contains `"open"`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.to_lowercase();

        if raw.contains("opening") {
            DoorState::Opening
        } else if raw.contains("closing") {
            DoorState::Closing
        } else if raw.contains("open") {
            DoorState::Open
        } else if raw.contains("closed") {
            DoorState::Closed
        } else if raw.contains("stop") {
            DoorState::Stopped
        } else if raw.contains("error") {
            DoorState::Problem
        } else {
            DoorState::Unknown
        }
    }

    pub fn from_status(status: Option<&DeviceStatus>) -> Self {
        status.map(DeviceStatus::door).unwrap_or(DoorState::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DoorState::Open => "open",
            DoorState::Opening => "opening",
            DoorState::Closed => "closed",
            DoorState::Closing => "closing",
            DoorState::Stopped => "stopped",
            DoorState::Problem => "problem",
            DoorState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
