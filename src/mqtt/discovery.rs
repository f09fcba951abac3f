use derive_builder::Builder;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Device {
    pub identifiers: Vec<String>,
    pub manufacturer: String,
    pub model: String,
    pub name: String,
}

impl Device {
    pub fn centurion_garage(ip_address: &str, name: &str) -> Self {
        Self {
            identifiers: vec![format!("centurion_garage_door_{ip_address}")],
            manufacturer: "Centurion".to_string(),
            model: "Garage".to_string(),
            name: name.to_string(),
        }
    }
}

/// One availability source for an entity. Home Assistant marks the entity
/// unavailable whenever `topic` carries `payload_not_available`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Availability {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_available: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_not_available: Option<String>,
}

impl Availability {
    pub fn online_offline(topic: String) -> Self {
        Self {
            topic,
            payload_available: Some(AvailabilityState::Online.as_str().to_string()),
            payload_not_available: Some(AvailabilityState::Offline.as_str().to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityState {
    Online,
    Offline,
}

impl AvailabilityState {
    pub fn as_str(self) -> &'static str {
        match self {
            AvailabilityState::Online => "online",
            AvailabilityState::Offline => "offline",
        }
    }
}

/// Retained config message announcing one entity to Home Assistant.
///
/// Only the fields an entity sets are serialized, so the same struct covers
/// covers, switches, sensors and cameras.
#[derive(Builder, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[builder(setter(into, strip_option), default)]
pub struct DiscoveryConfig {
    pub name: String,
    pub unique_id: String,
    pub device: Device,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub availability: Vec<Availability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_attributes_topic: Option<String>,
    /// Image topic, cameras only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_open: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_close: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_stop: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimistic: Option<bool>,
}
