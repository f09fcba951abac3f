//! Presentation adapters: each entity derives one value from the latest status
//! payload and, for controllable entities, maps a Home Assistant command
//! payload onto a single controller command.

use color_eyre::Result;

use crate::{
    centurion::{command::Command, status::DeviceStatus},
    mqtt::{
        discovery::{Availability, Device, DiscoveryConfig, DiscoveryConfigBuilder},
        topics::Topics,
    },
};

pub mod camera;
pub mod cover;
pub mod sensor;
pub mod switch;

/// Home Assistant's "no value" state payload.
pub const PAYLOAD_NONE: &str = "None";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Component {
    Camera,
    Cover,
    Sensor,
    Switch,
}

impl Component {
    pub fn as_str(self) -> &'static str {
        match self {
            Component::Camera => "camera",
            Component::Cover => "cover",
            Component::Sensor => "sensor",
            Component::Switch => "switch",
        }
    }
}

pub struct DiscoveryContext<'a> {
    pub topics: &'a Topics,
    pub device: &'a Device,
}

impl DiscoveryContext<'_> {
    /// Fields every polled entity shares: identity, device, availability,
    /// state and attribute topics.
    pub fn base_config(&self, name: &str, object_id: &str) -> DiscoveryConfigBuilder {
        let mut builder = DiscoveryConfigBuilder::default();
        builder
            .name(name)
            .unique_id(self.topics.unique_id(object_id))
            .device(self.device.clone())
            .availability(vec![Availability::online_offline(
                self.topics.availability(),
            )])
            .state_topic(self.topics.state(object_id))
            .json_attributes_topic(self.topics.status());

        builder
    }
}

pub trait Entity: Send + Sync {
    fn object_id(&self) -> &'static str;

    fn component(&self) -> Component;

    fn discovery(&self, ctx: &DiscoveryContext) -> Result<DiscoveryConfig>;

    /// State payload for the latest status, `None` if nothing was fetched yet.
    fn state(&self, status: Option<&DeviceStatus>) -> String;

    /// Controller command for a payload received on the entity's command
    /// topic. Read-only entities accept nothing.
    fn command(&self, _payload: &str) -> Option<Command> {
        None
    }
}

/// The entities every controller exposes. The camera is handled separately
/// since it publishes image bytes rather than a derived state.
pub fn garage_entities() -> Vec<Box<dyn Entity>> {
    vec![
        Box::new(cover::GarageDoorCover),
        Box::new(switch::GarageSwitch::lamp()),
        Box::new(switch::GarageSwitch::vacation()),
        Box::new(sensor::GarageSensor::wifi_signal()),
        Box::new(sensor::GarageSensor::cycles()),
    ]
}

/// Route an incoming command message to the entity owning `topic`.
pub fn resolve_command(
    entities: &[Box<dyn Entity>],
    topics: &Topics,
    topic: &str,
    payload: &str,
) -> Option<Command> {
    let object_id = topics.command_object_id(topic)?;

    entities
        .iter()
        .find(|entity| entity.object_id() == object_id)?
        .command(payload.trim())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::settings::MqttSettings;

    pub(crate) fn test_topics() -> Topics {
        Topics::new(&MqttSettings {
            id: "centurion-mqtt".to_string(),
            host: "localhost".to_string(),
            port: 1883,
            username: None,
            password: None,
            discovery_prefix: "homeassistant".to_string(),
            node_id: "garage".to_string(),
            base_topic: None,
        })
    }

    pub(crate) fn test_device() -> Device {
        Device::centurion_garage("192.0.2.10", "Centurion Garage")
    }

    #[test]
    fn test_object_ids_are_unique() {
        let entities = garage_entities();
        let mut ids: Vec<_> = entities.iter().map(|e| e.object_id()).collect();
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), entities.len());
    }

    #[test]
    fn test_resolve_command() {
        let entities = garage_entities();
        let topics = test_topics();

        let cases = [
            ("cover", "OPEN", Some(Command::OpenDoor)),
            ("cover", "CLOSE", Some(Command::CloseDoor)),
            ("cover", "STOP", Some(Command::StopDoor)),
            ("lamp", "ON", Some(Command::LampOn)),
            ("lamp", " OFF\n", Some(Command::LampOff)),
            ("vacation", "ON", Some(Command::VacationOn)),
            ("vacation", "OFF", Some(Command::VacationOff)),
            ("cover", "TOGGLE", None),
            ("wifi_signal", "ON", None),
            ("porch_light", "ON", None),
        ];

        for (object_id, payload, expected) in cases {
            let topic = topics.command(object_id);
            assert_eq!(
                resolve_command(&entities, &topics, &topic, payload),
                expected,
                "{topic} <- {payload:?}"
            );
        }

        assert_eq!(
            resolve_command(&entities, &topics, &topics.state("lamp"), "ON"),
            None
        );
    }

    #[test]
    fn test_discovery_shares_device_and_availability() {
        let topics = test_topics();
        let device = test_device();
        let ctx = DiscoveryContext {
            topics: &topics,
            device: &device,
        };

        for entity in garage_entities() {
            let config = entity.discovery(&ctx).unwrap();

            assert_eq!(config.device, device);
            assert_eq!(config.unique_id, topics.unique_id(entity.object_id()));
            assert_eq!(config.availability[0].topic, topics.availability());
            assert_eq!(config.state_topic, Some(topics.state(entity.object_id())));
            assert_eq!(config.json_attributes_topic, Some(topics.status()));
        }
    }
}
