use color_eyre::Result;

use super::{Component, DiscoveryContext, Entity, PAYLOAD_NONE};
use crate::{
    centurion::{
        command::Command,
        status::{DeviceStatus, DoorState},
    },
    mqtt::discovery::DiscoveryConfig,
};

pub struct GarageDoorCover;

impl GarageDoorCover {
    /// Cover state payload. Home Assistant has no "problem" cover state, so it
    /// shows as unknown; the raw value stays visible in the attributes.
    pub fn state_payload(state: DoorState) -> &'static str {
        match state {
            DoorState::Open
            | DoorState::Opening
            | DoorState::Closed
            | DoorState::Closing
            | DoorState::Stopped => state.as_str(),
            DoorState::Problem | DoorState::Unknown => PAYLOAD_NONE,
        }
    }
}

impl Entity for GarageDoorCover {
    fn object_id(&self) -> &'static str {
        "cover"
    }

    fn component(&self) -> Component {
        Component::Cover
    }

    fn discovery(&self, ctx: &DiscoveryContext) -> Result<DiscoveryConfig> {
        let config = ctx
            .base_config("Centurion Garage Door", self.object_id())
            .command_topic(ctx.topics.command(self.object_id()))
            .device_class("garage")
            .payload_open("OPEN")
            .payload_close("CLOSE")
            .payload_stop("STOP")
            .optimistic(false)
            .build()?;

        Ok(config)
    }

    fn state(&self, status: Option<&DeviceStatus>) -> String {
        Self::state_payload(DoorState::from_status(status)).to_string()
    }

    fn command(&self, payload: &str) -> Option<Command> {
        match payload {
            "OPEN" => Some(Command::OpenDoor),
            "CLOSE" => Some(Command::CloseDoor),
            "STOP" => Some(Command::StopDoor),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::tests::{test_device, test_topics};
    use serde_json::json;

    fn door(value: &str) -> DeviceStatus {
        serde_json::from_value(json!({ "door": value })).unwrap()
    }

    #[test]
    fn test_state_follows_poll() {
        let cover = GarageDoorCover;

        assert_eq!(cover.state(Some(&door("Opening"))), "opening");
        assert_eq!(cover.state(Some(&door("closed"))), "closed");
        assert_eq!(cover.state(Some(&door("Stopped"))), "stopped");
        assert_eq!(cover.state(Some(&door("ERROR"))), "None");
        assert_eq!(cover.state(Some(&DeviceStatus::default())), "None");
        assert_eq!(cover.state(None), "None");
    }

    #[test]
    fn test_discovery_payload() {
        let topics = test_topics();
        let device = test_device();
        let config = GarageDoorCover
            .discovery(&DiscoveryContext {
                topics: &topics,
                device: &device,
            })
            .unwrap();

        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["device_class"], "garage");
        assert_eq!(json["command_topic"], "centurion/garage/cover/set");
        assert_eq!(json["state_topic"], "centurion/garage/cover/state");
        assert_eq!(json["payload_stop"], "STOP");
        assert_eq!(json["optimistic"], false);
        assert!(json.get("unit_of_measurement").is_none());
    }
}
