use color_eyre::Result;

use super::{Component, DiscoveryContext, Entity};
use crate::{
    centurion::{
        command::Command,
        status::{self, DeviceStatus},
    },
    mqtt::discovery::DiscoveryConfig,
};

/// An on/off feature of the controller: the lamp or vacation mode.
pub struct GarageSwitch {
    object_id: &'static str,
    name: &'static str,
    icon: &'static str,
    field: &'static str,
    on: Command,
    off: Command,
}

impl GarageSwitch {
    pub fn lamp() -> Self {
        Self {
            object_id: "lamp",
            name: "Lamp Switch",
            icon: "mdi:lightbulb",
            field: status::LAMP,
            on: Command::LampOn,
            off: Command::LampOff,
        }
    }

    pub fn vacation() -> Self {
        Self {
            object_id: "vacation",
            name: "Vacation Mode",
            icon: "mdi:beach",
            field: status::VACATION,
            on: Command::VacationOn,
            off: Command::VacationOff,
        }
    }

    pub fn is_on(&self, status: Option<&DeviceStatus>) -> bool {
        status.map(|status| status.is_on(self.field)).unwrap_or(false)
    }
}

impl Entity for GarageSwitch {
    fn object_id(&self) -> &'static str {
        self.object_id
    }

    fn component(&self) -> Component {
        Component::Switch
    }

    fn discovery(&self, ctx: &DiscoveryContext) -> Result<DiscoveryConfig> {
        let config = ctx
            .base_config(self.name, self.object_id)
            .command_topic(ctx.topics.command(self.object_id))
            .icon(self.icon)
            .payload_on("ON")
            .payload_off("OFF")
            .optimistic(false)
            .build()?;

        Ok(config)
    }

    fn state(&self, status: Option<&DeviceStatus>) -> String {
        let payload = if self.is_on(status) { "ON" } else { "OFF" };
        payload.to_string()
    }

    fn command(&self, payload: &str) -> Option<Command> {
        match payload {
            "ON" => Some(self.on),
            "OFF" => Some(self.off),
            _ => None,
        }
    }
}
