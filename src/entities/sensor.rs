use color_eyre::Result;

use super::{Component, DiscoveryContext, Entity, PAYLOAD_NONE};
use crate::{
    centurion::status::{self, DeviceStatus},
    mqtt::discovery::DiscoveryConfig,
};

/// Integer readings taken straight from the status payload.
pub struct GarageSensor {
    object_id: &'static str,
    name: &'static str,
    icon: &'static str,
    field: &'static str,
    device_class: Option<&'static str>,
    state_class: &'static str,
    unit_of_measurement: Option<&'static str>,
}

impl GarageSensor {
    pub fn wifi_signal() -> Self {
        Self {
            object_id: "wifi_signal",
            name: "WiFi Signal Strength",
            icon: "mdi:wifi",
            field: status::WIFI_DBM,
            device_class: Some("signal_strength"),
            state_class: "measurement",
            unit_of_measurement: Some("dBm"),
        }
    }

    pub fn cycles() -> Self {
        Self {
            object_id: "cycles",
            name: "Cycles",
            icon: "mdi:counter",
            field: status::CYCLES,
            device_class: None,
            state_class: "total_increasing",
            unit_of_measurement: None,
        }
    }

    pub fn value(&self, status: Option<&DeviceStatus>) -> Option<i64> {
        status?.integer(self.field)
    }
}

impl Entity for GarageSensor {
    fn object_id(&self) -> &'static str {
        self.object_id
    }

    fn component(&self) -> Component {
        Component::Sensor
    }

    fn discovery(&self, ctx: &DiscoveryContext) -> Result<DiscoveryConfig> {
        let mut builder = ctx.base_config(self.name, self.object_id);
        builder.icon(self.icon).state_class(self.state_class);

        if let Some(device_class) = self.device_class {
            builder.device_class(device_class);
        }
        if let Some(unit) = self.unit_of_measurement {
            builder.unit_of_measurement(unit);
        }

        Ok(builder.build()?)
    }

    fn state(&self, status: Option<&DeviceStatus>) -> String {
        match self.value(status) {
            Some(value) => value.to_string(),
            None => PAYLOAD_NONE.to_string(),
        }
    }
}
