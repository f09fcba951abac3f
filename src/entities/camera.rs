use color_eyre::Result;

use super::{Component, DiscoveryContext};
use crate::mqtt::discovery::{Availability, DiscoveryConfig, DiscoveryConfigBuilder};

/// Snapshot camera. Images are fetched with `camera=snapshot` after each
/// successful poll and published as raw bytes.
pub struct GarageCamera;

impl GarageCamera {
    pub const OBJECT_ID: &'static str = "camera";

    pub fn component(&self) -> Component {
        Component::Camera
    }

    pub fn discovery(&self, ctx: &DiscoveryContext) -> Result<DiscoveryConfig> {
        let config = DiscoveryConfigBuilder::default()
            .name("Centurion Garage Camera")
            .unique_id(ctx.topics.unique_id(Self::OBJECT_ID))
            .device(ctx.device.clone())
            .availability(vec![Availability::online_offline(
                ctx.topics.availability(),
            )])
            .topic(ctx.topics.camera_image())
            .build()?;

        Ok(config)
    }
}
