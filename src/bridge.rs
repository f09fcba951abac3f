use std::{sync::Arc, time::Duration};

use color_eyre::Result;
use eyre::eyre;
use log::{error, info, warn};

use crate::{
    centurion::{
        api::GarageApi,
        coordinator::{Coordinator, Snapshot},
    },
    entities::{camera::GarageCamera, garage_entities, resolve_command, DiscoveryContext, Entity},
    mqtt::{
        discovery::{AvailabilityState, Device},
        topics::Topics,
    },
    protocols::mqtt::MqttClient,
};

/// Connects the polling coordinator to Home Assistant over MQTT.
pub struct Bridge<A> {
    coordinator: Arc<Coordinator<A>>,
    mqtt_client: MqttClient,
    topics: Topics,
    device: Device,
    entities: Vec<Box<dyn Entity>>,
    camera: Option<GarageCamera>,
}

impl<A: GarageApi> Bridge<A> {
    pub fn new(
        coordinator: Arc<Coordinator<A>>,
        mqtt_client: MqttClient,
        topics: Topics,
        device_name: &str,
        camera: bool,
    ) -> Self {
        let device = Device::centurion_garage(coordinator.api().ip_address(), device_name);

        Self {
            coordinator,
            mqtt_client,
            topics,
            device,
            entities: garage_entities(),
            camera: camera.then_some(GarageCamera),
        }
    }

    pub fn mqtt_client(&self) -> &MqttClient {
        &self.mqtt_client
    }

    pub async fn subscribe(&self) -> Result<()> {
        self.mqtt_client.subscribe(self.topics.command_filter()).await?;
        self.mqtt_client
            .subscribe(self.topics.home_assistant_status())
            .await
    }

    pub async fn publish_discovery(&self) -> Result<()> {
        let ctx = DiscoveryContext {
            topics: &self.topics,
            device: &self.device,
        };

        for entity in &self.entities {
            let config = entity.discovery(&ctx)?;
            let topic = self
                .topics
                .discovery(entity.component().as_str(), entity.object_id());

            self.mqtt_client
                .publish(topic, serde_json::to_string(&config)?, true)
                .await?;
        }

        if let Some(camera) = &self.camera {
            let config = camera.discovery(&ctx)?;
            let topic = self
                .topics
                .discovery(camera.component().as_str(), GarageCamera::OBJECT_ID);

            self.mqtt_client
                .publish(topic, serde_json::to_string(&config)?, true)
                .await?;
        }

        Ok(())
    }

    pub async fn publish_availability(&self, availability: AvailabilityState) -> Result<()> {
        self.mqtt_client
            .publish(self.topics.availability(), availability.as_str(), true)
            .await
    }

    /// Publish `offline` unless the request queue stays full for `timeout`,
    /// which happens while the broker is unreachable. The last will covers
    /// that case.
    pub async fn publish_offline(&self, timeout: Duration) -> Result<()> {
        let publish = self.publish_availability(AvailabilityState::Offline);

        match tokio::time::timeout(timeout, publish).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Timed out publishing offline availability, leaving it to the last will");
                Ok(())
            }
        }
    }

    pub async fn publish_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let availability = if snapshot.last_update_success {
            AvailabilityState::Online
        } else {
            AvailabilityState::Offline
        };
        self.publish_availability(availability).await?;

        let status = snapshot.status.as_deref();

        if let Some(status) = status {
            self.mqtt_client
                .publish(self.topics.status(), serde_json::to_string(status)?, true)
                .await?;
        }

        for entity in &self.entities {
            self.mqtt_client
                .publish(
                    self.topics.state(entity.object_id()),
                    entity.state(status),
                    true,
                )
                .await?;
        }

        if self.camera.is_some() && snapshot.last_update_success {
            // A missing snapshot should not take the other entities down.
            if let Err(e) = self.publish_camera_image().await {
                warn!("Unable to refresh camera snapshot: {:?}", e);
            }
        }

        Ok(())
    }

    pub async fn publish_current_snapshot(&self) -> Result<()> {
        let snapshot = self.coordinator.snapshot();
        self.publish_snapshot(&snapshot).await
    }

    async fn publish_camera_image(&self) -> Result<()> {
        let image = self.coordinator.api().get_camera_image().await?;

        self.mqtt_client
            .publish(self.topics.camera_image(), image.to_vec(), false)
            .await
    }

    /// Relay a Home Assistant command to the controller, then ask for a fresh
    /// poll so entity state follows the device.
    pub async fn handle_command(&self, topic: &str, payload: &str) -> Result<()> {
        let command = resolve_command(&self.entities, &self.topics, topic, payload)
            .ok_or_else(|| eyre!("Unsupported command {:?} on topic {}", payload, topic))?;

        info!("Sending {} to garage door controller", command);
        self.coordinator.api().send_command(command).await?;
        self.coordinator.request_refresh();

        Ok(())
    }

    /// Republish entity state after every poll.
    pub fn start_state_loop(self: &Arc<Self>) {
        let bridge = self.clone();
        let mut rx = self.coordinator.subscribe();

        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();

                if let Err(e) = bridge.publish_snapshot(&snapshot).await {
                    error!("Error while publishing garage door state: {:?}", e);
                }
            }
        });
    }
}
