use color_eyre::Result;
use log::error;
use rumqttc::{AsyncClient, LastWill, MqttOptions, QoS};
use std::{collections::VecDeque, sync::Arc, time::Duration};
use tokio::{
    sync::{Notify, RwLock},
    task,
};

use crate::{
    mqtt::{
        discovery::AvailabilityState,
        events::{handle_incoming_mqtt_event, InboundMessage},
        topics::Topics,
    },
    settings::Settings,
};

#[derive(Clone)]
pub struct MqttClient {
    pub client: AsyncClient,
    pub unhandled_messages: Arc<RwLock<VecDeque<InboundMessage>>>,
    pub notify: Arc<Notify>,
}

impl MqttClient {
    pub async fn publish<V: Into<Vec<u8>>>(&self, topic: String, payload: V, retain: bool) -> Result<()> {
        self.client
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await?;

        Ok(())
    }

    pub async fn subscribe(&self, topic: String) -> Result<()> {
        self.client.subscribe(topic, QoS::AtLeastOnce).await?;

        Ok(())
    }
}

pub fn mk_mqtt_client(settings: &Settings, topics: &Topics) -> MqttClient {
    let mut options = MqttOptions::new(
        settings.mqtt.id.clone(),
        settings.mqtt.host.clone(),
        settings.mqtt.port,
    );
    options.set_keep_alive(Duration::from_secs(5));
    options.set_last_will(LastWill::new(
        topics.availability(),
        AvailabilityState::Offline.as_str(),
        QoS::AtLeastOnce,
        true,
    ));

    if let Some(username) = &settings.mqtt.username {
        options.set_credentials(
            username.clone(),
            settings.mqtt.password.clone().unwrap_or_default(),
        );
    }

    let (client, mut eventloop) = AsyncClient::new(options, 10);

    let mqtt_client = MqttClient {
        client,
        unhandled_messages: Default::default(),
        notify: Default::default(),
    };

    let event_client = mqtt_client.clone();
    let topics = topics.clone();

    task::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(event) => {
                    let res = handle_incoming_mqtt_event(event, &event_client, &topics).await;

                    if let Err(e) = res {
                        error!("MQTT error: {:?}", e);
                    }
                }
                Err(e) => {
                    error!("MQTT connection error: {:?}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    });

    mqtt_client
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rumqttc::{Publish, Request};

    /// Client whose requests land in `capacity` slots that nothing drains
    /// unless the test reads them back.
    pub(crate) fn test_mqtt_client(capacity: usize) -> (MqttClient, flume::Receiver<Request>) {
        let (requests_tx, requests_rx) = flume::bounded(capacity);
        let mqtt_client = MqttClient {
            client: AsyncClient::from_senders(requests_tx),
            unhandled_messages: Default::default(),
            notify: Default::default(),
        };

        (mqtt_client, requests_rx)
    }

    pub(crate) fn published(requests: &flume::Receiver<Request>) -> Vec<Publish> {
        requests
            .try_iter()
            .filter_map(|request| match request {
                Request::Publish(publish) => Some(publish),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_publish_is_queued_at_least_once() {
        let (mqtt_client, requests) = test_mqtt_client(4);

        mqtt_client
            .publish("centurion/garage/lamp/state".to_string(), "ON", true)
            .await
            .unwrap();
        mqtt_client
            .subscribe("centurion/garage/+/set".to_string())
            .await
            .unwrap();

        match requests.try_iter().collect::<Vec<_>>().as_slice() {
            [Request::Publish(publish), Request::Subscribe(subscribe)] => {
                assert_eq!(publish.topic, "centurion/garage/lamp/state");
                assert_eq!(&publish.payload[..], b"ON");
                assert!(publish.retain);
                assert_eq!(publish.qos, QoS::AtLeastOnce);
                assert_eq!(subscribe.filters[0].path, "centurion/garage/+/set");
            }
            other => panic!("unexpected requests: {other:?}"),
        }
    }
}
