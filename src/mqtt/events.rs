use std::sync::Arc;

use color_eyre::Result;
use log::{debug, error, info};

use crate::{
    bridge::Bridge, centurion::api::GarageApi, mqtt::topics::Topics, protocols::mqtt::MqttClient,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundMessage {
    /// (Re)connected to the broker.
    Connected,
    /// Home Assistant restarted and needs discovery again.
    HomeAssistantOnline,
    Command { topic: String, payload: String },
}

impl InboundMessage {
    fn replaces(&self, other: &InboundMessage) -> bool {
        match (self, other) {
            (InboundMessage::Command { topic: a, .. }, InboundMessage::Command { topic: b, .. }) => {
                a == b
            }
            (InboundMessage::Command { .. }, _) | (_, InboundMessage::Command { .. }) => false,
            // Only a reconnect resubscribes, so it is never dropped.
            (InboundMessage::HomeAssistantOnline, InboundMessage::Connected) => false,
            _ => true,
        }
    }
}

/// Classify an incoming publish. Anything that is not the Home Assistant birth
/// message is treated as a command; routing happens later.
pub fn classify_publish(topics: &Topics, topic: &str, payload: &[u8]) -> Option<InboundMessage> {
    let payload = String::from_utf8_lossy(payload).trim().to_string();

    if topic == topics.home_assistant_status() {
        return (payload == "online").then_some(InboundMessage::HomeAssistantOnline);
    }

    Some(InboundMessage::Command {
        topic: topic.to_string(),
        payload,
    })
}

pub async fn push_unhandled_message(mqtt_client: &MqttClient, message: InboundMessage) {
    // Only the latest message per command topic is kept, so a burst of
    // presses collapses into the last one.
    let mut unhandled_messages = mqtt_client.unhandled_messages.write().await;
    unhandled_messages.retain(|m| !message.replaces(m));
    unhandled_messages.push_back(message);

    mqtt_client.notify.notify_one();
}

pub async fn handle_incoming_mqtt_event(
    event: rumqttc::Event,
    mqtt_client: &MqttClient,
    topics: &Topics,
) -> Result<()> {
    match event {
        rumqttc::Event::Incoming(rumqttc::Packet::ConnAck(_)) => {
            info!("Connected to MQTT broker");

            // Subscribing waits on the request queue, which only this task
            // drains, so it happens in the command loop instead.
            push_unhandled_message(mqtt_client, InboundMessage::Connected).await;
        }
        rumqttc::Event::Incoming(rumqttc::Packet::Publish(msg)) => {
            if let Some(message) = classify_publish(topics, &msg.topic, &msg.payload) {
                push_unhandled_message(mqtt_client, message).await;
            }
        }
        _ => {}
    }

    Ok(())
}

pub fn start_mqtt_events_loop<A: GarageApi>(bridge: &Arc<Bridge<A>>) {
    let bridge = bridge.clone();

    tokio::spawn(async move {
        loop {
            let next_message = {
                let mut unhandled_messages = bridge.mqtt_client().unhandled_messages.write().await;
                unhandled_messages.pop_front()
            };

            match next_message {
                Some(message) => {
                    let result = process_inbound_message(&bridge, message).await;

                    if let Err(e) = result {
                        error!("Error while processing MQTT message: {:?}", e);
                    }
                }
                None => {
                    // Wait until we get notified that there are new messages.
                    bridge.mqtt_client().notify.notified().await;
                }
            }
        }
    });
}

async fn process_inbound_message<A: GarageApi>(
    bridge: &Bridge<A>,
    message: InboundMessage,
) -> Result<()> {
    match message {
        InboundMessage::Connected => {
            bridge.subscribe().await?;
            debug!("Publishing discovery and current state");
            bridge.publish_discovery().await?;
            bridge.publish_current_snapshot().await
        }
        InboundMessage::HomeAssistantOnline => {
            debug!("Publishing discovery and current state");
            bridge.publish_discovery().await?;
            bridge.publish_current_snapshot().await
        }
        InboundMessage::Command { topic, payload } => bridge.handle_command(&topic, &payload).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bridge::tests::test_bridge,
        centurion::coordinator::tests::FakeApi,
        entities::tests::test_topics,
        protocols::mqtt::tests::test_mqtt_client,
    };
    use rumqttc::{ConnAck, ConnectReturnCode, Event, Packet, Request};
    use std::{collections::VecDeque, time::Duration};

    #[test]
    fn test_classify_publish() {
        let topics = test_topics();

        assert_eq!(
            classify_publish(&topics, "homeassistant/status", b"online"),
            Some(InboundMessage::HomeAssistantOnline)
        );
        assert_eq!(classify_publish(&topics, "homeassistant/status", b"offline"), None);
        assert_eq!(
            classify_publish(&topics, "centurion/garage/lamp/set", b"ON\n"),
            Some(InboundMessage::Command {
                topic: "centurion/garage/lamp/set".to_string(),
                payload: "ON".to_string(),
            })
        );
    }

    #[test]
    fn test_latest_command_per_topic_wins() {
        let open = InboundMessage::Command {
            topic: "centurion/garage/cover/set".to_string(),
            payload: "OPEN".to_string(),
        };
        let stop = InboundMessage::Command {
            topic: "centurion/garage/cover/set".to_string(),
            payload: "STOP".to_string(),
        };
        let lamp = InboundMessage::Command {
            topic: "centurion/garage/lamp/set".to_string(),
            payload: "ON".to_string(),
        };

        assert!(stop.replaces(&open));
        assert!(!lamp.replaces(&open));
        assert!(!InboundMessage::Connected.replaces(&open));
        assert!(InboundMessage::Connected.replaces(&InboundMessage::HomeAssistantOnline));
        assert!(!InboundMessage::HomeAssistantOnline.replaces(&InboundMessage::Connected));
        assert!(InboundMessage::HomeAssistantOnline.replaces(&InboundMessage::HomeAssistantOnline));
    }

    #[tokio::test]
    async fn test_connack_does_not_wait_on_full_queue() {
        let topics = test_topics();
        let (mqtt_client, requests) = test_mqtt_client(1);
        mqtt_client
            .publish(topics.availability(), "online", true)
            .await
            .unwrap();

        let connack = Event::Incoming(Packet::ConnAck(ConnAck::new(
            ConnectReturnCode::Success,
            false,
        )));
        tokio::time::timeout(
            Duration::from_secs(2),
            handle_incoming_mqtt_event(connack, &mqtt_client, &topics),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(
            *mqtt_client.unhandled_messages.read().await,
            VecDeque::from([InboundMessage::Connected])
        );
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn test_connected_subscribes_then_publishes_discovery() {
        let (bridge, requests) = test_bridge(FakeApi::default(), false, 64);

        process_inbound_message(&bridge, InboundMessage::Connected)
            .await
            .unwrap();
        let requests: Vec<_> = requests.try_iter().collect();

        match &requests[..2] {
            [Request::Subscribe(commands), Request::Subscribe(status)] => {
                assert_eq!(commands.filters[0].path, "centurion/garage/+/set");
                assert_eq!(status.filters[0].path, "homeassistant/status");
            }
            other => panic!("expected subscriptions first, got {other:?}"),
        }
        assert!(requests[2..].iter().any(|request| matches!(
            request,
            Request::Publish(publish) if publish.topic == "homeassistant/cover/garage/cover/config"
        )));
    }

    #[tokio::test]
    async fn test_home_assistant_online_does_not_resubscribe() {
        let (bridge, requests) = test_bridge(FakeApi::default(), false, 64);

        process_inbound_message(&bridge, InboundMessage::HomeAssistantOnline)
            .await
            .unwrap();

        assert!(requests
            .try_iter()
            .all(|request| matches!(request, Request::Publish(_))));
    }
}
