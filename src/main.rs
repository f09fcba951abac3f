use std::{sync::Arc, time::Duration};

use bridge::Bridge;
use centurion::{
    api::GarageApiClient,
    coordinator::{Coordinator, UpdateFailed},
    status::DoorState,
};
use color_eyre::Result;
use eyre::eyre;
use log::{info, warn};
use mqtt::{events::start_mqtt_events_loop, topics::Topics};
use protocols::{http::mk_hyper_http_client, mqtt::mk_mqtt_client};

use crate::settings::read_settings;

mod bridge;
mod centurion;
mod entities;
mod mqtt;
mod protocols;
mod settings;

const SHUTDOWN_PUBLISH_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let settings = read_settings()?;
    let topics = Topics::new(&settings.mqtt);
    let http_client = mk_hyper_http_client();
    let api_client = GarageApiClient::new(&settings.garage, http_client);
    let coordinator = Arc::new(Coordinator::new(
        api_client,
        settings.garage.scan_interval(),
    ));

    match coordinator.refresh().await {
        Ok(()) => info!(
            "Connected to garage door controller at {}, door is {}",
            settings.garage.ip_address,
            DoorState::from_status(coordinator.data().as_deref())
        ),
        Err(e @ UpdateFailed::AuthFailed(_)) => return Err(e.into()),
        Err(e) => warn!("{}, will keep polling every {:?}", e, coordinator.update_interval()),
    }

    let mqtt_client = mk_mqtt_client(&settings, &topics);
    let bridge = Arc::new(Bridge::new(
        coordinator.clone(),
        mqtt_client,
        topics,
        &settings.garage.name,
        settings.garage.camera,
    ));

    coordinator.start_poll_loop();
    bridge.start_state_loop();
    start_mqtt_events_loop(&bridge);

    let result: Result<()> = tokio::select! {
        res = tokio::signal::ctrl_c() => res.map_err(Into::into),
        _ = coordinator.reauth_requested() => Err(eyre!(
            "garage door controller rejected the api key, update garage.api_key and restart"
        )),
    };

    bridge.publish_offline(SHUTDOWN_PUBLISH_TIMEOUT).await?;

    result
}
