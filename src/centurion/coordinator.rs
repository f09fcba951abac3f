use std::{sync::Arc, time::Duration};

use log::{debug, error, info};
use thiserror::Error;
use tokio::{
    sync::{watch, Mutex, Notify},
    task::JoinHandle,
};

use super::{
    api::GarageApi,
    error::{ApiError, ErrorKind},
    status::DeviceStatus,
};

#[derive(Debug, Error)]
pub enum UpdateFailed {
    #[error("garage door controller rejected the api key, re-authentication required: {0}")]
    AuthFailed(#[source] ApiError),

    #[error("error fetching garage door status: {0}")]
    Failed(#[source] ApiError),
}

impl From<ApiError> for UpdateFailed {
    fn from(err: ApiError) -> Self {
        match err.kind() {
            ErrorKind::Authentication => UpdateFailed::AuthFailed(err),
            ErrorKind::Communication | ErrorKind::Client => UpdateFailed::Failed(err),
        }
    }
}

/// What dependent entities see after each poll.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    /// Latest successfully fetched payload. Survives failed polls.
    pub status: Option<Arc<DeviceStatus>>,
    pub last_update_success: bool,
    pub reauth_required: bool,
}

/// Polls the controller on a fixed interval and fans the latest status out to
/// subscribers.
pub struct Coordinator<A> {
    api: A,
    update_interval: Duration,
    snapshot: watch::Sender<Snapshot>,
    refresh_requested: Notify,
    // Held for the duration of a request so polls never overlap.
    refresh_lock: Mutex<()>,
}

impl<A: GarageApi> Coordinator<A> {
    pub fn new(api: A, update_interval: Duration) -> Self {
        let (snapshot, _) = watch::channel(Snapshot::default());

        Self {
            api,
            update_interval,
            snapshot,
            refresh_requested: Notify::new(),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    pub fn data(&self) -> Option<Arc<DeviceStatus>> {
        self.snapshot.borrow().status.clone()
    }

    pub fn last_update_success(&self) -> bool {
        self.snapshot.borrow().last_update_success
    }

    /// Fetch the status once. On failure the previous payload is kept.
    pub async fn refresh(&self) -> Result<(), UpdateFailed> {
        let _guard = self.refresh_lock.lock().await;
        let was_successful = self.last_update_success();

        match self.api.get_status().await {
            Ok(status) => {
                if !was_successful && self.snapshot.borrow().status.is_some() {
                    info!("Fetching garage door status recovered");
                }
                debug!(
                    "Garage door {}, lamp on: {}, vacation on: {}, wifi: {:?} dBm, cycles: {:?}",
                    status.door(),
                    status.lamp_on(),
                    status.vacation_on(),
                    status.wifi_dbm(),
                    status.cycles()
                );

                self.snapshot.send_modify(|snapshot| {
                    snapshot.status = Some(Arc::new(status));
                    snapshot.last_update_success = true;
                });

                Ok(())
            }
            Err(err) => {
                let failed = UpdateFailed::from(err);

                if was_successful {
                    error!("{}", failed);
                } else {
                    debug!("{}", failed);
                }

                let reauth_required = matches!(failed, UpdateFailed::AuthFailed(_));
                self.snapshot.send_modify(|snapshot| {
                    snapshot.last_update_success = false;
                    snapshot.reauth_required |= reauth_required;
                });

                Err(failed)
            }
        }
    }

    /// Ask the poll loop for an immediate refresh. Requests made while a
    /// refresh is running collapse into a single follow-up refresh.
    pub fn request_refresh(&self) {
        self.refresh_requested.notify_one();
    }

    /// Resolves once the controller has rejected the api key.
    pub async fn reauth_requested(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this only ends on a match.
        let _ = rx.wait_for(|snapshot| snapshot.reauth_required).await;
    }

    pub fn start_poll_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = self.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(coordinator.update_interval) => {}
                    _ = coordinator.refresh_requested.notified() => {
                        debug!("Refresh requested");
                    }
                }

                // Failures are already logged and recorded in the snapshot.
                let _ = coordinator.refresh().await;
            }
        })
    }
}
