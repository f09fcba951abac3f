use std::{future::Future, time::Duration};

use hyper::{body::Bytes, Uri};
use log::debug;

use super::{
    command::{Command, DeviceRequest},
    error::ApiError,
    status::DeviceStatus,
};
use crate::{
    protocols::http::{decode_json, mk_get_request, HyperHttpClient},
    settings::GarageSettings,
};

/// Everything the bridge needs from a garage door controller.
pub trait GarageApi: Send + Sync + 'static {
    fn ip_address(&self) -> &str;

    fn get_status(&self) -> impl Future<Output = Result<DeviceStatus, ApiError>> + Send;

    fn send_command(&self, command: Command) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn get_camera_image(&self) -> impl Future<Output = Result<Bytes, ApiError>> + Send;
}

#[derive(Clone)]
pub struct GarageApiClient {
    ip_address: String,
    api_key: String,
    client: HyperHttpClient,
    timeout: Duration,
}

impl GarageApiClient {
    pub fn new(settings: &GarageSettings, client: HyperHttpClient) -> Self {
        Self {
            ip_address: settings.ip_address.trim().to_string(),
            api_key: settings.api_key.clone(),
            client,
            timeout: settings.request_timeout(),
        }
    }

    fn base_url(&self) -> String {
        format!("http://{}/api?key={}", self.ip_address, self.api_key)
    }

    pub fn request_uri(&self, request: DeviceRequest) -> Result<Uri, ApiError> {
        let (param, value) = request.query();
        let uri = format!("{}&{}={}", self.base_url(), param, value).parse()?;

        Ok(uri)
    }

    async fn get(&self, request: DeviceRequest) -> Result<Bytes, ApiError> {
        let uri = self.request_uri(request)?;
        debug!("GET {:?} from {}", request, self.ip_address);

        mk_get_request(&self.client, &uri, self.timeout).await
    }
}

impl GarageApi for GarageApiClient {
    fn ip_address(&self) -> &str {
        &self.ip_address
    }

    async fn get_status(&self) -> Result<DeviceStatus, ApiError> {
        let body_bytes = self.get(DeviceRequest::Status).await?;

        decode_json(&body_bytes)
    }

    async fn send_command(&self, command: Command) -> Result<(), ApiError> {
        self.get(DeviceRequest::Command(command)).await?;

        Ok(())
    }

    async fn get_camera_image(&self) -> Result<Bytes, ApiError> {
        self.get(DeviceRequest::CameraSnapshot).await
    }
}
