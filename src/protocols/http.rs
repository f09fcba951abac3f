use std::time::Duration;

use hyper::{body::Bytes, Uri};
use serde::Deserialize;

use crate::centurion::error::{verify_response_status, ApiError};

pub type HyperHttpClient = hyper::Client<hyper::client::HttpConnector>;

/// The controller only speaks plain HTTP on the local network.
pub fn mk_hyper_http_client() -> HyperHttpClient {
    hyper::Client::builder().build_http()
}

/// GET `uri` and return the body, bounding the whole exchange by `timeout`.
pub async fn mk_get_request(
    client: &HyperHttpClient,
    uri: &Uri,
    timeout: Duration,
) -> Result<Bytes, ApiError> {
    let request = async {
        let response = client.get(uri.clone()).await?;
        verify_response_status(response.status())?;
        let body_bytes = hyper::body::to_bytes(response.into_body()).await?;

        Ok::<_, ApiError>(body_bytes)
    };

    tokio::time::timeout(timeout, request)
        .await
        .map_err(|_| ApiError::Timeout(timeout))?
}

pub fn decode_json<T: for<'a> Deserialize<'a>>(body_bytes: &[u8]) -> Result<T, ApiError> {
    let de = &mut serde_json::Deserializer::from_slice(body_bytes);
    let response: T = serde_path_to_error::deserialize(de)?;

    Ok(response)
}
