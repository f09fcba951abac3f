use std::time::Duration;

use hyper::StatusCode;
use thiserror::Error;

/// The three ways a device request can fail, as seen by callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, timeout or non-success HTTP status.
    Communication,
    /// The controller rejected the api key.
    Authentication,
    /// Anything wrong on our side, e.g. an unusable URL or an undecodable body.
    Client,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("timed out after {0:?} waiting for the garage door controller")]
    Timeout(Duration),

    #[error("error communicating with the garage door controller: {0}")]
    Transport(#[from] hyper::Error),

    #[error("garage door controller responded with HTTP {0}")]
    Status(StatusCode),

    #[error("garage door controller rejected the api key (HTTP {0})")]
    Authentication(StatusCode),

    #[error("invalid garage door controller url: {0}")]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),

    #[error("unexpected status payload from the garage door controller: {0}")]
    Decode(#[from] serde_path_to_error::Error<serde_json::Error>),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Timeout(_) | ApiError::Transport(_) | ApiError::Status(_) => {
                ErrorKind::Communication
            }
            ApiError::Authentication(_) => ErrorKind::Authentication,
            ApiError::InvalidUri(_) | ApiError::Decode(_) => ErrorKind::Client,
        }
    }
}

/// Maps a response status onto the error the caller should see, if any.
pub fn verify_response_status(status: StatusCode) -> Result<(), ApiError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::Authentication(status));
    }

    if !status.is_success() {
        return Err(ApiError::Status(status));
    }

    Ok(())
}
