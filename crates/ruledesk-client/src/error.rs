use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::{Error, Response};

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("request error: {0}")]
    Generic(#[from] anyhow::Error),
    #[error("network error: {status_code} {message}")]
    NetworkError { status_code: u16, message: String },
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl ClientError {
    /// Text suitable for showing to the operator.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Generic(e) => e.to_string(),
            ClientError::NetworkError { message, .. } | ClientError::Unauthorized(message) => {
                message.clone()
            }
        }
    }
}

/// Pulls `message` or `error` out of a JSON error body, else returns the body as-is.
fn error_message(body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|k| v.get(k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or(body)
}

#[async_trait]
pub trait ResponseExt {
    async fn map_client_error(self) -> Result<Response, ClientError>;
}

#[async_trait]
impl ResponseExt for Response {
    async fn map_client_error(self) -> Result<Response, ClientError> {
        match self.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED | StatusCode::NO_CONTENT => {
                Ok(self)
            }
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized(error_message(
                self.text().await.unwrap_or_default(),
            ))),
            status => Err(ClientError::NetworkError {
                status_code: status.as_u16(),
                message: error_message(self.text().await.unwrap_or_default()),
            }),
        }
    }
}

#[async_trait]
impl ResponseExt for Result<Response, Error> {
    async fn map_client_error(self) -> Result<Response, ClientError> {
        match self {
            Ok(response) => response.map_client_error().await,
            Err(e) => Err(ClientError::Generic(anyhow!(e.to_string()))),
        }
    }
}
