use std::fmt;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Largest payload the client will transfer. Checked before the PUT
    /// goes out so an oversized file fails without touching the network.
    pub max_bytes: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            // The request timeout covers the whole byte transfer.
            request_timeout: Duration::from_secs(120),
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ApiFailure,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: ApiFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: u64 },
    Network,
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::InvalidUrl => write!(f, "invalid url"),
            ApiFailure::HttpStatus(code) => write!(f, "http status {code}"),
            ApiFailure::Timeout => write!(f, "timeout"),
            ApiFailure::TooLarge { max_bytes, actual } => {
                write!(f, "payload too large ({actual} bytes, limit {max_bytes})")
            }
            ApiFailure::Network => write!(f, "network error"),
        }
    }
}

#[derive(Serialize)]
struct CreateProject<'a> {
    filename: &'a str,
}

/// Error body shape the API uses for rejections.
#[derive(Deserialize)]
struct ErrorDetail {
    detail: String,
}

/// Upload authorization: the server-assigned identity key plus a one-shot
/// link for the byte transfer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectCreated {
    pub object_prefix: String,
    pub upload_link: String,
}

#[async_trait::async_trait]
pub trait UploadApi: Send + Sync {
    /// `POST /api/images` with the filename; issues the upload link.
    async fn create_project(&self, filename: &str) -> Result<ProjectCreated, ApiError>;

    /// `PUT` the raw file bytes to the issued link.
    async fn put_object(&self, upload_link: &str, bytes: Vec<u8>) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestUploadApi {
    base: reqwest::Url,
    client: reqwest::Client,
    max_bytes: u64,
}

impl ReqwestUploadApi {
    pub fn new(base_url: &str, settings: UploadSettings) -> Result<Self, ApiError> {
        let base = reqwest::Url::parse(base_url)
            .map_err(|err| ApiError::new(ApiFailure::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiFailure::Network, err.to_string()))?;
        Ok(Self {
            base,
            client,
            max_bytes: settings.max_bytes,
        })
    }
}

#[async_trait::async_trait]
impl UploadApi for ReqwestUploadApi {
    async fn create_project(&self, filename: &str) -> Result<ProjectCreated, ApiError> {
        let url = self
            .base
            .join("/api/images")
            .map_err(|err| ApiError::new(ApiFailure::InvalidUrl, err.to_string()))?;

        let response = self
            .client
            .post(url)
            .json(&CreateProject { filename })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            // Rejections carry `{detail}`; fall back to the status line.
            let detail = response
                .json::<ErrorDetail>()
                .await
                .map(|body| body.detail)
                .unwrap_or_else(|_| status.to_string());
            return Err(ApiError::new(ApiFailure::HttpStatus(status.as_u16()), detail));
        }

        response
            .json::<ProjectCreated>()
            .await
            .map_err(|err| ApiError::new(ApiFailure::Network, err.to_string()))
    }

    async fn put_object(&self, upload_link: &str, bytes: Vec<u8>) -> Result<(), ApiError> {
        let actual = bytes.len() as u64;
        if actual > self.max_bytes {
            return Err(ApiError::new(
                ApiFailure::TooLarge {
                    max_bytes: self.max_bytes,
                    actual,
                },
                "payload exceeds the transfer limit",
            ));
        }

        let url = reqwest::Url::parse(upload_link)
            .map_err(|err| ApiError::new(ApiFailure::InvalidUrl, err.to_string()))?;

        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                ApiFailure::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiFailure::Timeout, err.to_string());
    }
    ApiError::new(ApiFailure::Network, err.to_string())
}
