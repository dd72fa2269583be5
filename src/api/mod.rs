// CringeIn server client

pub mod sse;

use futures::future::BoxFuture;
use futures::stream::Stream;
use reqwest::{Client, StatusCode};
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

use crate::events::Event;
use crate::models::GenerateRequest;

pub use sse::decode_stream;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Connection error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Server error: {status} — {body}")]
    Status { status: StatusCode, body: String },
    #[error("Connection error: {0}")]
    Stream(String),
}

/// Upper bound for the startup reachability probe
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

pub type EventStream = Pin<Box<dyn Stream<Item = Result<Event, ApiError>> + Send>>;

/// Issues a generation request and exposes the decoded event stream.
pub trait Transport: Send + Sync {
    fn open(&self, request: GenerateRequest) -> BoxFuture<'static, Result<EventStream, ApiError>>;
}

#[derive(Debug, Clone)]
pub struct CringeClient {
    base_url: String,
    client: Client,
}

impl CringeClient {
    /// `connect_timeout` bounds the TCP connect only. Sessions bound the wait
    /// for response headers and for each body chunk themselves.
    pub fn new(base_url: &str, connect_timeout: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub async fn generate_stream(&self, request: &GenerateRequest) -> Result<EventStream, ApiError> {
        let url = format!("{}/generate", self.base_url);

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        Ok(Box::pin(decode_stream(response.bytes_stream())))
    }

    pub async fn health_check(&self) -> bool {
        self.client
            .get(&self.base_url)
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
            .is_ok_and(|response| response.status().is_success())
    }
}

impl Transport for CringeClient {
    fn open(&self, request: GenerateRequest) -> BoxFuture<'static, Result<EventStream, ApiError>> {
        let client = self.clone();
        Box::pin(async move { client.generate_stream(&request).await })
    }
}
