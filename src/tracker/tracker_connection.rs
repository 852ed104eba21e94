use async_trait::async_trait;
use url::Url;

use std::time::Duration;

use super::TrackerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerHttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Performs one announce GET. Every call is an independent request.
#[async_trait]
pub trait TrackerConnection: Send + Sync {
    async fn get(&self, url: &Url) -> Result<TrackerHttpResponse, TrackerError>;
}

#[derive(Debug, Clone)]
pub struct HttpTrackerConnection {
    client: reqwest::Client,
}

impl HttpTrackerConnection {
    pub fn new(timeout: Duration) -> Result<Self, TrackerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl TrackerConnection for HttpTrackerConnection {
    async fn get(&self, url: &Url) -> Result<TrackerHttpResponse, TrackerError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        tracing::trace!("tracker responded with status {} and {} bytes", status, body.len());

        Ok(TrackerHttpResponse { status, body })
    }
}
