use thiserror::Error;
use tokio::sync::watch;
use url::Url;

use std::time::Duration;

use crate::utils::bencode::MalformedInput;
use crate::utils::cancelled;

pub mod tracker_connection;
pub use tracker_connection::{TrackerConnection, HttpTrackerConnection, TrackerHttpResponse};

pub mod tracker_request;
pub use tracker_request::TrackerRequest;

pub mod tracker_response;
pub use tracker_response::AnnounceResponse;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid tracker url '{0}': must be http:// or https:// and not a local host")]
    InvalidTrackerUrl(String),

    #[error("tracker response has no peers")]
    NoPeers,

    #[error("tracker returned status {0}")]
    BadStatus(u16),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure reported by a [`TrackerConnection`] other than reqwest.
    #[error("connection error: {0}")]
    Connection(String),

    #[error("decode tracker response: {0}")]
    Bencode(#[from] MalformedInput),

    #[error("invalid tracker response: {0}")]
    InvalidResponse(String),

    #[error("tracker returned failure: {0}")]
    TrackerFailure(String),

    #[error("no tracker urls")]
    NoTrackers,

    #[error("announce cancelled")]
    Cancelled,

    #[error("all trackers failed: {0}")]
    AllTrackersFailed(#[source] Box<TrackerError>),
}

/// Limits and timings of the announce phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Peers kept from a single response.
    pub max_peers: usize,
    /// Attempts per tracker url; 0 counts as 1.
    pub retries: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub http_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_peers: crate::TRACKER_MAX_PEERS,
            retries: crate::TRACKER_RETRIES,
            initial_backoff: Duration::from_secs(crate::TRACKER_INITIAL_BACKOFF_SECS),
            max_backoff: Duration::from_secs(crate::TRACKER_MAX_BACKOFF_SECS),
            http_timeout: Duration::from_secs(crate::TRACKER_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Rejects anything that isn't http(s) and hosts that point back at this machine.
pub fn validate_tracker_url(tracker_url: &str) -> Result<Url, TrackerError> {
    let invalid = || TrackerError::InvalidTrackerUrl(tracker_url.to_string());

    let url = Url::parse(tracker_url).map_err(|_| invalid())?;

    if !matches!(url.scheme().to_ascii_lowercase().as_str(), "http" | "https") {
        return Err(invalid());
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if host.is_empty() || host == "localhost" || host.starts_with("127.") {
        return Err(invalid());
    }

    Ok(url)
}

/// Keeps the first occurrence of every url, dropping empty ones.
pub fn dedup_tracker_urls(tracker_urls: &[String]) -> Vec<String> {
    let mut deduped: Vec<String> = Vec::with_capacity(tracker_urls.len());
    for url in tracker_urls {
        if !url.is_empty() && !deduped.contains(url) {
            deduped.push(url.clone());
        }
    }

    deduped
}

fn next_backoff(backoff: Duration, max_backoff: Duration) -> Duration {
    backoff.saturating_mul(2).min(max_backoff)
}


pub struct Tracker<C = HttpTrackerConnection> {
    config: TrackerConfig,
    connection: C,
}

impl Tracker<HttpTrackerConnection> {
    pub fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        let connection = HttpTrackerConnection::new(config.http_timeout)?;

        Ok(Self { config, connection })
    }
}

impl<C: TrackerConnection> Tracker<C> {
    pub fn with_connection(config: TrackerConfig, connection: C) -> Self {
        Self { config, connection }
    }

    pub fn get_config(&self) -> &TrackerConfig {
        &self.config
    }

    /// A single announce to a single tracker.
    pub async fn announce(&self, announce: &str, request: &TrackerRequest) -> Result<AnnounceResponse, TrackerError> {
        let url = request.as_url(validate_tracker_url(announce)?);

        let response = self.connection.get(&url).await?;
        if response.status != 200 {
            return Err(TrackerError::BadStatus(response.status));
        }

        AnnounceResponse::from_bytes(&response.body, self.config.max_peers)
    }

    /// Tries every tracker in order, retrying each with exponential backoff.
    ///
    /// Invalid urls are skipped without using up retries. Returns the first
    /// successful response, [`TrackerError::Cancelled`] as soon as `cancel`
    /// turns `true`, or [`TrackerError::AllTrackersFailed`] wrapping the most
    /// recent error.
    pub async fn announce_with_retry(&self, tracker_urls: &[String], request: &TrackerRequest, cancel: &mut watch::Receiver<bool>) -> Result<AnnounceResponse, TrackerError> {
        let tracker_urls = dedup_tracker_urls(tracker_urls);
        if tracker_urls.is_empty() {
            return Err(TrackerError::NoTrackers);
        }

        let mut last_error = TrackerError::NoTrackers;
        for announce in &tracker_urls {
            if let Err(e) = validate_tracker_url(announce) {
                tracing::warn!("skipping tracker: {}", e);
                last_error = e;
                continue;
            }

            let attempts = self.config.retries.max(1);
            let mut backoff = self.config.initial_backoff;
            for attempt in 1..=attempts {
                tracing::debug!("announcing to '{}' (attempt {}/{})", announce, attempt, attempts);

                let result = tokio::select! {
                    biased;
                    _ = cancelled(cancel) => return Err(TrackerError::Cancelled),
                    result = self.announce(announce, request) => result,
                };

                match result {
                    Ok(response) => {
                        tracing::info!("tracker '{}' returned {} peers", announce, response.peers.len());
                        return Ok(response);
                    }
                    Err(e) => {
                        tracing::debug!("announce to '{}' failed: {}", announce, e);
                        last_error = e;
                    }
                }

                if attempt == attempts {
                    break;
                }

                tracing::debug!("waiting {:?} before retrying '{}'", backoff, announce);
                tokio::select! {
                    biased;
                    _ = cancelled(cancel) => return Err(TrackerError::Cancelled),
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = next_backoff(backoff, self.config.max_backoff);
            }

            tracing::warn!("tracker '{}' failed after {} attempts", announce, attempts);
        }

        Err(TrackerError::AllTrackersFailed(Box::new(last_error)))
    }
}
