use clap::{Parser, ValueEnum};

use std::time::Duration;

use crate::peer::HandshakeConfig;
use crate::tracker::TrackerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<TracingLevel> for tracing::Level {
    fn from(level: TracingLevel) -> Self {
        match level {
            TracingLevel::Trace => tracing::Level::TRACE,
            TracingLevel::Debug => tracing::Level::DEBUG,
            TracingLevel::Info => tracing::Level::INFO,
            TracingLevel::Warn => tracing::Level::WARN,
            TracingLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Parse a torrent file, announce it to its trackers and handshake with the returned peers.
#[derive(Debug, Clone, Parser)]
#[command(name = "torrent-probe", version)]
pub struct ClientOptions {
    /// Path to the .torrent file
    pub torrent: String,

    /// Listen port reported to the tracker
    #[arg(short, long, default_value_t = crate::LISTENING_PORT)]
    pub port: u16,

    /// Attempts per tracker before moving on to the next one
    #[arg(long, default_value_t = crate::TRACKER_RETRIES as u32, value_parser = clap::value_parser!(u32).range(1..))]
    pub tracker_retries: u32,

    /// How many of the returned peers to handshake with
    #[arg(long, default_value_t = crate::HANDSHAKE_PEER_LIMIT)]
    pub handshake_peers: usize,

    #[arg(long, default_value_t = crate::HANDSHAKE_TIMEOUT_SECS)]
    pub handshake_timeout_secs: u64,

    /// Handshakes in flight at once
    #[arg(long, default_value_t = crate::HANDSHAKE_CONCURRENCY)]
    pub handshake_concurrency: usize,

    /// Give up on the trackers after this many seconds
    #[arg(long, default_value_t = crate::ANNOUNCE_DEADLINE_SECS)]
    pub deadline_secs: u64,

    /// debug adds tracker attempts, backoff waits and per-peer handshake results
    #[arg(long, value_enum, default_value_t = TracingLevel::Info)]
    pub tracing_level: TracingLevel,

    /// Print the torrent summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl ClientOptions {
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            retries: self.tracker_retries as usize,
            ..TrackerConfig::default()
        }
    }

    pub fn handshake_config(&self) -> HandshakeConfig {
        HandshakeConfig {
            timeout: Duration::from_secs(self.handshake_timeout_secs),
            max_peers: self.handshake_peers,
            concurrency: self.handshake_concurrency,
        }
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::parse_from(["torrent-probe", "file.torrent"]);

        assert_eq!(options.torrent, "file.torrent");
        assert_eq!(options.port, 6881);
        assert_eq!(options.handshake_config(), HandshakeConfig::default());
        assert_eq!(options.tracker_config(), TrackerConfig::default());
        assert_eq!(options.deadline(), Duration::from_secs(90));
        assert_eq!(options.tracing_level, TracingLevel::Info);
        assert!(!options.json);
    }

    #[test]
    fn test_overrides() {
        let options = ClientOptions::parse_from([
            "torrent-probe",
            "-p", "51413",
            "--handshake-peers", "3",
            "--handshake-concurrency", "4",
            "--tracing-level", "debug",
            "file.torrent",
        ]);

        assert_eq!(options.port, 51413);
        assert_eq!(options.handshake_config().max_peers, 3);
        assert_eq!(options.handshake_config().concurrency, 4);
        assert_eq!(tracing::Level::from(options.tracing_level), tracing::Level::DEBUG);
    }

    #[test]
    fn test_zero_tracker_retries_is_an_error() {
        assert!(ClientOptions::try_parse_from(["torrent-probe", "--tracker-retries", "0", "file.torrent"]).is_err());

        let options = ClientOptions::parse_from(["torrent-probe", "--tracker-retries", "1", "file.torrent"]);
        assert_eq!(options.tracker_config().retries, 1);
    }

    #[test]
    fn test_missing_torrent_is_an_error() {
        assert!(ClientOptions::try_parse_from(["torrent-probe"]).is_err());
    }
}
