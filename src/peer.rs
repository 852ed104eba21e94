use futures::StreamExt;
use thiserror::Error;
use tokio::sync::watch;

use std::time::Duration;

use crate::utils::cancelled;

pub mod peer_address;
pub use peer_address::PeerAddress;

pub mod handshake;
pub use handshake::Handshake;

pub mod peer_connection;
pub use peer_connection::perform_handshake;

/// Failures of a single handshake. Each one ends the attempt with that peer only.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Fewer than 68 bytes, or a length marker other than 19.
    #[error("handshake length invalid")]
    HandshakeLengthInvalid,

    #[error("handshake protocol string mismatch")]
    ProtocolMismatch,

    /// The peer answered for a different torrent.
    #[error("handshake info hash mismatch")]
    InfoHashMismatch,

    /// The connection closed before a full handshake arrived.
    #[error("connection closed before the full handshake was received")]
    ShortRead,

    #[error("handshake timed out after {0:?}")]
    Timeout(Duration),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a peer told us about itself in its handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePeer {
    pub reserved: [u8; 8],
    pub peer_id: [u8; 20],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeConfig {
    /// Budget for connect + send + receive of one handshake.
    pub timeout: Duration,
    /// How many of the tracker's peers get a handshake.
    pub max_peers: usize,
    /// Handshakes in flight at once; 1 runs them one after another.
    pub concurrency: usize,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::HANDSHAKE_TIMEOUT_SECS),
            max_peers: crate::HANDSHAKE_PEER_LIMIT,
            concurrency: crate::HANDSHAKE_CONCURRENCY,
        }
    }
}

/// Handshakes with the first `config.max_peers` peers and returns every
/// outcome in peer order. Every peer gets its own timeout.
pub async fn handshake_peers(peers: &[PeerAddress], handshake: &Handshake, config: &HandshakeConfig) -> Vec<(PeerAddress, Result<RemotePeer, PeerError>)> {
    futures::stream::iter(peers.iter().take(config.max_peers))
        .map(|peer_address| async move {
            let result = perform_handshake(peer_address, handshake, &handshake.info_hash, config.timeout).await;

            match &result {
                Ok(_) => tracing::debug!("handshake with peer '{}' successful", peer_address),
                Err(e) => tracing::debug!("handshake with peer '{}' failed: {}", peer_address, e),
            }

            (peer_address.clone(), result)
        })
        .buffered(config.concurrency.max(1))
        .collect()
        .await
}

/// [`handshake_peers`] that gives up with `None` as soon as `cancel` turns
/// `true`. Handshakes still in flight are dropped with their connections.
pub async fn handshake_peers_until(peers: &[PeerAddress], handshake: &Handshake, config: &HandshakeConfig, cancel: &mut watch::Receiver<bool>) -> Option<Vec<(PeerAddress, Result<RemotePeer, PeerError>)>> {
    tokio::select! {
        biased;
        _ = cancelled(cancel) => {
            tracing::info!("handshakes cancelled");
            None
        }
        results = handshake_peers(peers, handshake, config) => Some(results),
    }
}
