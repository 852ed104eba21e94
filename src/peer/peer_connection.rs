use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use std::time::Duration;

use crate::utils::sha1hash::Sha1Hash;

use super::handshake::{Handshake, HANDSHAKE_LEN};
use super::{PeerAddress, PeerError, RemotePeer};

/// Connects to `peer_address`, sends `handshake` and reads the peer's answer.
///
/// Connecting, sending and receiving share one `timeout`. The stream is
/// dropped when this returns, whatever the outcome.
pub async fn perform_handshake(peer_address: &PeerAddress, handshake: &Handshake, expected_info_hash: &Sha1Hash, timeout: Duration) -> Result<RemotePeer, PeerError> {
    let exchange = async {
        let mut stream = TcpStream::connect((peer_address.address.as_str(), peer_address.port)).await?;

        stream.write_all(&handshake.as_bytes()).await?;

        let mut handshake_bytes = [0u8; HANDSHAKE_LEN];
        stream.read_exact(&mut handshake_bytes).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => PeerError::ShortRead,
            _ => PeerError::Io(e),
        })?;

        Ok::<_, PeerError>(handshake_bytes)
    };

    let handshake_bytes = tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| PeerError::Timeout(timeout))??;

    let peer_handshake = Handshake::from_bytes(&handshake_bytes)?;
    if peer_handshake.info_hash != *expected_info_hash {
        return Err(PeerError::InfoHashMismatch);
    }

    Ok(RemotePeer {
        reserved: peer_handshake.reserved,
        peer_id: peer_handshake.peer_id,
    })
}
