use serde::{Serialize, Deserialize};

use crate::peer::PeerAddress;
use crate::utils::bencode::BencodedValue;

use super::TrackerError;

const COMPACT_PEER_LEN: usize = 6;

/// Peers returned by one announce, in tracker order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnounceResponse {
    pub peers: Vec<PeerAddress>,
}

impl AnnounceResponse {
    /// Decodes a bencoded announce response and keeps at most `max_peers` peers.
    /// Keys other than `peers` and `failure reason` are ignored.
    pub fn from_bytes(response: &[u8], max_peers: usize) -> Result<AnnounceResponse, TrackerError> {
        let response = BencodedValue::from_bytes(response)?;
        let response = response
            .try_into_dict()
            .ok_or_else(|| TrackerError::InvalidResponse("root is not a dictionary".to_string()))?;

        let mut peers = match response.get(&b"peers"[..]) {
            Some(BencodedValue::ByteString(compact)) => peers_from_compact(compact)?,
            Some(BencodedValue::List(peers)) => peers_from_list(peers),
            Some(_) => return Err(TrackerError::NoPeers),
            None => {
                return match response.get(&b"failure reason"[..]).and_then(BencodedValue::try_into_byte_string) {
                    Some(reason) => Err(TrackerError::TrackerFailure(String::from_utf8_lossy(reason).into_owned())),
                    None => Err(TrackerError::NoPeers),
                };
            }
        };

        peers.truncate(max_peers);

        Ok(AnnounceResponse { peers })
    }
}

fn peers_from_compact(compact: &[u8]) -> Result<Vec<PeerAddress>, TrackerError> {
    if compact.len() % COMPACT_PEER_LEN != 0 {
        return Err(TrackerError::InvalidResponse(format!(
            "compact peers length {} is not a multiple of {}",
            compact.len(),
            COMPACT_PEER_LEN
        )));
    }

    let peers = compact
        .chunks_exact(COMPACT_PEER_LEN)
        .map(|chunk| {
            let mut ip_port_chunk = [0u8; COMPACT_PEER_LEN];
            ip_port_chunk.copy_from_slice(chunk);

            PeerAddress::from_compact(ip_port_chunk)
        })
        .collect();

    Ok(peers)
}

/// Entries without a string `ip` or with a `port` outside u16 are skipped.
/// The ip is passed through as given.
fn peers_from_list(peers: &[BencodedValue]) -> Vec<PeerAddress> {
    peers
        .iter()
        .filter_map(|peer| {
            let ip = peer.get_from_dict(b"ip")?.try_into_byte_string()?;
            let port = peer.get_from_dict(b"port")?.try_into_integer()?;
            let port = u16::try_from(port).ok()?;

            Some(PeerAddress::new(String::from_utf8_lossy(ip).into_owned(), port))
        })
        .collect()
}
