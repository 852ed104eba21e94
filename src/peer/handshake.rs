use crate::utils::sha1hash::Sha1Hash;

use super::PeerError;

pub const PROTOCOL: &[u8; 19] = b"BitTorrent protocol";
pub const PROTOCOL_LEN: u8 = 19;
pub const HANDSHAKE_LEN: usize = 68;

/// `<19><"BitTorrent protocol"><reserved: 8><info_hash: 20><peer_id: 20>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub reserved: [u8; 8],
    pub info_hash: Sha1Hash,
    pub peer_id: [u8; 20],
}

impl Handshake {
    pub fn new(info_hash: Sha1Hash, peer_id: [u8; 20]) -> Handshake {
        Handshake {
            reserved: [0; 8],
            info_hash,
            peer_id,
        }
    }

    pub fn with_reserved(mut self, reserved: [u8; 8]) -> Handshake {
        self.reserved = reserved;
        self
    }

    pub fn from_bytes(handshake_bytes: &[u8]) -> Result<Handshake, PeerError> {
        if handshake_bytes.len() < HANDSHAKE_LEN || handshake_bytes[0] != PROTOCOL_LEN {
            return Err(PeerError::HandshakeLengthInvalid);
        }

        if &handshake_bytes[1..20] != PROTOCOL {
            return Err(PeerError::ProtocolMismatch);
        }

        let mut handshake = Handshake::new(Sha1Hash([0; 20]), [0; 20]);
        handshake.reserved.copy_from_slice(&handshake_bytes[20..28]);
        handshake.info_hash.0.copy_from_slice(&handshake_bytes[28..48]);
        handshake.peer_id.copy_from_slice(&handshake_bytes[48..68]);

        Ok(handshake)
    }

    pub fn as_bytes(&self) -> [u8; HANDSHAKE_LEN] {
        let mut bytes = [0u8; HANDSHAKE_LEN];

        bytes[0] = PROTOCOL_LEN;
        bytes[1..20].copy_from_slice(PROTOCOL);
        bytes[20..28].copy_from_slice(&self.reserved);
        bytes[28..48].copy_from_slice(self.info_hash.as_bytes());
        bytes[48..68].copy_from_slice(&self.peer_id);

        bytes
    }
}
