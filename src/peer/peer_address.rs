use serde::{Serialize, Deserialize};

use std::fmt::Display;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddress {
    pub address: String,
    pub port: u16,
}

impl Display for PeerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

impl PeerAddress {
    pub fn new(address: String, port: u16) -> PeerAddress {
        PeerAddress { address, port }
    }

    /// 4 bytes of IPv4 address followed by a 2 byte port, both big-endian.
    pub fn from_compact(peer_address: [u8; 6]) -> PeerAddress {
        let address = Ipv4Addr::new(peer_address[0], peer_address[1], peer_address[2], peer_address[3]).to_string();
        let port = u16::from_be_bytes([peer_address[4], peer_address[5]]);

        PeerAddress { address, port }
    }
}
