pub mod client_options;
pub mod torrent;
pub mod tracker;
pub mod peer;
pub mod utils;

pub use torrent::{TorrentFile, InvalidTorrent};
pub use tracker::{Tracker, TrackerConfig, TrackerError, TrackerRequest, AnnounceResponse};
pub use peer::{Handshake, HandshakeConfig, PeerAddress, PeerError, RemotePeer};
pub use utils::bencode::{BencodedValue, MalformedInput};
pub use utils::sha1hash::Sha1Hash;

pub const LISTENING_PORT: u16 = 6881;
pub const CLIENT_PEER_ID_PREFIX: &[u8; 8] = b"-TP0100-";

pub const MAX_BENCODE_DEPTH: usize = 64;

pub const TRACKER_MAX_PEERS: usize = 200;
pub const TRACKER_RETRIES: usize = 3;
pub const TRACKER_INITIAL_BACKOFF_SECS: u64 = 1;
pub const TRACKER_MAX_BACKOFF_SECS: u64 = 16;
pub const TRACKER_HTTP_TIMEOUT_SECS: u64 = 15;
pub const ANNOUNCE_DEADLINE_SECS: u64 = 90;

pub const HANDSHAKE_TIMEOUT_SECS: u64 = 5;
pub const HANDSHAKE_PEER_LIMIT: usize = 10;
pub const HANDSHAKE_CONCURRENCY: usize = 1;
