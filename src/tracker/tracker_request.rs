use url::Url;

use crate::torrent::TorrentFile;
use crate::utils::sha1hash::Sha1Hash;
use crate::utils::UrlEncodable;

/// The query sent with every announce. `info_hash` and `peer_id` go out as
/// raw bytes, percent-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerRequest {
    info_hash: Sha1Hash,
    peer_id: [u8; 20],
    port: u16,
    uploaded: u64,
    downloaded: u64,
    left: u64,
    compact: u8,
}

impl TrackerRequest {
    pub fn new(info_hash: Sha1Hash, peer_id: [u8; 20], port: u16, left: u64) -> TrackerRequest {
        TrackerRequest {
            info_hash,
            peer_id,
            port,
            uploaded: 0,
            downloaded: 0,
            left,
            compact: 1,
        }
    }

    /// First announce for a torrent: nothing downloaded yet, everything left.
    pub fn from_torrent(torrent_file: &TorrentFile, peer_id: [u8; 20], port: u16) -> TrackerRequest {
        TrackerRequest::new(torrent_file.get_info_hash(), peer_id, port, torrent_file.get_torrent_length())
    }

    pub fn get_info_hash(&self) -> Sha1Hash {
        self.info_hash
    }

    pub fn get_peer_id(&self) -> [u8; 20] {
        self.peer_id
    }

    fn as_query(&self) -> String {
        format!{
            "info_hash={info_hash}\
            &peer_id={peer_id}\
            &port={port}\
            &uploaded={uploaded}\
            &downloaded={downloaded}\
            &left={left}\
            &compact={compact}",
            info_hash = self.info_hash.as_url_encoded(),
            peer_id = self.peer_id.as_url_encoded(),
            port = self.port,
            uploaded = self.uploaded,
            downloaded = self.downloaded,
            left = self.left,
            compact = self.compact,
        }
    }

    /// Appends the announce parameters, keeping any query the tracker URL
    /// already carries (passkeys and the like).
    pub fn as_url(&self, mut announce: Url) -> Url {
        let query = match announce.query() {
            Some(existing) if !existing.is_empty() => format!("{}&{}", existing, self.as_query()),
            _ => self.as_query(),
        };
        announce.set_query(Some(&query));

        announce
    }
}
