use anyhow::{Context, Result};
use serde::{Serialize, Deserialize};

use crate::utils::read_file_as_bytes;
use crate::utils::sha1hash::Sha1Hash;

use super::{InvalidTorrent, TorrentParser};

pub const PIECE_HASH_LEN: usize = 20;

/// One entry of `info.files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: Vec<String>,
    pub length: u64,
}

/// Single-file torrents carry `info.length`, multi-file torrents carry `info.files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileLayout {
    Single { length: u64 },
    Multi { files: Vec<FileEntry> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentFile {
    pub(super) announce: Option<String>,
    pub(super) announce_list: Vec<Vec<String>>,
    pub(super) name: String,
    pub(super) piece_length: u64,
    pub(super) pieces: Vec<u8>,
    pub(super) layout: FileLayout,
    pub(super) info_hash: Sha1Hash,
}

// TorrentFile getters
impl TorrentFile {
    pub fn get_announce(&self) -> Option<&str> {
        self.announce.as_deref()
    }

    pub fn get_announce_list(&self) -> &[Vec<String>] {
        &self.announce_list
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_piece_length(&self) -> u64 {
        self.piece_length
    }

    pub fn get_pieces(&self) -> &[u8] {
        &self.pieces
    }

    pub fn get_layout(&self) -> &FileLayout {
        &self.layout
    }

    pub fn get_info_hash(&self) -> Sha1Hash {
        self.info_hash
    }

    /// A `pieces` string that isn't a whole number of digests reports zero pieces.
    pub fn get_pieces_count(&self) -> usize {
        if self.pieces.len() % PIECE_HASH_LEN != 0 {
            return 0;
        }

        self.pieces.len() / PIECE_HASH_LEN
    }

    pub fn get_piece_hash(&self, piece_index: usize) -> Option<Sha1Hash> {
        if piece_index >= self.get_pieces_count() {
            return None;
        }

        let start = piece_index * PIECE_HASH_LEN;
        let hash: [u8; PIECE_HASH_LEN] = self.pieces[start..start + PIECE_HASH_LEN].try_into().ok()?;

        Some(Sha1Hash(hash))
    }

    /// Saturates at `u64::MAX` instead of overflowing on absurd file lengths.
    pub fn get_torrent_length(&self) -> u64 {
        match &self.layout {
            FileLayout::Single { length } => *length,
            FileLayout::Multi { files } => files
                .iter()
                .fold(0u64, |total, file| total.saturating_add(file.length)),
        }
    }

    pub fn get_files_count(&self) -> usize {
        match &self.layout {
            FileLayout::Single { .. } => 1,
            FileLayout::Multi { files } => files.len(),
        }
    }

    /// Trackers in announce order: the primary `announce` first, then every
    /// tier of `announce-list`, without duplicates.
    pub fn get_tracker_urls(&self) -> Vec<String> {
        let candidates = self.announce
            .iter()
            .chain(self.announce_list.iter().flatten());

        let mut tracker_urls: Vec<String> = Vec::new();
        for url in candidates {
            if url.is_empty() || tracker_urls.contains(url) {
                continue;
            }
            tracker_urls.push(url.clone());
        }

        tracker_urls
    }
}

// TorrentFile methods
impl TorrentFile {
    pub async fn new(torrent_file_name: &str) -> Result<TorrentFile> {
        let torrent_file = read_file_as_bytes(torrent_file_name).await.context("couldn't read file as bytes")?;
        let torrent_file = TorrentFile::from_bytes(&torrent_file)
            .with_context(|| format!("couldn't parse torrent file '{torrent_file_name}'"))?;

        Ok(torrent_file)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<TorrentFile, InvalidTorrent> {
        TorrentParser::parse_torrent_file(bytes)
    }
}
