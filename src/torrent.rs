use thiserror::Error;

use crate::utils::bencode::MalformedInput;

pub mod torrent_file;
pub use torrent_file::{TorrentFile, FileEntry, FileLayout};

pub mod torrent_parser;
pub use torrent_parser::TorrentParser;

/// Structural problems that make a torrent file unusable.
/// Informational fields never produce these; they fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTorrent {
    #[error("invalid torrent: {0}")]
    Malformed(#[from] MalformedInput),

    #[error("invalid torrent: root is not a dictionary")]
    RootNotADictionary,

    #[error("invalid torrent: missing info dictionary")]
    MissingInfo,

    #[error("invalid torrent: info is not a dictionary")]
    InfoNotADictionary,

    #[error("invalid torrent: info.files is not a list")]
    FilesNotAList,
}
