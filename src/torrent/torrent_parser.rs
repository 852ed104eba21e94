use std::collections::BTreeMap;

use crate::utils::bencode::BencodedValue;
use crate::utils::sha1hash::sha1_hash;

use super::torrent_file::{FileEntry, FileLayout, TorrentFile};
use super::InvalidTorrent;

type BencodedDict = BTreeMap<Vec<u8>, BencodedValue>;

pub struct TorrentParser {}

impl TorrentParser {
    pub fn parse_torrent_file(torrent_file: &[u8]) -> Result<TorrentFile, InvalidTorrent> {
        let (root, info_span) = BencodedValue::from_bytes_capturing(torrent_file, b"info")?;

        let root = require_dict(&root, InvalidTorrent::RootNotADictionary)?;
        root.get(&b"info"[..]).ok_or(InvalidTorrent::MissingInfo)?;
        let info_span = info_span.ok_or(InvalidTorrent::MissingInfo)?;

        // fields and hash both come from the captured bytes, so a duplicated
        // `info` key can't make them disagree
        let info_bytes = &torrent_file[info_span];
        let info = BencodedValue::from_bytes(info_bytes)?;
        let info = require_dict(&info, InvalidTorrent::InfoNotADictionary)?;

        // hashed over the original bytes; re-encoding may reorder keys
        let info_hash = sha1_hash(info_bytes);

        let layout = match info.get(&b"files"[..]) {
            Some(files) => FileLayout::Multi { files: parse_files(files)? },
            None => FileLayout::Single { length: length_or_default(info.get(&b"length"[..])) },
        };

        let torrent = TorrentFile {
            announce: string_or_none(root.get(&b"announce"[..])),
            announce_list: parse_announce_list(root.get(&b"announce-list"[..])),
            name: byte_string_or_default(info.get(&b"name"[..])),
            piece_length: length_or_default(info.get(&b"piece length"[..])),
            pieces: info.get(&b"pieces"[..])
                .and_then(BencodedValue::try_into_byte_string)
                .cloned()
                .unwrap_or_default(),
            layout,
            info_hash,
        };

        tracing::debug!("parsed torrent '{}' with info hash {}", torrent.name, torrent.info_hash);

        Ok(torrent)
    }
}

fn parse_files(files: &BencodedValue) -> Result<Vec<FileEntry>, InvalidTorrent> {
    let files = files.try_into_list().ok_or(InvalidTorrent::FilesNotAList)?;

    let files = files
        .iter()
        .filter_map(BencodedValue::try_into_dict)
        .map(|file| FileEntry {
            path: list_or_empty(file.get(&b"path"[..]))
                .iter()
                .filter_map(BencodedValue::try_into_byte_string)
                .map(|component| String::from_utf8_lossy(component).into_owned())
                .collect(),
            length: length_or_default(file.get(&b"length"[..])),
        })
        .collect();

    Ok(files)
}

fn parse_announce_list(announce_list: Option<&BencodedValue>) -> Vec<Vec<String>> {
    list_or_empty(announce_list)
        .iter()
        .filter_map(BencodedValue::try_into_list)
        .map(|tier| {
            tier.iter()
                .filter_map(|url| string_or_none(Some(url)))
                .collect::<Vec<String>>()
        })
        .filter(|tier| !tier.is_empty())
        .collect()
}

// Structural fields fail the parse, informational ones fall back to a default.

pub fn require_dict(value: &BencodedValue, error: InvalidTorrent) -> Result<&BencodedDict, InvalidTorrent> {
    value.try_into_dict().ok_or(error)
}

/// Lossy UTF-8 text, or `None` when the value is missing or not a byte string.
pub fn string_or_none(value: Option<&BencodedValue>) -> Option<String> {
    let bytes = value?.try_into_byte_string()?;

    Some(String::from_utf8_lossy(bytes).into_owned())
}

pub fn byte_string_or_default(value: Option<&BencodedValue>) -> String {
    value
        .and_then(BencodedValue::try_into_byte_string)
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}

pub fn integer_or_default(value: Option<&BencodedValue>) -> i64 {
    value
        .and_then(BencodedValue::try_into_integer)
        .unwrap_or_default()
}

/// Sizes can't be negative; a negative value is treated like a mistyped one.
pub fn length_or_default(value: Option<&BencodedValue>) -> u64 {
    u64::try_from(integer_or_default(value)).unwrap_or_default()
}

pub fn list_or_empty(value: Option<&BencodedValue>) -> &[BencodedValue] {
    value
        .and_then(BencodedValue::try_into_list)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
