use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::sync::watch;

use std::time::Duration;

use torrent_probe::client_options::ClientOptions;
use torrent_probe::peer::{handshake_peers_until, Handshake};
use torrent_probe::tracker::{Tracker, TrackerRequest};
use torrent_probe::utils::{cancelled, create_client_peer_id};
use torrent_probe::TorrentFile;

const PRINTED_PEERS: usize = 10;
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Serialize)]
struct TorrentSummary<'a> {
    name: &'a str,
    info_hash: String,
    pieces_count: usize,
    piece_length: u64,
    files_count: usize,
    total_length: u64,
    trackers: Vec<String>,
}

impl<'a> TorrentSummary<'a> {
    fn new(torrent_file: &'a TorrentFile) -> Self {
        Self {
            name: torrent_file.get_name(),
            info_hash: torrent_file.get_info_hash().to_hex(),
            pieces_count: torrent_file.get_pieces_count(),
            piece_length: torrent_file.get_piece_length(),
            files_count: torrent_file.get_files_count(),
            total_length: torrent_file.get_torrent_length(),
            trackers: torrent_file.get_tracker_urls(),
        }
    }

    fn print(&self, as_json: bool) -> Result<()> {
        if as_json {
            println!("{}", serde_json::to_string_pretty(self).context("couldn't serialize torrent summary")?);
            return Ok(());
        }

        println!("Name: {}", self.name);
        println!("Info hash: {}", self.info_hash);
        println!("Piece count: {}", self.pieces_count);
        println!("Piece length: {}", self.piece_length);
        println!("File count: {}", self.files_count);
        println!("Total size: {}", self.total_length);

        Ok(())
    }
}

/// Flips the returned receiver to `true` on the first Ctrl-C. A second Ctrl-C
/// exits right away.
fn interrupt_signal() -> Result<watch::Receiver<bool>> {
    let (interrupt_tx, interrupt_rx) = watch::channel(false);

    ctrlc::set_handler(move || {
        if interrupt_tx.send_replace(true) {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
        tracing::info!("Ctrl-C received, cancelling (press again to exit)");
    })
    .context("couldn't set Ctrl-C handler")?;

    Ok(interrupt_rx)
}

/// Turns `true` on interrupt or once `deadline` has passed.
fn announce_cancel_signal(mut interrupt: watch::Receiver<bool>, deadline: Duration) -> watch::Receiver<bool> {
    let (cancel_tx, cancel_rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::select! {
            _ = cancelled(&mut interrupt) => {}
            _ = tokio::time::sleep(deadline) => {
                tracing::info!("announce deadline of {:?} passed, cancelling", deadline);
            }
        }
        let _ = cancel_tx.send(true);
    });

    cancel_rx
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = ClientOptions::parse();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(options.tracing_level))
        .with_writer(std::io::stderr)
        .init();

    let torrent_file = TorrentFile::new(&options.torrent).await?;
    TorrentSummary::new(&torrent_file).print(options.json)?;

    let tracker_urls = torrent_file.get_tracker_urls();
    if tracker_urls.is_empty() {
        bail!("no announce url in torrent '{}'", options.torrent);
    }

    let mut interrupt = interrupt_signal()?;
    let mut cancel = announce_cancel_signal(interrupt.clone(), options.deadline());

    let peer_id = create_client_peer_id();
    let tracker = Tracker::new(options.tracker_config()).context("couldn't create tracker client")?;
    let request = TrackerRequest::from_torrent(&torrent_file, peer_id, options.port);

    tracing::info!("announcing to {} trackers", tracker_urls.len());
    let response = tracker
        .announce_with_retry(&tracker_urls, &request, &mut cancel)
        .await
        .context("tracker")?;

    println!("Peers: {}", response.peers.len());
    for peer_address in response.peers.iter().take(PRINTED_PEERS) {
        println!("  {}", peer_address);
    }
    if response.peers.len() > PRINTED_PEERS {
        println!("  ... and {} more", response.peers.len() - PRINTED_PEERS);
    }

    let handshake = Handshake::new(torrent_file.get_info_hash(), peer_id);
    let handshake_config = options.handshake_config();

    tracing::info!("handshaking with up to {} peers", handshake_config.max_peers);
    let Some(results) = handshake_peers_until(&response.peers, &handshake, &handshake_config, &mut interrupt).await else {
        bail!("handshakes interrupted");
    };

    let successful = results.iter().filter(|(_, result)| result.is_ok()).count();
    println!("Handshook: {}/{}", successful, results.len());

    Ok(())
}
