use anyhow::{Context, Result};
use tokio::sync::watch;

pub mod bencode;
pub mod sha1hash;

pub use sha1hash::{sha1_hash, Sha1Hash};

pub trait UrlEncodable {
    fn as_url_encoded(&self) -> String;
}

impl UrlEncodable for [u8; 20] {
    fn as_url_encoded(&self) -> String {
        percent_encoding::percent_encode(self, percent_encoding::NON_ALPHANUMERIC).to_string()
    }
}

pub async fn read_file_as_bytes(path: &str) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("couldn't read file '{path}'"))
}

/// Builds a 20 byte peer id: the client prefix followed by random bytes.
pub fn create_client_peer_id() -> [u8; 20] {
    let mut peer_id = [0u8; 20];
    peer_id[..8].copy_from_slice(crate::CLIENT_PEER_ID_PREFIX);

    // a zero suffix still yields a valid peer id
    if let Err(e) = getrandom::getrandom(&mut peer_id[8..]) {
        tracing::warn!("couldn't generate random peer id suffix: {}", e);
    }

    peer_id
}

/// Resolves once `cancel` reads `true`. A dropped sender never cancels.
pub async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let sender_alive = cancel.wait_for(|&cancelled| cancelled).await.map(|_| ());
    if sender_alive.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[tokio::test]
    async fn test_cancelled_resolves_on_true() {
        let (cancel_tx, mut cancel) = watch::channel(false);

        tokio::spawn(async move {
            let _ = cancel_tx.send(true);
        });

        tokio::time::timeout(Duration::from_secs(5), cancelled(&mut cancel)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_ignores_dropped_sender() {
        let (cancel_tx, mut cancel) = watch::channel(false);
        drop(cancel_tx);

        let result = tokio::time::timeout(Duration::from_secs(60), cancelled(&mut cancel)).await;

        assert!(result.is_err());
    }

    #[test]
    fn test_create_client_peer_id_has_prefix() {
        let peer_id = create_client_peer_id();

        assert_eq!(&peer_id[..8], crate::CLIENT_PEER_ID_PREFIX);
    }

    #[test]
    fn test_peer_id_as_url_encoded() {
        let mut peer_id = [b'A'; 20];
        peer_id[0] = 0xff;

        let encoded = peer_id.as_url_encoded();

        assert!(encoded.starts_with("%FF"));
        assert!(encoded.ends_with(&"A".repeat(19)));
    }
}
