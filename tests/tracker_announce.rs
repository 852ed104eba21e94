use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::Instant;
use url::Url;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use torrent_probe::peer::PeerAddress;
use torrent_probe::tracker::{Tracker, TrackerConfig, TrackerConnection, TrackerError, TrackerHttpResponse, TrackerRequest};
use torrent_probe::utils::Sha1Hash;

#[derive(Default)]
struct ScriptedState {
    responses: VecDeque<Result<TrackerHttpResponse, TrackerError>>,
    requested: Vec<Url>,
}

/// Answers announces from a script and records every requested url.
#[derive(Clone, Default)]
struct ScriptedConnection {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedConnection {
    fn new(responses: Vec<Result<TrackerHttpResponse, TrackerError>>) -> Self {
        let state = ScriptedState { responses: responses.into(), requested: Vec::new() };

        Self { state: Arc::new(Mutex::new(state)) }
    }

    fn requested(&self) -> Vec<Url> {
        self.state.lock().unwrap().requested.clone()
    }
}

#[async_trait]
impl TrackerConnection for ScriptedConnection {
    async fn get(&self, url: &Url) -> Result<TrackerHttpResponse, TrackerError> {
        let mut state = self.state.lock().unwrap();
        state.requested.push(url.clone());

        state.responses
            .pop_front()
            .unwrap_or_else(|| Err(TrackerError::Connection("connection refused".to_string())))
    }
}

fn ok(body: &[u8]) -> Result<TrackerHttpResponse, TrackerError> {
    Ok(TrackerHttpResponse { status: 200, body: body.to_vec() })
}

fn refused() -> Result<TrackerHttpResponse, TrackerError> {
    Err(TrackerError::Connection("connection refused".to_string()))
}

fn one_peer_body() -> Vec<u8> {
    let mut body = b"d8:intervali1800e5:peers6:".to_vec();
    body.extend_from_slice(&[10, 0, 0, 1, 0x1a, 0xe1]);
    body.push(b'e');

    body
}

fn request() -> TrackerRequest {
    TrackerRequest::new(Sha1Hash([0x12; 20]), *b"-TP0100-abcdefghijkl", 6881, 100)
}

fn tracker(connection: &ScriptedConnection, retries: usize) -> Tracker<ScriptedConnection> {
    let config = TrackerConfig { retries, ..TrackerConfig::default() };

    Tracker::with_connection(config, connection.clone())
}

fn urls(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|url| url.to_string()).collect()
}

#[tokio::test]
async fn test_announce_returns_peers() {
    let connection = ScriptedConnection::new(vec![ok(&one_peer_body())]);

    let response = tracker(&connection, 3)
        .announce("http://tracker.example.com/announce", &request())
        .await
        .unwrap();

    assert_eq!(response.peers, vec![PeerAddress::new("10.0.0.1".to_string(), 6881)]);
}

#[tokio::test]
async fn test_announce_request_url() {
    let connection = ScriptedConnection::new(vec![ok(&one_peer_body())]);

    tracker(&connection, 3)
        .announce("http://tracker.example.com/announce?passkey=abc", &request())
        .await
        .unwrap();

    let requested = connection.requested();
    assert_eq!(requested.len(), 1);

    let url = requested[0].as_str();
    assert!(url.starts_with("http://tracker.example.com/announce?passkey=abc&info_hash="));
    assert!(url.contains(&format!("info_hash={}", "%12".repeat(20))));
    assert!(url.contains("peer_id=%2DTP0100%2Dabcdefghijkl"));
    assert!(url.contains("port=6881"));
    assert!(url.contains("left=100"));
    assert!(url.ends_with("compact=1"));
}

#[tokio::test]
async fn test_announce_bad_status() {
    let connection = ScriptedConnection::new(vec![Ok(TrackerHttpResponse { status: 404, body: Vec::new() })]);

    let result = tracker(&connection, 3).announce("http://tracker.example.com/announce", &request()).await;

    assert!(matches!(result, Err(TrackerError::BadStatus(404))));
}

#[tokio::test]
async fn test_announce_no_peers() {
    let connection = ScriptedConnection::new(vec![ok(b"d8:intervali1800ee")]);

    let result = tracker(&connection, 3).announce("http://tracker.example.com/announce", &request()).await;

    assert!(matches!(result, Err(TrackerError::NoPeers)));
}

#[tokio::test]
async fn test_announce_invalid_url_is_never_requested() {
    let connection = ScriptedConnection::default();

    let result = tracker(&connection, 3).announce("http://localhost:6969/announce", &request()).await;

    assert!(matches!(result, Err(TrackerError::InvalidTrackerUrl(_))));
    assert!(connection.requested().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_retry_backoff_then_success() {
    let connection = ScriptedConnection::new(vec![refused(), refused(), ok(&one_peer_body())]);
    let (_cancel_tx, mut cancel) = watch::channel(false);

    let start = Instant::now();
    let response = tracker(&connection, 3)
        .announce_with_retry(&urls(&["http://tracker.example.com/announce"]), &request(), &mut cancel)
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(response.peers.len(), 1);
    assert_eq!(connection.requested().len(), 3);
    // 1s after the first failure, 2s after the second
    assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(4), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_backoff_is_capped() {
    let connection = ScriptedConnection::default();
    let (_cancel_tx, mut cancel) = watch::channel(false);

    let start = Instant::now();
    let result = tracker(&connection, 7)
        .announce_with_retry(&urls(&["http://tracker.example.com/announce"]), &request(), &mut cancel)
        .await;
    let elapsed = start.elapsed();

    assert!(matches!(result, Err(TrackerError::AllTrackersFailed(_))));
    assert_eq!(connection.requested().len(), 7);
    // 1 + 2 + 4 + 8 + 16 + 16, nothing after the last attempt
    assert!(elapsed >= Duration::from_secs(47), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(48), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_invalid_urls_are_skipped() {
    let connection = ScriptedConnection::new(vec![ok(&one_peer_body())]);
    let (_cancel_tx, mut cancel) = watch::channel(false);

    let start = Instant::now();
    let response = tracker(&connection, 3)
        .announce_with_retry(
            &urls(&["udp://tracker.example.com:80", "http://127.0.0.1/announce", "http://tracker.example.com/announce"]),
            &request(),
            &mut cancel,
        )
        .await
        .unwrap();

    assert_eq!(response.peers.len(), 1);
    assert_eq!(connection.requested().len(), 1);
    assert_eq!(connection.requested()[0].host_str(), Some("tracker.example.com"));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_falls_back_to_next_tracker() {
    let connection = ScriptedConnection::new(vec![refused(), refused(), ok(&one_peer_body())]);
    let (_cancel_tx, mut cancel) = watch::channel(false);

    let response = tracker(&connection, 2)
        .announce_with_retry(
            &urls(&["http://first.example.com/announce", "http://second.example.com/announce"]),
            &request(),
            &mut cancel,
        )
        .await
        .unwrap();

    let hosts: Vec<_> = connection
        .requested()
        .iter()
        .map(|url| url.host_str().unwrap_or_default().to_string())
        .collect();

    assert_eq!(response.peers.len(), 1);
    assert_eq!(hosts, vec!["first.example.com", "first.example.com", "second.example.com"]);
}

#[tokio::test(start_paused = true)]
async fn test_all_trackers_failed_wraps_last_error() {
    let connection = ScriptedConnection::new(vec![
        refused(),
        Ok(TrackerHttpResponse { status: 500, body: Vec::new() }),
    ]);
    let (_cancel_tx, mut cancel) = watch::channel(false);

    let result = tracker(&connection, 2)
        .announce_with_retry(&urls(&["http://tracker.example.com/announce"]), &request(), &mut cancel)
        .await;

    match result {
        Err(TrackerError::AllTrackersFailed(last)) => assert!(matches!(*last, TrackerError::BadStatus(500))),
        other => panic!("expected AllTrackersFailed, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_only_invalid_urls() {
    let connection = ScriptedConnection::default();
    let (_cancel_tx, mut cancel) = watch::channel(false);

    let result = tracker(&connection, 3)
        .announce_with_retry(&urls(&["http://localhost/announce"]), &request(), &mut cancel)
        .await;

    match result {
        Err(TrackerError::AllTrackersFailed(last)) => assert!(matches!(*last, TrackerError::InvalidTrackerUrl(_))),
        other => panic!("expected AllTrackersFailed, got {other:?}"),
    }
    assert!(connection.requested().is_empty());
}

#[tokio::test]
async fn test_no_trackers() {
    let connection = ScriptedConnection::default();
    let (_cancel_tx, mut cancel) = watch::channel(false);

    let empty = tracker(&connection, 3).announce_with_retry(&[], &request(), &mut cancel).await;
    let blank = tracker(&connection, 3).announce_with_retry(&urls(&["", ""]), &request(), &mut cancel).await;

    assert!(matches!(empty, Err(TrackerError::NoTrackers)));
    assert!(matches!(blank, Err(TrackerError::NoTrackers)));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff() {
    let connection = ScriptedConnection::default();
    let (cancel_tx, mut cancel) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let _ = cancel_tx.send(true);
    });

    let start = Instant::now();
    let result = tracker(&connection, 3)
        .announce_with_retry(&urls(&["http://tracker.example.com/announce"]), &request(), &mut cancel)
        .await;
    let elapsed = start.elapsed();

    assert!(matches!(result, Err(TrackerError::Cancelled)));
    assert_eq!(connection.requested().len(), 2);
    assert!(elapsed >= Duration::from_millis(1500), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn test_already_cancelled() {
    let connection = ScriptedConnection::new(vec![ok(&one_peer_body())]);
    let (_cancel_tx, mut cancel) = watch::channel(true);

    let result = tracker(&connection, 3)
        .announce_with_retry(&urls(&["http://tracker.example.com/announce"]), &request(), &mut cancel)
        .await;

    assert!(matches!(result, Err(TrackerError::Cancelled)));
    assert!(connection.requested().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_cancel_sender_never_cancels() {
    let connection = ScriptedConnection::new(vec![refused(), ok(&one_peer_body())]);
    let (cancel_tx, mut cancel) = watch::channel(false);
    drop(cancel_tx);

    let response = tracker(&connection, 3)
        .announce_with_retry(&urls(&["http://tracker.example.com/announce"]), &request(), &mut cancel)
        .await
        .unwrap();

    assert_eq!(response.peers.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_retries_still_makes_one_attempt() {
    let connection = ScriptedConnection::new(vec![refused(), ok(&one_peer_body())]);
    let (_cancel_tx, mut cancel) = watch::channel(false);

    let result = tracker(&connection, 0)
        .announce_with_retry(
            &urls(&["http://first.example.com/announce", "http://second.example.com/announce"]),
            &request(),
            &mut cancel,
        )
        .await;

    assert_eq!(result.unwrap().peers.len(), 1);
    assert_eq!(connection.requested().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_zero_retries_reports_the_real_error() {
    let connection = ScriptedConnection::new(vec![Ok(TrackerHttpResponse { status: 503, body: Vec::new() })]);
    let (_cancel_tx, mut cancel) = watch::channel(false);

    let result = tracker(&connection, 0)
        .announce_with_retry(&urls(&["http://tracker.example.com/announce"]), &request(), &mut cancel)
        .await;

    match result {
        Err(TrackerError::AllTrackersFailed(last)) => assert!(matches!(*last, TrackerError::BadStatus(503))),
        other => panic!("expected AllTrackersFailed, got {other:?}"),
    }
}
