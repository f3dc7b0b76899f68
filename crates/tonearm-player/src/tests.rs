//! Session-level scenario tests over scripted collaborators.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tonearm_cache::CacheStore;
use tonearm_core::{
    AudioSource, Autoplay, Error, LoopMode, PlayerEvent, PlayerState, Requester, Result,
    SourceKind, Track,
};

use crate::connection::{Connection, ConnectionHandle, ConnectionStatus, DisconnectReason};
use crate::player::{Player, PlayerOptions};
use crate::resolver::Resolver;
use crate::transport::{
    PlaybackResource, Transport, TransportEvent, TransportHandle, TransportStatus,
};

// ----- scripted collaborators -----

#[derive(Default)]
struct ScriptedResolver {
    tracks: HashMap<String, Vec<Track>>,
    failing: HashSet<String>,
    stream_failing: HashSet<String>,
    related: HashMap<String, Vec<String>>,
}

impl ScriptedResolver {
    fn new() -> Self {
        Self::default()
    }

    fn with_track(mut self, identifier: &str, track: Track) -> Self {
        self.tracks.insert(identifier.to_string(), vec![track]);
        self
    }

    fn failing(mut self, identifier: &str) -> Self {
        self.failing.insert(identifier.to_string());
        self
    }

    fn stream_failing(mut self, track_id: &str) -> Self {
        self.stream_failing.insert(track_id.to_string());
        self
    }

    fn with_related(mut self, track_id: &str, ids: &[&str]) -> Self {
        self.related
            .insert(track_id.to_string(), ids.iter().map(|s| (*s).to_string()).collect());
        self
    }
}

#[async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, identifier: &str, kind: SourceKind) -> Result<Vec<Track>> {
        if self.failing.contains(identifier) {
            return Err(Error::resolution(identifier, "scripted failure"));
        }
        if let Some(tracks) = self.tracks.get(identifier) {
            return Ok(tracks.clone());
        }
        Ok(vec![Track::new(
            identifier,
            format!("Track {identifier}"),
            kind,
        )])
    }

    async fn open_stream(&self, track: &Track) -> Result<AudioSource> {
        if self.stream_failing.contains(&track.id) {
            return Err(Error::stream(&track.id, "scripted stream failure"));
        }
        Ok(AudioSource::encoded_with_mime(vec![0u8; 16], "audio/mpeg"))
    }

    async fn related(&self, track: &Track, _kind: SourceKind, limit: usize) -> Result<Vec<String>> {
        Ok(self
            .related
            .get(&track.id)
            .map(|ids| ids.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct TransportLog {
    played: Vec<String>,
    volumes: Vec<u8>,
    stops: Vec<bool>,
}

struct MockTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl Transport for MockTransport {
    fn play(&mut self, resource: PlaybackResource) {
        self.log.lock().played.push(resource.track_id);
    }

    fn pause(&mut self) -> bool {
        true
    }

    fn unpause(&mut self) -> bool {
        true
    }

    fn stop(&mut self, force: bool) {
        self.log.lock().stops.push(force);
    }

    fn set_volume(&mut self, percent: u8) {
        self.log.lock().volumes.push(percent);
    }

    fn position(&self) -> Duration {
        Duration::ZERO
    }
}

#[derive(Default)]
struct ConnectionLog {
    attempts: u32,
    rejoins: Vec<tokio::time::Instant>,
    destroyed: bool,
}

struct MockConnection {
    log: Arc<Mutex<ConnectionLog>>,
    events: mpsc::UnboundedSender<ConnectionStatus>,
}

impl Connection for MockConnection {
    fn rejoin_attempts(&self) -> u32 {
        self.log.lock().attempts
    }

    fn rejoin(&mut self) {
        let mut log = self.log.lock();
        log.attempts += 1;
        log.rejoins.push(tokio::time::Instant::now());
    }

    fn destroy(&mut self) {
        self.log.lock().destroyed = true;
        let _ = self.events.send(ConnectionStatus::Destroyed);
    }

    fn is_destroyed(&self) -> bool {
        self.log.lock().destroyed
    }
}

struct Harness {
    transport_log: Arc<Mutex<TransportLog>>,
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    connection_log: Arc<Mutex<ConnectionLog>>,
    connection_tx: mpsc::UnboundedSender<ConnectionStatus>,
    events: broadcast::Receiver<PlayerEvent>,
}

impl Harness {
    fn terminal(&self) {
        self.transport_tx
            .send(TransportEvent::StateChanged {
                old: TransportStatus::Playing,
                new: TransportStatus::Idle,
            })
            .unwrap();
    }

    fn played(&self) -> Vec<String> {
        self.transport_log.lock().played.clone()
    }

    fn drain(&mut self) -> Vec<PlayerEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

fn make_player(resolver: ScriptedResolver, options: PlayerOptions) -> (Player, Harness) {
    let transport_log = Arc::new(Mutex::new(TransportLog::default()));
    let (transport_tx, transport_rx) = mpsc::unbounded_channel();
    let connection_log = Arc::new(Mutex::new(ConnectionLog::default()));
    let (connection_tx, connection_rx) = mpsc::unbounded_channel();

    let player = Player::new(
        options,
        Arc::new(resolver),
        TransportHandle {
            control: Box::new(MockTransport {
                log: transport_log.clone(),
            }),
            events: transport_rx,
        },
        ConnectionHandle {
            control: Box::new(MockConnection {
                log: connection_log.clone(),
                events: connection_tx.clone(),
            }),
            events: connection_rx,
        },
    );
    let events = player.subscribe();
    (
        player,
        Harness {
            transport_log,
            transport_tx,
            connection_log,
            connection_tx,
            events,
        },
    )
}

/// Let the spawned monitor/supervisor tasks drain their channels.
async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

fn ids(identifiers: &[&str]) -> Vec<String> {
    identifiers.iter().map(|s| (*s).to_string()).collect()
}

// ----- enqueue + playback -----

#[tokio::test]
async fn test_enqueue_into_empty_queue_starts_playback() {
    let (player, mut h) = make_player(ScriptedResolver::new(), PlayerOptions::default());

    player
        .enqueue(&ids(&["a"]), SourceKind::Url, Requester::new("alex"))
        .await
        .unwrap();
    settle().await;

    assert_eq!(h.played(), vec!["a"]);
    assert_eq!(player.state(), PlayerState::Playing);

    let events = h.drain();
    assert_eq!(events[0], PlayerEvent::QueueStart);
    assert!(matches!(&events[1], PlayerEvent::TrackStart(t) if t.id == "a"));
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn test_enqueue_batch_skips_failing_identifier() {
    let resolver = ScriptedResolver::new().failing("b");
    let (player, h) = make_player(resolver, PlayerOptions::default());

    player
        .enqueue(&ids(&["a", "b", "c"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;

    let tracks = player.tracks();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].id, "a");
    assert_eq!(tracks[1].id, "c");
    assert_eq!(tracks[1].position, 1);
    assert_eq!(h.played(), vec!["a"]);
}

#[tokio::test]
async fn test_stream_failure_surfaces_audio_error_without_advancing() {
    let resolver = ScriptedResolver::new().stream_failing("a");
    let (player, mut h) = make_player(resolver, PlayerOptions::default());

    player
        .enqueue(&ids(&["a"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;

    assert!(h.played().is_empty());
    assert_eq!(player.queue_length(), 1);
    let events = h.drain();
    assert_eq!(events[0], PlayerEvent::QueueStart);
    assert!(matches!(&events[1], PlayerEvent::AudioError { track: Some(t), .. } if t.id == "a"));
}

#[tokio::test]
async fn test_transport_error_surfaces_audio_error() {
    let (player, mut h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;
    h.drain();

    h.transport_tx
        .send(TransportEvent::Error("decoder blew up".to_string()))
        .unwrap();
    settle().await;

    let events = h.drain();
    assert!(
        matches!(&events[0], PlayerEvent::AudioError { track: Some(t), message } if t.id == "a" && message == "decoder blew up")
    );
    // The queue is not advanced on transport errors.
    assert_eq!(h.played(), vec!["a"]);
}

// ----- transition policy in the running session -----

#[tokio::test]
async fn test_loop_track_replays_same_track() {
    let (player, mut h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    player.set_loop_mode(LoopMode::Track);
    settle().await;
    h.drain();

    h.terminal();
    settle().await;

    assert_eq!(h.played(), vec!["a", "a"]);
    assert_eq!(player.current_position(), 0);
    let events = h.drain();
    assert!(matches!(&events[0], PlayerEvent::TrackEnd(t) if t.id == "a"));
    assert!(matches!(&events[1], PlayerEvent::TrackStart(t) if t.id == "a"));
}

#[tokio::test]
async fn test_seek_flag_suppresses_terminal_event() {
    let (player, mut h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    player.set_loop_mode(LoopMode::Track);
    settle().await;
    h.drain();

    player.set_seeking(true);
    h.terminal();
    settle().await;

    // No replay, no emitted track-end; the flag is consumed.
    assert_eq!(h.played(), vec!["a"]);
    assert!(h.drain().is_empty());
    assert!(!player.is_seeking());

    // The next terminal event transitions normally again.
    h.terminal();
    settle().await;
    assert_eq!(h.played(), vec!["a", "a"]);
}

#[tokio::test]
async fn test_filter_flag_suppresses_one_terminal_event() {
    let (player, mut h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;
    h.drain();

    player.set_filtering(true);
    h.terminal();
    settle().await;

    assert_eq!(h.played(), vec!["a"]);
    assert!(h.drain().is_empty());
    assert_eq!(player.state(), PlayerState::Playing);
}

#[tokio::test]
async fn test_loop_queue_cycles_and_wraps() {
    let (player, h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a", "b", "c"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    player.set_loop_mode(LoopMode::Queue);
    settle().await;

    for _ in 0..3 {
        h.terminal();
        settle().await;
    }

    // One full lap: every track exactly once, then the wrap back to the head.
    assert_eq!(h.played(), vec!["a", "b", "c", "a"]);
    assert_eq!(player.queue_length(), 3);
    assert_eq!(player.current_position(), 0);
}

#[tokio::test]
async fn test_two_track_queue_plays_out_and_destroys() {
    let (player, mut h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a", "b"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;
    h.drain();

    h.terminal();
    settle().await;

    let events = h.drain();
    assert!(matches!(&events[0], PlayerEvent::TrackEnd(t) if t.id == "a"));
    assert!(matches!(&events[1], PlayerEvent::TrackStart(t) if t.id == "b"));
    assert!(!events.contains(&PlayerEvent::QueueEnd));

    h.terminal();
    settle().await;

    let events = h.drain();
    assert!(matches!(&events[0], PlayerEvent::TrackEnd(t) if t.id == "b"));
    assert!(events.contains(&PlayerEvent::QueueEnd));
    assert_eq!(player.state(), PlayerState::Destroyed);
    assert_eq!(player.queue_length(), 0);
    // Destroy stops the transport with force.
    assert!(h.transport_log.lock().stops.contains(&true));
}

#[tokio::test]
async fn test_autoplay_enriches_queue_on_last_track() {
    let resolver = ScriptedResolver::new()
        .with_track("seed", Track::new("seed", "Seed", SourceKind::YouTube))
        .with_related("seed", &["r1", "r2"]);
    let (player, h) = make_player(resolver, PlayerOptions::default());

    player
        .enqueue(&ids(&["seed"]), SourceKind::YouTube, Requester::default())
        .await
        .unwrap();
    player.set_autoplay(Autoplay::Relative);
    settle().await;

    h.terminal();
    settle().await;

    assert_eq!(player.queue_length(), 3);
    assert_eq!(h.played(), vec!["seed", "r1"]);
    let tracks = player.tracks();
    assert_eq!(tracks[1].id, "r1");
    assert_eq!(tracks[2].id, "r2");
}

#[tokio::test]
async fn test_autoplay_without_candidates_ends_queue() {
    let (player, mut h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    player.set_autoplay(Autoplay::Relative);
    settle().await;
    h.drain();

    h.terminal();
    settle().await;

    assert!(h.drain().contains(&PlayerEvent::QueueEnd));
    assert_eq!(player.state(), PlayerState::Destroyed);
}

#[tokio::test]
async fn test_paused_stop_is_not_a_terminal_event() {
    let (player, mut h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;

    assert!(player.pause());
    assert!(player.is_paused());
    assert_eq!(player.state(), PlayerState::Paused);
    h.drain();

    h.terminal();
    settle().await;

    assert_eq!(h.played(), vec!["a"]);
    assert!(h.drain().is_empty());

    assert!(player.resume());
    assert_eq!(player.state(), PlayerState::Playing);
    let events = h.drain();
    assert!(matches!(&events[0], PlayerEvent::TrackResume(t) if t.id == "a"));
}

#[tokio::test]
async fn test_interruption_emits_track_end_without_advancing() {
    let (player, mut h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a", "b"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;
    h.drain();

    h.transport_tx
        .send(TransportEvent::StateChanged {
            old: TransportStatus::Playing,
            new: TransportStatus::Buffering,
        })
        .unwrap();
    settle().await;

    let events = h.drain();
    assert!(matches!(&events[0], PlayerEvent::TrackEnd(t) if t.id == "a"));
    // No advance happened.
    assert_eq!(h.played(), vec!["a"]);
    assert_eq!(player.current_position(), 0);
}

// ----- queue operations through the session -----

#[tokio::test]
async fn test_skip_to_past_queue_end_is_noop() {
    let (player, h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a", "b"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;

    player.skip_to(5).await.unwrap();
    settle().await;

    assert_eq!(player.queue_length(), 2);
    assert_eq!(player.current_position(), 0);
    assert_eq!(h.played(), vec!["a"]);
    assert!(h.transport_log.lock().stops.is_empty());
}

#[tokio::test]
async fn test_skip_to_discards_and_plays_target() {
    let (player, h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a", "b", "c"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;

    player.skip_to(3).await.unwrap();
    settle().await;

    assert_eq!(player.queue_length(), 1);
    assert_eq!(player.current_track().unwrap().id, "c");
    assert_eq!(h.played(), vec!["a", "c"]);

    // The stop-induced terminal event is absorbed by the seek flag.
    h.terminal();
    settle().await;
    assert_eq!(h.played(), vec!["a", "c"]);
    assert!(!player.is_seeking());
}

#[tokio::test]
async fn test_skip_to_rotates_under_loop_queue() {
    let (player, _h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a", "b", "c"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    player.set_loop_mode(LoopMode::Queue);
    settle().await;

    player.skip_to(3).await.unwrap();
    settle().await;

    assert_eq!(player.queue_length(), 3);
    let queued: Vec<String> = player.tracks().iter().map(|t| t.id.clone()).collect();
    assert_eq!(queued, vec!["c", "a", "b"]);
}

#[tokio::test]
async fn test_play_previous_steps_back_only_with_history() {
    let (player, h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a", "b"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;

    // No history yet: silently ignored.
    player.play_previous().await.unwrap();
    settle().await;
    assert_eq!(h.played(), vec!["a"]);

    h.terminal();
    settle().await;
    assert_eq!(h.played(), vec!["a", "b"]);

    player.play_previous().await.unwrap();
    settle().await;
    assert_eq!(h.played(), vec!["a", "b", "a"]);
    assert_eq!(player.current_position(), 0);
}

#[tokio::test]
async fn test_shuffle_round_trip_through_session() {
    let (player, _h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    let identifiers: Vec<String> = (0..12).map(|i| i.to_string()).collect();
    player
        .enqueue(&identifiers, SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;

    let original: Vec<String> = player.tracks().iter().map(|t| t.id.clone()).collect();
    player.shuffle();
    assert!(player.is_shuffled());
    player.shuffle();
    player.unshuffle();
    assert!(!player.is_shuffled());

    let restored: Vec<String> = player.tracks().iter().map(|t| t.id.clone()).collect();
    assert_eq!(original, restored);
}

#[tokio::test]
async fn test_volume_forwards_to_transport() {
    let (player, h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player.set_volume(40);
    assert_eq!(player.volume(), 40);
    assert_eq!(h.transport_log.lock().volumes, vec![40]);
}

#[tokio::test]
async fn test_seek_and_filter_swap_require_plugin() {
    let (player, _h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;

    assert!(matches!(
        player.seek(Duration::from_secs(30)).await,
        Err(Error::Filter(_))
    ));
    assert!(matches!(
        player.apply_filters(vec!["bass=g=5".to_string()]).await,
        Err(Error::Filter(_))
    ));
    // Setting the chain without applying is always allowed.
    player.set_filters(vec!["bass=g=5".to_string()]);
    assert_eq!(player.filters(), vec!["bass=g=5"]);
}

#[tokio::test]
async fn test_mix_marker_extends_queue() {
    let seed_url = "https://www.youtube.com/watch?v=abcdefghijk&list=RDabc&index=1";
    let resolver = ScriptedResolver::new()
        .with_track(seed_url, Track::new("abcdefghijk", "Mix seed", SourceKind::YouTube))
        .with_related("abcdefghijk", &["m1", "m2"]);
    let (player, _h) = make_player(resolver, PlayerOptions::default());

    player
        .enqueue(&ids(&[seed_url]), SourceKind::YouTube, Requester::default())
        .await
        .unwrap();
    settle().await;

    // The mix tail was detected and playing it pulled in continuations.
    assert_eq!(player.queue_length(), 3);
    let queued: Vec<String> = player.tracks().iter().map(|t| t.id.clone()).collect();
    assert_eq!(queued, vec!["abcdefghijk", "m1", "m2"]);
}

#[tokio::test]
async fn test_cache_write_through_and_eviction() {
    let cache = Arc::new(CacheStore::memory(8));
    let options = PlayerOptions {
        cache: Some(cache.clone()),
        ..PlayerOptions::default()
    };
    let (player, h) = make_player(ScriptedResolver::new(), options);

    player
        .enqueue(&ids(&["a", "b"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;
    assert!(cache.has("a"));

    // Advancing evicts the consumed track's artifact.
    h.terminal();
    settle().await;
    assert!(!cache.has("a"));
    assert!(cache.has("b"));

    // Destroy clears the plugin entirely.
    player.destroy();
    assert!(!cache.has("b"));
    assert_eq!(player.state(), PlayerState::Destroyed);
}

#[tokio::test]
async fn test_enqueue_after_destroy_is_rejected() {
    let (player, _h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player.destroy();
    let result = player
        .enqueue(&ids(&["a"]), SourceKind::Url, Requester::default())
        .await;
    assert!(matches!(result, Err(Error::Destroyed)));
}

#[tokio::test]
async fn test_format_queue_renders_page() {
    let (player, _h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    let identifiers: Vec<String> = (0..5).map(|i| i.to_string()).collect();
    player
        .enqueue(&identifiers, SourceKind::Url, Requester::new("alex"))
        .await
        .unwrap();
    settle().await;

    let lines = player.format_queue(2, 2, "{position}) {title}");
    assert_eq!(lines, vec!["3) Track 2", "4) Track 3"]);
}

// ----- connection supervision -----

#[tokio::test(start_paused = true)]
async fn test_disconnect_below_ceiling_rejoins_after_backoff() {
    let (_player, h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    h.connection_log.lock().attempts = 4;

    let begin = tokio::time::Instant::now();
    h.connection_tx
        .send(ConnectionStatus::Disconnected(DisconnectReason::Lost))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;

    let log = h.connection_log.lock();
    assert_eq!(log.rejoins.len(), 1);
    assert_eq!(log.rejoins[0].duration_since(begin), Duration::from_secs(25));
    assert!(!log.destroyed);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_at_ceiling_destroys_without_waiting() {
    let (player, h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    h.connection_log.lock().attempts = 5;

    h.connection_tx
        .send(ConnectionStatus::Disconnected(DisconnectReason::Lost))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    {
        let log = h.connection_log.lock();
        assert!(log.rejoins.is_empty());
        assert!(log.destroyed);
    }
    // The connection's Destroyed event tears the session down.
    assert_eq!(player.state(), PlayerState::Destroyed);
}

#[tokio::test(start_paused = true)]
async fn test_resumable_close_without_reconnect_destroys_session() {
    let (player, h) = make_player(ScriptedResolver::new(), PlayerOptions::default());

    h.connection_tx
        .send(ConnectionStatus::Disconnected(DisconnectReason::Closed {
            code: 4014,
        }))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;

    assert!(h.connection_log.lock().destroyed);
    assert_eq!(player.state(), PlayerState::Destroyed);
}

#[tokio::test(start_paused = true)]
async fn test_resumable_close_with_reconnect_recovers() {
    let (player, h) = make_player(ScriptedResolver::new(), PlayerOptions::default());

    h.connection_tx
        .send(ConnectionStatus::Disconnected(DisconnectReason::Closed {
            code: 4014,
        }))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    h.connection_tx.send(ConnectionStatus::Connecting).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    h.connection_tx.send(ConnectionStatus::Ready).unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(!h.connection_log.lock().destroyed);
    assert_ne!(player.state(), PlayerState::Destroyed);
}

#[tokio::test(start_paused = true)]
async fn test_connecting_must_reach_ready_within_bound() {
    let (_player, h) = make_player(ScriptedResolver::new(), PlayerOptions::default());

    h.connection_tx.send(ConnectionStatus::Connecting).unwrap();
    tokio::time::sleep(Duration::from_secs(21)).await;

    assert!(h.connection_log.lock().destroyed);
}

#[tokio::test(start_paused = true)]
async fn test_connection_destroyed_stops_transport() {
    let (player, h) = make_player(ScriptedResolver::new(), PlayerOptions::default());
    player
        .enqueue(&ids(&["a"]), SourceKind::Url, Requester::default())
        .await
        .unwrap();
    settle().await;

    h.connection_tx.send(ConnectionStatus::Destroyed).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(player.state(), PlayerState::Destroyed);
    assert!(h.transport_log.lock().stops.contains(&true));
    assert_eq!(player.queue_length(), 0);
}
