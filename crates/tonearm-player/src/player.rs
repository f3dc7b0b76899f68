//! The player session: queue, modes, playback driver, and event surface.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tonearm_cache::{CacheBacking, CacheStore};
use tonearm_core::{
    Autoplay, Error, LoopMode, PlayerEvent, PlayerState, QueueDiscipline, Requester, Result,
    SourceKind, Track,
};
use tonearm_filter::FilterChain;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::connection::{Connection, ConnectionHandle};
use crate::events::EventBus;
use crate::format;
use crate::modes::Modes;
use crate::queue::Queue;
use crate::resolver::Resolver;
use crate::supervisor;
use crate::transition::{self, Suppressed, Transition};
use crate::transport::{PlaybackResource, Transport, TransportEvent, TransportHandle, TransportStatus};

/// Construction options for a player session. Cache and filter plugins are
/// explicit optional dependencies; there is no registry lookup.
pub struct PlayerOptions {
    pub discipline: QueueDiscipline,
    /// Optional pause between identifier resolutions in a batch enqueue.
    pub request_gap: Option<Duration>,
    /// How many related tracks autoplay enrichment fetches.
    pub autoplay_limit: usize,
    /// How many related tracks a mix continuation appends.
    pub mix_limit: usize,
    /// Event bus capacity.
    pub event_capacity: usize,
    pub cache: Option<Arc<CacheStore>>,
    pub filters: Option<Arc<FilterChain>>,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            discipline: QueueDiscipline::Default,
            request_gap: None,
            autoplay_limit: 10,
            mix_limit: 3,
            event_capacity: 64,
            cache: None,
            filters: None,
        }
    }
}

/// A playback session.
///
/// Owns exactly one queue, one mode bundle, one transport handle, and one
/// connection handle. All mutation is funneled through internal locks that
/// are never held across awaits; terminal transport events are consumed by
/// a single task, so the transition policy never runs twice concurrently.
#[derive(Clone)]
pub struct Player {
    inner: Arc<PlayerInner>,
}

impl Player {
    /// Create a session and start its transport monitor and connection
    /// supervisor. Must be called within a tokio runtime.
    pub fn new(
        options: PlayerOptions,
        resolver: Arc<dyn Resolver>,
        transport: TransportHandle,
        connection: ConnectionHandle,
    ) -> Self {
        let inner = Arc::new(PlayerInner {
            id: Uuid::new_v4(),
            discipline: options.discipline,
            request_gap: options.request_gap,
            autoplay_limit: options.autoplay_limit,
            mix_limit: options.mix_limit,
            queue: Mutex::new(Queue::new()),
            modes: Mutex::new(Modes::default()),
            state: Mutex::new(PlayerState::Idling),
            transport: Mutex::new(transport.control),
            connection: Mutex::new(connection.control),
            resolver,
            cache: options.cache,
            filter_chain: options.filters,
            events: EventBus::new(options.event_capacity),
        });

        tokio::spawn(run_transport_monitor(inner.clone(), transport.events));
        tokio::spawn(supervisor::run(inner.clone(), connection.events));

        info!("player session {} created", inner.id);
        Self { inner }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.inner.events.subscribe()
    }

    pub fn state(&self) -> PlayerState {
        *self.inner.state.lock()
    }

    /// Resolve and append identifiers. One identifier may expand into
    /// several tracks; identifiers that fail to resolve are skipped without
    /// aborting the batch. Playback starts as soon as the first track lands
    /// in an empty queue.
    pub async fn enqueue(
        &self,
        identifiers: &[String],
        kind: SourceKind,
        requester: Requester,
    ) -> Result<()> {
        if self.state() == PlayerState::Destroyed {
            return Err(Error::Destroyed);
        }
        if kind == SourceKind::YouTube {
            self.inner.detect_mix(identifiers);
        }

        for identifier in identifiers {
            match self.inner.resolver.resolve(identifier, kind).await {
                Ok(tracks) => {
                    for track in tracks {
                        let len = self.inner.queue.lock().append(track, requester.clone());
                        if len == 1 {
                            self.inner.emit(PlayerEvent::QueueStart);
                            self.inner.try_play().await;
                        }
                    }
                }
                Err(e) => warn!("skipping '{identifier}': {e}"),
            }
            if let Some(gap) = self.inner.request_gap {
                tokio::time::sleep(gap).await;
            }
        }
        Ok(())
    }

    /// Stop the current resource; the terminal event advances the queue
    /// through the normal transition policy.
    pub fn skip(&self) {
        self.inner.transport.lock().stop(false);
    }

    /// Reposition to `position` (1-based). Tracks ahead of the target are
    /// discarded, or rotated to the tail under loop-queue. A position past
    /// the end of the queue is a no-op.
    pub async fn skip_to(&self, position: usize) -> Result<()> {
        let rotate = self.inner.modes.lock().loop_mode == LoopMode::Queue;
        let discarded = self.inner.queue.lock().skip_to(position, rotate);
        let Some(discarded) = discarded else {
            return Ok(());
        };
        if let Some(cache) = &self.inner.cache {
            for track in &discarded {
                cache.delete(&track.id);
            }
        }
        self.inner.modes.lock().seeked = true;
        self.inner.transport.lock().stop(false);
        self.inner.play_at(None).await
    }

    /// Step back to the previously played track. Silently ignored when
    /// there is no history; the cursor does not wrap.
    pub async fn play_previous(&self) -> Result<()> {
        if !self.inner.queue.lock().step_back() {
            return Ok(());
        }
        self.inner.modes.lock().seeked = true;
        self.inner.transport.lock().stop(false);
        self.inner.play_at(None).await
    }

    /// Pause playback. Returns whether the transport paused.
    pub fn pause(&self) -> bool {
        let paused = self.inner.transport.lock().pause();
        if paused {
            self.inner.modes.lock().paused = true;
            *self.inner.state.lock() = PlayerState::Paused;
            if let Some(track) = self.inner.current_track() {
                self.inner.emit(PlayerEvent::TrackPause(track));
            }
        }
        paused
    }

    /// Resume a paused session. Returns whether the transport resumed.
    pub fn resume(&self) -> bool {
        let resumed = self.inner.transport.lock().unpause();
        if resumed {
            self.inner.modes.lock().paused = false;
            *self.inner.state.lock() = PlayerState::Playing;
            if let Some(track) = self.inner.current_track() {
                self.inner.emit(PlayerEvent::TrackResume(track));
            }
        }
        resumed
    }

    /// Re-enter the current track at `position`. Requires the filter plugin
    /// (the pipeline is the seek entry point); the induced terminal event is
    /// suppressed.
    pub async fn seek(&self, position: Duration) -> Result<()> {
        if self.inner.filter_chain.is_none() {
            return Err(Error::Filter("seeking requires a filter plugin".to_string()));
        }
        self.inner.modes.lock().seeked = true;
        self.inner.play_at(Some(position)).await
    }

    /// Volume in percent.
    pub fn volume(&self) -> u8 {
        self.inner.modes.lock().volume
    }

    /// Set the volume, forwarding to the transport's live resource.
    pub fn set_volume(&self, percent: u8) {
        self.inner.modes.lock().volume = percent;
        self.inner.transport.lock().set_volume(percent);
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.inner.modes.lock().loop_mode
    }

    pub fn set_loop_mode(&self, mode: LoopMode) {
        self.inner.modes.lock().loop_mode = mode;
    }

    pub fn autoplay(&self) -> Autoplay {
        self.inner.modes.lock().autoplay
    }

    pub fn set_autoplay(&self, autoplay: Autoplay) {
        self.inner.modes.lock().autoplay = autoplay;
    }

    /// Randomly permute the queue. The original order stays recoverable.
    pub fn shuffle(&self) {
        self.inner.queue.lock().shuffle();
        self.inner.modes.lock().shuffled = true;
    }

    /// Restore enqueue order.
    pub fn unshuffle(&self) {
        self.inner.queue.lock().unshuffle();
        self.inner.modes.lock().shuffled = false;
    }

    pub fn is_shuffled(&self) -> bool {
        self.inner.modes.lock().shuffled
    }

    pub fn is_paused(&self) -> bool {
        self.inner.modes.lock().paused
    }

    pub fn is_loop_enabled(&self) -> bool {
        self.loop_mode() != LoopMode::None
    }

    pub fn is_autoplay_enabled(&self) -> bool {
        self.autoplay().is_enabled()
    }

    /// Active filter chain. Mutating it does not rebuild the resource; the
    /// driver reads it on each play. Use [`Self::apply_filters`] for a live
    /// swap.
    pub fn filters(&self) -> Vec<String> {
        self.inner.modes.lock().filters.clone()
    }

    pub fn set_filters(&self, specs: Vec<String>) {
        self.inner.modes.lock().filters = specs;
    }

    pub fn add_filters(&self, specs: Vec<String>) {
        self.inner.modes.lock().filters.extend(specs);
    }

    pub fn clear_filters(&self) {
        self.inner.modes.lock().filters.clear();
    }

    /// Swap the active filter chain and rebuild the playing resource. The
    /// induced terminal event is suppressed via the filtering flag.
    pub async fn apply_filters(&self, specs: Vec<String>) -> Result<()> {
        if self.inner.filter_chain.is_none() {
            return Err(Error::Filter("no filter plugin registered".to_string()));
        }
        {
            let mut modes = self.inner.modes.lock();
            modes.filters = specs;
            modes.filtering = true;
        }
        self.inner.play_at(None).await
    }

    /// Mark (or clear) an in-flight seek so the next terminal event is
    /// treated as self-induced.
    pub fn set_seeking(&self, seeking: bool) {
        self.inner.modes.lock().seeked = seeking;
    }

    pub fn is_seeking(&self) -> bool {
        self.inner.modes.lock().seeked
    }

    /// Mark (or clear) an in-flight filter swap.
    pub fn set_filtering(&self, filtering: bool) {
        self.inner.modes.lock().filtering = filtering;
    }

    /// Remove the track at `index`, evicting its cached artifact.
    pub fn remove_track(&self, index: usize) -> Option<Track> {
        let removed = self.inner.queue.lock().remove_at(index);
        if let (Some(cache), Some(track)) = (&self.inner.cache, &removed) {
            cache.delete(&track.id);
        }
        removed
    }

    /// Drop every queued track. Playback of the current resource is not
    /// interrupted.
    pub fn clear_queue(&self) {
        self.inner.queue.lock().clear();
    }

    pub fn current_track(&self) -> Option<Track> {
        self.inner.current_track()
    }

    pub fn previous_track(&self) -> Option<Track> {
        self.inner.queue.lock().previous().cloned()
    }

    /// Zero-based cursor into the queue.
    pub fn current_position(&self) -> usize {
        self.inner.queue.lock().cursor()
    }

    /// Elapsed playback time of the current resource.
    pub fn playback_position(&self) -> Duration {
        self.inner.transport.lock().position()
    }

    pub fn queue_length(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Snapshot of the queued tracks.
    pub fn tracks(&self) -> Vec<Track> {
        self.inner.queue.lock().items().to_vec()
    }

    /// Render a page of the queue with `{field}` substitution. See
    /// [`format::DEFAULT_TEMPLATE`] for the default shape.
    pub fn format_queue(&self, page: usize, limit: usize, template: &str) -> Vec<String> {
        let queue = self.inner.queue.lock();
        let start = (page.max(1) - 1).saturating_mul(limit);
        format::render(queue.page(page, limit), start, template)
    }

    /// Tear the session down: clear the queue, reset modes, stop the
    /// transport, clear the cache plugin. Terminal; a new session must be
    /// constructed to resume.
    pub fn destroy(&self) {
        self.inner.destroy_session();
    }
}

/// Shared session state, owned by the public handle and the two tasks.
pub(crate) struct PlayerInner {
    pub(crate) id: Uuid,
    discipline: QueueDiscipline,
    request_gap: Option<Duration>,
    autoplay_limit: usize,
    mix_limit: usize,
    pub(crate) queue: Mutex<Queue>,
    pub(crate) modes: Mutex<Modes>,
    pub(crate) state: Mutex<PlayerState>,
    pub(crate) transport: Mutex<Box<dyn Transport>>,
    pub(crate) connection: Mutex<Box<dyn Connection>>,
    resolver: Arc<dyn Resolver>,
    cache: Option<Arc<CacheStore>>,
    filter_chain: Option<Arc<FilterChain>>,
    events: EventBus,
}

impl PlayerInner {
    pub(crate) fn emit(&self, event: PlayerEvent) {
        self.events.emit(event);
    }

    pub(crate) fn current_track(&self) -> Option<Track> {
        self.queue.lock().current().cloned()
    }

    fn emit_track_end(&self) {
        if let Some(track) = self.current_track() {
            self.emit(PlayerEvent::TrackEnd(track));
        }
    }

    /// Record a continuation-list marker from a batch of identifiers.
    fn detect_mix(&self, identifiers: &[String]) {
        let mut modes = self.modes.lock();
        if modes.mix.enabled {
            return;
        }
        let is_mix = identifiers
            .iter()
            .any(|u| u.contains("list=") && u.contains("index="));
        if !is_mix {
            return;
        }
        if let Some(id) = identifiers
            .last()
            .and_then(|last| tonearm_resolver::extract_video_id(last))
        {
            modes.mix.enabled = true;
            modes.mix.last_id = Some(id);
        }
    }

    /// Resolve the stream for the track at the cursor, route it through the
    /// cache and filter plugins, and hand it to the transport.
    pub(crate) async fn play_at(&self, seek: Option<Duration>) -> Result<()> {
        let track = self
            .current_track()
            .ok_or_else(|| Error::InvalidArgument("cannot play from an empty queue".to_string()))?;

        let mut source = if let Some(cache) = &self.cache {
            if cache.has(&track.id) {
                cache.get(&track.id)?
            } else {
                let fetched = self.resolver.open_stream(&track).await?;
                cache.write(&track, &fetched)?;
                if cache.backing() == CacheBacking::Disk {
                    cache.get(&track.id)?
                } else {
                    fetched
                }
            }
        } else {
            self.resolver.open_stream(&track).await?
        };

        let specs = self.modes.lock().filters.clone();
        if let Some(chain) = &self.filter_chain {
            if seek.is_some() || !specs.is_empty() {
                source = chain.create_pipeline(&specs).process(&source, seek).await?;
            }
        } else if seek.is_some() {
            return Err(Error::Filter("seeking requires a filter plugin".to_string()));
        }

        let volume = self.modes.lock().volume;
        self.emit(PlayerEvent::TrackStart(track.clone()));
        self.transport.lock().play(PlaybackResource {
            track_id: track.id.clone(),
            source,
            volume,
        });
        *self.state.lock() = PlayerState::Playing;

        self.extend_mix_if_needed(&track).await;
        Ok(())
    }

    /// When the playing track is the recorded tail of a continuation list,
    /// append further related tracks and move the marker.
    async fn extend_mix_if_needed(&self, track: &Track) {
        let mix = self.modes.lock().mix.clone();
        if !mix.enabled || mix.last_id.as_deref() != Some(track.id.as_str()) {
            return;
        }
        match self
            .resolver
            .related(track, SourceKind::YouTube, self.mix_limit)
            .await
        {
            Ok(ids) if !ids.is_empty() => {
                let appended = self
                    .resolve_and_append(&ids, SourceKind::YouTube, track.requester.clone())
                    .await;
                if appended > 0 {
                    if let Some(last) = ids.last() {
                        self.modes.lock().mix.last_id = Some(last.clone());
                    }
                }
                debug!("extended mix with {appended} track(s)");
            }
            Ok(_) => {}
            Err(e) => warn!("mix continuation failed: {e}"),
        }
    }

    /// Resolve identifiers and append the results, skipping failures.
    /// Never starts playback; callers do.
    async fn resolve_and_append(
        &self,
        identifiers: &[String],
        kind: SourceKind,
        requester: Requester,
    ) -> usize {
        let mut appended = 0;
        for identifier in identifiers {
            match self.resolver.resolve(identifier, kind).await {
                Ok(tracks) => {
                    for track in tracks {
                        self.queue.lock().append(track, requester.clone());
                        appended += 1;
                    }
                }
                Err(e) => warn!("skipping '{identifier}': {e}"),
            }
        }
        appended
    }

    /// Play and surface failures as audio errors instead of propagating.
    pub(crate) async fn try_play(&self) {
        if let Err(e) = self.play_at(None).await {
            warn!("playback failed: {e}");
            self.emit(PlayerEvent::AudioError {
                track: self.current_track(),
                message: e.to_string(),
            });
        }
    }

    /// Execute the transition decided for a terminal event.
    pub(crate) async fn handle_terminal(&self) {
        if *self.state.lock() == PlayerState::Destroyed {
            return;
        }
        let decision = {
            let modes = self.modes.lock();
            let queue = self.queue.lock();
            transition::decide(&modes, &queue)
        };
        debug!("terminal event -> {decision:?}");
        match decision {
            Transition::Ignore => {}
            Transition::Suppress(Suppressed::Seek) => {
                self.modes.lock().seeked = false;
            }
            Transition::Suppress(Suppressed::FilterSwap) => {
                self.modes.lock().filtering = false;
            }
            Transition::Replay => {
                self.emit_track_end();
                self.try_play().await;
            }
            Transition::AdvanceCircular => {
                self.emit_track_end();
                self.queue.lock().advance_circular();
                self.try_play().await;
            }
            Transition::Autoplay => {
                self.emit_track_end();
                self.autoplay_next().await;
            }
            Transition::Advance => {
                self.emit_track_end();
                self.advance_and_play().await;
            }
            Transition::Finish => {
                self.emit_track_end();
                self.emit(PlayerEvent::QueueEnd);
                self.destroy_session();
            }
        }
    }

    /// A not-actively-playing transition that is neither idle nor a pause:
    /// emit a suppression-checked track-end without advancing.
    pub(crate) fn handle_interruption(&self) {
        {
            let mut modes = self.modes.lock();
            if modes.seeked {
                modes.seeked = false;
                return;
            }
            if modes.filtering {
                modes.filtering = false;
                return;
            }
        }
        self.emit_track_end();
    }

    /// Enrich the queue from the autoplay provider, then advance. When
    /// enrichment finds nothing the queue is exhausted and the session ends.
    async fn autoplay_next(&self) {
        let autoplay = self.modes.lock().autoplay;
        if let Some(current) = self.current_track() {
            let provider = match autoplay {
                Autoplay::YouTube | Autoplay::Spotify => Some(SourceKind::YouTube),
                Autoplay::SoundCloud => Some(SourceKind::SoundCloud),
                Autoplay::Relative => match current.source {
                    SourceKind::YouTube | SourceKind::Spotify => Some(SourceKind::YouTube),
                    SourceKind::SoundCloud => Some(SourceKind::SoundCloud),
                    SourceKind::LocalFile | SourceKind::Url => None,
                },
                Autoplay::None => None,
            };
            if let Some(provider) = provider {
                match self
                    .resolver
                    .related(&current, provider, self.autoplay_limit)
                    .await
                {
                    Ok(ids) => {
                        let appended = self
                            .resolve_and_append(&ids, provider, current.requester.clone())
                            .await;
                        debug!("autoplay appended {appended} track(s)");
                    }
                    Err(e) => warn!("autoplay enrichment failed: {e}"),
                }
            }
        }

        if self.queue.lock().len() > 1 {
            self.advance_and_play().await;
        } else {
            self.emit(PlayerEvent::QueueEnd);
            self.destroy_session();
        }
    }

    /// Advance under the active discipline, evict the consumed track's
    /// cached artifact, and play.
    async fn advance_and_play(&self) {
        let evicted = self.queue.lock().advance(self.discipline);
        if let (Some(cache), Some(track)) = (&self.cache, evicted) {
            cache.delete(&track.id);
        }
        if self.current_track().is_some() {
            self.try_play().await;
        } else {
            self.emit(PlayerEvent::QueueEnd);
            self.destroy_session();
        }
    }

    /// Clear the queue, reset modes, stop the transport, clear the cache.
    pub(crate) fn destroy_session(&self) {
        {
            let mut state = self.state.lock();
            if *state == PlayerState::Destroyed {
                return;
            }
            *state = PlayerState::Destroyed;
        }
        info!("destroying player session {}", self.id);
        self.queue.lock().clear();
        *self.modes.lock() = Modes::default();
        self.transport.lock().stop(true);
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}

/// Consume transport events. Terminal transitions (something other than a
/// pause stopped the resource) run the transition policy; this is the only
/// place it is invoked, so two terminal events can never interleave.
async fn run_transport_monitor(
    inner: Arc<PlayerInner>,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::StateChanged { old, new } => {
                if old != TransportStatus::Idle && new == TransportStatus::Idle {
                    inner.handle_terminal().await;
                } else if old == TransportStatus::Playing && new == TransportStatus::Buffering {
                    inner.handle_interruption();
                }
            }
            TransportEvent::Error(message) => {
                inner.emit(PlayerEvent::AudioError {
                    track: inner.current_track(),
                    message,
                });
            }
        }
        if *inner.state.lock() == PlayerState::Destroyed {
            break;
        }
    }
    debug!("transport monitor stopped");
}
