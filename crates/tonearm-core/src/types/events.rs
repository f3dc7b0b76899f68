//! Events emitted across the player's boundary to the application layer.

use serde::{Deserialize, Serialize};

use super::Track;

/// Lifecycle events emitted by a player session.
///
/// These are the only way the core communicates with the rest of the
/// system; subscribers receive them over a broadcast channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlayerEvent {
    /// A track began playing.
    TrackStart(Track),
    /// The current track reached a terminal condition.
    TrackEnd(Track),
    /// Playback was paused.
    TrackPause(Track),
    /// Playback resumed after a pause.
    TrackResume(Track),
    /// Playback started from an empty queue.
    QueueStart,
    /// The queue ran out and the session is being torn down.
    QueueEnd,
    /// A stream or transport failure surfaced during playback. The queue is
    /// not advanced automatically; the application decides whether to skip.
    AudioError {
        track: Option<Track>,
        message: String,
    },
}

impl PlayerEvent {
    /// The track this event concerns, where applicable.
    pub const fn track(&self) -> Option<&Track> {
        match self {
            Self::TrackStart(track)
            | Self::TrackEnd(track)
            | Self::TrackPause(track)
            | Self::TrackResume(track) => Some(track),
            Self::AudioError { track, .. } => track.as_ref(),
            Self::QueueStart | Self::QueueEnd => None,
        }
    }
}
