//! Playback mode and session lifecycle enums.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use serde::{Deserialize, Serialize};

/// What the player should do when the current track finishes naturally.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Advance through the queue and stop at the end.
    #[default]
    None,
    /// Replay the current track indefinitely.
    Track,
    /// Advance circularly, wrapping from the last track back to the first.
    Queue,
}

/// Autoplay enrichment mode: where related tracks are pulled from when the
/// queue is about to run out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Autoplay {
    #[default]
    None,
    YouTube,
    SoundCloud,
    Spotify,
    /// Use the current track's own provider.
    Relative,
}

impl Autoplay {
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Session lifecycle state. `Destroyed` is terminal; a new session must be
/// constructed to resume playback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Idling,
    Playing,
    Paused,
    Destroyed,
}

/// Policy governing how consumed tracks are retained or discarded as
/// playback advances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueueDiscipline {
    /// Keep the most recently consumed track at the queue front so it can
    /// be replayed with `play_previous`.
    #[default]
    Default,
    /// Discard the head as soon as it is consumed; no history.
    ForwardOnly,
}
