//! Audio transport boundary.
//!
//! The transport (mixer, voice gateway, local output) is an external
//! collaborator. The player drives it through [`Transport`] and reacts to
//! the state transitions it reports over an event channel.

use std::time::Duration;

use tonearm_core::AudioSource;

/// Observable transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    /// No resource is loaded, or the current resource has finished.
    Idle,
    Playing,
    Paused,
    /// Buffering, auto-paused, or any other not-actively-playing state that
    /// is not an explicit pause.
    Buffering,
}

/// State transitions and failures reported by the transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    StateChanged {
        old: TransportStatus,
        new: TransportStatus,
    },
    /// A failure during playback of the current resource. Surfaced to the
    /// application as an audio error; the queue is not advanced.
    Error(String),
}

/// A playable resource handed to the transport.
#[derive(Debug, Clone)]
pub struct PlaybackResource {
    /// Id of the track this resource was built from.
    pub track_id: String,
    /// The audio payload (encoded, or raw PCM after a filter pipeline).
    pub source: AudioSource,
    /// Initial volume, in percent.
    pub volume: u8,
}

/// Control surface of the downstream audio transport.
///
/// Playing a new resource replaces the current one; the teardown of the old
/// resource surfaces as a state transition like any other, which is why the
/// session uses suppression flags around seeks and filter swaps.
pub trait Transport: Send {
    /// Begin playing a resource, replacing any current one.
    fn play(&mut self, resource: PlaybackResource);

    /// Pause the current resource. Returns whether playback was paused.
    fn pause(&mut self) -> bool;

    /// Resume a paused resource. Returns whether playback resumed.
    fn unpause(&mut self) -> bool;

    /// Stop playback. `force` also drops a paused resource.
    fn stop(&mut self, force: bool);

    /// Adjust the live resource's volume, in percent.
    fn set_volume(&mut self, percent: u8);

    /// Elapsed playback time of the current resource.
    fn position(&self) -> Duration;
}

/// A transport control handle paired with its event stream.
pub struct TransportHandle {
    pub control: Box<dyn Transport>,
    pub events: tokio::sync::mpsc::UnboundedReceiver<TransportEvent>,
}
