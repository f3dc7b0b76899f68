//! Core domain types for tonearm.

pub mod events;
pub mod playback;
pub mod source;
pub mod track;

pub use events::PlayerEvent;
pub use playback::{Autoplay, LoopMode, PlayerState, QueueDiscipline};
pub use source::{AudioSource, Encoding, SourceKind};
pub use track::{Requester, Track, TrackDuration};
