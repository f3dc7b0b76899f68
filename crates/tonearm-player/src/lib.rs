//! # tonearm-player
//!
//! The tonearm core: playback state machine, queue/transition engine, and
//! connection supervisor.
//!
//! A [`Player`] session owns one queue, one mode bundle, one transport
//! handle, and one connection handle. Callers enqueue identifiers; the
//! session resolves them, routes audio through the optional cache and
//! filter plugins, hands resources to the transport, and decides what plays
//! next on every terminal event — honoring loop modes, autoplay enrichment,
//! shuffle, and the seek/filter suppression flags. The supervisor keeps the
//! outbound connection alive across transient failures with bounded
//! retries.

pub mod connection;
pub mod events;
pub mod format;
pub mod modes;
pub mod player;
pub mod queue;
pub mod resolver;
pub mod supervisor;
pub mod transition;
pub mod transport;

pub use connection::{
    Connection, ConnectionHandle, ConnectionStatus, DisconnectReason, RESUMABLE_CLOSE_CODE,
};
pub use events::EventBus;
pub use format::DEFAULT_TEMPLATE;
pub use modes::{MixMarker, Modes};
pub use player::{Player, PlayerOptions};
pub use queue::Queue;
pub use resolver::Resolver;
pub use transition::{decide, Suppressed, Transition};
pub use transport::{
    PlaybackResource, Transport, TransportEvent, TransportHandle, TransportStatus,
};

#[cfg(test)]
mod tests;
