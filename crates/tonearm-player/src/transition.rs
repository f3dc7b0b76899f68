//! Transition policy: what happens when the current track stops playing.
//!
//! Pure decision logic over a mode/queue snapshot. Invoked exactly once per
//! terminal event by the transport monitor; the caller executes the decision
//! and clears any consumed suppression flag.

use tonearm_core::LoopMode;

use crate::modes::Modes;
use crate::queue::Queue;

/// Which suppression flag absorbed a self-induced terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppressed {
    Seek,
    FilterSwap,
}

/// Decision for a terminal playback event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The stop was an explicit pause; not a terminal event.
    Ignore,
    /// A seek or filter swap tore the resource down; no transition, no
    /// events. The named flag must be cleared.
    Suppress(Suppressed),
    /// Replay the current track, cursor unchanged.
    Replay,
    /// Advance the cursor circularly and replay.
    AdvanceCircular,
    /// Enrich the queue with related tracks, then advance.
    Autoplay,
    /// Advance under the active queue discipline.
    Advance,
    /// Emit queue-end and destroy the session.
    Finish,
}

/// Evaluate the decision table, first match wins.
pub fn decide(modes: &Modes, queue: &Queue) -> Transition {
    if modes.paused {
        return Transition::Ignore;
    }
    if modes.seeked {
        return Transition::Suppress(Suppressed::Seek);
    }
    if modes.filtering {
        return Transition::Suppress(Suppressed::FilterSwap);
    }
    if modes.loop_mode == LoopMode::Track && queue.current().is_some() {
        return Transition::Replay;
    }
    if modes.loop_mode == LoopMode::Queue && !queue.is_empty() {
        return Transition::AdvanceCircular;
    }
    if modes.autoplay.is_enabled() && queue.len() == 1 {
        return Transition::Autoplay;
    }
    if queue.len() > 1 && queue.cursor() < queue.len() - 1 {
        return Transition::Advance;
    }
    Transition::Finish
}
