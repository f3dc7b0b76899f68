//! The session's mutable mode bundle.

use serde::{Deserialize, Serialize};
use tonearm_core::{Autoplay, LoopMode};

/// Marker recording the last item of a detected continuation ("mix") list.
/// When the playing track matches it, the driver extends the queue with
/// further related tracks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MixMarker {
    pub enabled: bool,
    pub last_id: Option<String>,
}

/// Playback flags owned exclusively by the session. Created with defaults
/// when the session starts and reset to defaults on destroy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modes {
    pub loop_mode: LoopMode,
    pub autoplay: Autoplay,
    pub shuffled: bool,
    pub paused: bool,
    /// True only during a filter-chain swap, so the induced terminal event
    /// is not read as natural end-of-track.
    pub filtering: bool,
    /// Same suppression purpose, for seek operations.
    pub seeked: bool,
    /// Active filter chain. Mutating this does not apply it; the driver
    /// reads it each time it resolves a stream.
    pub filters: Vec<String>,
    /// Volume in percent.
    pub volume: u8,
    pub mix: MixMarker,
}

impl Modes {
    pub const DEFAULT_VOLUME: u8 = 100;
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            loop_mode: LoopMode::None,
            autoplay: Autoplay::None,
            shuffled: false,
            paused: false,
            filtering: false,
            seeked: false,
            filters: Vec::new(),
            volume: Self::DEFAULT_VOLUME,
            mix: MixMarker::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let modes = Modes::default();
        assert_eq!(modes.loop_mode, LoopMode::None);
        assert_eq!(modes.autoplay, Autoplay::None);
        assert_eq!(modes.volume, 100);
        assert!(!modes.paused);
        assert!(!modes.seeked);
        assert!(!modes.filtering);
        assert!(modes.filters.is_empty());
        assert!(!modes.mix.enabled);
    }
}
