//! Track type representing a single resolved queue entry.

use serde::{Deserialize, Serialize};

use super::SourceKind;

/// Opaque reference to the actor that requested a track.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Requester(String);

impl Requester {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Requester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Track duration with millisecond precision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TrackDuration(pub u64);

impl TrackDuration {
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn from_seconds(seconds: u64) -> Self {
        Self(seconds * 1000)
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    pub const fn as_seconds(&self) -> u64 {
        self.0 / 1000
    }

    /// Format as MM:SS or HH:MM:SS.
    pub fn format(&self) -> String {
        let total_secs = self.as_seconds();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes}:{seconds:02}")
        }
    }
}

/// A single resolved track. Immutable after creation; `position` is the
/// stable enqueue-order key used to restore ordering after shuffles and is
/// assigned by the queue on append.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    /// Provider-scoped identifier (video id, permalink, path, URL).
    pub id: String,
    /// Track title.
    pub title: String,
    /// Artist/uploader name (if known).
    pub artist: Option<String>,
    /// Canonical URL of the track.
    pub url: String,
    /// Track duration.
    pub duration: TrackDuration,
    /// Thumbnail/artwork URL (if any).
    pub thumbnail: Option<String>,
    /// Provider this track was resolved from.
    pub source: SourceKind,
    /// Actor that requested the track.
    pub requester: Requester,
    /// Enqueue-order position, stable across shuffles.
    pub position: usize,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, source: SourceKind) -> Self {
        let id = id.into();
        Self {
            url: id.clone(),
            id,
            title: title.into(),
            artist: None,
            duration: TrackDuration::default(),
            thumbnail: None,
            source,
            requester: Requester::default(),
            position: 0,
        }
    }

    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: TrackDuration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// Artist name, or an empty string when unknown.
    pub fn artist_name(&self) -> &str {
        self.artist.as_deref().unwrap_or("")
    }
}
