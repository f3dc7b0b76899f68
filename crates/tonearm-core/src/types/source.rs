//! Source providers and resolved audio payloads.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Provider a track identifier belongs to. Closed set; resolution is
/// dispatched statically on this tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    YouTube,
    SoundCloud,
    Spotify,
    LocalFile,
    Url,
}

impl SourceKind {
    /// Human-readable provider name used in queue rendering.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::SoundCloud => "SoundCloud",
            Self::Spotify => "Spotify",
            Self::LocalFile => "LocalFile",
            Self::Url => "Url",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// How an [`AudioSource`] payload is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Container/codec data as fetched from the provider; the transport
    /// probes the format itself.
    #[default]
    Encoded,
    /// Raw interleaved PCM (s16le, 48 kHz stereo), produced by a filter
    /// pipeline.
    RawPcm,
}

/// A resolved, playable audio payload.
#[derive(Debug, Clone, Default)]
pub struct AudioSource {
    /// Complete audio payload.
    pub data: Bytes,
    /// MIME type of the payload.
    pub mime: String,
    /// Payload encoding.
    pub encoding: Encoding,
}

impl AudioSource {
    /// Wrap provider-encoded bytes, sniffing the MIME type from magic bytes.
    pub fn encoded(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let mime = detect_audio_mime(&data).to_string();
        Self {
            data,
            mime,
            encoding: Encoding::Encoded,
        }
    }

    /// Wrap provider-encoded bytes with a known MIME type.
    pub fn encoded_with_mime(data: impl Into<Bytes>, mime: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime: mime.into(),
            encoding: Encoding::Encoded,
        }
    }

    /// Wrap raw PCM produced by a filter pipeline.
    pub fn raw_pcm(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mime: "audio/pcm".to_string(),
            encoding: Encoding::RawPcm,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Detect audio MIME type from magic bytes.
pub fn detect_audio_mime(data: &[u8]) -> &'static str {
    if data.len() < 12 {
        return "audio/unknown";
    }

    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return "audio/webm";
    }

    if data.len() >= 8 && &data[4..8] == b"ftyp" {
        return "audio/mp4";
    }

    if data.starts_with(b"ID3") || (data[0] == 0xFF && (data[1] & 0xE0) == 0xE0) {
        return "audio/mpeg";
    }

    if data.starts_with(b"OggS") {
        return "audio/ogg";
    }

    if data.starts_with(b"fLaC") {
        return "audio/flac";
    }

    "audio/unknown"
}
