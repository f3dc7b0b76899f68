//! Local-file resolver.

use std::path::Path;

use tonearm_core::{AudioSource, Error, Result, SourceKind, Track};
use tracing::debug;

use crate::ProviderResolver;

/// Resolver for audio files on the local filesystem.
#[derive(Clone, Default)]
pub struct LocalFileResolver;

impl LocalFileResolver {
    pub const fn new() -> Self {
        Self
    }
}

impl ProviderResolver for LocalFileResolver {
    async fn resolve(&self, identifier: &str) -> Result<Vec<Track>> {
        let metadata = tokio::fs::metadata(identifier)
            .await
            .map_err(|e| Error::resolution(identifier, format!("cannot stat file: {e}")))?;
        if !metadata.is_file() {
            return Err(Error::resolution(identifier, "not a regular file"));
        }

        let title = Path::new(identifier)
            .file_name()
            .map_or_else(|| identifier.to_string(), |n| n.to_string_lossy().into_owned());

        debug!("resolved local file {identifier} ({} bytes)", metadata.len());
        Ok(vec![Track::new(identifier, title, SourceKind::LocalFile)])
    }

    async fn open_stream(&self, track: &Track) -> Result<AudioSource> {
        let data = tokio::fs::read(&track.id)
            .await
            .map_err(|e| Error::stream(&track.id, format!("cannot read file: {e}")))?;
        if data.is_empty() {
            return Err(Error::stream(&track.id, "file is empty"));
        }
        Ok(AudioSource::encoded(data))
    }

    async fn related(&self, _track: &Track, _limit: usize) -> Result<Vec<String>> {
        // Local files have no notion of related content.
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_resolve_and_stream_local_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"OggS\0\0\0\0\0\0\0\0")
            .expect("write sample");
        let path = file.path().to_string_lossy().into_owned();

        let resolver = LocalFileResolver::new();
        let tracks = resolver.resolve(&path).await.expect("resolve");
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].source, SourceKind::LocalFile);

        let source = resolver.open_stream(&tracks[0]).await.expect("stream");
        assert_eq!(source.mime, "audio/ogg");
    }

    #[tokio::test]
    async fn test_resolve_missing_file() {
        let resolver = LocalFileResolver::new();
        let err = resolver
            .resolve("/definitely/not/here.mp3")
            .await
            .expect_err("missing file should fail");
        assert!(matches!(err, Error::Resolution { .. }));
    }
}
