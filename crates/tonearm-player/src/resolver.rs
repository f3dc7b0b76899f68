//! Resolution boundary.
//!
//! The session depends on this seam rather than on the concrete provider
//! set, so tests can stand in a scripted resolver.

use async_trait::async_trait;
use tonearm_core::{AudioSource, Result, SourceKind, Track};
use tonearm_resolver::ResolverSet;

/// Resolution capability the session depends on.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve an identifier into one or more tracks.
    async fn resolve(&self, identifier: &str, kind: SourceKind) -> Result<Vec<Track>>;

    /// Open the audio stream for a resolved track.
    async fn open_stream(&self, track: &Track) -> Result<AudioSource>;

    /// Related-track identifiers, from `kind`'s provider.
    async fn related(&self, track: &Track, kind: SourceKind, limit: usize) -> Result<Vec<String>>;
}

#[async_trait]
impl Resolver for ResolverSet {
    async fn resolve(&self, identifier: &str, kind: SourceKind) -> Result<Vec<Track>> {
        Self::resolve(self, identifier, kind).await
    }

    async fn open_stream(&self, track: &Track) -> Result<AudioSource> {
        Self::open_stream(self, track).await
    }

    async fn related(&self, track: &Track, kind: SourceKind, limit: usize) -> Result<Vec<String>> {
        Self::related(self, track, kind, limit).await
    }
}
