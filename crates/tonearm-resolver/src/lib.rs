//! # tonearm-resolver
//!
//! Provider resolvers for tonearm. One resolver per [`SourceKind`] variant,
//! all behind the [`ProviderResolver`] capability trait; [`ResolverSet`]
//! dispatches on the kind tag statically.

use std::time::Duration;

use tonearm_core::{AudioSource, Result, SourceKind, Track};

mod http;
mod local;
mod soundcloud;
mod spotify;
mod youtube;

pub use http::UrlResolver;
pub use local::LocalFileResolver;
pub use soundcloud::SoundCloudResolver;
pub use spotify::SpotifyResolver;
pub use youtube::{extract_video_id, YouTubeResolver};

/// Default timeout for provider requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

/// Capability interface every provider resolver implements.
///
/// `resolve` turns a user-supplied identifier into one or more tracks (a
/// set/playlist identifier expands to several); `open_stream` fetches the
/// audio payload for an already-resolved track; `related` lists identifiers
/// of similar tracks for autoplay enrichment.
pub trait ProviderResolver {
    fn resolve(
        &self,
        identifier: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Track>>> + Send;

    fn open_stream(
        &self,
        track: &Track,
    ) -> impl std::future::Future<Output = Result<AudioSource>> + Send;

    fn related(
        &self,
        track: &Track,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

/// Configuration for the resolver set.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// SoundCloud API client id; without it SoundCloud identifiers fail to
    /// resolve.
    pub soundcloud_client_id: Option<String>,
}

/// One resolver per source kind, dispatched by tag.
pub struct ResolverSet {
    youtube: YouTubeResolver,
    soundcloud: SoundCloudResolver,
    spotify: SpotifyResolver,
    local: LocalFileResolver,
    url: UrlResolver,
}

impl ResolverSet {
    /// Build a resolver set sharing a single HTTP client.
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| tonearm_core::Error::Network(format!("failed to build client: {e}")))?;

        let youtube = YouTubeResolver::new(http.clone());
        Ok(Self {
            soundcloud: SoundCloudResolver::new(http.clone(), config.soundcloud_client_id),
            spotify: SpotifyResolver::new(http.clone(), youtube.clone()),
            local: LocalFileResolver::new(),
            url: UrlResolver::new(http),
            youtube,
        })
    }

    /// Resolve an identifier with the resolver matching `kind`.
    pub async fn resolve(&self, identifier: &str, kind: SourceKind) -> Result<Vec<Track>> {
        match kind {
            SourceKind::YouTube => self.youtube.resolve(identifier).await,
            SourceKind::SoundCloud => self.soundcloud.resolve(identifier).await,
            SourceKind::Spotify => self.spotify.resolve(identifier).await,
            SourceKind::LocalFile => self.local.resolve(identifier).await,
            SourceKind::Url => self.url.resolve(identifier).await,
        }
    }

    /// Open the audio stream for a resolved track.
    pub async fn open_stream(&self, track: &Track) -> Result<AudioSource> {
        match track.source {
            SourceKind::YouTube => self.youtube.open_stream(track).await,
            SourceKind::SoundCloud => self.soundcloud.open_stream(track).await,
            SourceKind::Spotify => self.spotify.open_stream(track).await,
            SourceKind::LocalFile => self.local.open_stream(track).await,
            SourceKind::Url => self.url.open_stream(track).await,
        }
    }

    /// Related-track identifiers for autoplay, from `kind`'s provider.
    pub async fn related(
        &self,
        track: &Track,
        kind: SourceKind,
        limit: usize,
    ) -> Result<Vec<String>> {
        match kind {
            SourceKind::YouTube | SourceKind::Spotify => self.youtube.related(track, limit).await,
            SourceKind::SoundCloud => self.soundcloud.related(track, limit).await,
            SourceKind::LocalFile => self.local.related(track, limit).await,
            SourceKind::Url => self.url.related(track, limit).await,
        }
    }
}

pub(crate) fn network_err(context: &str, err: &reqwest::Error) -> tonearm_core::Error {
    tonearm_core::Error::Network(format!("{context}: {err}"))
}
