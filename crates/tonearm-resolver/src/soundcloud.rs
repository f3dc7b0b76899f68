//! `SoundCloud` resolver backed by the public api-v2 resolve endpoint.

use serde::Deserialize;
use tonearm_core::{AudioSource, Error, Result, SourceKind, Track, TrackDuration};
use tracing::debug;

use crate::{network_err, ProviderResolver};

const RESOLVE_URL: &str = "https://api-v2.soundcloud.com/resolve";

#[derive(Debug, Deserialize)]
struct ScTrack {
    id: u64,
    title: String,
    duration: u64,
    permalink_url: String,
    artwork_url: Option<String>,
    user: ScUser,
    media: Option<ScMedia>,
}

#[derive(Debug, Deserialize)]
struct ScUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct ScMedia {
    transcodings: Vec<ScTranscoding>,
}

#[derive(Debug, Deserialize)]
struct ScTranscoding {
    url: String,
    format: ScFormat,
}

#[derive(Debug, Deserialize)]
struct ScFormat {
    protocol: String,
}

#[derive(Debug, Deserialize)]
struct ScSet {
    tracks: Vec<ScTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScResolved {
    Set(ScSet),
    Track(Box<ScTrack>),
}

#[derive(Debug, Deserialize)]
struct ScStreamLocation {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ScRelated {
    collection: Vec<ScTrack>,
}

/// Resolver for `SoundCloud` permalinks (tracks and sets).
#[derive(Clone)]
pub struct SoundCloudResolver {
    http: reqwest::Client,
    client_id: Option<String>,
}

impl SoundCloudResolver {
    pub const fn new(http: reqwest::Client, client_id: Option<String>) -> Self {
        Self { http, client_id }
    }

    fn client_id(&self) -> Result<&str> {
        self.client_id
            .as_deref()
            .ok_or_else(|| Error::InvalidArgument("no SoundCloud client id configured".into()))
    }

    fn track_from(sc: ScTrack) -> Track {
        // Artwork defaults to a small rendition; request the 500px one.
        let artwork = sc
            .artwork_url
            .map(|a| a.replace("-large.jpg", "-t500x500.jpg"));
        let mut track = Track::new(&sc.permalink_url, sc.title, SourceKind::SoundCloud)
            .with_url(sc.permalink_url.clone())
            .with_artist(sc.user.username)
            .with_duration(TrackDuration::from_millis(sc.duration));
        if let Some(artwork) = artwork {
            track = track.with_thumbnail(artwork);
        }
        track
    }

    async fn resolve_raw(&self, identifier: &str) -> Result<ScResolved> {
        let client_id = self.client_id()?;
        self.http
            .get(RESOLVE_URL)
            .query(&[("url", identifier), ("client_id", client_id)])
            .send()
            .await
            .map_err(|e| network_err("resolve request failed", &e))?
            .json()
            .await
            .map_err(|e| network_err("resolve response was not JSON", &e))
    }

    async fn numeric_id(&self, track: &Track) -> Result<u64> {
        match self.resolve_raw(&track.id).await? {
            ScResolved::Track(sc) => Ok(sc.id),
            ScResolved::Set(_) => Err(Error::stream(&track.id, "identifier is a set")),
        }
    }
}

impl ProviderResolver for SoundCloudResolver {
    async fn resolve(&self, identifier: &str) -> Result<Vec<Track>> {
        let resolved = self.resolve_raw(identifier).await.map_err(|e| match e {
            Error::Network(reason) => Error::resolution(identifier, reason),
            other => other,
        })?;

        let tracks = match resolved {
            ScResolved::Track(sc) => vec![Self::track_from(*sc)],
            ScResolved::Set(set) => set.tracks.into_iter().map(Self::track_from).collect(),
        };
        debug!("resolved {} SoundCloud track(s) from {identifier}", tracks.len());
        Ok(tracks)
    }

    async fn open_stream(&self, track: &Track) -> Result<AudioSource> {
        let client_id = self.client_id()?.to_string();
        let resolved = self.resolve_raw(&track.id).await?;
        let ScResolved::Track(sc) = resolved else {
            return Err(Error::stream(&track.id, "identifier is a set"));
        };

        let transcoding_url = sc
            .media
            .as_ref()
            .and_then(|m| {
                m.transcodings
                    .iter()
                    .find(|t| t.format.protocol == "progressive")
            })
            .map(|t| t.url.clone())
            .ok_or_else(|| Error::stream(&track.id, "no progressive transcoding"))?;

        let location: ScStreamLocation = self
            .http
            .get(&transcoding_url)
            .query(&[("client_id", client_id.as_str())])
            .send()
            .await
            .map_err(|e| network_err("transcoding request failed", &e))?
            .json()
            .await
            .map_err(|e| network_err("transcoding response was not JSON", &e))?;

        let data = self
            .http
            .get(&location.url)
            .send()
            .await
            .map_err(|e| network_err("stream fetch failed", &e))?
            .bytes()
            .await
            .map_err(|e| network_err("stream read failed", &e))?;

        if data.is_empty() {
            return Err(Error::stream(&track.id, "provider returned empty stream"));
        }
        Ok(AudioSource::encoded(data))
    }

    async fn related(&self, track: &Track, limit: usize) -> Result<Vec<String>> {
        let client_id = self.client_id()?.to_string();
        let track_id = self.numeric_id(track).await?;
        let related_url = format!("https://api-v2.soundcloud.com/tracks/{track_id}/related");

        let related: ScRelated = self
            .http
            .get(&related_url)
            .query(&[
                ("client_id", client_id.as_str()),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| network_err("related request failed", &e))?
            .json()
            .await
            .map_err(|e| network_err("related response was not JSON", &e))?;

        Ok(related
            .collection
            .into_iter()
            .take(limit)
            .map(|sc| sc.permalink_url)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_conversion_upgrades_artwork() {
        let sc = ScTrack {
            id: 42,
            title: "Song".into(),
            duration: 185_000,
            permalink_url: "https://soundcloud.com/someone/song".into(),
            artwork_url: Some("https://i1.sndcdn.com/artworks-abc-large.jpg".into()),
            user: ScUser {
                username: "someone".into(),
            },
            media: None,
        };
        let track = SoundCloudResolver::track_from(sc);
        assert_eq!(track.source, SourceKind::SoundCloud);
        assert_eq!(track.duration.as_seconds(), 185);
        assert_eq!(
            track.thumbnail.as_deref(),
            Some("https://i1.sndcdn.com/artworks-abc-t500x500.jpg")
        );
    }

    #[test]
    fn test_missing_client_id_is_rejected() {
        let resolver = SoundCloudResolver::new(reqwest::Client::new(), None);
        assert!(resolver.client_id().is_err());
    }
}
