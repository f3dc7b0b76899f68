//! Spotify resolver. Metadata comes from the public oEmbed endpoint; the
//! audio itself is located through `YouTube` search, since Spotify exposes no
//! streamable audio without a playback session.

use serde::Deserialize;
use serde_json::Value;
use tonearm_core::{AudioSource, Error, Result, SourceKind, Track};
use tracing::debug;

use crate::{network_err, ProviderResolver, YouTubeResolver};

const OEMBED_URL: &str = "https://open.spotify.com/oembed";
const SEARCH_URL: &str = "https://www.youtube.com/results";

#[derive(Debug, Deserialize)]
struct OembedResponse {
    title: String,
    thumbnail_url: Option<String>,
}

/// Resolver for `open.spotify.com` track links.
#[derive(Clone)]
pub struct SpotifyResolver {
    http: reqwest::Client,
    youtube: YouTubeResolver,
}

impl SpotifyResolver {
    pub const fn new(http: reqwest::Client, youtube: YouTubeResolver) -> Self {
        Self { http, youtube }
    }

    /// Find the first `YouTube` video id matching the track's title/artist.
    async fn locate_video(&self, track: &Track) -> Result<String> {
        let query = if track.artist.is_some() {
            format!("{} {}", track.title, track.artist_name())
        } else {
            track.title.clone()
        };

        let html = self
            .http
            .get(SEARCH_URL)
            .query(&[("search_query", query.as_str())])
            .send()
            .await
            .map_err(|e| network_err("search request failed", &e))?
            .text()
            .await
            .map_err(|e| network_err("search read failed", &e))?;

        first_video_id(&html)
            .ok_or_else(|| Error::stream(&track.id, "no matching playable track found"))
    }
}

impl ProviderResolver for SpotifyResolver {
    async fn resolve(&self, identifier: &str) -> Result<Vec<Track>> {
        let oembed: OembedResponse = self
            .http
            .get(OEMBED_URL)
            .query(&[("url", identifier)])
            .send()
            .await
            .map_err(|e| Error::resolution(identifier, format!("oembed request failed: {e}")))?
            .json()
            .await
            .map_err(|e| Error::resolution(identifier, format!("oembed response invalid: {e}")))?;

        let mut track = Track::new(identifier, oembed.title, SourceKind::Spotify)
            .with_url(identifier.to_string());
        if let Some(thumbnail) = oembed.thumbnail_url {
            track = track.with_thumbnail(thumbnail);
        }
        debug!("resolved Spotify track {identifier}: {}", track.title);
        Ok(vec![track])
    }

    async fn open_stream(&self, track: &Track) -> Result<AudioSource> {
        let video_id = self.locate_video(track).await?;
        debug!("playing Spotify track {} via video {video_id}", track.id);
        let surrogate = Track::new(video_id, &track.title, SourceKind::YouTube);
        self.youtube.open_stream(&surrogate).await
    }

    async fn related(&self, track: &Track, limit: usize) -> Result<Vec<String>> {
        let video_id = self.locate_video(track).await?;
        let surrogate = Track::new(video_id, &track.title, SourceKind::YouTube);
        self.youtube.related(&surrogate, limit).await
    }
}

/// Pull the first video id out of a results page's embedded initial data.
fn first_video_id(html: &str) -> Option<String> {
    let start = html.find("var ytInitialData = ")? + "var ytInitialData = ".len();
    let end = start + html[start..].find(";</script>")?;
    let data: Value = serde_json::from_str(&html[start..end]).ok()?;

    let mut ids = Vec::new();
    collect_first_video_id(&data, &mut ids);
    ids.into_iter().next()
}

fn collect_first_video_id(value: &Value, out: &mut Vec<String>) {
    if !out.is_empty() {
        return;
    }
    match value {
        Value::Object(map) => {
            if map.contains_key("videoRenderer") {
                if let Some(id) = map
                    .get("videoRenderer")
                    .and_then(|r| r.get("videoId"))
                    .and_then(Value::as_str)
                {
                    out.push(id.to_string());
                    return;
                }
            }
            for nested in map.values() {
                collect_first_video_id(nested, out);
            }
        }
        Value::Array(items) => {
            for nested in items {
                collect_first_video_id(nested, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_video_id_parses_initial_data() {
        let html = concat!(
            "<html><script>var ytInitialData = ",
            r#"{"contents":[{"videoRenderer":{"videoId":"dQw4w9WgXcQ"}}]}"#,
            ";</script></html>"
        );
        assert_eq!(first_video_id(html), Some("dQw4w9WgXcQ".to_string()));
    }

    #[test]
    fn test_first_video_id_missing_data() {
        assert_eq!(first_video_id("<html></html>"), None);
    }
}
