//! `YouTube` resolver backed by the `InnerTube` player API.

use serde::Serialize;
use serde_json::Value;
use tonearm_core::{AudioSource, Error, Result, SourceKind, Track, TrackDuration};
use tracing::{debug, warn};

use crate::{network_err, ProviderResolver};

const PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const NEXT_URL: &str = "https://www.youtube.com/youtubei/v1/next";

/// The Android client sees unciphered stream URLs.
const CLIENT_NAME: &str = "ANDROID";
const CLIENT_VERSION: &str = "19.09.37";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InnerTubeRequest {
    context: InnerTubeContext,
    video_id: String,
}

#[derive(Debug, Serialize)]
struct InnerTubeContext {
    client: InnerTubeClient,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InnerTubeClient {
    client_name: &'static str,
    client_version: &'static str,
    hl: &'static str,
}

impl InnerTubeRequest {
    fn for_video(video_id: impl Into<String>) -> Self {
        Self {
            context: InnerTubeContext {
                client: InnerTubeClient {
                    client_name: CLIENT_NAME,
                    client_version: CLIENT_VERSION,
                    hl: "en",
                },
            },
            video_id: video_id.into(),
        }
    }
}

/// Resolver for `YouTube` video identifiers and watch URLs.
#[derive(Clone)]
pub struct YouTubeResolver {
    http: reqwest::Client,
}

impl YouTubeResolver {
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn player_response(&self, video_id: &str) -> Result<Value> {
        let response = self
            .http
            .post(PLAYER_URL)
            .json(&InnerTubeRequest::for_video(video_id))
            .send()
            .await
            .map_err(|e| network_err("player request failed", &e))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| network_err("player response was not JSON", &e))?;

        let status = body
            .pointer("/playabilityStatus/status")
            .and_then(Value::as_str)
            .unwrap_or("ERROR");
        if status != "OK" {
            let reason = body
                .pointer("/playabilityStatus/reason")
                .and_then(Value::as_str)
                .unwrap_or("unknown reason");
            return Err(Error::resolution(video_id, reason));
        }

        Ok(body)
    }

    /// Pick the best audio-only adaptive format.
    fn best_audio_url(response: &Value, video_id: &str) -> Result<String> {
        let formats = response
            .pointer("/streamingData/adaptiveFormats")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::stream(video_id, "no streaming data"))?;

        formats
            .iter()
            .filter(|f| {
                f.get("mimeType")
                    .and_then(Value::as_str)
                    .is_some_and(|m| m.starts_with("audio/"))
            })
            .max_by_key(|f| f.get("bitrate").and_then(Value::as_u64).unwrap_or(0))
            .and_then(|f| f.get("url").and_then(Value::as_str))
            .map(String::from)
            .ok_or_else(|| Error::stream(video_id, "no playable audio format"))
    }

    /// Search a watch-next tree for distinct related video ids.
    fn collect_video_ids(value: &Value, exclude: &str, out: &mut Vec<String>, limit: usize) {
        if out.len() >= limit {
            return;
        }
        match value {
            Value::Object(map) => {
                if let Some(id) = map.get("videoId").and_then(Value::as_str) {
                    if id != exclude && !out.iter().any(|seen| seen == id) {
                        out.push(id.to_string());
                    }
                }
                for nested in map.values() {
                    Self::collect_video_ids(nested, exclude, out, limit);
                }
            }
            Value::Array(items) => {
                for nested in items {
                    Self::collect_video_ids(nested, exclude, out, limit);
                }
            }
            _ => {}
        }
    }
}

impl ProviderResolver for YouTubeResolver {
    async fn resolve(&self, identifier: &str) -> Result<Vec<Track>> {
        let video_id = extract_video_id(identifier)
            .ok_or_else(|| Error::resolution(identifier, "not a video id or watch URL"))?;

        let response = self.player_response(&video_id).await?;
        let details = response
            .get("videoDetails")
            .ok_or_else(|| Error::resolution(&video_id, "missing video details"))?;

        let title = details
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Unknown title");
        let duration_secs = details
            .get("lengthSeconds")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        let thumbnail = details
            .pointer("/thumbnail/thumbnails")
            .and_then(Value::as_array)
            .and_then(|thumbs| thumbs.last())
            .and_then(|t| t.get("url"))
            .and_then(Value::as_str);

        let mut track = Track::new(&video_id, title, SourceKind::YouTube)
            .with_url(format!("https://youtube.com/watch?v={video_id}"))
            .with_duration(TrackDuration::from_seconds(duration_secs));
        if let Some(author) = details.get("author").and_then(Value::as_str) {
            track = track.with_artist(author);
        }
        if let Some(thumb) = thumbnail {
            track = track.with_thumbnail(thumb);
        }

        debug!("resolved YouTube video {video_id}: {title}");
        Ok(vec![track])
    }

    async fn open_stream(&self, track: &Track) -> Result<AudioSource> {
        let response = self.player_response(&track.id).await.map_err(|e| match e {
            Error::Resolution { reason, .. } => Error::stream(&track.id, reason),
            other => other,
        })?;
        let stream_url = Self::best_audio_url(&response, &track.id)?;

        let data = self
            .http
            .get(&stream_url)
            .send()
            .await
            .map_err(|e| network_err("stream fetch failed", &e))?
            .bytes()
            .await
            .map_err(|e| network_err("stream read failed", &e))?;

        if data.is_empty() {
            return Err(Error::stream(&track.id, "provider returned empty stream"));
        }
        debug!("fetched {} bytes for {}", data.len(), track.id);
        Ok(AudioSource::encoded(data))
    }

    async fn related(&self, track: &Track, limit: usize) -> Result<Vec<String>> {
        let response = self
            .http
            .post(NEXT_URL)
            .json(&InnerTubeRequest::for_video(&track.id))
            .send()
            .await
            .map_err(|e| network_err("next request failed", &e))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| network_err("next response was not JSON", &e))?;

        let mut ids = Vec::new();
        Self::collect_video_ids(&body, &track.id, &mut ids, limit);
        if ids.is_empty() {
            warn!("no related videos found for {}", track.id);
        }
        Ok(ids)
    }
}

/// Extract a video id from a watch URL, a share URL, or a bare id.
pub fn extract_video_id(identifier: &str) -> Option<String> {
    if let Ok(parsed) = url::Url::parse(identifier) {
        if let Some((_, id)) = parsed.query_pairs().find(|(key, _)| key == "v") {
            return Some(id.into_owned());
        }
        // youtu.be/<id> share links
        if parsed.host_str().is_some_and(|h| h.ends_with("youtu.be")) {
            return parsed
                .path_segments()
                .and_then(|mut segments| segments.next())
                .filter(|s| !s.is_empty())
                .map(String::from);
        }
        return None;
    }

    let looks_like_id = identifier.len() == 11
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    looks_like_id.then(|| identifier.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id_from_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=abc123def45&list=RDabc&index=2"),
            Some("abc123def45".to_string())
        );
    }

    #[test]
    fn test_extract_video_id_from_share_url() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_video_id_bare() {
        assert_eq!(
            extract_video_id("dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(extract_video_id("not a video"), None);
    }

    #[test]
    fn test_collect_video_ids_dedupes_and_limits() {
        let tree = serde_json::json!({
            "results": [
                {"videoId": "aaaaaaaaaaa"},
                {"nested": {"videoId": "bbbbbbbbbbb"}},
                {"videoId": "aaaaaaaaaaa"},
                {"videoId": "current0000"},
                {"videoId": "ccccccccccc"},
            ]
        });
        let mut out = Vec::new();
        YouTubeResolver::collect_video_ids(&tree, "current0000", &mut out, 2);
        assert_eq!(out, vec!["aaaaaaaaaaa", "bbbbbbbbbbb"]);
    }
}
