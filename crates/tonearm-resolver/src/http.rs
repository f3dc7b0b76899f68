//! Direct-URL resolver.

use tonearm_core::{AudioSource, Error, Result, SourceKind, Track};
use tracing::debug;

use crate::{network_err, ProviderResolver};

/// Resolver for direct audio URLs.
#[derive(Clone)]
pub struct UrlResolver {
    http: reqwest::Client,
}

impl UrlResolver {
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl ProviderResolver for UrlResolver {
    async fn resolve(&self, identifier: &str) -> Result<Vec<Track>> {
        let parsed = url::Url::parse(identifier)
            .map_err(|e| Error::resolution(identifier, format!("not a URL: {e}")))?;

        let response = self
            .http
            .head(parsed.as_str())
            .send()
            .await
            .map_err(|e| Error::resolution(identifier, format!("probe failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::resolution(
                identifier,
                format!("probe returned {}", response.status()),
            ));
        }

        let title = title_from_url(&parsed);
        debug!("resolved direct URL {identifier}");
        Ok(vec![Track::new(identifier, title, SourceKind::Url)])
    }

    async fn open_stream(&self, track: &Track) -> Result<AudioSource> {
        let response = self
            .http
            .get(&track.id)
            .send()
            .await
            .map_err(|e| network_err("stream fetch failed", &e))?;

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let data = response
            .bytes()
            .await
            .map_err(|e| network_err("stream read failed", &e))?;
        if data.is_empty() {
            return Err(Error::stream(&track.id, "URL returned no data"));
        }

        Ok(match mime {
            Some(mime) => AudioSource::encoded_with_mime(data, mime),
            None => AudioSource::encoded(data),
        })
    }

    async fn related(&self, _track: &Track, _limit: usize) -> Result<Vec<String>> {
        // Arbitrary URLs have no notion of related content.
        Ok(Vec::new())
    }
}

/// Derive a display title from the last path segment, query stripped.
fn title_from_url(parsed: &url::Url) -> String {
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .map_or_else(|| parsed.as_str().to_string(), String::from)
}
